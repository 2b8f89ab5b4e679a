pub use self::parser::{Config, DatabaseConfig, DbType, LoggingConfig, SlackConfig};
pub use self::validator::ConfigError;

mod parser;
mod validator;
