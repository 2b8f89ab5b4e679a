#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

mod cli;
mod config;
mod db;
mod mapper;
mod notifier;
mod projection;
mod sheet;
mod slack;
mod sync;
mod utils;

#[cfg(test)]
mod testing;

use cli::{Cli, Command};
use config::Config;
use sheet::SheetAdapter;
use slack::SlackClient;
use sync::SyncEngine;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::parse_from_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config))?;
    utils::logging::init_tracing(&config.logging);
    config
        .validate()
        .with_context(|| format!("invalid config in {}", cli.config))?;
    info!("slack-sheet-sync starting: {:?}", cli.command);

    let db_manager = db::DatabaseManager::new(&config.database).await?;
    db_manager.migrate().await?;
    info!("using {:?} store", db_manager.db_type());
    let sheets = Arc::new(SheetAdapter::new(db_manager.sheet_store()));

    let slack = Arc::new(SlackClient::new(&config.slack)?);
    let engine = SyncEngine::new(&config, slack, sheets.clone());

    match cli.command {
        Command::Init => {
            engine.init().await?;
        }
        Command::Update => {
            engine.update().await?;
        }
        Command::UpdateEmoji => {
            engine.update_emoji().await?;
        }
        Command::TestNotify { channel, text } => {
            if !engine.test_notify(channel.as_deref(), &text).await {
                bail!("test notification failed");
            }
        }
        Command::TestGetEmoji => match engine.test_get_emoji().await {
            Some(emoji) => {
                info!("emoji list has {} entries", emoji.len());
                for (name, path) in &emoji {
                    println!("{name}\t{path}");
                }
            }
            None => warn!("emoji list unavailable"),
        },
        Command::Report => {
            let log = sheets.load_table(&config.sheets.log_table, true).await?;
            let emoji = sheets.load_table(&config.sheets.emoji_table, true).await?;
            let paths = projection::emoji_paths(&emoji);
            for view in projection::latest_member_views(&log, &paths) {
                println!("{}", serde_json::to_string(&view)?);
            }
        }
    }

    info!("slack-sheet-sync finished");
    Ok(())
}
