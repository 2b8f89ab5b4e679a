use clap::{Parser, Subcommand};

/// Sync a Slack member directory and custom emoji into a tabular store.
#[derive(Parser, Debug)]
#[command(name = "slack-sheet-sync", version)]
#[command(about = "Sync Slack members and custom emoji into a tabular store")]
pub struct Cli {
    /// Path to the YAML config file.
    #[arg(long, short, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the log and emoji tables and write a full snapshot.
    Init,
    /// Append new or changed members and announce status changes.
    Update,
    /// Rewrite the emoji table from the current emoji list.
    UpdateEmoji,
    /// Post a test message.
    TestNotify {
        /// Channel to post to; defaults to slack.notify_channel.
        #[arg(long)]
        channel: Option<String>,
        #[arg(long, default_value = "testMessage")]
        text: String,
    },
    /// Fetch the emoji list and print it.
    TestGetEmoji,
    /// Print the latest row of every member with formula columns resolved,
    /// one JSON object per line.
    Report,
}
