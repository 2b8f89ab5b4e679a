use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::DatabaseError;
use crate::mapper::{RowMapper, emoji_header, emoji_to_rows, log_header};
use crate::notifier::{Notifier, new_member_text, status_change_text};
use crate::sheet::SheetAdapter;
use crate::slack::{Member, SlackApi};

pub mod logic;

use self::logic::{SyncDecision, decide, log_columns, user_filter};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("table {table} has no '{column}' header column")]
    MissingColumn { table: String, column: String },
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// What a run did. `members_skipped` / `emoji_skipped` mean the Slack fetch
/// for that resource failed and nothing was written for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub appended: usize,
    pub unchanged: usize,
    pub notified: usize,
    pub emoji_rows: usize,
    pub members_skipped: bool,
    pub emoji_skipped: bool,
}

pub struct SyncEngine {
    slack: Arc<dyn SlackApi>,
    sheets: Arc<SheetAdapter>,
    notifier: Notifier,
    mapper: RowMapper,
    log_table: String,
    emoji_table: String,
    notify_new_members: bool,
}

impl SyncEngine {
    pub fn new(config: &Config, slack: Arc<dyn SlackApi>, sheets: Arc<SheetAdapter>) -> Self {
        Self {
            notifier: Notifier::new(slack.clone(), config.slack.notify_channel.clone()),
            mapper: RowMapper::new(config.sheets.emoji_table.clone(), config.sheets.utc_offset()),
            log_table: config.sheets.log_table.clone(),
            emoji_table: config.sheets.emoji_table.clone(),
            notify_new_members: config.notify.on_new_member,
            slack,
            sheets,
        }
    }

    /// Creates both tables and writes a full snapshot. A log table that
    /// already holds rows is left alone; the emoji table is always
    /// overwritten.
    pub async fn init(&self) -> Result<SyncSummary, SyncError> {
        let mut summary = SyncSummary::default();

        self.sheets.ensure_table(&self.log_table).await?;
        self.sheets.ensure_table(&self.emoji_table).await?;

        let existing = self.sheets.load_table(&self.log_table, true).await?;
        if existing.is_empty() {
            self.sheets.append_row(&self.log_table, log_header()).await?;

            match self.fetch_active_members().await {
                Some(members) => {
                    for member in &members {
                        self.sheets
                            .append_row(&self.log_table, self.mapper.member_to_row(member))
                            .await?;
                        summary.appended += 1;
                    }
                }
                None => summary.members_skipped = true,
            }
        } else {
            warn!(
                "table {} already has {} rows, skipping member snapshot",
                self.log_table,
                existing.len()
            );
        }

        self.write_emoji_table(&mut summary).await?;

        info!(
            appended = summary.appended,
            emoji_rows = summary.emoji_rows,
            "init finished"
        );
        Ok(summary)
    }

    /// Appends a row for every new or changed member and announces status
    /// changes.
    pub async fn update(&self) -> Result<SyncSummary, SyncError> {
        let mut summary = SyncSummary::default();

        let Some(members) = self.fetch_active_members().await else {
            summary.members_skipped = true;
            return Ok(summary);
        };

        let rows = self.sheets.load_table(&self.log_table, true).await?;
        let columns = log_columns(&self.log_table, &rows)?;

        for member in &members {
            let decision = decide(&rows, columns, member);
            debug!(user = %member.name, ?decision, "sync decision");

            if !decision.needs_append() {
                summary.unchanged += 1;
                continue;
            }

            self.sheets
                .append_row(&self.log_table, self.mapper.member_to_row(member))
                .await?;
            summary.appended += 1;

            if let Some(text) = self.notification_for(decision, member) {
                if self.notifier.notify(&text).await {
                    summary.notified += 1;
                }
            }
        }

        info!(
            appended = summary.appended,
            unchanged = summary.unchanged,
            notified = summary.notified,
            "update finished"
        );
        Ok(summary)
    }

    /// Full refresh of the emoji table.
    pub async fn update_emoji(&self) -> Result<SyncSummary, SyncError> {
        let mut summary = SyncSummary::default();
        self.write_emoji_table(&mut summary).await?;
        info!(emoji_rows = summary.emoji_rows, "emoji update finished");
        Ok(summary)
    }

    pub async fn test_notify(&self, channel: Option<&str>, text: &str) -> bool {
        let channel = channel.unwrap_or(self.notifier.channel());
        self.notifier.notify_to(channel, text).await
    }

    pub async fn test_get_emoji(&self) -> Option<BTreeMap<String, String>> {
        self.fetch_emoji_logged().await
    }

    async fn fetch_emoji_logged(&self) -> Option<BTreeMap<String, String>> {
        match self.slack.fetch_emoji().await {
            Ok(emoji) => emoji,
            Err(err) => {
                warn!("emoji fetch failed: {}", err);
                None
            }
        }
    }

    fn notification_for(&self, decision: SyncDecision, member: &Member) -> Option<String> {
        match decision {
            SyncDecision::Changed => Some(status_change_text(member)),
            SyncDecision::New if self.notify_new_members => Some(new_member_text(member)),
            SyncDecision::New | SyncDecision::Unchanged => None,
        }
    }

    async fn fetch_active_members(&self) -> Option<Vec<Member>> {
        match self.slack.fetch_members().await {
            Ok(Some(members)) => Some(user_filter(members)),
            Ok(None) => {
                warn!("member list unavailable, skipping member sync");
                None
            }
            Err(err) => {
                warn!("member fetch failed, skipping member sync: {}", err);
                None
            }
        }
    }

    /// Replaces the emoji table in one write. The table is only touched
    /// once the fetch succeeded, and a failed write leaves the old rows.
    async fn write_emoji_table(&self, summary: &mut SyncSummary) -> Result<(), SyncError> {
        let Some(emoji) = self.fetch_emoji_logged().await else {
            warn!("emoji list unavailable, skipping emoji sync");
            summary.emoji_skipped = true;
            return Ok(());
        };

        let mut rows = Vec::with_capacity(emoji.len() + 1);
        rows.push(emoji_header());
        rows.extend(emoji_to_rows(&emoji));

        self.sheets.write_range(&self.emoji_table, rows).await?;
        summary.emoji_rows = emoji.len();
        Ok(())
    }
}
