//! In-process stand-ins used by unit tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::db::memory::MemorySheetStore;
use crate::db::{DatabaseError, Row, SheetStore};
use crate::sheet::SheetAdapter;
use crate::slack::models::MemberProfile;
use crate::slack::{Member, SlackApi, SlackError};

#[derive(Default)]
struct FakeState {
    members: Option<Vec<Member>>,
    emoji: Option<BTreeMap<String, String>>,
    posted: Vec<(String, String)>,
    fail_posts: bool,
    broken_transport: bool,
    emoji_fetches: usize,
}

/// Scripted Slack API. `None` data answers like `ok: false`.
#[derive(Default)]
pub struct FakeSlack {
    state: Mutex<FakeState>,
}

fn transport_error() -> SlackError {
    SlackError::Decode(serde_json::from_str::<serde_json::Value>("<html>").unwrap_err())
}

impl FakeSlack {
    pub fn with_members(members: Vec<Member>) -> Self {
        let fake = Self::default();
        fake.set_members(Some(members));
        fake
    }

    pub fn set_members(&self, members: Option<Vec<Member>>) {
        self.state.lock().members = members;
    }

    pub fn set_emoji(&self, emoji: Option<BTreeMap<String, String>>) {
        self.state.lock().emoji = emoji;
    }

    pub fn fail_posts(&self) {
        self.state.lock().fail_posts = true;
    }

    pub fn break_transport(&self) {
        self.state.lock().broken_transport = true;
    }

    pub fn posted(&self) -> Vec<(String, String)> {
        self.state.lock().posted.clone()
    }

    pub fn emoji_fetches(&self) -> usize {
        self.state.lock().emoji_fetches
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn fetch_members(&self) -> Result<Option<Vec<Member>>, SlackError> {
        let state = self.state.lock();
        if state.broken_transport {
            return Err(transport_error());
        }
        Ok(state.members.clone())
    }

    async fn fetch_emoji(&self) -> Result<Option<BTreeMap<String, String>>, SlackError> {
        let mut state = self.state.lock();
        if state.broken_transport {
            return Err(transport_error());
        }
        state.emoji_fetches += 1;
        Ok(state.emoji.clone())
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let mut state = self.state.lock();
        if state.fail_posts || state.broken_transport {
            return Err(transport_error());
        }
        state.posted.push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

pub fn memory_sheets() -> Arc<SheetAdapter> {
    Arc::new(SheetAdapter::new(Arc::new(MemorySheetStore::new())))
}

pub fn member(id: &str, updated: i64) -> Member {
    Member {
        id: id.to_string(),
        name: id.to_lowercase(),
        updated,
        profile: MemberProfile {
            display_name: format!("{id} display"),
            status_emoji: ":speech_balloon:".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// Memory store whose bulk replace can be made to fail.
#[derive(Default)]
pub struct FlakyReplaceStore {
    inner: MemorySheetStore,
    fail_replace: Mutex<bool>,
}

impl FlakyReplaceStore {
    pub fn fail_replace(&self) {
        *self.fail_replace.lock() = true;
    }
}

#[async_trait]
impl SheetStore for FlakyReplaceStore {
    async fn table_exists(&self, name: &str) -> Result<bool, DatabaseError> {
        self.inner.table_exists(name).await
    }

    async fn create_table(&self, name: &str) -> Result<(), DatabaseError> {
        self.inner.create_table(name).await
    }

    async fn load_rows(&self, name: &str) -> Result<Vec<Row>, DatabaseError> {
        self.inner.load_rows(name).await
    }

    async fn append_row(&self, name: &str, row: &Row) -> Result<(), DatabaseError> {
        self.inner.append_row(name, row).await
    }

    async fn replace_rows(&self, name: &str, rows: &[Row]) -> Result<(), DatabaseError> {
        if *self.fail_replace.lock() {
            return Err(DatabaseError::Query("replace refused".to_string()));
        }
        self.inner.replace_rows(name, rows).await
    }

    async fn clear_rows(&self, name: &str) -> Result<(), DatabaseError> {
        self.inner.clear_rows(name).await
    }
}
