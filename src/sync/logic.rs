use crate::db::Row;
use crate::slack::Member;

use super::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncDecision {
    /// No stored row shares the member id.
    New,
    /// The latest stored row has a different `updated` value.
    Changed,
    Unchanged,
}

impl SyncDecision {
    pub(crate) fn needs_append(self) -> bool {
        !matches!(self, SyncDecision::Unchanged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LogColumns {
    pub(crate) id: usize,
    pub(crate) updated: usize,
}

pub(crate) fn is_active(member: &Member) -> bool {
    !member.deleted && !member.is_bot && !member.is_restricted && !member.is_ultra_restricted
}

pub(crate) fn user_filter(members: Vec<Member>) -> Vec<Member> {
    members.into_iter().filter(is_active).collect()
}

/// Position of `name` in the header row. A repeated name resolves to its
/// last occurrence.
pub(crate) fn header_index(header: &[String], name: &str) -> Option<usize> {
    header.iter().rposition(|cell| cell == name)
}

pub(crate) fn log_columns(table: &str, rows: &[Row]) -> Result<LogColumns, SyncError> {
    let header = rows.first().map(Vec::as_slice).unwrap_or_default();
    let column = |name: &str| {
        header_index(header, name).ok_or_else(|| SyncError::MissingColumn {
            table: table.to_string(),
            column: name.to_string(),
        })
    };

    Ok(LogColumns {
        id: column("id")?,
        updated: column("updated")?,
    })
}

/// Compares the member against the last stored row with the same id.
/// Append order stands in for recency.
pub(crate) fn decide(rows: &[Row], columns: LogColumns, member: &Member) -> SyncDecision {
    let latest = rows
        .iter()
        .skip(1)
        .rev()
        .find(|row| row.get(columns.id).is_some_and(|id| *id == member.id));

    let Some(latest) = latest else {
        return SyncDecision::New;
    };

    let stored = latest
        .get(columns.updated)
        .and_then(|cell| cell.trim().parse::<i64>().ok());

    if stored == Some(member.updated) {
        SyncDecision::Unchanged
    } else {
        SyncDecision::Changed
    }
}
