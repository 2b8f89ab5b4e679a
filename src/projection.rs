//! Read-time counterparts of the formula cells written by `mapper`.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::db::Row;
use crate::mapper::ALIAS_PREFIX;
use crate::sync::logic::header_index;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub updated: Option<i64>,
    pub updated_date: Option<String>,
    pub updated_time: String,
    pub status_emoji: String,
    pub status_emoji_url: Option<String>,
    pub status_text: String,
    pub icon_url: String,
}

/// name -> path, read from the emoji table by header name.
pub fn emoji_paths(rows: &[Row]) -> HashMap<String, String> {
    let Some(header) = rows.first() else {
        return HashMap::new();
    };
    let (Some(name_col), Some(path_col)) = (header_index(header, "name"), header_index(header, "path"))
    else {
        return HashMap::new();
    };

    rows.iter()
        .skip(1)
        .filter_map(|row| Some((row.get(name_col)?.clone(), row.get(path_col)?.clone())))
        .collect()
}

/// Resolves one alias hop. An alias whose target is unknown resolves to
/// its own literal path.
pub fn resolve_emoji_url(emoji: &HashMap<String, String>, name: &str) -> Option<String> {
    let path = emoji.get(name)?;
    match path.strip_prefix(ALIAS_PREFIX) {
        Some(target) => Some(emoji.get(target).cloned().unwrap_or_else(|| path.clone())),
        None => Some(path.clone()),
    }
}

/// The latest stored row of each member, in order of first appearance.
pub fn latest_member_views(log: &[Row], emoji: &HashMap<String, String>) -> Vec<MemberView> {
    let Some(header) = log.first() else {
        return Vec::new();
    };
    let Some(id_col) = header_index(header, "id") else {
        return Vec::new();
    };

    let cell = |row: &Row, name: &str| -> String {
        header_index(header, name)
            .and_then(|col| row.get(col))
            .cloned()
            .unwrap_or_default()
    };

    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut latest: HashMap<&str, &Row> = HashMap::new();
    for row in log.iter().skip(1) {
        let Some(id) = row.get(id_col) else {
            continue;
        };
        if seen.insert(id.as_str()) {
            order.push(id.as_str());
        }
        latest.insert(id.as_str(), row);
    }

    order
        .into_iter()
        .filter_map(|id| latest.get(id).copied())
        .map(|row| {
            let updated_time = cell(row, "updated_time");
            let status_emoji = cell(row, "status_emoji");
            let status_emoji_url = resolve_emoji_url(emoji, &emoji_key(&status_emoji));
            MemberView {
                id: cell(row, "id"),
                name: cell(row, "name"),
                display_name: cell(row, "display_name"),
                updated: cell(row, "updated").parse().ok(),
                updated_date: date_part(&updated_time),
                updated_time,
                status_emoji,
                status_emoji_url,
                status_text: cell(row, "status_text"),
                icon_url: cell(row, "image_512"),
            }
        })
        .collect()
}

/// Lookup key for a status emoji: every colon removed, as the sheet formula
/// does with `SUBSTITUTE`.
fn emoji_key(status_emoji: &str) -> String {
    status_emoji.replace(':', "")
}

/// `YYYY/MM/DD` from a `YYYY/MM/DD:HH:MM:SS` cell.
fn date_part(updated_time: &str) -> Option<String> {
    let (date, _) = updated_time.split_once(':')?;
    (date.len() == 10).then(|| date.to_string())
}
