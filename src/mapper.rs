//! Turns Slack records into the literal rows stored in the log and emoji
//! tables.
//!
//! Some cells hold spreadsheet formulas. They are stored verbatim so the
//! tables can be pasted into a spreadsheet as-is; `projection` computes the
//! same values when reading from the store.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Local};

use crate::db::Row;
use crate::slack::Member;

pub const LOG_HEADER: [&str; 11] = [
    "id",
    "icon",
    "display_name",
    "name",
    "updated",
    "updated_date",
    "updated_time",
    "status_emoji",
    "status_emoji_image",
    "status_text",
    "image_512",
];

pub const EMOJI_HEADER: [&str; 3] = ["name", "path", "url"];

pub const ALIAS_PREFIX: &str = "alias:";

const UPDATED_TIME_FORMAT: &str = "%Y/%m/%d:%H:%M:%S";

// Relative references, so a row reads the same wherever it lands.
const ICON_FORMULA: &str = r#"=IMAGE(INDIRECT("RC[9]", false))"#;
const UPDATED_DATE_FORMULA: &str = r#"=DATEVALUE(LEFT(INDIRECT("RC[1]", false), 10))"#;
const EMOJI_URL_FORMULA: &str = r#"=IF(LEFT(INDIRECT("RC[-1]", false), 5)="alias", IFERROR(VLOOKUP(MID(INDIRECT("RC[-1]", false), 7, 1000), A:B, 2, false), INDIRECT("RC[-1]", false)), INDIRECT("RC[-1]", false))"#;

pub fn log_header() -> Row {
    LOG_HEADER.iter().map(|h| h.to_string()).collect()
}

pub fn emoji_header() -> Row {
    EMOJI_HEADER.iter().map(|h| h.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct RowMapper {
    emoji_table: String,
    utc_offset: Option<FixedOffset>,
}

impl RowMapper {
    /// `utc_offset` of `None` renders timestamps in the host's local zone.
    pub fn new(emoji_table: impl Into<String>, utc_offset: Option<FixedOffset>) -> Self {
        Self {
            emoji_table: emoji_table.into(),
            utc_offset,
        }
    }

    pub fn member_to_row(&self, member: &Member) -> Row {
        vec![
            member.id.clone(),
            ICON_FORMULA.to_string(),
            member.profile.display_name.clone(),
            member.name.clone(),
            member.updated.to_string(),
            UPDATED_DATE_FORMULA.to_string(),
            format_updated(member.updated, self.utc_offset),
            member.profile.status_emoji.clone(),
            self.status_emoji_formula(),
            member.profile.status_text.clone(),
            member.profile.image_512.clone(),
        ]
    }

    fn status_emoji_formula(&self) -> String {
        format!(
            r#"=IFERROR(IMAGE(VLOOKUP(SUBSTITUTE(INDIRECT("RC[-1]", false), ":", ""), {}!A:C, 3, false)), "")"#,
            self.emoji_table
        )
    }
}

/// One `[name, path, url formula]` row per entry, in name order.
pub fn emoji_to_rows(emoji: &BTreeMap<String, String>) -> Vec<Row> {
    emoji
        .iter()
        .map(|(name, path)| vec![name.clone(), path.clone(), EMOJI_URL_FORMULA.to_string()])
        .collect()
}

/// `YYYY/MM/DD:HH:MM:SS` for a Unix timestamp. Timestamps chrono cannot
/// represent come back as the raw number.
pub fn format_updated(updated: i64, utc_offset: Option<FixedOffset>) -> String {
    match to_calendar_time(updated, utc_offset) {
        Some(time) => time.format(UPDATED_TIME_FORMAT).to_string(),
        None => updated.to_string(),
    }
}

fn to_calendar_time(
    updated: i64,
    utc_offset: Option<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let utc = DateTime::from_timestamp(updated, 0)?;
    Some(match utc_offset {
        Some(offset) => utc.with_timezone(&offset),
        None => utc.with_timezone(&Local).fixed_offset(),
    })
}
