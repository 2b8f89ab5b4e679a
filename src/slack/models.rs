use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A workspace user as returned by `users.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub deleted: bool,
    pub is_bot: bool,
    pub is_restricted: bool,
    pub is_ultra_restricted: bool,
    pub is_admin: bool,
    pub tz: Option<String>,
    pub updated: i64,
    pub profile: MemberProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberProfile {
    pub real_name: String,
    pub display_name: String,
    pub status_text: String,
    pub status_emoji: String,
    pub image_512: String,
}

impl Member {
    /// Display name, falling back to the login name when the profile has none.
    pub fn label(&self) -> &str {
        if self.profile.display_name.is_empty() {
            &self.name
        } else {
            &self.profile.display_name
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseMetadata {
    pub next_cursor: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserListResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub members: Vec<Member>,
    pub cache_ts: Option<i64>,
    pub response_metadata: Option<ResponseMetadata>,
}

impl UserListResponse {
    pub fn next_cursor(&self) -> Option<&str> {
        self.response_metadata
            .as_ref()
            .map(|meta| meta.next_cursor.as_str())
            .filter(|cursor| !cursor.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmojiListResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub emoji: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::{EmojiListResponse, Member, UserListResponse};

    #[test]
    fn user_list_parses_slack_payload() {
        let body = r#"{
            "ok": true,
            "members": [{
                "id": "U1",
                "team_id": "T1",
                "name": "alice",
                "deleted": false,
                "color": "9f69e7",
                "is_bot": false,
                "updated": 1614935223,
                "profile": {
                    "display_name": "Alice",
                    "status_emoji": ":palm_tree:",
                    "status_text": "vacation",
                    "image_512": "https://avatars/alice_512.png",
                    "image_24": "https://avatars/alice_24.png"
                }
            }],
            "cache_ts": 1614935300,
            "response_metadata": {"next_cursor": "dXNlcjpVMEc5V0ZYTlo="}
        }"#;

        let response: UserListResponse = serde_json::from_str(body).expect("parse");

        assert!(response.ok);
        assert_eq!(response.members.len(), 1);
        let member = &response.members[0];
        assert_eq!(member.id, "U1");
        assert_eq!(member.updated, 1614935223);
        assert_eq!(member.profile.status_emoji, ":palm_tree:");
        assert!(!member.is_restricted);
        assert_eq!(response.next_cursor(), Some("dXNlcjpVMEc5V0ZYTlo="));
    }

    #[test]
    fn empty_cursor_means_last_page() {
        let response: UserListResponse = serde_json::from_str(
            r#"{"ok": true, "members": [], "response_metadata": {"next_cursor": ""}}"#,
        )
        .expect("parse");

        assert_eq!(response.next_cursor(), None);
    }

    #[test]
    fn error_response_keeps_reason() {
        let response: UserListResponse =
            serde_json::from_str(r#"{"ok": false, "error": "invalid_auth"}"#).expect("parse");

        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("invalid_auth"));
        assert!(response.members.is_empty());
    }

    #[test]
    fn emoji_list_is_sorted_by_name() {
        let response: EmojiListResponse = serde_json::from_str(
            r#"{"ok": true, "emoji": {"zz": "http://x/zz.png", "aa": "alias:zz"}}"#,
        )
        .expect("parse");

        let names: Vec<&str> = response.emoji.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["aa", "zz"]);
    }

    #[test]
    fn label_falls_back_to_login_name() {
        let mut member = Member {
            name: "bob".to_string(),
            ..Default::default()
        };
        assert_eq!(member.label(), "bob");

        member.profile.display_name = "Bobby".to_string();
        assert_eq!(member.label(), "Bobby");
    }
}
