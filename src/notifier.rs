use std::sync::Arc;

use tracing::{error, info};

use crate::slack::{Member, SlackApi};

/// Posts status-change messages. One call, one message; failures are
/// logged and swallowed so a run keeps going.
pub struct Notifier {
    api: Arc<dyn SlackApi>,
    channel: String,
}

impl Notifier {
    pub fn new(api: Arc<dyn SlackApi>, channel: impl Into<String>) -> Self {
        Self {
            api,
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub async fn notify(&self, text: &str) -> bool {
        self.notify_to(&self.channel, text).await
    }

    pub async fn notify_to(&self, channel: &str, text: &str) -> bool {
        match self.api.post_message(channel, text).await {
            Ok(()) => {
                info!("posted notification to {}", channel);
                true
            }
            Err(err) => {
                error!("failed to post notification to {}: {}", channel, err);
                false
            }
        }
    }
}

pub fn status_change_text(member: &Member) -> String {
    let status = [
        member.profile.status_emoji.as_str(),
        member.profile.status_text.as_str(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ");

    if status.is_empty() {
        format!("{} cleared their status", member.label())
    } else {
        format!("{} updated their status: {}", member.label(), status)
    }
}

pub fn new_member_text(member: &Member) -> String {
    let mut text = format!("{} joined the member log", member.label());
    if !member.profile.status_emoji.is_empty() {
        text.push_str(&format!(" with status {}", member.profile.status_emoji));
    }
    text
}
