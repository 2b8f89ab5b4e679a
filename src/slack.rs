use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SlackConfig;

pub mod models;

pub use self::models::{EmojiListResponse, Member, UserListResponse};

const USERS_LIST: &str = "users.list";
const EMOJI_LIST: &str = "emoji.list";
const CHAT_POST_MESSAGE: &str = "chat.postMessage";

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("invalid slack api url: {0}")]
    Url(#[from] url::ParseError),
    #[error("slack request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode slack response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The three Web API methods the sync needs.
///
/// `Ok(None)` means Slack answered with `ok: false`; callers skip the
/// resource for this run instead of failing.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn fetch_members(&self) -> Result<Option<Vec<Member>>, SlackError>;
    async fn fetch_emoji(&self) -> Result<Option<BTreeMap<String, String>>, SlackError>;
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError>;
}

pub struct SlackClient {
    client: Client,
    api_url: Url,
    token: SecretString,
    page_limit: u32,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self, SlackError> {
        let mut api_url = Url::parse(&config.api_url)?;
        // Url::join drops the last path segment unless it ends with a slash.
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            api_url,
            token: SecretString::from(config.bot_token.clone()),
            page_limit: config.page_limit,
        })
    }

    fn method_url(&self, method: &str) -> Result<Url, SlackError> {
        Ok(self.api_url.join(method)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SlackError> {
        let url = self.method_url(method)?;
        debug!("calling slack {}", method);

        let token = self.token.expose_secret();
        let mut query: Vec<(&str, &str)> = vec![("token", token)];
        query.extend_from_slice(params);

        let body = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?
            .bytes()
            .await?;

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn fetch_members(&self) -> Result<Option<Vec<Member>>, SlackError> {
        let limit = self.page_limit.to_string();
        let mut members = Vec::new();
        let mut cursor = String::new();
        let mut seen_cursors = HashSet::new();

        loop {
            let mut params = vec![("limit", limit.as_str())];
            if !cursor.is_empty() {
                params.push(("cursor", cursor.as_str()));
            }

            let page: UserListResponse = self.get_json(USERS_LIST, &params).await?;
            if !page.ok {
                warn!(
                    "slack {} returned ok=false: {}",
                    USERS_LIST,
                    page.error.as_deref().unwrap_or("unknown error")
                );
                return Ok(None);
            }

            let next_cursor = page.next_cursor().map(ToOwned::to_owned);
            members.extend(page.members);

            match next_cursor {
                Some(next) if !seen_cursors.insert(next.clone()) => {
                    warn!("slack {} repeated cursor {}, stopping", USERS_LIST, next);
                    break;
                }
                Some(next) => cursor = next,
                None => break,
            }
        }

        debug!("fetched {} members from slack", members.len());
        Ok(Some(members))
    }

    async fn fetch_emoji(&self) -> Result<Option<BTreeMap<String, String>>, SlackError> {
        let response: EmojiListResponse = self.get_json(EMOJI_LIST, &[]).await?;
        if !response.ok {
            warn!(
                "slack {} returned ok=false: {}",
                EMOJI_LIST,
                response.error.as_deref().unwrap_or("unknown error")
            );
            return Ok(None);
        }

        debug!("fetched {} emoji from slack", response.emoji.len());
        Ok(Some(response.emoji))
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let url = self.method_url(CHAT_POST_MESSAGE)?;
        let token = self.token.expose_secret();

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .form(&[("token", token), ("channel", channel), ("text", text)])
            .send()
            .await?;

        let body = response.text().await?;
        info!("chat.postMessage to {} responded: {}", channel, body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use super::{SlackApi, SlackClient};
    use crate::config::SlackConfig;

    /// Request line and body of one HTTP request.
    async fn read_request(socket: &mut TcpStream) -> (String, String) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.expect("read request");
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < header_end + length {
            let n = socket.read(&mut chunk).await.expect("read body");
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let request_line = head.lines().next().unwrap_or_default().to_string();
        let body = String::from_utf8_lossy(&buf[header_end..header_end + length]).to_string();
        (request_line, body)
    }

    /// Answers one connection per canned JSON body, in order, and hands back
    /// what was received.
    async fn serve(responses: Vec<&'static str>) -> (String, JoinHandle<Vec<(String, String)>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let handle = tokio::spawn(async move {
            let mut received = Vec::new();
            for body in responses {
                let (mut socket, _) = listener.accept().await.expect("accept");
                received.push(read_request(&mut socket).await);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.expect("write");
                let _ = socket.shutdown().await;
            }
            received
        });

        (format!("http://{addr}/api/"), handle)
    }

    fn local_client(api_url: &str) -> SlackClient {
        let mut config = config(api_url);
        config.bot_token = "xoxb-t".to_string();
        config.page_limit = 2;
        SlackClient::new(&config).expect("client")
    }

    fn config(api_url: &str) -> SlackConfig {
        SlackConfig {
            api_url: api_url.to_string(),
            bot_token: "xoxb-test".to_string(),
            notify_channel: "general".to_string(),
            page_limit: 200,
        }
    }

    #[test]
    fn method_url_appends_method_to_base() {
        let client = SlackClient::new(&config("https://slack.com/api/")).expect("client");

        let url = client.method_url("users.list").expect("url");
        assert_eq!(url.as_str(), "https://slack.com/api/users.list");
    }

    #[test]
    fn base_without_trailing_slash_keeps_api_segment() {
        let client = SlackClient::new(&config("https://slack.example.test/api")).expect("client");

        let url = client.method_url("chat.postMessage").expect("url");
        assert_eq!(url.as_str(), "https://slack.example.test/api/chat.postMessage");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(SlackClient::new(&config("::not a url")).is_err());
    }

    #[tokio::test]
    async fn members_follow_next_cursor() {
        let (api_url, server) = serve(vec![
            r#"{"ok":true,"members":[{"id":"U1"}],"response_metadata":{"next_cursor":"abc="}}"#,
            r#"{"ok":true,"members":[{"id":"U2"}],"response_metadata":{"next_cursor":""}}"#,
        ])
        .await;

        let members = local_client(&api_url)
            .fetch_members()
            .await
            .expect("fetch")
            .expect("members");
        let received = server.await.expect("server");

        let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["U1", "U2"]);
        assert_eq!(received.len(), 2);
        assert!(received[0].0.starts_with("GET /api/users.list?token=xoxb-t&limit=2 "));
        assert!(!received[0].0.contains("cursor="));
        assert!(received[1].0.contains("&cursor=abc%3D"));
    }

    #[tokio::test]
    async fn non_ok_page_makes_member_list_unavailable() {
        let (api_url, server) = serve(vec![
            r#"{"ok":true,"members":[{"id":"U1"}],"response_metadata":{"next_cursor":"abc"}}"#,
            r#"{"ok":false,"error":"ratelimited"}"#,
        ])
        .await;

        let members = local_client(&api_url).fetch_members().await.expect("fetch");
        server.await.expect("server");

        assert!(members.is_none());
    }

    #[tokio::test]
    async fn repeated_cursor_stops_paging() {
        let (api_url, server) = serve(vec![
            r#"{"ok":true,"members":[{"id":"U1"}],"response_metadata":{"next_cursor":"abc"}}"#,
            r#"{"ok":true,"members":[{"id":"U2"}],"response_metadata":{"next_cursor":"abc"}}"#,
        ])
        .await;

        let members = local_client(&api_url)
            .fetch_members()
            .await
            .expect("fetch")
            .expect("members");
        let received = server.await.expect("server");

        assert_eq!(members.len(), 2);
        assert_eq!(received.len(), 2);
    }

    #[tokio::test]
    async fn emoji_list_is_returned_by_name() {
        let (api_url, server) = serve(vec![
            r#"{"ok":true,"emoji":{"b":"http://x/b.png","a":"alias:b"}}"#,
        ])
        .await;

        let emoji = local_client(&api_url)
            .fetch_emoji()
            .await
            .expect("fetch")
            .expect("emoji");
        let received = server.await.expect("server");

        assert_eq!(emoji.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(received[0].0.starts_with("GET /api/emoji.list?token=xoxb-t "));
    }

    #[tokio::test]
    async fn post_message_sends_form_and_ignores_ok_flag() {
        let (api_url, server) = serve(vec![r#"{"ok":false,"error":"channel_not_found"}"#]).await;

        local_client(&api_url)
            .post_message("bot-test", "a b&c")
            .await
            .expect("post");
        let received = server.await.expect("server");

        assert!(received[0].0.starts_with("POST /api/chat.postMessage "));
        assert_eq!(received[0].1, "token=xoxb-t&channel=bot-test&text=a+b%26c");
    }
}
