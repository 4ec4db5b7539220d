//! The handful of Slack Web API methods the bot needs.

use std::{collections::HashSet, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, de::DeserializeOwned},
    teambot_channels::{BotIdentity, ChannelId, UserId},
    tracing::debug,
};

use crate::{Error, Result, config::SlackAccountConfig};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const MEMBERS_PAGE_SIZE: &str = "200";

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthTest {
    user_id: String,
    #[serde(default)]
    user: String,
}

#[derive(Debug, Deserialize)]
struct ConnectionsOpen {
    url: String,
}

#[derive(Debug, Deserialize)]
struct MembersPage {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

/// Thin Web API client. Every method is a form-encoded POST with a bearer
/// token.
#[derive(Clone)]
pub struct SlackApi {
    http: reqwest::Client,
    base_url: String,
    bot_token: Secret<String>,
    app_token: Secret<String>,
}

impl SlackApi {
    pub fn new(config: &SlackAccountConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            app_token: config.app_token.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        token: &Secret<String>,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let resp = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(token.expose_secret())
            .form(params)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                method: method.to_string(),
                status,
                body,
            });
        }

        let body: serde_json::Value = resp.json().await?;
        let envelope: Envelope = serde_json::from_value(body.clone())?;
        if !envelope.ok {
            return Err(Error::api(
                method,
                envelope.error.unwrap_or_else(|| "unknown_error".into()),
            ));
        }
        Ok(serde_json::from_value(body)?)
    }

    /// `auth.test`: who the bot token belongs to.
    pub async fn auth_test(&self) -> Result<BotIdentity> {
        let auth: AuthTest = self.call("auth.test", &self.bot_token, &[]).await?;
        Ok(BotIdentity::new(auth.user_id, auth.user))
    }

    /// `apps.connections.open`: a fresh Socket Mode websocket URL.
    pub async fn open_connection(&self) -> Result<String> {
        let open: ConnectionsOpen = self
            .call("apps.connections.open", &self.app_token, &[])
            .await?;
        Ok(open.url)
    }

    /// `chat.postMessage`.
    pub async fn post_message(&self, channel: &ChannelId, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("chat.postMessage", &self.bot_token, &[
                ("channel", channel.as_str()),
                ("text", text),
            ])
            .await?;
        Ok(())
    }

    /// `conversations.members`, following cursors until the last page.
    pub async fn conversation_members(&self, channel: &ChannelId) -> Result<HashSet<UserId>> {
        let mut members = HashSet::new();
        let mut cursor = String::new();
        loop {
            let mut params = vec![
                ("channel", channel.as_str()),
                ("limit", MEMBERS_PAGE_SIZE),
            ];
            if !cursor.is_empty() {
                params.push(("cursor", cursor.as_str()));
            }
            let page: MembersPage = self
                .call("conversations.members", &self.bot_token, &params)
                .await?;
            members.extend(page.members.into_iter().map(UserId::new));

            match page.response_metadata.map(|m| m.next_cursor) {
                Some(next) if !next.is_empty() => cursor = next,
                _ => break,
            }
        }
        debug!(channel = %channel, count = members.len(), "fetched channel members");
        Ok(members)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn api(server: &mockito::Server) -> SlackApi {
        let config = SlackAccountConfig::new(
            Secret::new("xoxb-test".into()),
            Secret::new("xapp-test".into()),
        )
        .with_api_base_url(server.url());
        SlackApi::new(&config).unwrap()
    }

    #[tokio::test]
    async fn auth_test_returns_identity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth.test")
            .match_header("authorization", "Bearer xoxb-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"user_id":"UBOT","user":"teambot","team":"T1"}"#)
            .create_async()
            .await;

        let identity = api(&server).auth_test().await.unwrap();
        assert_eq!(identity, BotIdentity::new("UBOT", "teambot"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn open_connection_uses_app_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/apps.connections.open")
            .match_header("authorization", "Bearer xapp-test")
            .with_status(200)
            .with_body(r#"{"ok":true,"url":"wss://wss.slack.test/link"}"#)
            .create_async()
            .await;

        let url = api(&server).open_connection().await.unwrap();
        assert_eq!(url, "wss://wss.slack.test/link");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_message_sends_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("channel".into(), "D1".into()),
                Matcher::UrlEncoded("text".into(), "Team <#C1> created.".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"ok":true,"ts":"1.2"}"#)
            .create_async()
            .await;

        api(&server)
            .post_message(&ChannelId::new("D1"), "Team <#C1> created.")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_body(r#"{"ok":false,"error":"channel_not_found"}"#)
            .create_async()
            .await;

        let err = api(&server)
            .post_message(&ChannelId::new("C404"), "hi")
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::Api { error, .. } if error == "channel_not_found"));

        let transport_err = teambot_channels::Error::from(err);
        assert!(matches!(
            transport_err,
            teambot_channels::Error::Rejected { .. }
        ));
    }

    #[tokio::test]
    async fn http_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth.test")
            .with_status(503)
            .with_body("try later")
            .create_async()
            .await;

        let err = api(&server).auth_test().await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 503, .. }));
        assert!(err.to_string().contains("try later"));
    }

    #[tokio::test]
    async fn members_follow_cursor() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/conversations.members")
            .match_body(Matcher::Exact("channel=C1&limit=200".into()))
            .with_status(200)
            .with_body(
                r#"{"ok":true,"members":["U1","U2"],"response_metadata":{"next_cursor":"page2"}}"#,
            )
            .create_async()
            .await;
        let second = server
            .mock("POST", "/conversations.members")
            .match_body(Matcher::Exact("channel=C1&limit=200&cursor=page2".into()))
            .with_status(200)
            .with_body(
                r#"{"ok":true,"members":["U2","UBOT"],"response_metadata":{"next_cursor":""}}"#,
            )
            .create_async()
            .await;

        let members = api(&server)
            .conversation_members(&ChannelId::new("C1"))
            .await
            .unwrap();

        let expected: HashSet<UserId> = ["U1", "U2", "UBOT"].into_iter().map(UserId::new).collect();
        assert_eq!(members, expected);
        first.assert_async().await;
        second.assert_async().await;
    }
}
