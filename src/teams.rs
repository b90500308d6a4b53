//! Teams incoming-webhook notifications.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Article;

pub const THEME_COLOR: &str = "#34D399";
pub const READ_MORE: &str = "もっと見る";
pub const UNAVAILABLE_TITLE: &str = "今週...ネタ切れです！";
pub const UNAVAILABLE_TEXT: &str = "申し訳ございません。。🙇🙇🙇";

/// Legacy connector "MessageCard" payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageCard {
    #[serde(rename = "@type")]
    pub card_type: String,
    #[serde(rename = "@context")]
    pub context: String,
    pub title: String,
    pub text: String,
    #[serde(rename = "themeColor")]
    pub theme_color: String,
}

impl MessageCard {
    pub fn new(title: &str, text: &str, theme_color: &str) -> Self {
        Self {
            card_type: "MessageCard".into(),
            context: "https://schema.org/extensions".into(),
            title: title.to_string(),
            text: text.to_string(),
            theme_color: theme_color.to_string(),
        }
    }
}

/// Card sent when no article is available this time.
pub fn unavailable_card() -> MessageCard {
    MessageCard::new(UNAVAILABLE_TITLE, UNAVAILABLE_TEXT, THEME_COLOR)
}

/// Card announcing an article: excerpt as a heading, then a link to it.
pub fn article_card(article: &Article) -> MessageCard {
    let text = format!(
        "<h2>{}</h2><a href=\"{}\">{}</a>",
        article.excerpt, article.url, READ_MORE
    );
    MessageCard::new(&article.title, &text, THEME_COLOR)
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, webhook_url: &str, card: &MessageCard) -> Result<()>;
}

/// Send a card through `sender`; its result is passed through untouched.
pub async fn send_card(
    sender: &dyn MessageSender,
    webhook_url: &str,
    card: &MessageCard,
) -> Result<()> {
    sender.send(webhook_url, card).await
}

#[derive(Debug, Clone)]
pub struct TeamsClient {
    http: Client,
}

impl TeamsClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("article-notifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http })
    }

    pub fn build_request(&self, webhook_url: &str, card: &MessageCard) -> Result<reqwest::Request> {
        self.http
            .post(webhook_url)
            .header("Content-Type", "application/json")
            .json(card)
            .build()
            .context("failed to build webhook request")
    }
}

#[async_trait]
impl MessageSender for TeamsClient {
    async fn send(&self, webhook_url: &str, card: &MessageCard) -> Result<()> {
        let request = self.build_request(webhook_url, card)?;
        debug!(title = %card.title, "posting card to webhook");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach webhook")?;

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        check_status(status, &body)?;
        debug!(%status, response = %body, "webhook accepted card");
        Ok(())
    }
}

/// Non-2xx webhook responses become errors carrying status and body.
pub fn check_status(status: StatusCode, body: &str) -> Result<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(anyhow!("webhook rate limited (429): {}", body));
    }
    if !status.is_success() {
        return Err(anyhow!("webhook error {}: {}", status, body));
    }
    Ok(())
}
