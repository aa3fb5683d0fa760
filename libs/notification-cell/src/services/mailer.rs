// libs/notification-cell/src/services/mailer.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::error::MailerError;

/// Opaque delivery transport. Implementations may fail transiently; retry
/// policy lives in the delivery worker, not here.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}

/// Client for the transactional mail API.
#[derive(Debug)]
pub struct HttpMailer {
    client: Client,
    base_url: String,
    api_key: String,
    from_address: String,
}

impl HttpMailer {
    pub fn new(config: &AppConfig) -> Result<Self, MailerError> {
        if !config.is_mailer_configured() {
            return Err(MailerError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.mailer_api_url.clone(),
            api_key: config.mailer_api_key.clone(),
            from_address: config.mailer_from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let url = format!("{}/messages", self.base_url);
        debug!("Sending message to {} via {}", to, url);

        let request_body = json!({
            "from": self.from_address,
            "to": to,
            "subject": subject,
            "text": body,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let response_text = response.text().await.unwrap_or_default();
            error!("Mail API send failed: {} - {}", status, response_text);
            return Err(MailerError::Api {
                status: status.as_u16(),
                message: response_text,
            });
        }

        info!("Message to {} accepted by mail API", to);
        Ok(())
    }
}
