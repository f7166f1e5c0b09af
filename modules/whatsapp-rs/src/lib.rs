pub mod error;
pub mod models;

pub use error::{Result, WhatsAppError};
pub use models::{IncomingMessage, MediaInfo, MessageContent, WebhookPayload};

use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

const GRAPH_API_URL: &str = "https://graph.facebook.com/v18.0";

/// WhatsApp ids are bare international numbers: digits only, no leading `+`.
fn is_wa_id(recipient: &str) -> bool {
    (8..=15).contains(&recipient.len()) && recipient.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone)]
pub struct WhatsAppOptions {
    pub phone_number_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct WhatsAppService {
    options: WhatsAppOptions,
    http: Client,
}

impl WhatsAppService {
    pub fn new(options: WhatsAppOptions) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WhatsAppError::Network(e.to_string()))?;

        Ok(Self { options, http })
    }

    async fn post_message(&self, payload: serde_json::Value) -> Result<()> {
        let url = format!("{GRAPH_API_URL}/{}/messages", self.options.phone_number_id);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.options.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(status = %status, "WhatsApp API returned non-success");
            return Err(WhatsAppError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    /// Send a plain text message.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        if !is_wa_id(to) {
            return Err(WhatsAppError::InvalidRecipient(to.to_string()));
        }

        self.post_message(serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        }))
        .await?;

        info!(to, "WhatsApp message sent");
        Ok(())
    }

    /// Resolve a media id from a webhook into a short-lived download URL.
    pub async fn media_info(&self, media_id: &str) -> Result<MediaInfo> {
        let url = format!("{GRAPH_API_URL}/{media_id}");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.options.access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(WhatsAppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Download media bytes, giving up once more than `max_bytes` arrive.
    /// The CDN requires the same bearer token.
    pub async fn download_media(&self, media_url: &str, max_bytes: usize) -> Result<Vec<u8>> {
        let mut resp = self
            .http
            .get(media_url)
            .bearer_auth(&self.options.access_token)
            .timeout(Duration::from_secs(15))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WhatsAppError::Api {
                status: status.as_u16(),
                message: "media download failed".to_string(),
            });
        }

        check_declared_size(resp.content_length(), max_bytes)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            append_capped(&mut bytes, &chunk, max_bytes)?;
        }
        Ok(bytes)
    }
}

/// Reject up front when the server already told us the body is too big.
fn check_declared_size(content_length: Option<u64>, max_bytes: usize) -> Result<()> {
    match content_length {
        Some(len) if len > max_bytes as u64 => Err(WhatsAppError::MediaTooLarge { max_bytes }),
        _ => Ok(()),
    }
}

fn append_capped(buf: &mut Vec<u8>, chunk: &[u8], max_bytes: usize) -> Result<()> {
    if buf.len() + chunk.len() > max_bytes {
        return Err(WhatsAppError::MediaTooLarge { max_bytes });
    }
    buf.extend_from_slice(chunk);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_wa_id() {
        assert!(is_wa_id("15551234567"));
        assert!(is_wa_id("447911123456"));

        assert!(!is_wa_id("+15551234567")); // Leading +
        assert!(!is_wa_id("1234")); // Too short
        assert!(!is_wa_id("user@example.com"));
    }

    #[tokio::test]
    async fn send_text_rejects_bad_recipient_without_network() {
        let service = WhatsAppService::new(WhatsAppOptions {
            phone_number_id: "1".to_string(),
            access_token: "t".to_string(),
        })
        .unwrap();

        let err = service.send_text("not-a-number", "hi").await.unwrap_err();
        assert!(matches!(err, WhatsAppError::InvalidRecipient(_)));
    }

    #[test]
    fn declared_size_over_cap_is_rejected() {
        assert!(check_declared_size(None, 10).is_ok());
        assert!(check_declared_size(Some(10), 10).is_ok());
        assert!(matches!(
            check_declared_size(Some(11), 10),
            Err(WhatsAppError::MediaTooLarge { max_bytes: 10 })
        ));
    }

    #[test]
    fn streamed_body_stops_at_cap() {
        let mut buf = Vec::new();
        append_capped(&mut buf, b"12345", 8).unwrap();
        append_capped(&mut buf, b"678", 8).unwrap();
        assert_eq!(buf, b"12345678");

        let err = append_capped(&mut buf, b"9", 8).unwrap_err();
        assert!(matches!(err, WhatsAppError::MediaTooLarge { max_bytes: 8 }));
        assert_eq!(buf.len(), 8);
    }
}
