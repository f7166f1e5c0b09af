use serde::Deserialize;

/// Top-level body of a WhatsApp Business webhook delivery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub from: String,
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub text: Option<TextBody>,
    pub image: Option<MediaRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaRef {
    pub id: String,
    pub mime_type: Option<String>,
}

/// What a user sent us, reduced to the kinds we can analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Image { media_id: String },
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub from: String,
    pub message_id: String,
    pub content: MessageContent,
}

impl WebhookPayload {
    /// Flatten every message across entries and changes.
    pub fn messages(&self) -> Vec<IncomingMessage> {
        self.entry
            .iter()
            .flat_map(|e| e.changes.iter())
            .flat_map(|c| c.value.messages.iter())
            .map(|m| IncomingMessage {
                from: m.from.clone(),
                message_id: m.id.clone(),
                content: match (m.kind.as_str(), &m.text, &m.image) {
                    ("text", Some(text), _) => MessageContent::Text(text.body.clone()),
                    ("image", _, Some(image)) => MessageContent::Image {
                        media_id: image.id.clone(),
                    },
                    (other, _, _) => MessageContent::Unsupported(other.to_string()),
                },
            })
            .collect()
    }
}

/// Response of `GET /{media_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaInfo {
    pub url: String,
    pub mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_text_and_image_messages() {
        let body = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "123",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [
                            {"from": "15551234567", "id": "wamid.1", "type": "text",
                             "text": {"body": "Is it true that vaccines cause autism?"}},
                            {"from": "15557654321", "id": "wamid.2", "type": "image",
                             "image": {"id": "media-9", "mime_type": "image/jpeg"}},
                            {"from": "15550000000", "id": "wamid.3", "type": "audio",
                             "audio": {"id": "media-10"}}
                        ]
                    }
                }]
            }]
        });

        let payload: WebhookPayload = serde_json::from_value(body).unwrap();
        let messages = payload.messages();

        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[0].content,
            MessageContent::Text("Is it true that vaccines cause autism?".to_string())
        );
        assert_eq!(
            messages[1].content,
            MessageContent::Image {
                media_id: "media-9".to_string()
            }
        );
        assert_eq!(
            messages[2].content,
            MessageContent::Unsupported("audio".to_string())
        );
    }

    #[test]
    fn status_only_delivery_has_no_messages() {
        let body = serde_json::json!({
            "entry": [{"changes": [{"value": {"statuses": [{"id": "wamid.1"}]}}]}]
        });
        let payload: WebhookPayload = serde_json::from_value(body).unwrap();
        assert!(payload.messages().is_empty());
    }
}
