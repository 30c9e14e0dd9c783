//! Text summary of a message payload.

use crate::i18n::t;
use wabridge_core::event::MessagePayload;

/// The part of a payload used as its summary, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageContent<'a> {
    Text(&'a str),
    ExtendedText(&'a str),
    Image,
    Media,
}

impl<'a> MessageContent<'a> {
    /// Pick the highest-priority content. Empty text falls through to the
    /// next shape.
    pub fn classify(payload: Option<&'a MessagePayload>) -> Self {
        let Some(payload) = payload else {
            return Self::Media;
        };
        if let Some(text) = non_empty(payload.conversation.as_deref()) {
            return Self::Text(text);
        }
        if let Some(text) = non_empty(payload.extended_text.as_deref()) {
            return Self::ExtendedText(text);
        }
        if payload.image.is_some() {
            return Self::Image;
        }
        Self::Media
    }

    pub fn summary(&self, lang: &str) -> String {
        match self {
            Self::Text(s) | Self::ExtendedText(s) => (*s).to_string(),
            Self::Image => t("image_placeholder", lang).to_string(),
            Self::Media => t("media_placeholder", lang).to_string(),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Summary text for a payload.
pub fn extract_summary(payload: Option<&MessagePayload>, lang: &str) -> String {
    MessageContent::classify(payload).summary(lang)
}
