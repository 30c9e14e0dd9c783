//! Reshape session events into the client wire format.
//!
//! Both transforms keep input order and never drop an entry because an
//! optional field is missing. They mutate the profile cache: a chat name seen
//! in a snapshot renames the shared profile for every later message.

use crate::extract::extract_summary;
use crate::format::{format_bytes, format_timestamp};
use crate::users::UserCache;
use wabridge_core::event::{ChatSnapshot, DocumentInfo, WaMessage};
use wabridge_core::message::{Attachment, ChatSummary, MessageSender, MessageView, NewMessage};

/// Turn a chat snapshot into chat summaries.
///
/// Snapshot messages are unread when someone else sent them and no read
/// receipt has been recorded.
pub fn transform_chats_snapshot(
    chats: &[ChatSnapshot],
    users: &mut UserCache,
    lang: &str,
) -> Vec<ChatSummary> {
    chats
        .iter()
        .map(|chat| {
            let sender = match chat.name.as_deref() {
                Some(name) => users.set_display_name(&chat.id, name),
                None => users.get_or_create(&chat.id),
            };
            let messages = chat
                .messages
                .iter()
                .map(|msg| {
                    let unread = !msg.key.from_me && !msg.has_read_receipt();
                    let from = if msg.key.from_me {
                        MessageSender::Me
                    } else {
                        MessageSender::Contact(sender.clone())
                    };
                    view(msg, unread, from, lang)
                })
                .collect();

            ChatSummary {
                id: chat.id.clone(),
                sender,
                messages,
            }
        })
        .collect()
}

/// Turn freshly received messages into `(chat, message)` pairs.
///
/// Upserted messages are unread whenever someone else sent them; receipts
/// are not consulted.
pub fn transform_messages_upsert(
    messages: &[WaMessage],
    users: &mut UserCache,
    lang: &str,
) -> Vec<NewMessage> {
    messages
        .iter()
        .map(|msg| {
            let chat_id = &msg.key.remote_jid;
            let from = if msg.key.from_me {
                MessageSender::Me
            } else {
                MessageSender::Contact(users.get_or_create(chat_id))
            };
            NewMessage {
                chat_id: chat_id.clone(),
                message: view(msg, !msg.key.from_me, from, lang),
            }
        })
        .collect()
}

fn view(msg: &WaMessage, unread: bool, sender: MessageSender, lang: &str) -> MessageView {
    let payload = msg.message.as_ref();
    MessageView {
        id: msg.key.id.clone(),
        text_summary: extract_summary(payload, lang),
        formatted_timestamp: format_timestamp(msg.timestamp, lang),
        unread,
        sender,
        attachment: payload.and_then(|p| p.document.as_ref()).map(attachment),
    }
}

fn attachment(doc: &DocumentInfo) -> Attachment {
    Attachment {
        file_name: doc.file_name.clone(),
        mime_subtype: doc
            .mimetype
            .as_deref()
            .and_then(|m| m.split_once('/'))
            .map(|(_, sub)| sub.to_string()),
        size: format_bytes(doc.file_length.unwrap_or(0)),
    }
}
