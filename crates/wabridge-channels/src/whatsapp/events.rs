//! Translation of `whatsapp-rust` events into bridge session events.

use tracing::{debug, info, warn};
use wabridge_core::event::{
    ChatSnapshot, ConnectionUpdate, DisconnectReason, DocumentInfo, ImageInfo, MessageKey,
    MessagePayload, SessionEvent, UserReceipt, WaMessage,
};
use wacore::types::events::Event;
use wacore::types::message::MessageInfo;
use waproto::whatsapp as wa;

/// Map a library event to the bridge's event model. Events the bridge has
/// no use for yield `None`.
pub(super) fn translate_event(event: Event) -> Option<SessionEvent> {
    match event {
        Event::PairingQrCode { code, .. } => {
            info!("WhatsApp QR code generated (scan to pair)");
            Some(SessionEvent::ConnectionUpdate(ConnectionUpdate::qr(code)))
        }
        Event::PairSuccess(_) => {
            info!("WhatsApp pairing successful!");
            Some(SessionEvent::CredsUpdate)
        }
        Event::Connected(_) => {
            info!("WhatsApp connected");
            Some(SessionEvent::ConnectionUpdate(ConnectionUpdate::open()))
        }
        Event::Disconnected(_) => {
            warn!("WhatsApp disconnected");
            Some(closed(DisconnectReason::ConnectionLost))
        }
        Event::LoggedOut(_) => {
            warn!("WhatsApp logged out, session invalidated");
            Some(closed(DisconnectReason::LoggedOut))
        }
        Event::StreamReplaced(_) => {
            warn!("WhatsApp stream replaced by another client");
            Some(closed(DisconnectReason::StreamReplaced))
        }
        Event::ConnectFailure(failure) => {
            warn!("WhatsApp connect failure: {failure:?}");
            Some(closed(DisconnectReason::ConnectFailure(format!(
                "{failure:?}"
            ))))
        }
        Event::HistorySync(history) => snapshot_from_history(&history),
        Event::Message(msg, info) => Some(SessionEvent::MessagesUpsert(vec![message_from_live(
            &msg, &info,
        )])),
        _ => None,
    }
}

fn closed(reason: DisconnectReason) -> SessionEvent {
    SessionEvent::ConnectionUpdate(ConnectionUpdate::closed(reason))
}

/// A chat snapshot event for a history sync chunk. Chunks without
/// conversations (push names, non-blocking data) yield nothing.
pub(super) fn snapshot_from_history(history: &wa::HistorySync) -> Option<SessionEvent> {
    if history.conversations.is_empty() {
        debug!("history sync chunk without conversations, skipped");
        return None;
    }
    let chats = chats_from_history(history);
    debug!("history sync with {} conversations", chats.len());
    Some(SessionEvent::ChatsSet(chats))
}

/// Convert a history sync blob into chat snapshots, keeping conversation
/// and message order.
pub(super) fn chats_from_history(history: &wa::HistorySync) -> Vec<ChatSnapshot> {
    history
        .conversations
        .iter()
        .map(|conv| ChatSnapshot {
            id: conv.id.clone(),
            name: conv.name.clone().filter(|n| !n.is_empty()),
            messages: conv
                .messages
                .iter()
                .filter_map(|m| m.message.as_ref())
                .map(message_from_web)
                .collect(),
        })
        .collect()
}

/// Convert a stored message (history sync shape).
pub(super) fn message_from_web(web: &wa::WebMessageInfo) -> WaMessage {
    WaMessage {
        key: MessageKey {
            remote_jid: web.key.remote_jid.clone().unwrap_or_default(),
            from_me: web.key.from_me.unwrap_or(false),
            id: web.key.id.clone().unwrap_or_default(),
        },
        message: web.message.as_ref().map(payload_from_proto),
        timestamp: web.message_timestamp.map(|t| t as i64).unwrap_or(0),
        user_receipt: web
            .user_receipt
            .iter()
            .map(|r| UserReceipt {
                user_jid: r.user_jid.clone(),
                read_timestamp: r.read_timestamp,
            })
            .collect(),
    }
}

/// Convert a live message event. Live messages carry no receipts yet.
pub(super) fn message_from_live(msg: &wa::Message, info: &MessageInfo) -> WaMessage {
    WaMessage {
        key: MessageKey {
            remote_jid: info.source.chat.to_string(),
            from_me: info.source.is_from_me,
            id: info.id.clone(),
        },
        message: Some(payload_from_proto(msg)),
        timestamp: info.timestamp.timestamp(),
        user_receipt: Vec::new(),
    }
}

/// Unwrap nested wrappers (device_sent, ephemeral, view_once).
pub(super) fn unwrap_message(msg: &wa::Message) -> &wa::Message {
    msg.device_sent_message
        .as_ref()
        .and_then(|d| d.message.as_deref())
        .or_else(|| {
            msg.ephemeral_message
                .as_ref()
                .and_then(|e| e.message.as_deref())
        })
        .or_else(|| {
            msg.view_once_message
                .as_ref()
                .and_then(|v| v.message.as_deref())
        })
        .unwrap_or(msg)
}

/// Reduce a protocol message to the payload shapes the bridge reads.
pub(super) fn payload_from_proto(msg: &wa::Message) -> MessagePayload {
    let inner = unwrap_message(msg);
    MessagePayload {
        conversation: inner.conversation.clone(),
        extended_text: inner
            .extended_text_message
            .as_ref()
            .and_then(|e| e.text.clone()),
        image: inner.image_message.as_ref().map(|img| ImageInfo {
            mimetype: img.mimetype.clone(),
            caption: img.caption.clone(),
        }),
        document: inner.document_message.as_ref().map(|doc| DocumentInfo {
            file_name: doc.file_name.clone(),
            mimetype: doc.mimetype.clone(),
            file_length: doc.file_length,
        }),
    }
}
