//! # wabridge-channels
//!
//! External WhatsApp client integration for the bridge.

pub mod whatsapp;
