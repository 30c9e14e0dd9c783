//! In-memory profile cache keyed by chat/contact JID.
//!
//! Profiles are created lazily and live for the whole process. Avatar and
//! presence are placeholders: WhatsApp does not supply them here, so they are
//! either drawn at random or left unknown.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use wabridge_core::message::{SharedProfile, UserProfile};

/// Number of bundled placeholder avatars (`1.jpg` to `7.jpg`).
const AVATAR_COUNT: u32 = 7;

pub struct UserCache {
    profiles: HashMap<String, SharedProfile>,
    synthesize: bool,
}

impl UserCache {
    /// Create an empty cache. With `synthesize` off, avatar and presence
    /// stay unknown.
    pub fn new(synthesize: bool) -> Self {
        Self {
            profiles: HashMap::new(),
            synthesize,
        }
    }

    /// Return the shared profile for `jid`, creating it on first sight.
    pub fn get_or_create(&mut self, jid: &str) -> SharedProfile {
        let synthesize = self.synthesize;
        self.profiles
            .entry(jid.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(placeholder_profile(jid, synthesize))))
            .clone()
    }

    /// Overwrite the display name of `jid`'s profile. Every holder of the
    /// profile sees the change.
    pub fn set_display_name(&mut self, jid: &str, name: &str) -> SharedProfile {
        let profile = self.get_or_create(jid);
        rename(&profile, name);
        profile
    }

    #[cfg(test)]
    pub fn get(&self, jid: &str) -> Option<SharedProfile> {
        self.profiles.get(jid).cloned()
    }
}

/// Set the display name on a shared profile in place.
pub fn rename(profile: &SharedProfile, name: &str) {
    let mut guard = profile.write().unwrap_or_else(PoisonError::into_inner);
    guard.display_name = name.to_string();
}

/// The part of a JID before `@`.
pub fn local_part(jid: &str) -> &str {
    jid.split_once('@').map_or(jid, |(user, _)| user)
}

fn placeholder_profile(jid: &str, synthesize: bool) -> UserProfile {
    let user = local_part(jid);
    let (avatar, online) = if synthesize {
        let mut rng = rand::thread_rng();
        let n = rng.gen_range(1..=AVATAR_COUNT);
        (
            Some(format!("/static/images/avatar/{n}.jpg")),
            Some(rng.gen_bool(0.5)),
        )
    } else {
        (None, None)
    };

    UserProfile {
        display_name: user.to_string(),
        handle: format!("@{user}"),
        avatar,
        online,
    }
}
