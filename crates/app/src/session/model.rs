use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPreferences {
    #[serde(rename = "rememberLogin")]
    pub remember_login: bool,
}

/// Authenticated identity, serialized in the same shape the session blob has
/// always used (`name`, `subscription`, `lastLogin`, `preferences.rememberLogin`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub id: String,
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "avatar", default, skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
    #[serde(rename = "subscription")]
    pub subscription_tier: SubscriptionTier,
    #[serde(rename = "lastLogin")]
    pub last_login_at: DateTime<Utc>,
    pub preferences: SessionPreferences,
}

impl UserSession {
    pub fn remember_flag(&self) -> bool {
        self.preferences.remember_login
    }
}

/// The separate "remembered user" record used to prefill the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RememberMarker {
    pub email: String,
    #[serde(rename = "rememberMe")]
    pub remember_me: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_blob_uses_camel_case_wire_names() {
        let raw = r#"{
            "id": "user_123",
            "email": "a@b.com",
            "name": "Ada",
            "subscription": "premium",
            "lastLogin": "2026-10-01T08:00:00Z",
            "preferences": { "rememberLogin": true }
        }"#;

        let session: UserSession = serde_json::from_str(raw).unwrap();

        assert_eq!(session.display_name, "Ada");
        assert_eq!(session.avatar_ref, None);
        assert_eq!(session.subscription_tier, SubscriptionTier::Premium);
        assert!(session.remember_flag());

        let encoded = serde_json::to_value(&session).unwrap();
        assert_eq!(encoded["lastLogin"], "2026-10-01T08:00:00Z");
        assert!(encoded.get("avatar").is_none());
    }
}
