/// Durable user identity records.
pub mod model;
/// Restore/persist/clear over the key-value store.
pub mod store;

pub use model::{RememberMarker, SessionPreferences, SubscriptionTier, UserSession};
pub use store::{REMEMBER_KEY, SESSION_KEY, SessionError, SessionStore};
