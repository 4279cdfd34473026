use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Every string-backed identifier gets the same shape so they never mix.
macro_rules! define_string_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Fresh time-ordered identifier, e.g. `new-0190…`.
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::now_v7().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(ConversationId, "new");
define_string_id!(NoteId, "note");
define_string_id!(AttachmentId, "kb");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let first = ConversationId::generate();
        let second = ConversationId::generate();

        assert_ne!(first, second);
        assert!(first.as_str().starts_with("new-"));
        assert!(NoteId::generate().as_str().starts_with("note-"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = AttachmentId::from("kb1");

        assert_eq!(serde_json::to_string(&id).unwrap(), "\"kb1\"");
        assert_eq!(id.to_string(), "kb1");
    }
}
