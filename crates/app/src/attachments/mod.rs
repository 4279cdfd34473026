/// Available documents and knowledge bases.
pub mod catalog;
/// Items attached to a conversation context.
pub mod set;
/// File-name validation for uploads.
pub mod upload;

pub use catalog::Catalog;
pub use set::{AttachmentError, AttachmentKind, AttachmentRef, AttachmentSet};
pub use upload::{ALLOWED_EXTENSIONS, UploadRejection, UploadReport, validate_batch};
