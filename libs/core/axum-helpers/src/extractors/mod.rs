//! Custom extractors for Axum handlers.
//!
//! They turn malformed input into the shared [`AppError`](crate::AppError)
//! envelope instead of axum's plain-text rejections.

pub mod current_user;
pub mod id_path;
pub mod validated_json;

pub use current_user::CurrentUser;
pub use id_path::IdPath;
pub use validated_json::ValidatedJson;
