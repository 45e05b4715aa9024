pub mod error;
pub mod reconciler;
pub mod source;
