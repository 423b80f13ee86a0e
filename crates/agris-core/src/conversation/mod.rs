//! Conversation domain module.
//!
//! This module contains the conversation summary/detail/message models,
//! display shaping helpers, recency grouping, and the backend API trait.
//!
//! # Module Structure
//!
//! - `model`: Core conversation models (`ConversationSummary`,
//!   `ConversationDetail`, `Message`, `Feedback`) and display shaping
//! - `groups`: Recency bucketing (`RecencyBucket`, `ConversationGroup`)
//! - `api`: API trait for the conversation endpoints (`ConversationApi`)

mod api;
mod groups;
mod model;

// Re-export public API
pub use api::ConversationApi;
pub use groups::{group_by_recency, ConversationGroup, RecencyBucket};
pub use model::{
    display_title, truncate_chars, ConversationDetail, ConversationSummary, Feedback, Message,
    DEFAULT_TITLE, PREVIEW_MAX_CHARS, TITLE_MAX_CHARS,
};
