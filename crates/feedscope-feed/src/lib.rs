//! Message feed processing for feedscope
//!
//! This crate provides the bounded message history, text and internal-request
//! filtering, the rendered view projection, and the [`StreamClient`] that ties
//! them together.

mod buffer;
mod client;
mod filter;
mod internal;
mod view;

pub use buffer::HistoryBuffer;
pub use client::{FeedStats, StreamClient};
pub use filter::{FilterState, TextFilter};
pub use internal::{InternalRule, is_internal_request};
pub use view::{FeedView, RenderedRow, Segment, visible_rows};

// Re-export types used in our public API
pub use feedscope_types::{Message, MessageKind};
