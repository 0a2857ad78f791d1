//! Network transport for feedscope
//!
//! This crate provides the server-sent events parser and reconnecting stream
//! task, plus the `/health` lookup used to label the feed.

mod endpoints;
mod error;
mod health;
mod sse;
mod stream;

pub use endpoints::{Endpoints, http_client};
pub use error::{HealthError, StreamError};
pub use health::{fetch_health, load_topic, topic_from_health, topic_label_from_body};
pub use sse::{SseEvent, SseParser};
pub use stream::{DEFAULT_RETRY, StreamEvent, StreamManager};

// Re-export types used in our public API
pub use feedscope_types::{ConnectionState, StreamStats, TopicLabel};
