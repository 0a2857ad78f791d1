//! Shared types for feedscope
//!
//! This crate contains data structures used across multiple feedscope crates.

use chrono::Local;
use ratatui::style::Color;

// ============================================================================
// Message Types
// ============================================================================

/// Format used for the time-of-day shown next to each message
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Origin of a message in the feed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MessageKind {
    /// Payload received from the stream
    #[default]
    Message,
    /// Transport failure notice
    Error,
    /// Lifecycle notice (connected, cleared)
    Info,
}

impl MessageKind {
    /// Get display color for this kind
    pub fn color(&self) -> Color {
        match self {
            Self::Message => Color::White,
            Self::Error => Color::Red,
            Self::Info => Color::Cyan,
        }
    }
}

/// A single feed message
///
/// Messages are never changed once they enter the history; the only
/// mutation is assigning the sequence id on insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    id: u64,
    content: String,
    timestamp: String,
    kind: MessageKind,
}

impl Message {
    /// Create a message stamped with the current local time
    pub fn new(content: impl Into<String>, kind: MessageKind) -> Self {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::with_timestamp(content, timestamp, kind)
    }

    /// Create a message with an explicit timestamp
    pub fn with_timestamp(
        content: impl Into<String>,
        timestamp: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            id: 0,
            content: content.into(),
            timestamp: timestamp.into(),
            kind,
        }
    }

    /// Assign the sequence id
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }
}

// ============================================================================
// Connection Types
// ============================================================================

/// Label shown for the topic the feed is reading from
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum TopicLabel {
    /// Health check still in flight
    #[default]
    Loading,
    /// Topic name reported by the server
    Topic(String),
    /// Server answered but did not report a topic
    Unknown,
    /// Health check failed or returned garbage
    Error,
}

impl TopicLabel {
    pub fn label(&self) -> &str {
        match self {
            Self::Loading => "Loading...",
            Self::Topic(name) => name,
            Self::Unknown => "Unknown",
            Self::Error => "Error loading topic",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Loading => Color::DarkGray,
            Self::Topic(_) => Color::Yellow,
            Self::Unknown | Self::Error => Color::Red,
        }
    }
}

/// State of the event stream connection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    /// Waiting out the retry delay
    Reconnecting,
    /// Server asked us to stop
    Closed,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "live",
            Self::Reconnecting => "reconnecting",
            Self::Closed => "closed",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Connecting => Color::Yellow,
            Self::Open => Color::Green,
            Self::Reconnecting => Color::Yellow,
            Self::Closed => Color::Red,
        }
    }
}

/// Counters kept by the stream task
#[derive(Clone, Debug, Default)]
pub struct StreamStats {
    pub state: ConnectionState,

    /// Successful connections (first one included)
    pub connects: u64,

    /// Failed or dropped connections
    pub failures: u64,

    /// Message events delivered
    pub events: u64,

    /// Last `id:` field seen on the stream
    pub last_event_id: Option<String>,
}
