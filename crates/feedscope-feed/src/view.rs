use std::collections::VecDeque;

use feedscope_types::{Message, MessageKind};

use crate::buffer::HistoryBuffer;
use crate::filter::{FilterState, TextFilter};
use crate::internal::InternalRule;

/// A run of message text, optionally emphasized as a filter match
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub highlighted: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: false,
        }
    }

    fn highlight(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: true,
        }
    }
}

/// Display projection of one message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedRow {
    /// ID of the source message
    pub id: u64,
    pub kind: MessageKind,
    pub timestamp: String,
    pub segments: Vec<Segment>,
}

impl RenderedRow {
    /// Build a row, splitting the content around every filter match.
    /// Matched text keeps its original casing.
    pub fn render(message: &Message, filter: &TextFilter) -> Self {
        let content = message.content();
        let mut segments = Vec::new();
        let mut last_end = 0;

        for (start, end) in filter.find_matches(content) {
            if start > last_end {
                segments.push(Segment::plain(&content[last_end..start]));
            }
            segments.push(Segment::highlight(&content[start..end]));
            last_end = end;
        }
        if last_end < content.len() || segments.is_empty() {
            segments.push(Segment::plain(&content[last_end..]));
        }

        Self {
            id: message.id(),
            kind: message.kind(),
            timestamp: message.timestamp().to_string(),
            segments,
        }
    }

    /// The `[timestamp] ` lead-in
    pub fn prefix(&self) -> String {
        format!("[{}] ", self.timestamp)
    }

    /// Message text without any emphasis
    pub fn content(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Row as plain text
    pub fn plain_text(&self) -> String {
        format!("{}{}", self.prefix(), self.content())
    }

    /// Row with highlighted runs wrapped in the given markers
    pub fn marked_text(&self, open: &str, close: &str) -> String {
        let mut out = self.prefix();
        for segment in &self.segments {
            if segment.highlighted {
                out.push_str(open);
                out.push_str(&segment.text);
                out.push_str(close);
            } else {
                out.push_str(&segment.text);
            }
        }
        out
    }

    pub fn has_highlight(&self) -> bool {
        self.segments.iter().any(|s| s.highlighted)
    }
}

/// Recompute the visible rows from scratch, newest first
pub fn visible_rows(
    history: &HistoryBuffer,
    filter: &FilterState,
    rule: &InternalRule,
    limit: usize,
) -> Vec<RenderedRow> {
    history
        .iter()
        .filter(|m| filter.should_display(m.content(), rule))
        .take(limit)
        .map(|m| RenderedRow::render(m, &filter.text))
        .collect()
}

/// Rows currently on display, newest first
pub struct FeedView {
    rows: VecDeque<RenderedRow>,
    capacity: usize,
}

impl FeedView {
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Insert at the top, dropping the bottom row when over capacity
    pub fn push_front(&mut self, row: RenderedRow) {
        self.rows.push_front(row);
        self.rows.truncate(self.capacity);
    }

    /// Drop the row for an evicted message. Evictions always take the
    /// oldest message, so only the bottom row can match.
    pub fn evict(&mut self, id: u64) {
        if self.rows.back().is_some_and(|r| r.id == id) {
            self.rows.pop_back();
        }
    }

    /// Replace every row
    pub fn replace(&mut self, rows: Vec<RenderedRow>) {
        self.rows = rows.into();
        self.rows.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn front(&self) -> Option<&RenderedRow> {
        self.rows.front()
    }

    /// Iterate top to bottom
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &RenderedRow> {
        self.rows.iter()
    }

    /// Rows in a range (for virtual scrolling)
    pub fn range(&self, start: usize, count: usize) -> impl Iterator<Item = &RenderedRow> {
        self.rows.iter().skip(start).take(count)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
