use tracing::debug;

use feedscope_types::{Message, MessageKind};

use crate::buffer::HistoryBuffer;
use crate::filter::{FilterState, TextFilter};
use crate::internal::InternalRule;
use crate::view::{FeedView, RenderedRow, visible_rows};

const CONNECTED_TEXT: &str = "Connected to Kafka stream";
const ERROR_TEXT: &str = "Connection error occurred. Attempting to reconnect...";
const CLOSED_TEXT: &str = "Stream closed by server";
const CLEARED_TEXT: &str = "All messages cleared";

/// Counts shown in the status bar
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Entries in the history buffer
    pub history: usize,
    /// Rows in the view
    pub visible: usize,
    /// Stream messages received since the last clear
    pub received: u64,
}

/// Owns the message history, the filter state and the rendered view
///
/// Every callback runs to completion on the caller's task, so the view is
/// always equal to [`visible_rows`] over the current history and filter.
pub struct StreamClient {
    history: HistoryBuffer,
    filter: FilterState,
    rule: InternalRule,
    view: FeedView,
    received: u64,
}

impl StreamClient {
    pub fn new(capacity: usize, rule: InternalRule) -> Self {
        let history = HistoryBuffer::new(capacity);
        let view = FeedView::new(history.capacity());
        Self {
            history,
            filter: FilterState::default(),
            rule,
            view,
            received: 0,
        }
    }

    /// Stream connected
    pub fn on_open(&mut self) -> Option<&RenderedRow> {
        self.append(Message::new(CONNECTED_TEXT, MessageKind::Info))
    }

    /// Payload received; returns the new row if it passed the filter
    pub fn on_message(&mut self, raw: impl Into<String>) -> Option<&RenderedRow> {
        self.received += 1;
        self.append(Message::new(raw, MessageKind::Message))
    }

    /// Stream failed; the transport takes care of reconnecting
    pub fn on_error(&mut self) -> Option<&RenderedRow> {
        self.append(Message::new(ERROR_TEXT, MessageKind::Error))
    }

    /// Server ended the stream for good
    pub fn on_closed(&mut self) -> Option<&RenderedRow> {
        self.append(Message::new(CLOSED_TEXT, MessageKind::Info))
    }

    fn append(&mut self, message: Message) -> Option<&RenderedRow> {
        if let Some(evicted) = self.history.push(message) {
            self.view.evict(evicted.id());
        }

        let message = self.history.newest()?;
        if !self.filter.should_display(message.content(), &self.rule) {
            return None;
        }

        self.view
            .push_front(RenderedRow::render(message, &self.filter.text));
        self.view.front()
    }

    /// Set the text filter. Blank input leaves the active filter and the
    /// view as they were and returns `Ok(false)`; dropping the filter goes
    /// through [`clear_filter`](Self::clear_filter), which re-renders.
    pub fn apply_filter(&mut self, text: &str) -> Result<bool, regex::Error> {
        let filter = TextFilter::new(text)?;
        if !filter.is_active() {
            return Ok(false);
        }

        debug!(pattern = filter.pattern(), "applying filter");
        self.filter.text = filter;
        self.refresh();
        Ok(true)
    }

    pub fn clear_filter(&mut self) {
        self.filter.text = TextFilter::inactive();
        self.refresh();
    }

    pub fn set_hide_internal(&mut self, hide: bool) {
        self.filter.hide_internal = hide;
        self.refresh();
    }

    /// Drop all history and show a single confirmation notice
    pub fn clear_all_messages(&mut self) {
        self.history.clear();
        self.view.clear();
        self.received = 0;
        self.append(Message::new(CLEARED_TEXT, MessageKind::Info));
    }

    pub fn is_internal_request(&self, content: &str) -> bool {
        self.rule.is_internal_request(content)
    }

    pub fn should_display(&self, content: &str) -> bool {
        self.filter.should_display(content, &self.rule)
    }

    /// Rebuild the view from history
    fn refresh(&mut self) {
        let rows = visible_rows(
            &self.history,
            &self.filter,
            &self.rule,
            self.history.capacity(),
        );
        self.view.replace(rows);
    }

    pub fn view(&self) -> &FeedView {
        &self.view
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn hide_internal(&self) -> bool {
        self.filter.hide_internal
    }

    pub fn stats(&self) -> FeedStats {
        FeedStats {
            history: self.history.len(),
            visible: self.view.len(),
            received: self.received,
        }
    }
}

impl Default for StreamClient {
    fn default() -> Self {
        Self::new(HistoryBuffer::DEFAULT_CAPACITY, InternalRule::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERNAL: &str = r#"{"remote_ip":"10.1.2.3","url":"/api/now/v1/foo"}"#;
    const EXTERNAL: &str = r#"{"remote_ip":"192.168.1.1","url":"/api/now/v1/foo"}"#;

    fn contents(client: &StreamClient) -> Vec<String> {
        client.view().iter().map(|r| r.content()).collect()
    }

    fn history_contents(client: &StreamClient) -> Vec<String> {
        client
            .history()
            .iter()
            .map(|m| m.content().to_string())
            .collect()
    }

    fn assert_view_consistent(client: &StreamClient) {
        let expected = visible_rows(
            client.history(),
            client.filter(),
            &InternalRule::default(),
            client.history().capacity(),
        );
        let actual: Vec<_> = client.view().iter().cloned().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_lifecycle_messages_share_the_pipeline() {
        let mut client = StreamClient::default();
        assert!(client.on_open().is_some());
        client.on_message("payload");
        let row = client.on_error().unwrap();
        assert_eq!(row.kind, MessageKind::Error);

        let kinds: Vec<_> = client.history().iter().map(|m| m.kind()).collect();
        assert_eq!(
            kinds,
            vec![MessageKind::Error, MessageKind::Message, MessageKind::Info]
        );
        assert_eq!(client.view().len(), 3);
        assert_eq!(client.stats().received, 1);
    }

    #[test]
    fn test_message_hidden_by_filter_is_still_stored() {
        let mut client = StreamClient::default();
        client.apply_filter("error").unwrap();

        assert!(client.on_message("all good").is_none());
        let row = client.on_message("an Error happened").unwrap();
        assert!(row.has_highlight());

        assert_eq!(client.history().len(), 2);
        assert_eq!(contents(&client), vec!["an Error happened"]);
    }

    #[test]
    fn test_history_capacity_and_eviction() {
        let mut client = StreamClient::new(1000, InternalRule::default());
        for i in 0..1200 {
            client.on_message(format!("message {}", i));
            assert!(client.history().len() <= 1000);
        }
        assert_eq!(client.history().len(), 1000);
        assert_eq!(client.history().oldest().unwrap().content(), "message 200");
        assert_eq!(client.view().len(), 1000);
        assert_view_consistent(&client);
    }

    #[test]
    fn test_eviction_removes_filtered_row() {
        let mut client = StreamClient::new(3, InternalRule::default());
        client.on_message("error one");
        client.apply_filter("error").unwrap();
        client.on_message("ok two");
        client.on_message("ok three");
        assert_eq!(contents(&client), vec!["error one"]);

        // Pushes "error one" out of history
        client.on_message("ok four");
        assert!(client.view().is_empty());
        assert_view_consistent(&client);
    }

    #[test]
    fn test_unfiltered_view_respects_hide_internal() {
        let mut client = StreamClient::default();
        client.on_message(INTERNAL);
        client.on_message(EXTERNAL);
        client.on_message("plain");

        client.set_hide_internal(true);
        assert_eq!(contents(&client), vec!["plain", EXTERNAL]);

        // New internal messages stay hidden
        assert!(client.on_message(INTERNAL).is_none());
        assert_eq!(client.history().len(), 4);
        assert_view_consistent(&client);

        client.set_hide_internal(false);
        assert_eq!(contents(&client), vec![INTERNAL, "plain", EXTERNAL, INTERNAL]);
    }

    #[test]
    fn test_filters_only_remove_rows() {
        let mut client = StreamClient::default();
        for text in [INTERNAL, EXTERNAL, "error: a", "info: b", "ERROR c"] {
            client.on_message(text);
        }
        let all: Vec<u64> = client.view().iter().map(|r| r.id).collect();

        client.set_hide_internal(true);
        let hidden: Vec<u64> = client.view().iter().map(|r| r.id).collect();
        assert!(hidden.iter().all(|id| all.contains(id)));
        assert!(hidden.len() < all.len());

        client.set_hide_internal(false);
        client.apply_filter("nothing matches this").unwrap();
        assert!(client.view().is_empty());

        client.apply_filter("error").unwrap();
        let filtered: Vec<u64> = client.view().iter().map(|r| r.id).collect();
        assert!(filtered.iter().all(|id| all.contains(id)));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filter_round_trip_restores_view() {
        let mut client = StreamClient::default();
        client.on_open();
        for text in ["error 1", "fine", "ERROR 2", "also fine"] {
            client.on_message(text);
        }
        let original: Vec<_> = client.view().iter().cloned().collect();

        client.apply_filter("error").unwrap();
        assert_eq!(contents(&client), vec!["ERROR 2", "error 1"]);

        client.clear_filter();
        let restored: Vec<_> = client.view().iter().cloned().collect();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_blank_filter_is_a_no_op() {
        let mut client = StreamClient::default();
        client.on_message("error 1");
        client.on_message("fine");
        client.apply_filter("error").unwrap();

        assert!(!client.apply_filter("   ").unwrap());
        assert_eq!(client.filter().text.pattern(), "error");
        assert_eq!(contents(&client), vec!["error 1"]);
    }

    #[test]
    fn test_filter_is_trimmed_and_literal() {
        let mut client = StreamClient::default();
        client.on_message("call a(1)");
        client.on_message("call a1");

        assert!(client.apply_filter("  a(  ").unwrap());
        assert_eq!(client.filter().text.pattern(), "a(");
        assert_eq!(contents(&client), vec!["call a(1)"]);
    }

    #[test]
    fn test_highlight_does_not_change_history() {
        let mut client = StreamClient::default();
        client.on_message("Disk Error");
        client.apply_filter("error").unwrap();

        assert_eq!(history_contents(&client), vec!["Disk Error"]);
        let row = client.view().front().unwrap();
        assert_eq!(row.marked_text("<", ">"), format!("[{}] Disk <Error>", row.timestamp));
    }

    #[test]
    fn test_clear_all_then_one_message() {
        let mut client = StreamClient::default();
        client.on_open();
        client.on_message("old");
        client.clear_all_messages();

        assert_eq!(history_contents(&client), vec![CLEARED_TEXT]);
        assert_eq!(client.stats().received, 0);

        client.on_message("new");
        assert_eq!(history_contents(&client), vec!["new", CLEARED_TEXT]);
        assert_eq!(contents(&client), vec!["new", CLEARED_TEXT]);
    }

    #[test]
    fn test_clear_all_keeps_filter() {
        let mut client = StreamClient::default();
        client.apply_filter("error").unwrap();
        client.clear_all_messages();

        // Confirmation does not match the filter
        assert_eq!(client.history().len(), 1);
        assert!(client.view().is_empty());
        assert_eq!(client.filter().text.pattern(), "error");
    }

    #[test]
    fn test_should_display_and_classification() {
        let mut client = StreamClient::default();
        assert!(client.is_internal_request(INTERNAL));
        assert!(!client.is_internal_request("not json"));

        client.set_hide_internal(true);
        assert!(!client.should_display(INTERNAL));
        assert!(client.should_display(EXTERNAL));

        client.apply_filter("192.168").unwrap();
        assert!(client.should_display(EXTERNAL));
        assert!(!client.should_display("other"));
    }

    #[test]
    fn test_malformed_json_never_breaks_rendering() {
        let mut client = StreamClient::default();
        client.set_hide_internal(true);
        for text in ["{", "{\"remote_ip\":", "null", "}{", "\u{0}"] {
            assert!(client.on_message(text).is_some());
        }
        assert_eq!(client.view().len(), 5);
    }

    #[test]
    fn test_view_matches_recompute_after_mixed_operations() {
        let mut client = StreamClient::new(5, InternalRule::default());
        client.on_open();
        for i in 0..4 {
            client.on_message(format!("error {}", i));
            client.on_message(INTERNAL);
        }
        client.apply_filter("ERR").unwrap();
        assert_view_consistent(&client);
        client.on_error();
        client.set_hide_internal(true);
        client.on_message("err again");
        assert_view_consistent(&client);
        client.clear_filter();
        client.on_message(INTERNAL);
        assert_view_consistent(&client);
    }
}
