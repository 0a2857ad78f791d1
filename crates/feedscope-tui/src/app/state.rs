use feedscope_types::{StreamStats, TopicLabel};

/// Rows moved by page up/down
pub const PAGE_SIZE: usize = 20;

/// Application state outside the feed itself
pub struct AppState {
    /// Topic reported by the health check
    pub topic: TopicLabel,

    /// Server the feed is read from
    pub server: String,

    /// Latest connection counters
    pub connection: StreamStats,

    /// Is the filter input focused?
    pub search_active: bool,

    /// Current filter input text
    pub search_input: String,

    /// Filter input error message
    pub filter_error: Option<String>,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Error to display (if any)
    pub error_message: Option<String>,

    /// Informational message, such as a finished export
    pub notice: Option<String>,

    /// Rows scrolled past from the top (newest) row
    pub scroll: usize,

    /// Keep the newest row in view?
    pub follow: bool,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            topic: TopicLabel::default(),
            server: server.into(),
            connection: StreamStats::default(),
            search_active: false,
            search_input: String::new(),
            filter_error: None,
            help_visible: false,
            error_message: None,
            notice: None,
            scroll: 0,
            follow: true,
            should_quit: false,
        }
    }

    /// Focus the filter input, starting from the active pattern
    pub fn start_search(&mut self, current: &str) {
        self.search_active = true;
        self.search_input = current.to_string();
        self.filter_error = None;
    }

    /// Leave the filter input without touching the active filter
    pub fn cancel_search(&mut self) {
        self.search_active = false;
        self.filter_error = None;
    }

    pub fn search_input_char(&mut self, c: char) {
        self.search_input.push(c);
    }

    /// Insert pasted text, dropping line breaks
    pub fn search_input_paste(&mut self, text: &str) {
        self.search_input
            .extend(text.chars().filter(|c| *c != '\n' && *c != '\r'));
    }

    pub fn search_input_backspace(&mut self) {
        self.search_input.pop();
    }

    /// A new row was inserted at the top of the view. Unless following,
    /// shift the offset so the rows on screen stay put.
    pub fn row_inserted(&mut self) {
        if !self.follow {
            self.scroll = self.scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll = self.scroll.saturating_sub(n);
        self.follow = self.scroll == 0;
    }

    pub fn scroll_down(&mut self, n: usize) {
        // Clamped against the row count at render time
        self.scroll = self.scroll.saturating_add(n);
        self.follow = false;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow = true;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = usize::MAX;
        self.follow = false;
    }

    pub fn toggle_follow(&mut self) {
        self.follow = !self.follow;
        if self.follow {
            self.scroll = 0;
        }
    }

    /// Clamp the scroll offset to the rows available
    pub fn clamp_scroll(&mut self, total_rows: usize, viewport: usize) {
        let max_scroll = total_rows.saturating_sub(viewport);
        if self.follow {
            self.scroll = 0;
        } else if self.scroll > max_scroll {
            self.scroll = max_scroll;
        }
    }

    pub fn show_error(&mut self, msg: String) {
        self.notice = None;
        self.error_message = Some(msg);
    }

    pub fn show_notice(&mut self, msg: String) {
        self.error_message = None;
        self.notice = Some(msg);
    }

    /// Clear whichever message is showing
    pub fn dismiss_message(&mut self) {
        self.error_message = None;
        self.notice = None;
    }
}
