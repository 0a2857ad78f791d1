use ratatui::style::{Color, Modifier, Style};

use feedscope_types::{ConnectionState, MessageKind, TopicLabel};

/// Styles used across the feed screen
pub struct Theme;

impl Theme {
    pub const MUTED: Color = Color::DarkGray;
    pub const ACCENT: Color = Color::Cyan;
    pub const MATCH: Color = Color::Yellow;
    pub const BAR_BG: Color = Color::DarkGray;

    pub fn border() -> Style {
        Style::default().fg(Self::MUTED)
    }

    /// Border of the filter bar while it has focus
    pub fn border_editing() -> Style {
        Style::default().fg(Self::MATCH)
    }

    pub fn title() -> Style {
        Style::default().fg(Self::ACCENT).add_modifier(Modifier::BOLD)
    }

    pub fn muted() -> Style {
        Style::default().fg(Self::MUTED)
    }

    /// The `[hh:mm:ss]` lead-in of a row
    pub fn timestamp() -> Style {
        Self::muted()
    }

    /// Body text of a row, colored by record kind
    pub fn message(kind: MessageKind) -> Style {
        let style = Style::default().fg(kind.color());
        match kind {
            MessageKind::Message => style,
            MessageKind::Error | MessageKind::Info => style.add_modifier(Modifier::ITALIC),
        }
    }

    /// Occurrence of the text filter inside a row
    pub fn filter_match() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Self::MATCH)
            .add_modifier(Modifier::BOLD)
    }

    /// Pattern shown in the filter bar, and the input being typed
    pub fn filter_text() -> Style {
        Style::default().fg(Self::MATCH).add_modifier(Modifier::BOLD)
    }

    pub fn input_cursor() -> Style {
        Style::default()
            .fg(Self::MATCH)
            .add_modifier(Modifier::SLOW_BLINK)
    }

    pub fn toggle(on: bool) -> Style {
        if on {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Self::muted()
        }
    }

    pub fn topic(topic: &TopicLabel) -> Style {
        Style::default()
            .fg(topic.color())
            .add_modifier(Modifier::BOLD)
    }

    pub fn connection(state: ConnectionState) -> Style {
        Style::default()
            .fg(state.color())
            .add_modifier(Modifier::BOLD)
    }

    pub fn server() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Color::White).bg(Self::BAR_BG)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::MATCH)
            .bg(Self::BAR_BG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn notice() -> Style {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_records_stand_out() {
        assert!(!Theme::message(MessageKind::Message)
            .add_modifier
            .contains(Modifier::ITALIC));
        assert!(Theme::message(MessageKind::Error)
            .add_modifier
            .contains(Modifier::ITALIC));
        assert_eq!(Theme::message(MessageKind::Error).fg, Some(Color::Red));
    }

    #[test]
    fn test_toggle_styles_differ() {
        assert_ne!(Theme::toggle(true), Theme::toggle(false));
    }
}
