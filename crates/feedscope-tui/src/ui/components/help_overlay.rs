use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::{Layout, Theme};

const KEYS: &[(&str, &[(&str, &str)])] = &[
    (
        "Scrolling (newest at top)",
        &[
            ("j/↓", "Older messages"),
            ("k/↑", "Newer messages"),
            ("Ctrl+d", "Page down"),
            ("Ctrl+u", "Page up"),
            ("g/Home", "Newest, resume follow"),
            ("G/End", "Oldest"),
            ("f", "Toggle follow"),
        ],
    ),
    (
        "Filtering",
        &[
            ("/", "Edit text filter"),
            ("Enter", "Apply filter"),
            ("Ctrl+u", "Clear input"),
            ("n", "Clear filter"),
            ("h", "Hide internal API requests"),
        ],
    ),
    (
        "Feed",
        &[
            ("c", "Clear all messages"),
            ("e", "Export visible messages"),
            ("?", "Toggle this help"),
            ("Esc", "Close / dismiss"),
            ("q", "Quit"),
        ],
    ),
];

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let height = KEYS.iter().map(|(_, keys)| keys.len() as u16 + 2).sum::<u16>() + 3;
        let popup_area = Layout::centered_popup(frame.area(), 50, height);

        frame.render_widget(Clear, popup_area);

        let mut lines = Vec::new();
        for (title, keys) in KEYS {
            lines.push(Line::from(Span::styled(*title, Theme::filter_text())));
            lines.extend(keys.iter().map(|&(key, desc)| Self::key_line(key, desc)));
            lines.push(Line::from(""));
        }
        lines.pop();

        let help = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::title())
                .title(Span::styled(" Keys ", Theme::title())),
        );

        frame.render_widget(help, popup_area);
    }

    fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Theme::toggle(true)),
            Span::styled(format!("  {}", desc), Theme::server()),
        ])
    }
}
