use ratatui::{
    Frame,
    layout::{Margin, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use feedscope_feed::{RenderedRow, Segment, StreamClient};

use crate::app::AppState;
use crate::ui::components::{StatusBar, feed_hints};
use crate::ui::{Layout, Theme};

/// The live feed screen
pub struct FeedViewerScreen;

impl FeedViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, client: &StreamClient) {
        let areas = Layout::feed(frame.area());

        Self::render_header(frame, areas.header, state);
        Self::render_filter_bar(frame, areas.filter, state, client);
        Self::render_messages(frame, areas.messages, state, client);
        Self::render_status_bar(frame, areas.status, state, client);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let connection = &state.connection;

        let mut spans = vec![
            Span::styled("feedscope", Theme::title()),
            Span::styled(" │ ", Theme::muted()),
            Span::styled("Topic: ", Theme::muted()),
            Span::styled(state.topic.label().to_string(), Theme::topic(&state.topic)),
            Span::styled(" │ ", Theme::muted()),
            Span::styled(state.server.clone(), Theme::server()),
            Span::styled(" │ ", Theme::muted()),
            Span::styled(
                format!("● {}", connection.state.label()),
                Theme::connection(connection.state),
            ),
        ];

        if connection.failures > 0 {
            spans.push(Span::styled(
                format!(" ({} disconnects)", connection.failures),
                Theme::muted(),
            ));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_filter_bar(frame: &mut Frame, area: Rect, state: &AppState, client: &StreamClient) {
        let filter = client.filter();
        let mut spans = vec![];

        if state.search_active {
            spans.push(Span::styled(" /", Theme::filter_text()));
            spans.push(Span::styled(state.search_input.clone(), Theme::filter_text()));
            spans.push(Span::styled("█", Theme::input_cursor()));
        } else {
            spans.push(Span::styled(" Filter: ", Theme::muted()));
            if filter.text.is_active() {
                spans.push(Span::styled(
                    filter.text.pattern().to_string(),
                    Theme::filter_text(),
                ));
            } else {
                spans.push(Span::styled("(none)", Theme::muted()));
            }
        }

        spans.push(Span::styled("   Hide internal: ", Theme::muted()));
        spans.push(Span::styled(
            if filter.hide_internal { "on" } else { "off" },
            Theme::toggle(filter.hide_internal),
        ));

        if let Some(err) = &state.filter_error {
            spans.push(Span::styled(format!("  ⚠ {}", err), Theme::error()));
        }

        if state.search_active {
            spans.push(Span::styled(
                "  [Enter] Apply  [Esc] Cancel",
                Theme::muted(),
            ));
        } else if filter.text.is_active() {
            spans.push(Span::styled("  [n] Clear  [/] Edit", Theme::muted()));
        }

        let border_style = if state.filter_error.is_some() {
            Theme::error()
        } else if state.search_active {
            Theme::border_editing()
        } else {
            Theme::border()
        };

        let filter_bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Filter ", Theme::title())),
        );

        frame.render_widget(filter_bar, area);
    }

    fn render_messages(frame: &mut Frame, area: Rect, state: &mut AppState, client: &StreamClient) {
        let view = client.view();
        let total_rows = view.len();

        // Calculate visible area (accounting for border)
        let inner_height = area.height.saturating_sub(2) as usize;
        state.clamp_scroll(total_rows, inner_height);

        // 2 for borders, 1 for scrollbar
        let inner_width = area.width.saturating_sub(3) as usize;

        let lines: Vec<Line> = view
            .range(state.scroll, inner_height)
            .map(|row| Self::row_line(row, inner_width))
            .collect();

        let title = if client.filter().is_empty() {
            format!(" Messages ({}) ", total_rows)
        } else {
            format!(" Messages ({} matching) ", total_rows)
        };

        let messages = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(title, Theme::title())),
        );

        frame.render_widget(messages, area);

        if total_rows > inner_height {
            let max_scroll = total_rows.saturating_sub(inner_height);
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(state.scroll.min(max_scroll));

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    /// `[timestamp] ` in dim text, then the content with filter matches
    /// highlighted, cut to the available width
    fn row_line(row: &RenderedRow, width: usize) -> Line<'static> {
        let prefix = row.prefix();
        let prefix_width = prefix.width();
        let base_style = Theme::message(row.kind);

        let mut spans = vec![Span::styled(prefix, Theme::timestamp())];
        for (text, highlighted) in fit_segments(&row.segments, width.saturating_sub(prefix_width)) {
            let style = if highlighted {
                Theme::filter_match()
            } else {
                base_style
            };
            spans.push(Span::styled(text, style));
        }

        Line::from(spans)
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, client: &StreamClient) {
        let message = match (&state.error_message, &state.notice) {
            (Some(err), _) => Some((err, Theme::error())),
            (None, Some(notice)) => Some((notice, Theme::notice())),
            (None, None) => None,
        };
        if let Some((text, style)) = message {
            let line = Line::from(vec![
                Span::styled(format!(" {}", text), style),
                Span::styled("  [Esc] Dismiss", Theme::muted()),
            ]);
            frame.render_widget(Paragraph::new(line).style(Theme::status_bar()), area);
            return;
        }

        let stats = client.stats();
        let right_text = format!(
            "{} shown / {} stored | {} received {}",
            stats.visible,
            stats.history,
            stats.received,
            if state.follow { "▲" } else { " " }
        );

        frame.render_widget(StatusBar::new().hints(feed_hints()).right(right_text), area);
    }
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

fn sanitize(c: char) -> char {
    if c.is_control() { ' ' } else { c }
}

/// Cut highlighted segments to `max_width` display columns, ending with
/// `…` when something was dropped. Control characters become spaces.
pub fn fit_segments(segments: &[Segment], max_width: usize) -> Vec<(String, bool)> {
    let total: usize = segments
        .iter()
        .flat_map(|s| s.text.chars())
        .map(|c| char_width(sanitize(c)))
        .sum();
    let truncated = total > max_width;
    let budget = if truncated {
        max_width.saturating_sub(1)
    } else {
        max_width
    };

    let mut out = Vec::new();
    let mut used = 0;

    'segments: for segment in segments {
        let mut text = String::new();
        for c in segment.text.chars().map(sanitize) {
            let w = char_width(c);
            if used + w > budget {
                if !text.is_empty() {
                    out.push((text, segment.highlighted));
                }
                break 'segments;
            }
            used += w;
            text.push(c);
        }
        if !text.is_empty() {
            out.push((text, segment.highlighted));
        }
    }

    if truncated && max_width > 0 {
        out.push(("…".to_string(), false));
    }
    out
}
