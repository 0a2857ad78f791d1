use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Regions of the feed screen
#[derive(Clone, Copy, Debug)]
pub struct FeedAreas {
    pub header: Rect,
    pub filter: Rect,
    pub messages: Rect,
    pub status: Rect,
}

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Header, filter bar, message list, status bar
    pub fn feed(area: Rect) -> FeedAreas {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Filter bar
                Constraint::Min(1),    // Messages
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        FeedAreas {
            header: chunks[0],
            filter: chunks[1],
            messages: chunks[2],
            status: chunks[3],
        }
    }

    /// A popup of at most `width` x `height`, centered in `area`
    pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}
