use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Minimum width for a collapsed column (just "F" with borders)
const COLLAPSED_WIDTH: u16 = 3;

/// Padding for expanded columns (border + space on each side)
const COLUMN_PADDING: u16 = 4;

const DETAILS_WIDTH: u16 = 44;

pub struct AppLayout {
    pub header: Rect,
    pub filters: Rect,
    pub conversations: Rect,
    pub messages: Rect,
    pub details: Rect,
    pub status_bar: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Filters,
    Conversations,
    Messages,
    Details,
}

pub struct LayoutConfig {
    pub focused_pane: FocusedPane,
    pub max_filter_width: u16,
    pub max_conversation_width: u16,
}

impl AppLayout {
    pub fn new(area: Rect, config: LayoutConfig) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(10),   // Main content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        let header = vertical[0];
        let main = vertical[1];
        let status_bar = vertical[2];

        // Filters only take room while focused.
        let filters_width = match config.focused_pane {
            FocusedPane::Filters => (config.max_filter_width + COLUMN_PADDING).min(main.width / 3),
            _ => COLLAPSED_WIDTH,
        };
        let conversations_width =
            (config.max_conversation_width + COLUMN_PADDING).min(main.width / 3);
        let details_width = DETAILS_WIDTH.min(main.width / 3);

        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(filters_width),
                Constraint::Length(conversations_width),
                Constraint::Min(20), // Messages take remaining space
                Constraint::Length(details_width),
            ])
            .split(main);

        Self {
            header,
            filters: horizontal[0],
            conversations: horizontal[1],
            messages: horizontal[2],
            details: horizontal[3],
            status_bar,
        }
    }
}
