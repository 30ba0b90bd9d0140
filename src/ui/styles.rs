use ratatui::style::{Color, Modifier, Style};

use crate::api::Level;

pub struct Theme {
    pub border: Style,
    pub border_focused: Style,
    pub title: Style,
    pub title_focused: Style,
    pub selected: Style,
    /// Marker for the conversation whose details are open.
    pub marked: Style,
    pub customer_label: Style,
    pub customer_text: Style,
    pub agent_label: Style,
    pub agent_text: Style,
    pub operator: Style,
    pub timestamp: Style,
    pub chip: Style,
    pub chip_active: Style,
    pub count: Style,
    pub section: Style,
    pub field_label: Style,
    pub field_value: Style,
    pub field_missing: Style,
    pub editing: Style,
    pub pending: Style,
    pub level_high: Style,
    pub level_medium: Style,
    pub level_low: Style,
    pub error: Style,
    pub success: Style,
    pub status_bar: Style,
    pub key_hint: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border: Style::default().fg(Color::DarkGray),
            border_focused: Style::default().fg(Color::Cyan),
            title: Style::default().fg(Color::White),
            title_focused: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            selected: Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            marked: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            customer_label: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            customer_text: Style::default().fg(Color::White),
            agent_label: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            agent_text: Style::default().fg(Color::White),
            operator: Style::default().fg(Color::Gray),
            timestamp: Style::default().fg(Color::DarkGray),
            chip: Style::default().fg(Color::White),
            chip_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            count: Style::default().fg(Color::DarkGray),
            section: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            field_label: Style::default().fg(Color::Gray),
            field_value: Style::default().fg(Color::White),
            field_missing: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            editing: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::UNDERLINED),
            pending: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            level_high: Style::default().fg(Color::Green),
            level_medium: Style::default().fg(Color::Yellow),
            level_low: Style::default().fg(Color::Red),
            error: Style::default().fg(Color::Red),
            success: Style::default().fg(Color::Green),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            key_hint: Style::default().fg(Color::Cyan),
        }
    }
}

impl Theme {
    pub fn level(&self, level: Level) -> Style {
        match level {
            Level::High => self.level_high,
            Level::Medium => self.level_medium,
            Level::Low => self.level_low,
        }
    }
}
