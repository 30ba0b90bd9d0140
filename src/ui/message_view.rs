use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Margin, Rect},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget,
    },
};

use super::styles::Theme;
use crate::api::{ConversationDetail, Direction, display_timestamp, informed};
use crate::app::DetailPane;
use crate::markup;
use crate::state::EditableField;

/// Transcript of the selected conversation with the template checkbox beneath it.
pub struct ConversationView<'a> {
    detail: &'a DetailPane,
    focused: bool,
    theme: &'a Theme,
    /// Displayed template flag and whether a save is in flight.
    template: Option<(bool, bool)>,
}

impl<'a> ConversationView<'a> {
    pub fn new(
        detail: &'a DetailPane,
        focused: bool,
        theme: &'a Theme,
        template: Option<(bool, bool)>,
    ) -> Self {
        Self {
            detail,
            focused,
            theme,
            template,
        }
    }

    fn render_messages(&self, detail: &ConversationDetail, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        for message in detail.messages.iter().filter(|m| !m.is_blank()) {
            let (label, label_style, text_style) = match message.direction {
                Direction::Inbound => (
                    "Customer",
                    self.theme.customer_label,
                    self.theme.customer_text,
                ),
                Direction::Outbound => ("Agent", self.theme.agent_label, self.theme.agent_text),
            };

            let mut header = vec![Span::styled(label, label_style)];
            if let Some(operator) = informed(&message.operator_info) {
                header.push(Span::styled(
                    format!(" · {}", operator),
                    self.theme.operator,
                ));
            }
            header.push(Span::styled(
                format!("  {}", display_timestamp(&message.timestamp, true)),
                self.theme.timestamp,
            ));
            lines.push(Line::from(header));
            lines.extend(markup::to_lines(&message.content, width, "  ", text_style));
            lines.push(Line::from(""));
        }

        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "No messages in this conversation",
                self.theme.field_missing,
            )));
        }

        lines
    }

    fn placeholder(&self) -> Option<Line<'static>> {
        match self.detail {
            DetailPane::Empty => Some(Line::from(Span::styled(
                "Select a conversation to view its messages",
                self.theme.field_missing,
            ))),
            DetailPane::Loading { .. } => Some(Line::from(Span::styled(
                "Loading conversation...",
                self.theme.pending,
            ))),
            DetailPane::Failed { .. } => Some(Line::from(Span::styled(
                "Failed to load conversation details",
                self.theme.error,
            ))),
            DetailPane::Loaded(_) => None,
        }
    }
}

impl<'a> StatefulWidget for ConversationView<'a> {
    type State = ConversationState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let (border_style, title_style) = if self.focused {
            (self.theme.border_focused, self.theme.title_focused)
        } else {
            (self.theme.border, self.theme.title)
        };

        let block = Block::default()
            .title(Span::styled(" Messages ", title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        if let Some(line) = self.placeholder() {
            state.total_lines = 0;
            Paragraph::new(line).render(inner, buf);
            return;
        }
        let DetailPane::Loaded(selected) = self.detail else {
            return;
        };

        let (body, footer) = match self.template {
            Some(_) => {
                let [body, footer] =
                    Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
                (body, Some(footer))
            }
            None => (inner, None),
        };

        // Leave a column for the scrollbar.
        let lines = self.render_messages(&selected.detail, body.width.saturating_sub(1) as usize);
        let total_lines = lines.len();
        state.total_lines = total_lines;

        let max_scroll = total_lines.saturating_sub(body.height as usize);
        state.scroll_offset = state.scroll_offset.min(max_scroll);

        let visible_lines: Vec<Line> = lines
            .into_iter()
            .skip(state.scroll_offset)
            .take(body.height as usize)
            .collect();

        Paragraph::new(Text::from(visible_lines)).render(body, buf);

        if total_lines > body.height as usize {
            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_lines)
                .position(state.scroll_offset)
                .viewport_content_length(body.height as usize);

            scrollbar.render(
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                buf,
                &mut scrollbar_state,
            );
        }

        if let (Some(footer), Some((checked, pending))) = (footer, self.template) {
            let mark = if checked { "[x]" } else { "[ ]" };
            let style = if pending {
                self.theme.pending
            } else {
                self.theme.field_value
            };
            let line = Line::from(vec![
                Span::styled(format!("{} ", mark), self.theme.key_hint),
                Span::styled(EditableField::Template.checkbox_label(checked), style),
                Span::styled("  (t)", self.theme.timestamp),
            ]);
            Paragraph::new(line).render(footer, buf);
        }
    }
}

pub struct ConversationState {
    pub scroll_offset: usize,
    pub total_lines: usize,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            scroll_offset: 0,
            total_lines: 0,
        }
    }

    pub fn scroll_down(&mut self, amount: usize, viewport_height: usize) {
        let max_scroll = self.total_lines.saturating_sub(viewport_height);
        self.scroll_offset = (self.scroll_offset + amount).min(max_scroll);
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self, viewport_height: usize) {
        self.scroll_offset = self.total_lines.saturating_sub(viewport_height);
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Message, SessionInfo};
    use crate::app::Selected;

    fn message(content: &str, direction: Direction, operator: Option<&str>) -> Message {
        Message {
            content: content.into(),
            direction,
            timestamp: "2024-05-01 10:00:00".into(),
            operator_info: operator.map(String::from),
        }
    }

    fn loaded(messages: Vec<Message>) -> DetailPane {
        DetailPane::Loaded(Box::new(Selected {
            session_id: "s1".into(),
            detail: ConversationDetail {
                messages,
                session_info: Some(SessionInfo::default()),
            },
        }))
    }

    fn rows(pane: &DetailPane, template: Option<(bool, bool)>) -> Vec<String> {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 50, 10);
        let mut buf = Buffer::empty(area);
        ConversationView::new(pane, true, &theme, template).render(
            area,
            &mut buf,
            &mut ConversationState::new(),
        );
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn labels_messages_and_skips_blank_ones() {
        let pane = loaded(vec![
            message("Hi *there*", Direction::Inbound, None),
            message("  ", Direction::Outbound, None),
            message("Hello", Direction::Outbound, Some("ana")),
        ]);
        let rows = rows(&pane, Some((false, false)));

        assert!(rows[1].contains("Customer  01/05/2024 10:00:00"));
        assert!(rows[2].contains("  Hi there"));
        assert!(rows[4].contains("Agent · ana"));
        assert!(rows[5].contains("Hello"));
        assert!(rows[8].contains("[ ] Do not use as template"));
    }

    #[test]
    fn empty_transcript_placeholder() {
        let rows = rows(&loaded(vec![]), None);
        assert!(rows[1].contains("No messages in this conversation"));
    }

    #[test]
    fn pane_states_have_placeholders() {
        assert!(rows(&DetailPane::Empty, None)[1].contains("Select a conversation"));
        let loading = DetailPane::Loading {
            session_id: "s1".into(),
        };
        assert!(rows(&loading, None)[1].contains("Loading conversation..."));
        let failed = DetailPane::Failed {
            session_id: "s1".into(),
            error: "boom".into(),
        };
        assert!(rows(&failed, None)[1].contains("Failed to load conversation details"));
    }

    #[test]
    fn scroll_is_clamped() {
        let mut state = ConversationState::new();
        state.total_lines = 30;
        state.scroll_down(50, 10);
        assert_eq!(state.scroll_offset, 20);
        state.scroll_up(5);
        assert_eq!(state.scroll_offset, 15);
        state.scroll_to_top();
        assert_eq!(state.scroll_offset, 0);
    }
}
