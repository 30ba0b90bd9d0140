use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::styles::Theme;
use crate::api::{ConversationSummary, Level, display_timestamp, percent};

const NO_SUMMARY: &str = "No summary available";

pub struct ConversationList<'a> {
    conversations: &'a [ConversationSummary],
    total_count: u64,
    selected_session: Option<&'a str>,
    focused: bool,
    loading: bool,
    theme: &'a Theme,
}

/// Cut `text` to `width` columns, ending with an ellipsis when shortened.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            out.push('…');
            return out;
        }
        used += w;
        out.push(c);
    }
    out
}

impl<'a> ConversationList<'a> {
    pub fn new(
        conversations: &'a [ConversationSummary],
        total_count: u64,
        selected_session: Option<&'a str>,
        focused: bool,
        loading: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            conversations,
            total_count,
            selected_session,
            focused,
            loading,
            theme,
        }
    }

    /// "> 3f2a9c1b...  01/05/2024 ✓" plus room for the summary line.
    pub fn max_content_width() -> u16 {
        32
    }

    fn item(&self, conversation: &ConversationSummary, width: usize) -> ListItem<'a> {
        let marked = self.selected_session == Some(conversation.session_id.as_str());
        let marker = if marked { "▶ " } else { "  " };
        let id_style = if marked {
            self.theme.marked
        } else {
            self.theme.title
        };

        let mut header = vec![
            Span::styled(marker, self.theme.marked),
            Span::styled(conversation.short_id(), id_style),
            Span::raw("  "),
            Span::styled(
                display_timestamp(&conversation.classified_at, false),
                self.theme.timestamp,
            ),
        ];
        if conversation.rlhf {
            header.push(Span::styled(" ✓", self.theme.success));
        }

        let summary = conversation
            .summary
            .as_deref()
            .filter(|s| !s.trim().is_empty());
        let summary_line = match summary {
            Some(text) => Span::styled(
                format!("  {}", truncate(text, width.saturating_sub(2))),
                self.theme.agent_text,
            ),
            None => Span::styled(format!("  {}", NO_SUMMARY), self.theme.field_missing),
        };

        let confidence = Span::styled(
            format!("  {} confidence", percent(conversation.confidence, 1)),
            self.theme.level(Level::confidence(conversation.confidence)),
        );

        ListItem::new(vec![
            Line::from(header),
            Line::from(summary_line),
            Line::from(confidence),
        ])
    }
}

impl<'a> StatefulWidget for ConversationList<'a> {
    type State = ConversationListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let (border_style, title_style) = if self.focused {
            (self.theme.border_focused, self.theme.title_focused)
        } else {
            (self.theme.border, self.theme.title)
        };

        let title = if self.loading {
            format!(" Conversations ({}) … ", self.total_count)
        } else {
            format!(" Conversations ({}) ", self.total_count)
        };
        let block = Block::default()
            .title(Span::styled(title, title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        if self.conversations.is_empty() {
            let inner = block.inner(area);
            block.render(area, buf);
            let text = if self.loading {
                "Loading conversations..."
            } else {
                "No conversations found"
            };
            Paragraph::new(Line::from(Span::styled(text, self.theme.field_missing)))
                .render(inner, buf);
            return;
        }

        let width = block.inner(area).width as usize;
        let items: Vec<ListItem> = self
            .conversations
            .iter()
            .map(|c| self.item(c, width))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(self.theme.selected)
            .style(Style::default());

        StatefulWidget::render(list, area, buf, &mut state.list_state);
    }
}

pub struct ConversationListState {
    pub list_state: ListState,
}

impl ConversationListState {
    pub fn new() -> Self {
        Self {
            list_state: ListState::default(),
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.list_state.select(index);
    }

    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => (i - 1).min(len - 1),
        };
        self.list_state.select(Some(i));
    }

    pub fn first(&mut self) {
        self.list_state.select(Some(0));
    }

    pub fn last(&mut self, len: usize) {
        if len > 0 {
            self.list_state.select(Some(len - 1));
        }
    }
}

impl Default for ConversationListState {
    fn default() -> Self {
        Self::new()
    }
}
