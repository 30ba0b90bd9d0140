use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};
use unicode_width::UnicodeWidthStr;

use super::styles::Theme;
use crate::state::{Chip, FacetGroup, FilterSet};

pub struct FilterPanel<'a> {
    groups: &'a [FacetGroup],
    filters: &'a FilterSet,
    focused: bool,
    collapsed: bool,
    theme: &'a Theme,
}

fn chip_text(chip: &Chip, active: bool) -> String {
    let mark = if active { "●" } else { "○" };
    match chip.count {
        Some(count) => format!("{} {} ({})", mark, chip.label, count),
        None => format!("{} {}", mark, chip.label),
    }
}

impl<'a> FilterPanel<'a> {
    pub fn new(
        groups: &'a [FacetGroup],
        filters: &'a FilterSet,
        focused: bool,
        collapsed: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            groups,
            filters,
            focused,
            collapsed,
            theme,
        }
    }

    pub fn max_content_width(groups: &[FacetGroup]) -> u16 {
        groups
            .iter()
            .flat_map(|g| g.chips.iter())
            .map(|chip| chip_text(chip, false).width() + 2)
            .max()
            .unwrap_or(15) as u16
    }
}

impl<'a> StatefulWidget for FilterPanel<'a> {
    type State = FilterPaneState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let (border_style, title_style) = if self.focused {
            (self.theme.border_focused, self.theme.title_focused)
        } else {
            (self.theme.border, self.theme.title)
        };

        if self.collapsed {
            let block = Block::default()
                .title(Span::styled("F", title_style))
                .borders(Borders::ALL)
                .border_style(border_style);
            block.render(area, buf);
            return;
        }

        let mut items = Vec::new();
        let mut cursor_row = None;
        let mut chip_index = 0;
        for group in self.groups {
            if group.chips.is_empty() {
                continue;
            }
            if !items.is_empty() {
                items.push(ListItem::new(Line::from("")));
            }
            items.push(ListItem::new(Line::from(Span::styled(
                group.facet.title(),
                self.theme.section,
            ))));
            for chip in &group.chips {
                if chip_index == state.cursor {
                    cursor_row = Some(items.len());
                }
                let active = chip.is_active(self.filters);
                let style = if active {
                    self.theme.chip_active
                } else {
                    self.theme.chip
                };
                items.push(ListItem::new(Line::from(Span::styled(
                    format!(" {}", chip_text(chip, active)),
                    style,
                ))));
                chip_index += 1;
            }
        }

        let title = if self.filters.is_empty() {
            " Filters ".to_string()
        } else {
            format!(" Filters ({}) ", self.filters.len())
        };
        let block = Block::default()
            .title(Span::styled(title, title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let list = List::new(items)
            .block(block)
            .highlight_style(self.theme.selected);

        state.list_state.select(cursor_row);
        StatefulWidget::render(list, area, buf, &mut state.list_state);
    }
}

/// Cursor over the flattened chips of every group.
pub struct FilterPaneState {
    pub cursor: usize,
    pub list_state: ListState,
}

impl FilterPaneState {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            list_state: ListState::default(),
        }
    }

    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.cursor = if self.cursor >= len - 1 { 0 } else { self.cursor + 1 };
    }

    pub fn previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.cursor = if self.cursor == 0 || self.cursor >= len {
            len - 1
        } else {
            self.cursor - 1
        };
    }

    pub fn first(&mut self) {
        self.cursor = 0;
    }

    pub fn last(&mut self, len: usize) {
        if len > 0 {
            self.cursor = len - 1;
        }
    }
}

impl Default for FilterPaneState {
    fn default() -> Self {
        Self::new()
    }
}
