use std::collections::HashMap;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use super::styles::Theme;
use crate::api::{Level, SessionInfo, display_timestamp, informed, percent};
use crate::app::DetailPane;
use crate::markup;
use crate::state::{
    EditableField, EditorInput, FieldTxn, FieldValue, InlineEditor, NOT_INFORMED,
};

const NOT_AVAILABLE: &str = "N/A";

/// Session info of the selected conversation, with inline editors.
pub struct DetailPanel<'a> {
    detail: &'a DetailPane,
    editor: Option<&'a InlineEditor>,
    pending: &'a HashMap<EditableField, FieldTxn>,
    cursor: EditableField,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> DetailPanel<'a> {
    pub fn new(
        detail: &'a DetailPane,
        editor: Option<&'a InlineEditor>,
        pending: &'a HashMap<EditableField, FieldTxn>,
        cursor: EditableField,
        focused: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            detail,
            editor,
            pending,
            cursor,
            focused,
            theme,
        }
    }

    fn section(&self, title: &str, lines: &mut Vec<Line<'static>>) {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(title.to_string(), self.theme.section)));
    }

    fn fact(&self, label: &str, value: Span<'static>) -> Line<'static> {
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{}: ", label), self.theme.field_label),
            value,
        ])
    }

    fn optional(&self, value: &Option<String>, fallback: &'static str) -> Span<'static> {
        match informed(value) {
            Some(text) => Span::styled(text.to_string(), self.theme.field_value),
            None => Span::styled(fallback, self.theme.field_missing),
        }
    }

    fn editor_spans(
        &self,
        editor: &InlineEditor,
        lines: &mut Vec<Line<'static>>,
        mut row: Vec<Span<'static>>,
    ) {
        match &editor.input {
            EditorInput::Text { buffer } => {
                if buffer.is_empty() {
                    row.push(Span::styled(
                        format!("▏{}", editor.field.placeholder()),
                        self.theme.field_missing,
                    ));
                } else {
                    row.push(Span::styled(format!("{}▏", buffer), self.theme.editing));
                }
                lines.push(Line::from(row));
            }
            EditorInput::Select { options, cursor } => {
                row.push(Span::styled(format!("▾ {}", editor.value()), self.theme.editing));
                lines.push(Line::from(row));
                for (i, option) in options.iter().enumerate() {
                    let style = if i == *cursor {
                        self.theme.selected
                    } else {
                        self.theme.field_value
                    };
                    let mark = if i == *cursor { "● " } else { "  " };
                    lines.push(Line::from(vec![
                        Span::raw("      "),
                        Span::styled(format!("{}{}", mark, option), style),
                    ]));
                }
            }
        }
    }

    /// One editable field. Returns the index of its first line.
    fn field(
        &self,
        field: EditableField,
        info: &SessionInfo,
        lines: &mut Vec<Line<'static>>,
    ) -> usize {
        let start = lines.len();
        let at_cursor = self.focused && self.cursor == field;
        let pointer = if at_cursor { "› " } else { "  " };
        let row = vec![
            Span::styled(pointer, self.theme.key_hint),
            Span::styled(format!("{}: ", field.label()), self.theme.field_label),
        ];

        if let Some(editor) = self.editor.filter(|e| e.field == field) {
            self.editor_spans(editor, lines, row);
            return start;
        }

        let (value, pending) = match self.pending.get(&field) {
            Some(txn) => (txn.shown().clone(), true),
            None => (field.current(info), false),
        };
        let value_style = if pending {
            self.theme.pending
        } else {
            self.theme.field_value
        };

        let mut row = row;
        match value {
            FieldValue::Flag(checked) => {
                let mark = if checked { "[x] " } else { "[ ] " };
                row.push(Span::styled(mark, self.theme.key_hint));
                row.push(Span::styled(field.checkbox_label(checked), value_style));
            }
            FieldValue::Text(text) if text.trim().is_empty() => {
                row.push(Span::styled(NOT_INFORMED, self.theme.field_missing));
            }
            FieldValue::Text(text) => row.push(Span::styled(text, value_style)),
        }
        if pending {
            row.push(Span::styled(" …", self.theme.pending));
        }
        if at_cursor {
            for span in row.iter_mut().skip(1) {
                span.style = span.style.patch(self.theme.selected);
            }
        }
        lines.push(Line::from(row));
        start
    }

    fn tags(&self, info: &SessionInfo) -> Line<'static> {
        let mut spans = Vec::new();
        let mut tag = |text: String, style: Style| {
            spans.push(Span::styled(format!("[{}]", text), style));
            spans.push(Span::raw(" "));
        };
        if !info.category.is_empty() {
            tag(info.category.clone(), self.theme.chip_active);
        }
        if let Some(agent) = informed(&info.primary_agent) {
            tag(agent.to_string(), self.theme.agent_label);
        }
        if info.has_handoff {
            tag("Handoff".into(), self.theme.level_medium);
        } else {
            tag("Direct".into(), self.theme.level_high);
        }
        if info.rlhf {
            tag("✓ RLHF".into(), self.theme.success);
        }
        Line::from(spans)
    }

    fn handoff_view(&self, info: &SessionInfo, lines: &mut Vec<Line<'static>>) {
        let primary = informed(&info.primary_agent);
        if info.has_handoff {
            let noun = if info.handoff_count == 1 {
                "transfer"
            } else {
                "transfers"
            };
            lines.push(Line::from(Span::styled(
                format!("  With handoff ({} {})", info.handoff_count, noun),
                self.theme.level_medium,
            )));
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    primary.unwrap_or(NOT_AVAILABLE).to_string(),
                    self.theme.agent_label,
                ),
                Span::styled(" → ", self.theme.timestamp),
                Span::styled(
                    informed(&info.final_agent)
                        .unwrap_or(NOT_AVAILABLE)
                        .to_string(),
                    self.theme.agent_label,
                ),
            ]));
        } else {
            lines.push(Line::from(Span::styled(
                "  No handoff",
                self.theme.level_high,
            )));
            lines.push(Line::from(Span::styled(
                format!(
                    "  Resolved directly by {}",
                    primary.unwrap_or("initial agent")
                ),
                self.theme.field_value,
            )));
        }
    }

    /// Panel lines and the line holding the cursor.
    fn render_info(&self, info: &SessionInfo) -> (Vec<Line<'static>>, usize) {
        let mut lines = vec![self.tags(info)];
        let mut cursor_line = 0;
        let mut track = |field: EditableField, line: usize| {
            if field == self.cursor {
                cursor_line = line;
            }
        };

        self.section("Classification", &mut lines);
        for field in [EditableField::Category, EditableField::Subcategory] {
            let line = self.field(field, info, &mut lines);
            track(field, line);
        }
        lines.push(self.fact(
            "Confidence",
            Span::styled(
                percent(info.confidence, 1),
                self.theme.level(Level::confidence(info.confidence)),
            ),
        ));

        self.section("Customer", &mut lines);
        for field in [
            EditableField::Name,
            EditableField::Company,
            EditableField::Erp,
            EditableField::Channel,
            EditableField::CustomerNumber,
        ] {
            let line = self.field(field, info, &mut lines);
            track(field, line);
        }

        self.section("Agents", &mut lines);
        lines.push(self.fact("Primary", self.optional(&info.primary_agent, NOT_AVAILABLE)));
        lines.push(self.fact("Final", self.optional(&info.final_agent, NOT_AVAILABLE)));
        lines.push(self.fact(
            "Effectiveness",
            Span::styled(
                percent(info.effectiveness_score, 1),
                self.theme
                    .level(Level::effectiveness(info.effectiveness_score)),
            ),
        ));

        self.section("Handoff", &mut lines);
        self.handoff_view(info, &mut lines);
        for field in [EditableField::HasHandoff, EditableField::Resolution] {
            let line = self.field(field, info, &mut lines);
            track(field, line);
        }

        self.section("Metrics", &mut lines);
        lines.push(self.fact(
            "Messages analyzed",
            Span::styled(info.messages_analyzed.to_string(), self.theme.field_value),
        ));
        for field in [EditableField::Rlhf, EditableField::Template] {
            let line = self.field(field, info, &mut lines);
            track(field, line);
        }
        lines.push(self.fact(
            "Classified at",
            Span::styled(
                display_timestamp(&info.classified_at, true),
                self.theme.timestamp,
            ),
        ));

        self.section("Summary", &mut lines);
        lines.push(Line::from(vec![
            Span::raw("  "),
            self.optional(&info.summary, "No summary available"),
        ]));

        if let Some(reasoning) = informed(&info.reasoning) {
            self.section("Reasoning", &mut lines);
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(reasoning.to_string(), self.theme.field_value),
            ]));
        }

        (lines, cursor_line)
    }
}

impl<'a> Widget for DetailPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (border_style, title_style) = if self.focused {
            (self.theme.border_focused, self.theme.title_focused)
        } else {
            (self.theme.border, self.theme.title)
        };

        let block = Block::default()
            .title(Span::styled(" Details ", title_style))
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        let placeholder = |text: String, style: Style| {
            Paragraph::new(Line::from(Span::styled(text, style)))
                .wrap(Wrap { trim: true })
        };

        let info = match self.detail {
            DetailPane::Empty => {
                placeholder("No conversation selected".into(), self.theme.field_missing)
                    .render(inner, buf);
                return;
            }
            DetailPane::Loading { .. } => {
                placeholder("Loading details...".into(), self.theme.pending).render(inner, buf);
                return;
            }
            DetailPane::Failed { error, .. } => {
                placeholder(
                    format!("Failed to load conversation details: {}", error),
                    self.theme.error,
                )
                .render(inner, buf);
                return;
            }
            DetailPane::Loaded(selected) => match &selected.detail.session_info {
                Some(info) => info,
                None => {
                    placeholder(
                        "No classification data for this conversation".into(),
                        self.theme.field_missing,
                    )
                    .render(inner, buf);
                    return;
                }
            },
        };

        let (lines, cursor_line) = self.render_info(info);
        let extra = match self.editor.map(|e| &e.input) {
            Some(EditorInput::Select { options, .. }) => options.len(),
            _ => 0,
        };

        // Wrap here so the offset counts screen rows, not logical lines.
        let mut rows = Vec::new();
        let mut cursor_row = 0;
        let mut cursor_end = None;
        for (i, line) in lines.iter().enumerate() {
            if i == cursor_line {
                cursor_row = rows.len();
            }
            rows.extend(markup::wrap_line(line, inner.width as usize));
            if i == cursor_line + extra {
                cursor_end = Some(rows.len());
            }
        }
        let cursor_end = cursor_end.unwrap_or(rows.len());

        // Keep the cursor (and an open dropdown) in view.
        let height = inner.height as usize;
        let offset = if self.focused {
            (cursor_end + 1).saturating_sub(height).min(cursor_row)
        } else {
            0
        };

        Paragraph::new(rows)
            .scroll((offset as u16, 0))
            .render(inner, buf);
    }
}
