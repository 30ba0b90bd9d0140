//! Message content formatting.
//!
//! Content is tokenized once into [`Segment`]s and rendered either to terminal
//! lines or to an HTML fragment. A `*word*` span (non-empty, no inner asterisk)
//! is emphasis; newlines are line breaks.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Emphasis(String),
    LineBreak,
}

/// Drop control characters that would reach the terminal, keeping newlines and tabs.
fn sanitize(content: &str) -> String {
    content
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

fn push_text(segments: &mut Vec<Segment>, text: &str, emphasis: bool) {
    for (i, part) in text.split('\n').enumerate() {
        if i > 0 {
            segments.push(Segment::LineBreak);
        }
        if part.is_empty() {
            continue;
        }
        segments.push(if emphasis {
            Segment::Emphasis(part.to_string())
        } else {
            Segment::Text(part.to_string())
        });
    }
}

pub fn tokenize(content: &str) -> Vec<Segment> {
    let content = sanitize(content);
    let mut segments = Vec::new();
    let mut rest = content.as_str();

    while let Some(open) = rest.find('*') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('*') else {
            break;
        };
        if close == 0 {
            // "**": retry from the second asterisk
            push_text(&mut segments, &rest[..open + 1], false);
            rest = after;
            continue;
        }
        push_text(&mut segments, &rest[..open], false);
        push_text(&mut segments, &after[..close], true);
        rest = &after[close + 1..];
    }
    push_text(&mut segments, rest, false);

    segments
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTML fragment: escaped text, `<strong>` for emphasis, `<br>` for newlines.
pub fn to_html(content: &str) -> String {
    tokenize(content)
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => escape_html(text),
            Segment::Emphasis(text) => format!("<strong>{}</strong>", escape_html(text)),
            Segment::LineBreak => "<br>".to_string(),
        })
        .collect()
}

/// Terminal lines, word-wrapped to `width`, each prefixed with `indent`.
pub fn to_lines(content: &str, width: usize, indent: &str, style: Style) -> Vec<Line<'static>> {
    let emphasis = style.add_modifier(Modifier::BOLD);
    let width = width.saturating_sub(indent.width()).max(1);

    // Split into logical lines of styled words first.
    let mut logical: Vec<Vec<(String, Style)>> = vec![Vec::new()];
    for segment in tokenize(content) {
        let (text, word_style) = match segment {
            Segment::LineBreak => {
                logical.push(Vec::new());
                continue;
            }
            Segment::Text(text) => (text, style),
            Segment::Emphasis(text) => (text, emphasis),
        };
        if let Some(words) = logical.last_mut() {
            words.extend(
                text.split_whitespace()
                    .map(|w| (w.to_string(), word_style)),
            );
        }
    }

    let mut lines = Vec::new();
    for words in logical {
        let mut spans = vec![Span::raw(indent.to_string())];
        let mut used = 0;
        for (word, word_style) in words {
            let w = word.width();
            if used > 0 && used + 1 + w > width {
                lines.push(Line::from(std::mem::replace(
                    &mut spans,
                    vec![Span::raw(indent.to_string())],
                )));
                used = 0;
            }
            if used > 0 {
                spans.push(Span::styled(" ", style));
                used += 1;
            }
            used += w;
            spans.push(Span::styled(word, word_style));
        }
        lines.push(Line::from(spans));
    }

    lines
}

/// Word-wrap an already styled line to `width` columns, keeping span styles.
/// Words wider than a row are broken by character.
pub fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut used = 0;

    for span in &line.spans {
        for piece in span.content.split_inclusive(' ') {
            let word_width = piece.trim_end_matches(' ').width();
            if used > 0 && used + word_width > width {
                rows.push(Line::from(std::mem::take(&mut spans)).style(line.style));
                used = 0;
            }
            if word_width <= width {
                spans.push(Span::styled(piece.to_string(), span.style));
                used += piece.width();
                continue;
            }

            let mut chunk = String::new();
            for c in piece.chars() {
                let w = c.width().unwrap_or(0);
                if used + w > width && used > 0 {
                    spans.push(Span::styled(std::mem::take(&mut chunk), span.style));
                    rows.push(Line::from(std::mem::take(&mut spans)).style(line.style));
                    used = 0;
                }
                chunk.push(c);
                used += w;
            }
            if !chunk.is_empty() {
                spans.push(Span::styled(chunk, span.style));
            }
        }
    }

    rows.push(Line::from(spans).style(line.style));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn wrap_line_breaks_on_words_and_keeps_styles() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::raw("Category: "),
            Span::styled("Billing and invoices", bold),
        ]);
        let rows = wrap_line(&line, 12);
        let text: Vec<String> = rows.iter().map(plain).collect();
        assert_eq!(text, vec!["Category: ", "Billing and ", "invoices"]);
        assert_eq!(rows[2].spans[0].style, bold);
    }

    #[test]
    fn wrap_line_splits_long_words() {
        let rows = wrap_line(&Line::from("abcdefghij"), 4);
        let text: Vec<String> = rows.iter().map(plain).collect();
        assert_eq!(text, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn emphasis_and_breaks() {
        assert_eq!(
            tokenize("Hello *world*\nbye"),
            vec![
                Segment::Text("Hello ".into()),
                Segment::Emphasis("world".into()),
                Segment::LineBreak,
                Segment::Text("bye".into()),
            ]
        );
    }

    #[test]
    fn double_asterisk_is_not_emphasis_opener() {
        assert_eq!(
            tokenize("a **b* c"),
            vec![
                Segment::Text("a *".into()),
                Segment::Emphasis("b".into()),
                Segment::Text(" c".into()),
            ]
        );
    }

    #[test]
    fn unmatched_asterisk_stays_literal() {
        assert_eq!(tokenize("5 * 3"), vec![Segment::Text("5 * 3".into())]);
    }

    #[test]
    fn emphasis_can_span_lines() {
        assert_eq!(
            tokenize("*a\nb*"),
            vec![
                Segment::Emphasis("a".into()),
                Segment::LineBreak,
                Segment::Emphasis("b".into()),
            ]
        );
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(
            tokenize("\u{1b}[31mred\r\nok"),
            vec![
                Segment::Text("[31mred".into()),
                Segment::LineBreak,
                Segment::Text("ok".into()),
            ]
        );
    }

    #[test]
    fn html_escapes_script() {
        let html = to_html("<script>&\"</script> *word*");
        assert_eq!(
            html,
            "&lt;script&gt;&amp;&quot;&lt;/script&gt; <strong>word</strong>"
        );
    }

    #[test]
    fn lines_wrap_and_bold_emphasis() {
        let style = Style::default();
        let lines = to_lines("one *two* three", 10, "  ", style);
        assert_eq!(lines.len(), 2);
        let first: Vec<&str> = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, vec!["  ", "one", " ", "two"]);
        assert!(lines[0].spans[3].style.add_modifier.contains(Modifier::BOLD));
        let second: Vec<&str> = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(second, vec!["  ", "three"]);
    }

    #[test]
    fn blank_lines_survive() {
        let lines = to_lines("a\n\nb", 40, "", Style::default());
        assert_eq!(lines.len(), 3);
    }

    proptest! {
        #[test]
        fn html_has_no_raw_markup_characters(content in ".*") {
            let html = to_html(&content);
            let stripped = html
                .replace("<strong>", "")
                .replace("</strong>", "")
                .replace("<br>", "")
                .replace("&amp;", "")
                .replace("&lt;", "")
                .replace("&gt;", "")
                .replace("&quot;", "");
            prop_assert!(!stripped.contains('<'));
            prop_assert!(!stripped.contains('>'));
            prop_assert!(!stripped.contains('&'));
        }
    }
}
