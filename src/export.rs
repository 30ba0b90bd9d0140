use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::api::{ConversationDetail, Direction, display_timestamp, informed, percent};
use crate::markup::{escape_html, to_html};
use crate::state::NOT_INFORMED;

/// Standalone HTML transcript of one conversation.
pub fn render_transcript(session_id: &str, detail: &ConversationDetail) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html><head><meta charset=\"utf-8\">");
    let _ = writeln!(
        html,
        "<title>Conversation {}</title></head><body>",
        escape_html(session_id)
    );
    let _ = writeln!(html, "<h1>Conversation {}</h1>", escape_html(session_id));

    if let Some(info) = &detail.session_info {
        let field = |value: &Option<String>| escape_html(informed(value).unwrap_or(NOT_INFORMED));
        let _ = writeln!(html, "<dl>");
        let _ = writeln!(
            html,
            "<dt>Category</dt><dd>{} / {}</dd>",
            escape_html(&info.category),
            escape_html(&info.subcategory)
        );
        let _ = writeln!(
            html,
            "<dt>Confidence</dt><dd>{}</dd>",
            percent(info.confidence, 1)
        );
        let _ = writeln!(html, "<dt>Customer</dt><dd>{}</dd>", field(&info.name));
        let _ = writeln!(html, "<dt>Company</dt><dd>{}</dd>", field(&info.company));
        let _ = writeln!(
            html,
            "<dt>RLHF</dt><dd>{}</dd>",
            if info.rlhf { "validated" } else { "not validated" }
        );
        let _ = writeln!(html, "</dl>");
    }

    let messages: Vec<_> = detail.messages.iter().filter(|m| !m.is_blank()).collect();
    if messages.is_empty() {
        let _ = writeln!(html, "<p class=\"empty\">No messages in this conversation</p>");
    }
    for message in messages {
        let (class, who) = match message.direction {
            Direction::Inbound => ("inbound", "Customer"),
            Direction::Outbound => ("outbound", "Agent"),
        };
        let _ = writeln!(html, "<div class=\"message {}\">", class);
        let _ = write!(
            html,
            "<div class=\"meta\">{} &middot; {}",
            who,
            escape_html(&display_timestamp(&message.timestamp, true))
        );
        if let Some(operator) = informed(&message.operator_info) {
            let _ = write!(html, " &middot; {}", escape_html(operator));
        }
        let _ = writeln!(html, "</div>");
        let _ = writeln!(html, "<div class=\"bubble\">{}</div>", to_html(&message.content));
        let _ = writeln!(html, "</div>");
    }

    let _ = writeln!(html, "</body></html>");
    html
}

/// File name for a session, with path separators and other unsafe characters replaced.
fn file_name(session_id: &str) -> String {
    let safe: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.html", safe)
}

pub fn write_transcript(
    dir: &Path,
    session_id: &str,
    detail: &ConversationDetail,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;
    let path = dir.join(file_name(session_id));
    std::fs::write(&path, render_transcript(session_id, detail))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
