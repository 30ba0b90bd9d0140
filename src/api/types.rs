use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Facet label the backend uses for sessions that were transferred between agents.
pub const HANDOFF_ACTIVE_LABEL: &str = "Com Transbordo";
pub const RLHF_VALIDATED_LABEL: &str = "Validado";
pub const RLHF_NOT_VALIDATED_LABEL: &str = "Não Validado";

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Decode `null` as the type's default. The backend reads straight from SQLite
/// columns, so any of them can come back null.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FacetItem {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfidenceRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FacetCounts {
    #[serde(default, deserialize_with = "nullable")]
    pub categories: Vec<FacetItem>,
    #[serde(default, deserialize_with = "nullable")]
    pub subcategories: Vec<FacetItem>,
    #[serde(default, deserialize_with = "nullable")]
    pub agents: Vec<FacetItem>,
    #[serde(default, deserialize_with = "nullable")]
    pub confidence_ranges: Vec<ConfidenceRange>,
    #[serde(default, deserialize_with = "nullable")]
    pub handoff_status: Vec<FacetItem>,
    #[serde(default, deserialize_with = "nullable")]
    pub rlhf_status: Vec<FacetItem>,
}

impl FacetCounts {
    pub fn rlhf_count(&self, label: &str) -> u64 {
        self.rlhf_status
            .iter()
            .find(|s| s.name == label)
            .map(|s| s.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Stats {
    #[serde(default, deserialize_with = "nullable")]
    pub total_conversations: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub avg_confidence: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub handoff_rate: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub unique_agents: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversationSummary {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub classified_at: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub rlhf: bool,
}

impl ConversationSummary {
    /// Shortened id shown in the list, e.g. `3f2a9c1b...`
    pub fn short_id(&self) -> String {
        let short: String = self.session_id.chars().take(8).collect();
        format!("{}...", short)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConversationPage {
    #[serde(default, deserialize_with = "nullable")]
    pub conversations: Vec<ConversationSummary>,
    #[serde(default, deserialize_with = "nullable")]
    pub total_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Inbound,
    Outbound,
}

/// The column is passed through raw: only "outbound" is ours, anything else
/// (null included) came from the customer.
fn direction<'de, D>(deserializer: D) -> Result<Direction, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(str::trim) {
        Some(d) if d.eq_ignore_ascii_case("outbound") => Direction::Outbound,
        _ => Direction::Inbound,
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "nullable")]
    pub content: String,
    #[serde(default, deserialize_with = "direction")]
    pub direction: Direction,
    #[serde(default, deserialize_with = "nullable")]
    pub timestamp: String,
    #[serde(default)]
    pub operator_info: Option<String>,
}

impl Message {
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SessionInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub category: String,
    #[serde(default, deserialize_with = "nullable")]
    pub subcategory: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub erp: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default, rename = "customerNumber")]
    pub customer_number: Option<String>,
    #[serde(default)]
    pub primary_agent: Option<String>,
    #[serde(default)]
    pub final_agent: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub has_handoff: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub handoff_count: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub resolution: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub template: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub rlhf: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub effectiveness_score: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub messages_analyzed: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub classified_at: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConversationDetail {
    #[serde(default, deserialize_with = "nullable")]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub session_info: Option<SessionInfo>,
}

/// Non-empty optional text, treating `""` the same as absent.
pub fn informed(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub fn confidence(score: f64) -> Self {
        if score >= 0.9 {
            Level::High
        } else if score >= 0.7 {
            Level::Medium
        } else {
            Level::Low
        }
    }

    pub fn effectiveness(score: f64) -> Self {
        if score >= 0.8 {
            Level::High
        } else if score >= 0.6 {
            Level::Medium
        } else {
            Level::Low
        }
    }
}

/// Format a ratio in `[0, 1]` as a percentage with the given precision.
pub fn percent(ratio: f64, precision: usize) -> String {
    format!("{:.*}%", precision, ratio * 100.0)
}

/// Render a backend timestamp in local time, falling back to the raw string.
///
/// The classifier writes SQLite `CURRENT_TIMESTAMP` values (`2024-05-01 13:45:00`)
/// while message rows carry RFC 3339, so both are accepted.
pub fn display_timestamp(raw: &str, with_time: bool) -> String {
    let fmt = if with_time { "%d/%m/%Y %H:%M:%S" } else { "%d/%m/%Y" };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format(fmt).to_string();
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return naive.format(fmt).to_string();
        }
    }
    raw.to_string()
}
