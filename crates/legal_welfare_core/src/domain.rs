//! crates/legal_welfare_core/src/domain.rs
//!
//! Defines the core data structures for the application: the cached records
//! (analyzed documents and generated letters), the remote conversation summary
//! and the derived activity view-model.
//!
//! Field names serialize as camelCase so cache values stay readable by the
//! browser build of the product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

//=========================================================================================
// Cached Records
//=========================================================================================

/// Outcome of a bias analysis run, as reported by the analysis backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sentences: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biased_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral_count: Option<i64>,
    pub success: bool,
}

/// A document that went through bias analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedDocument {
    pub id: String,
    pub filename: String,
    pub analyzed_at: DateTime<Utc>,
    pub result: AnalysisResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Caller input for a new analyzed document. The cache assigns `id` and `analyzed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnalyzedDocument {
    pub filename: String,
    pub result: AnalysisResult,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A letter produced by the letter generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLetter {
    pub id: String,
    pub filename: String,
    pub template_name: String,
    pub generated_at: DateTime<Utc>,
    pub success: bool,
}

/// Caller input for a new generated letter. The cache assigns `id` and `generated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGeneratedLetter {
    pub filename: String,
    pub template_name: String,
    pub success: bool,
}

//=========================================================================================
// Stats
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedDocumentStats {
    pub total_analyzed: usize,
    /// Documents with a bias count of exactly zero.
    pub total_inclusive: usize,
    /// Documents with a positive bias count.
    pub total_flagged: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterStats {
    pub total_letters: usize,
}

/// Combined stats shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    #[serde(flatten)]
    pub analyzed: AnalyzedDocumentStats,
    #[serde(flatten)]
    pub letters: LetterStats,
}

//=========================================================================================
// Remote Chat History
//=========================================================================================

/// A conversation summary as returned by the chat-history endpoint.
/// Only the fields the activity feed needs are kept.
///
/// The backend may send a numeric id or a null title; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

//=========================================================================================
// Activity (derived, never persisted)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Chat,
    Document,
    Letter,
}

/// One entry of the unified recent-activity timeline.
///
/// Exactly one of `conversation_id`, `document_id` and `letter_id` is set and it
/// always matches `kind`; the constructors below are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    /// Human-relative time, e.g. "5 minutes ago".
    pub time: String,
    /// Absolute time, used for ordering.
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    letter_id: Option<String>,
}

impl Activity {
    pub fn chat(conversation_id: String, title: String, time: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: format!("chat_{}", conversation_id),
            kind: ActivityKind::Chat,
            title,
            time,
            timestamp,
            conversation_id: Some(conversation_id),
            document_id: None,
            letter_id: None,
        }
    }

    pub fn document(document_id: String, title: String, time: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: document_id.clone(),
            kind: ActivityKind::Document,
            title,
            time,
            timestamp,
            conversation_id: None,
            document_id: Some(document_id),
            letter_id: None,
        }
    }

    pub fn letter(letter_id: String, title: String, time: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: letter_id.clone(),
            kind: ActivityKind::Letter,
            title,
            time,
            timestamp,
            conversation_id: None,
            document_id: None,
            letter_id: Some(letter_id),
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn letter_id(&self) -> Option<&str> {
        self.letter_id.as_deref()
    }
}

/// Which slice of the timeline a caller wants to see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityFilter {
    #[default]
    All,
    Kind(ActivityKind),
}

impl ActivityFilter {
    pub fn matches(&self, activity: &Activity) -> bool {
        match self {
            ActivityFilter::All => true,
            ActivityFilter::Kind(kind) => activity.kind == *kind,
        }
    }
}

impl std::str::FromStr for ActivityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ActivityFilter::All),
            "chat" => Ok(ActivityFilter::Kind(ActivityKind::Chat)),
            "document" => Ok(ActivityFilter::Kind(ActivityKind::Document)),
            "letter" => Ok(ActivityFilter::Kind(ActivityKind::Letter)),
            other => Err(format!("unknown activity type '{}'", other)),
        }
    }
}

/// Per-kind totals for the filter tabs of the timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub all: usize,
    pub chat: usize,
    pub document: usize,
    pub letter: usize,
}

impl ActivityCounts {
    pub fn tally(activities: &[Activity]) -> Self {
        activities.iter().fold(Self::default(), |mut counts, activity| {
            counts.all += 1;
            match activity.kind {
                ActivityKind::Chat => counts.chat += 1,
                ActivityKind::Document => counts.document += 1,
                ActivityKind::Letter => counts.letter += 1,
            }
            counts
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_summary_accepts_numeric_id_and_null_title() {
        let raw = r#"[
            { "id": 42, "title": null, "updated_at": "2024-06-15T10:00:00" },
            { "id": "c7", "updated_at": "2024-06-15T11:00:00", "message_count": 3 }
        ]"#;
        let conversations: Vec<ConversationSummary> = serde_json::from_str(raw).unwrap();
        assert_eq!(conversations[0].id, "42");
        assert_eq!(conversations[0].title, "");
        assert_eq!(conversations[1].id, "c7");
        assert_eq!(conversations[1].title, "");
    }

    #[test]
    fn analyzed_document_reads_browser_json() {
        let raw = r#"{
            "id": "doc_1700000000000_abc123xyz",
            "filename": "contract.pdf",
            "analyzedAt": "2024-03-01T10:15:30.123Z",
            "result": { "totalSentences": 12, "biasedCount": 2, "success": true },
            "sessionId": "s-1"
        }"#;
        let doc: AnalyzedDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.filename, "contract.pdf");
        assert_eq!(doc.result.biased_count, Some(2));
        assert_eq!(doc.result.neutral_count, None);
        assert_eq!(doc.session_id.as_deref(), Some("s-1"));
    }

    #[test]
    fn activity_serializes_kind_as_type_and_only_its_reference() {
        let activity = Activity::chat(
            "42".to_string(),
            "Tenancy question".to_string(),
            "Just now".to_string(),
            Utc::now(),
        );
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["id"], "chat_42");
        assert_eq!(json["type"], "chat");
        assert_eq!(json["conversationId"], "42");
        assert!(json.get("documentId").is_none());
        assert!(json.get("letterId").is_none());
    }

    #[test]
    fn document_stats_flatten_into_one_object() {
        let stats = DocumentStats {
            analyzed: AnalyzedDocumentStats {
                total_analyzed: 3,
                total_inclusive: 1,
                total_flagged: 2,
            },
            letters: LetterStats { total_letters: 4 },
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalAnalyzed"], 3);
        assert_eq!(json["totalFlagged"], 2);
        assert_eq!(json["totalLetters"], 4);
    }

    #[test]
    fn activity_filter_parses_tab_names() {
        assert_eq!("all".parse::<ActivityFilter>(), Ok(ActivityFilter::All));
        assert_eq!(
            "letter".parse::<ActivityFilter>(),
            Ok(ActivityFilter::Kind(ActivityKind::Letter))
        );
        assert!("memo".parse::<ActivityFilter>().is_err());
    }
}
