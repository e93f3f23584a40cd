//! crates/legal_welfare_core/src/activity.rs
//!
//! Builds the unified recent-activity timeline from remote chat conversations and
//! the locally cached documents and letters.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::cache::DocumentCache;
use crate::domain::{Activity, ActivityFilter, ConversationSummary};
use crate::ports::ChatHistoryService;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;

//=========================================================================================
// Formatting Helpers
//=========================================================================================

/// Formats `at` relative to `now`, e.g. "5 minutes ago", "Yesterday" or "3/14/2024".
///
/// All thresholds use whole (floored) units of the elapsed time.
pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_ms = (now - at).num_milliseconds();
    let diff_mins = diff_ms.div_euclid(MINUTE_MS);
    let diff_hours = diff_ms.div_euclid(HOUR_MS);
    let diff_days = diff_ms.div_euclid(DAY_MS);

    if diff_mins < 60 {
        if diff_mins <= 1 {
            "Just now".to_string()
        } else {
            format!("{} minutes ago", diff_mins)
        }
    } else if diff_hours < 24 {
        if diff_hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", diff_hours)
        }
    } else if diff_days == 1 {
        "Yesterday".to_string()
    } else if diff_days < 7 {
        format!("{} days ago", diff_days)
    } else {
        at.format("%-m/%-d/%Y").to_string()
    }
}

/// `"appeal_letter"` -> `"Appeal Letter"`
pub fn humanize_template_name(template_name: &str) -> String {
    static WORD_START: OnceLock<Regex> = OnceLock::new();
    let word_start = WORD_START.get_or_init(|| Regex::new(r"\b\w").expect("word start pattern"));

    let spaced = template_name.replace('_', " ");
    word_start
        .replace_all(&spaced, |caps: &Captures| caps[0].to_uppercase())
        .into_owned()
}

/// Parses a backend timestamp: RFC 3339, or naive ISO-8601 read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn filter_activities(activities: Vec<Activity>, filter: ActivityFilter) -> Vec<Activity> {
    activities.into_iter().filter(|a| filter.matches(a)).collect()
}

//=========================================================================================
// ActivityAggregator
//=========================================================================================

#[derive(Clone)]
pub struct ActivityAggregator {
    cache: DocumentCache,
    chat_history: Option<Arc<dyn ChatHistoryService>>,
}

impl ActivityAggregator {
    pub fn new(cache: DocumentCache, chat_history: Option<Arc<dyn ChatHistoryService>>) -> Self {
        Self {
            cache,
            chat_history,
        }
    }

    /// All activities for a user, most recent first. Never fails: a chat backend
    /// problem only removes the chat entries from the result.
    pub async fn get_all_activities(&self, user_id: &str, token: Option<&str>) -> Vec<Activity> {
        self.get_all_activities_at(user_id, token, Utc::now()).await
    }

    /// Same as `get_all_activities`, with relative times computed against `now`.
    pub async fn get_all_activities_at(
        &self,
        user_id: &str,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<Activity> {
        let mut activities = self.chat_activities(token, now).await;

        activities.extend(self.cache.analyzed_documents(user_id).into_iter().map(|doc| {
            Activity::document(
                doc.id,
                format!("Analyzed: {}", doc.filename),
                format_relative_time(doc.analyzed_at, now),
                doc.analyzed_at,
            )
        }));

        activities.extend(self.cache.generated_letters(user_id).into_iter().map(|letter| {
            Activity::letter(
                letter.id,
                format!("Generated: {}", humanize_template_name(&letter.template_name)),
                format_relative_time(letter.generated_at, now),
                letter.generated_at,
            )
        }));

        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!("Aggregated {} activities for user {}", activities.len(), user_id);
        activities
    }

    async fn chat_activities(&self, token: Option<&str>, now: DateTime<Utc>) -> Vec<Activity> {
        let (Some(token), Some(chat_history)) = (token.filter(|t| !t.is_empty()), &self.chat_history)
        else {
            return Vec::new();
        };

        match chat_history.list_conversations(token).await {
            Ok(conversations) => conversations
                .into_iter()
                .filter_map(|conv| conversation_activity(conv, now))
                .collect(),
            Err(e) => {
                warn!("Failed to fetch chat conversations: {}", e);
                Vec::new()
            }
        }
    }
}

fn conversation_activity(conv: ConversationSummary, now: DateTime<Utc>) -> Option<Activity> {
    let Some(updated_at) = parse_timestamp(&conv.updated_at) else {
        warn!(
            "Skipping conversation {} with unreadable updated_at '{}'",
            conv.id, conv.updated_at
        );
        return None;
    };
    Some(Activity::chat(
        conv.id,
        conv.title,
        format_relative_time(updated_at, now),
        updated_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityCounts, ActivityKind};
    use crate::memory::MemoryStore;
    use crate::ports::{KeyValueStore, PortError, PortResult};
    use crate::store::KeyedStore;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    struct FakeChatHistory {
        conversations: Vec<ConversationSummary>,
        seen_tokens: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatHistoryService for FakeChatHistory {
        async fn list_conversations(&self, token: &str) -> PortResult<Vec<ConversationSummary>> {
            self.seen_tokens.lock().unwrap().push(token.to_string());
            Ok(self.conversations.clone())
        }
    }

    struct FailingChatHistory;

    #[async_trait]
    impl ChatHistoryService for FailingChatHistory {
        async fn list_conversations(&self, _token: &str) -> PortResult<Vec<ConversationSummary>> {
            Err(PortError::Unauthorized)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn seeded_backend() -> Arc<MemoryStore> {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(
                "user_u1_analyzed_documents",
                r#"[{"id":"doc_2","filename":"lease.pdf","analyzedAt":"2024-06-15T11:00:00.000Z","result":{"success":true}},
                    {"id":"doc_1","filename":"policy.docx","analyzedAt":"2024-06-10T09:00:00.000Z","result":{"biasedCount":0,"success":true}}]"#,
            )
            .unwrap();
        backend
            .set(
                "user_u1_letters_generated",
                r#"[{"id":"letter_1","filename":"a.docx","templateName":"housing_benefit_appeal","generatedAt":"2024-06-14T12:00:00.000Z","success":true}]"#,
            )
            .unwrap();
        backend
    }

    fn aggregator(chat: Option<Arc<dyn ChatHistoryService>>) -> ActivityAggregator {
        let cache = DocumentCache::new(KeyedStore::new(seeded_backend()));
        ActivityAggregator::new(cache, chat)
    }

    fn conversation(id: &str, updated_at: &str) -> ConversationSummary {
        ConversationSummary {
            id: id.to_string(),
            title: format!("Conversation {}", id),
            updated_at: updated_at.to_string(),
        }
    }

    #[test]
    fn relative_time_thresholds() {
        let t = now();
        assert_eq!(format_relative_time(t - Duration::seconds(30), t), "Just now");
        assert_eq!(format_relative_time(t - Duration::seconds(119), t), "Just now");
        assert_eq!(format_relative_time(t - Duration::minutes(5), t), "5 minutes ago");
        assert_eq!(format_relative_time(t - Duration::minutes(59), t), "59 minutes ago");
        assert_eq!(format_relative_time(t - Duration::minutes(61), t), "1 hour ago");
        assert_eq!(format_relative_time(t - Duration::minutes(90), t), "1 hour ago");
        assert_eq!(format_relative_time(t - Duration::hours(5), t), "5 hours ago");
        assert_eq!(format_relative_time(t - Duration::hours(25), t), "Yesterday");
        assert_eq!(format_relative_time(t - Duration::days(3), t), "3 days ago");
        assert_eq!(format_relative_time(t - Duration::days(10), t), "6/5/2024");
    }

    #[test]
    fn future_times_read_as_just_now() {
        let t = now();
        assert_eq!(format_relative_time(t + Duration::hours(2), t), "Just now");
    }

    #[test]
    fn template_names_are_humanized() {
        assert_eq!(humanize_template_name("housing_benefit_appeal"), "Housing Benefit Appeal");
        assert_eq!(humanize_template_name("complaint"), "Complaint");
        assert_eq!(humanize_template_name("form_2b"), "Form 2b");
    }

    #[test]
    fn timestamps_accept_rfc3339_and_naive_iso() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-06-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-06-15T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-06-15T10:30:00.000000"), Some(expected));
        assert_eq!(parse_timestamp("last tuesday"), None);
    }

    #[tokio::test]
    async fn without_token_only_local_records_are_returned() {
        let chat = Arc::new(FakeChatHistory {
            conversations: vec![conversation("c1", "2024-06-15T11:59:00Z")],
            seen_tokens: Mutex::new(Vec::new()),
        });
        let agg = aggregator(Some(chat.clone()));

        let activities = agg.get_all_activities_at("u1", None, now()).await;
        assert_eq!(activities.len(), 3);
        assert!(activities.iter().all(|a| a.kind != ActivityKind::Chat));
        assert!(chat.seen_tokens.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_chat_backend_keeps_local_records() {
        let agg = aggregator(Some(Arc::new(FailingChatHistory)));
        let activities = agg.get_all_activities_at("u1", Some("bad-token"), now()).await;
        let kinds: Vec<_> = activities.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![ActivityKind::Document, ActivityKind::Letter, ActivityKind::Document]
        );
    }

    #[tokio::test]
    async fn mixed_sources_are_sorted_newest_first() {
        let chat = Arc::new(FakeChatHistory {
            conversations: vec![
                conversation("old", "2024-06-01T08:00:00"),
                conversation("new", "2024-06-15T11:59:30Z"),
                conversation("broken", "not a date"),
            ],
            seen_tokens: Mutex::new(Vec::new()),
        });
        let agg = aggregator(Some(chat.clone()));

        let activities = agg.get_all_activities_at("u1", Some("tok"), now()).await;
        let ids: Vec<_> = activities.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["chat_new", "doc_2", "letter_1", "doc_1", "chat_old"]);
        assert!(activities
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp));
        assert_eq!(chat.seen_tokens.lock().unwrap().as_slice(), ["tok".to_string()]);

        assert_eq!(activities[0].conversation_id(), Some("new"));
        assert_eq!(activities[0].time, "Just now");
        assert_eq!(activities[1].title, "Analyzed: lease.pdf");
        assert_eq!(activities[1].document_id(), Some("doc_2"));
        assert_eq!(activities[1].time, "1 hour ago");
        assert_eq!(activities[2].title, "Generated: Housing Benefit Appeal");
        assert_eq!(activities[2].letter_id(), Some("letter_1"));
        assert_eq!(activities[2].time, "Yesterday");
        assert_eq!(activities[4].time, "6/1/2024");
    }

    #[tokio::test]
    async fn unknown_user_with_no_chat_service_is_empty() {
        let agg = aggregator(None);
        assert!(agg.get_all_activities("nobody", Some("tok")).await.is_empty());
    }

    #[tokio::test]
    async fn filtering_and_counts_follow_kinds() {
        let agg = aggregator(None);
        let activities = agg.get_all_activities_at("u1", None, now()).await;

        let counts = ActivityCounts::tally(&activities);
        assert_eq!(counts.all, 3);
        assert_eq!(counts.document, 2);
        assert_eq!(counts.letter, 1);
        assert_eq!(counts.chat, 0);

        let letters = filter_activities(activities, ActivityFilter::Kind(ActivityKind::Letter));
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].id, "letter_1");
    }
}
