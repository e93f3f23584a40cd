pub mod activity;
pub mod cache;
pub mod domain;
pub mod memory;
pub mod ports;
pub mod store;

pub use activity::{filter_activities, format_relative_time, humanize_template_name, ActivityAggregator};
pub use cache::{DocumentCache, RecentList, DEFAULT_CAPACITY};
pub use domain::{
    Activity, ActivityCounts, ActivityFilter, ActivityKind, AnalysisResult, AnalyzedDocument,
    AnalyzedDocumentStats, ConversationSummary, DocumentStats, GeneratedLetter, LetterStats,
    NewAnalyzedDocument, NewGeneratedLetter,
};
pub use memory::MemoryStore;
pub use ports::{ChatHistoryService, KeyValueStore, PortError, PortResult};
pub use store::{KeyedStore, Namespace};
