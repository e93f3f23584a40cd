pub mod chat_history;
pub mod file_store;

pub use chat_history::HttpChatHistoryAdapter;
pub use file_store::JsonFileStore;
