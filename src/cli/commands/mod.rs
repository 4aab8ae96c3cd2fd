//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod forget;
mod history;
mod ingest;
mod list;
mod search;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use forget::run_forget;
pub use history::run_history;
pub use ingest::run_ingest;
pub use list::run_list;
pub use search::run_search;
