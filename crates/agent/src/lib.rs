pub mod explain;
pub mod live_search;
pub mod llm;

pub use explain::GroqExplanationWriter;
pub use live_search::GroqLiveSearch;
pub use llm::{GroqClient, LlmClient};
