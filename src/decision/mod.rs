// Trade decisions from an LLM chat-completion API
pub mod openai;
pub mod prompt;

pub use openai::{parse_decision, OpenAIDecisionEngine};
pub use prompt::system_prompt;

use crate::models::Decision;
use crate::Result;

/// Turns the aggregated market context into a trade decision
///
/// One attempt per tick; any error aborts the tick before execution.
#[allow(async_fn_in_trait)]
pub trait DecisionEngine {
    async fn decide(&self, payload: &serde_json::Value) -> Result<Decision>;
}
