// Contract risk analysis and the portfolio dashboard.
// All LLM calls go through llm_client.

pub mod analysis;
pub mod coalesce;
pub mod dashboard;
pub mod handlers;
pub mod prompts;
