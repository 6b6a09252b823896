// Candidate screening: field extraction, AI or rule-based scoring, ranking.
// All provider calls go through llm_client via the orchestrator.

pub mod extractor;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod ranking;
pub mod response_parser;
pub mod rule_scorer;
