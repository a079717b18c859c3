//! Token snapshot aggregation and the three-step narrative synthesis.

pub mod prompts;
pub mod synthesizer;
pub mod token_info;
pub mod verdict;

pub use synthesizer::AnalysisSynthesizer;
pub use token_info::{fetch_token_snapshot, normalize_chain, TokenSnapshot};
