//! Narrative synthesis: three sequential generative calls with distinct
//! role framings. The community verdict goes to its own provider; the rest
//! use the primary one.

use super::prompts;
use super::token_info::TokenSnapshot;
use crate::data::DataResult;
use crate::dyor::DyorReport;
use crate::llm::TextGenerator;
use crate::orchestrator::refresh::UpdatedPlatform;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub struct AnalysisSynthesizer {
    llm: Arc<dyn TextGenerator>,
    community_llm: Arc<dyn TextGenerator>,
}

impl AnalysisSynthesizer {
    pub fn new(llm: Arc<dyn TextGenerator>, community_llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm, community_llm }
    }

    /// Quant-trader verdict over the aggregated snapshot, at most 4 sentences.
    pub async fn technical_analysis(&self, snapshot: &TokenSnapshot) -> DataResult<String> {
        info!("Requesting technical analysis for {}", snapshot.symbol);
        self.llm
            .complete(
                prompts::TECHNICAL_LORE,
                &prompts::token_info_prompt(snapshot),
            )
            .await
    }

    /// Community-sentiment verdict. Only symbol and address are shared with
    /// the community provider.
    pub async fn community_analysis(&self, symbol: &str, address: &str) -> DataResult<String> {
        info!("Requesting community analysis for {}", symbol);
        self.community_llm
            .complete(
                prompts::COMMUNITY_LORE,
                &prompts::community_prompt(symbol, address),
            )
            .await
    }

    /// Final 11-field investment verdict combining both prior analyses.
    pub async fn final_verdict(
        &self,
        snapshot: &TokenSnapshot,
        technical: &str,
        community: &str,
    ) -> DataResult<String> {
        info!("Requesting final verdict for {}", snapshot.symbol);
        self.llm
            .complete(
                prompts::VERDICT_LORE,
                &prompts::verdict_prompt(snapshot, technical, community),
            )
            .await
    }

    /// Development-status narrative over the repo listing, at most 5 sentences.
    pub async fn development_status(&self, repo_listing: &str) -> DataResult<String> {
        let lore = prompts::development_status_lore(&Utc::now().format("%Y-%m-%d").to_string());
        self.llm.complete(&lore, repo_listing).await
    }

    /// Refreshed conclusion combining the original report, new signals and
    /// the previous AI report when one exists.
    pub async fn final_conclusion(
        &self,
        report: &DyorReport,
        development_status: &str,
        platforms: &[UpdatedPlatform],
        ticker_analytic: &str,
        last_ai_report: Option<&Value>,
    ) -> DataResult<String> {
        self.llm
            .complete(
                prompts::FINAL_CONCLUSION_LORE,
                &prompts::final_conclusion_prompt(
                    report,
                    development_status,
                    platforms,
                    ticker_analytic,
                    last_ai_report,
                ),
            )
            .await
    }
}
