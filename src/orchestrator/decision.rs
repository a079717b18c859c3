//! Legacy single-document decision path: snapshot → technical → community →
//! verdict → flattened analysis record with deltas against the prior run.

use super::AppContext;
use crate::analysis::verdict::{build_analysis_record, parse_verdict};
use crate::analysis::{fetch_token_snapshot, AnalysisSynthesizer};
use crate::data::{DataError, DataResult};
use crate::store::TokenAnalysisRecord;
use std::sync::Arc;
use tracing::info;

pub struct DecisionOrchestrator {
    ctx: Arc<AppContext>,
}

impl DecisionOrchestrator {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Produce and upsert one decision record for (address, chain).
    /// Price/holder deltas are computed against the record read immediately
    /// before the upsert.
    pub async fn decide(&self, chain: &str, address: &str) -> DataResult<TokenAnalysisRecord> {
        info!("⚖️  Running decision for {} on {}", address, chain);
        let previous = self.ctx.store.latest_analysis(address, chain).await?;

        let synthesizer =
            AnalysisSynthesizer::new(self.ctx.llm.clone(), self.ctx.community_llm.clone());

        let snapshot = fetch_token_snapshot(
            self.ctx.market.as_ref(),
            self.ctx.onchain.as_ref(),
            address,
            chain,
        )
        .await?;

        let technical = synthesizer.technical_analysis(&snapshot).await?;
        let community = synthesizer
            .community_analysis(&snapshot.symbol, &snapshot.address)
            .await?;
        let verdict_text = synthesizer
            .final_verdict(&snapshot, &technical, &community)
            .await?;

        let parsed = parse_verdict(&verdict_text);
        if !parsed.contains_key("Final decision") || !parsed.contains_key("Token name") {
            return Err(DataError::parse_error(
                "investment verdict",
                "required fields missing from verdict",
                verdict_text,
            ));
        }

        let record = build_analysis_record(&parsed, address, chain, previous.as_ref());
        self.ctx.store.upsert_analysis(&record).await?;

        info!(
            "Decision stored for {}: {} ({})",
            record.token_symbol, record.final_decision, record.final_confidence
        );
        Ok(record)
    }
}
