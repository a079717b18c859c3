//! Refresh pipeline: re-fetch live signals for a previously parsed report,
//! merge them with the prior state and emit a new immutable AI report.
//!
//! Stage order: token info → technical analysis → repo activity → social
//! followers → conclusion → persist. A failure in any stage aborts the rest
//! of the refresh; nothing partial is ever written.

use super::AppContext;
use crate::analysis::{fetch_token_snapshot, normalize_chain, AnalysisSynthesizer, TokenSnapshot};
use crate::data::{github::format_repo_listing, DataError, DataResult, FollowerLookup, PlatformKind};
use crate::data::social::strip_handle;
use crate::dyor::schema::PlatformEntry;
use crate::dyor::{DyorReport, ReportParser};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Substitutes for the technical analysis when a project is pre-launch and
/// no address/chain is known yet.
pub const NO_TOKEN_INFO_SENTINEL: &str = "No token info available.";

/// One platform entry after the follower refresh. Every entry of the
/// original report reappears here, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatedPlatform {
    pub name: Option<String>,
    pub url: Option<String>,
    pub followers: u64,
}

/// The synthesized bundle persisted as one AIReport row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedReport {
    pub updated_development_status: String,
    pub updated_platforms: Vec<UpdatedPlatform>,
    pub social_conclusion: Value,
    pub final_conclusion: String,
    pub ticker_analytic: String,
    pub token_info: Option<TokenSnapshot>,
    pub repos_info: String,
}

/// Result of ingesting an uploaded document
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub input_report: DyorReport,
    pub updated_report: RefreshedReport,
}

pub struct RefreshOrchestrator {
    ctx: Arc<AppContext>,
}

impl RefreshOrchestrator {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Parse an uploaded document, record the token and its research input,
    /// then run a full refresh and persist the resulting AI report.
    pub async fn ingest_document(&self, bytes: &[u8]) -> DataResult<IngestOutcome> {
        let parser = ReportParser::new(self.ctx.llm.clone());
        let report = parser.parse_docx(bytes).await?;

        let project_name = report
            .project_name()
            .ok_or_else(|| {
                DataError::Validation("parsed report has no project name".to_string())
            })?
            .to_string();
        let address = report.token_address().map(str::to_string);
        let chain = report.token_chain().map(str::to_string);

        info!("📥 Ingesting research document for {}", project_name);
        let token_id = self
            .ctx
            .store
            .upsert_token(&project_name, address.as_deref(), chain.as_deref())
            .await?;

        let data = serde_json::to_value(&report)?;
        self.ctx
            .store
            .insert_research_input(
                token_id,
                &project_name,
                address.as_deref(),
                chain.as_deref(),
                &data,
                None,
            )
            .await?;

        let updated = self
            .refresh_report(&report, address.as_deref(), chain.as_deref(), None)
            .await?;
        self.persist_report(token_id, &project_name, address.as_deref(), &updated)
            .await?;

        Ok(IngestOutcome {
            input_report: report,
            updated_report: updated,
        })
    }

    /// Refresh a known token from its latest stored research input and the
    /// previous AI report, then persist a new AI report.
    pub async fn refresh_token_by_name(&self, name: &str) -> DataResult<RefreshedReport> {
        let token = self
            .ctx
            .store
            .get_token_by_name(name)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("token {name}")))?;

        let input = self
            .ctx
            .store
            .latest_research_input(token.id)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("research input for token {name}")))?;
        let report: DyorReport = serde_json::from_value(input.data)?;

        let last_ai = self.ctx.store.latest_ai_report(token.id).await?;

        let updated = self
            .refresh_report(
                &report,
                token.token_address.as_deref(),
                token.token_chain.as_deref(),
                last_ai.as_ref().map(|r| &r.data),
            )
            .await?;

        self.persist_report(
            token.id,
            &token.token_name,
            token.token_address.as_deref(),
            &updated,
        )
        .await?;
        self.ctx.store.touch_last_research(token.id).await?;

        Ok(updated)
    }

    /// Run every stage of the refresh without persisting anything.
    pub async fn refresh_report(
        &self,
        report: &DyorReport,
        address: Option<&str>,
        chain: Option<&str>,
        last_ai_report: Option<&Value>,
    ) -> DataResult<RefreshedReport> {
        let synthesizer =
            AnalysisSynthesizer::new(self.ctx.llm.clone(), self.ctx.community_llm.clone());

        // Token info and technical analysis are skipped for pre-launch
        // projects; no market vendor is contacted in that case.
        let (token_info, ticker_analytic) = match (address, chain) {
            (Some(address), Some(chain)) => {
                info!("📊 Fetching token info for {} on {}", address, chain);
                let snapshot = fetch_token_snapshot(
                    self.ctx.market.as_ref(),
                    self.ctx.onchain.as_ref(),
                    address,
                    &normalize_chain(chain),
                )
                .await?;
                let ticker = synthesizer.technical_analysis(&snapshot).await?;
                (Some(snapshot), ticker)
            }
            _ => {
                info!("Token address/chain unknown, skipping market stages");
                (None, NO_TOKEN_INFO_SENTINEL.to_string())
            }
        };

        info!("🛠️  Fetching repository activity");
        let repos_info = match github_account_from_url(report.general_info.github_url.as_deref())
        {
            Some(account) => {
                let repos = self.ctx.github.repos_with_activity(&account).await?;
                format_repo_listing(&repos)
            }
            None => format_repo_listing(&[]),
        };
        let updated_development_status = synthesizer.development_status(&repos_info).await?;

        info!("👥 Refreshing social follower counts");
        let updated_platforms =
            update_platforms(self.ctx.socials.as_ref(), &report.social_media.platforms).await;
        let social_conclusion =
            social_deltas(&report.social_media.platforms, &updated_platforms);

        info!("📝 Synthesizing conclusion");
        let final_conclusion = synthesizer
            .final_conclusion(
                report,
                &updated_development_status,
                &updated_platforms,
                &ticker_analytic,
                last_ai_report,
            )
            .await?;

        Ok(RefreshedReport {
            updated_development_status,
            updated_platforms,
            social_conclusion,
            final_conclusion,
            ticker_analytic,
            token_info,
            repos_info,
        })
    }

    async fn persist_report(
        &self,
        token_id: Uuid,
        token_name: &str,
        token_address: Option<&str>,
        updated: &RefreshedReport,
    ) -> DataResult<()> {
        let data = serde_json::to_value(updated)?;
        self.ctx
            .store
            .insert_ai_report(token_id, token_name, token_address, &data)
            .await?;
        Ok(())
    }
}

/// Resolve the source-hosting account name from the report's GitHub URL.
pub fn github_account_from_url(url: Option<&str>) -> Option<String> {
    let account = url?
        .replace("https://github.com/", "")
        .trim_matches('/')
        .to_string();
    if account.is_empty() {
        None
    } else {
        Some(account)
    }
}

/// Re-fetch follower counts for every platform entry. The result preserves
/// every original entry in order; an unrecognized platform or a failed
/// fetch degrades that entry to 0 followers.
pub async fn update_platforms(
    socials: &dyn FollowerLookup,
    platforms: &[PlatformEntry],
) -> Vec<UpdatedPlatform> {
    let mut updated = Vec::with_capacity(platforms.len());
    for platform in platforms {
        let kind = PlatformKind::from_name(platform.name.as_deref().unwrap_or_default());
        let url = platform.url.as_deref().unwrap_or_default();
        let handle = strip_handle(kind, url);

        let followers = if kind == PlatformKind::Other {
            0
        } else {
            match socials.follower_count(kind, &handle).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(
                        "Follower fetch for {:?} handle {} failed, degrading to 0: {}",
                        kind, handle, e
                    );
                    0
                }
            }
        };

        updated.push(UpdatedPlatform {
            name: platform.name.clone(),
            url: platform.url.clone(),
            followers,
        });
    }
    updated
}

/// Old/new/change follower counts per platform, computed from the prior
/// report against the refreshed list. Deterministic, no generative call.
pub fn social_deltas(original: &[PlatformEntry], updated: &[UpdatedPlatform]) -> Value {
    let entries: Vec<Value> = original
        .iter()
        .zip(updated)
        .map(|(before, after)| {
            let name = before
                .name
                .as_deref()
                .unwrap_or("unknown")
                .to_lowercase();
            let old = before.followers.unwrap_or(0);
            let new = after.followers as i64;
            let mut entry = serde_json::Map::new();
            entry.insert(
                name,
                serde_json::json!({"followers": {"old": old, "new": new, "change": new - old}}),
            );
            Value::Object(entry)
        })
        .collect();
    Value::Array(entries)
}
