//! End-to-end pipeline test over stubbed vendors: flatten a real .docx,
//! parse it with a fixed generator, then run the full refresh.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::io::{Cursor, Write};
use std::sync::Arc;

use tokenscout::analysis::token_info::NO_LIQUIDITY_SENTINEL;
use tokenscout::data::{
    DataError, DataResult, FollowerLookup, MaxPricePoint, OnchainSource, PairPrice, PlatformKind,
    RepoActivitySource, RepoInfo, TokenDataSource, TokenMetadata,
};
use tokenscout::dyor::ReportParser;
use tokenscout::llm::TextGenerator;
use tokenscout::orchestrator::{AppContext, RefreshOrchestrator};
use tokenscout::storage::LocalStorage;
use tokenscout::store::TokenStore;

const PARSED_REPORT: &str = r#"{
    "document_title": "Acme Protocol DYOR",
    "general_info": {
        "project_name": "Acme Protocol",
        "token_info": {"token_chain": "base", "token_address": "0xabc"},
        "github_url": "https://github.com/acme-protocol"
    },
    "summary": "A modular settlement layer.",
    "social_media": {"platforms": [
        {"name": "Twitter", "url": "https://x.com/acme", "followers": 1000},
        {"name": "Telegram", "url": "https://t.me/acme", "followers": 500}
    ]}
}"#;

/// Generator that answers the extraction call with a canned report and
/// every other call with a role-tagged line.
struct ScriptedGenerator;

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, system_role: &str, _user_prompt: &str) -> DataResult<String> {
        if system_role.contains("report parser") {
            Ok(PARSED_REPORT.to_string())
        } else if system_role.contains("quant trader") {
            Ok("Concentrated holders and thin liquidity.".to_string())
        } else if system_role.contains("GitHub") {
            Ok("Active development across two repositories.".to_string())
        } else {
            Ok("Hold off until liquidity deepens.".to_string())
        }
    }
}

struct StubMarket;

#[async_trait]
impl TokenDataSource for StubMarket {
    async fn token_metadata(&self, address: &str, _chain: &str) -> DataResult<TokenMetadata> {
        Ok(TokenMetadata {
            name: "Acme Protocol".to_string(),
            symbol: "ACME".to_string(),
            address: address.to_string(),
            twitter: Some("https://x.com/acme".to_string()),
            telegram: None,
            website: None,
            total_supply_formatted: 1_000_000_000.0,
        })
    }

    async fn top_holder_percentages(&self, _address: &str, _chain: &str) -> DataResult<Vec<f64>> {
        Ok(vec![8.4, 3.1, 1.9])
    }

    async fn pair_price(&self, _address: &str, _chain: &str) -> DataResult<PairPrice> {
        // No liquidity: the snapshot must carry the sentinel, not null
        Ok(PairPrice {
            usd_price: None,
            pair_total_liquidity_usd: None,
        })
    }
}

struct StubOnchain;

#[async_trait]
impl OnchainSource for StubOnchain {
    async fn holders_count(
        &self,
        _address: &str,
        _date: NaiveDate,
        _network: &str,
    ) -> DataResult<u64> {
        Ok(4211)
    }

    async fn max_price(
        &self,
        _address: &str,
        _before: NaiveDate,
        _network: &str,
    ) -> DataResult<MaxPricePoint> {
        Ok(MaxPricePoint {
            high: 0.081,
            at: "2025-04-02T09:00:00Z".to_string(),
        })
    }
}

struct StubGithub;

#[async_trait]
impl RepoActivitySource for StubGithub {
    async fn repos_with_activity(&self, account: &str) -> DataResult<Vec<RepoInfo>> {
        assert_eq!(account, "acme-protocol");
        Ok(vec![RepoInfo {
            name: "core".to_string(),
            full_name: "acme-protocol/core".to_string(),
            stars: 42,
            last_commit: "2025-06-01T12:00:00Z"
                .parse()
                .expect("valid commit timestamp"),
            description: Some("Settlement engine".to_string()),
            language: Some("Rust".to_string()),
            is_fork: false,
            default_branch: "main".to_string(),
        }])
    }
}

struct StubSocials;

#[async_trait]
impl FollowerLookup for StubSocials {
    async fn follower_count(&self, platform: PlatformKind, handle: &str) -> DataResult<u64> {
        match platform {
            PlatformKind::Twitter => {
                assert_eq!(handle, "acme");
                Ok(1500)
            }
            PlatformKind::Telegram => Err(DataError::Internal("scrape failed".to_string())),
            _ => Ok(0),
        }
    }
}

fn stub_context() -> Arc<AppContext> {
    let pool = sqlx::PgPool::connect_lazy("postgresql://localhost/test")
        .expect("lazy pool for tests");
    Arc::new(AppContext {
        store: TokenStore::new(pool),
        storage: LocalStorage::new("target/test-uploads"),
        market: Arc::new(StubMarket),
        onchain: Arc::new(StubOnchain),
        github: Arc::new(StubGithub),
        socials: Arc::new(StubSocials),
        llm: Arc::new(ScriptedGenerator),
        community_llm: Arc::new(ScriptedGenerator),
    })
}

fn build_docx() -> Vec<u8> {
    let document = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:p>
      <w:r><w:t>Acme Protocol research. Source code at </w:t></w:r>
      <w:hyperlink r:id="rId1"><w:r><w:t>GitHub</w:t></w:r></w:hyperlink>
    </w:p>
    <w:p><w:r><w:t>Community lives on Twitter and Telegram.</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
    let rels = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="hyperlink" Target="https://github.com/acme-protocol" TargetMode="External"/>
</Relationships>"#;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer
        .start_file("word/document.xml", options)
        .expect("start document part");
    writer
        .write_all(document.as_bytes())
        .expect("write document part");
    writer
        .start_file("word/_rels/document.xml.rels", options)
        .expect("start rels part");
    writer.write_all(rels.as_bytes()).expect("write rels part");
    writer.finish().expect("finish archive").into_inner()
}

#[tokio::test]
async fn test_parse_then_refresh_end_to_end() {
    let ctx = stub_context();

    // Parse a real .docx through the stub generator
    let parser = ReportParser::new(ctx.llm.clone());
    let report = parser
        .parse_docx(&build_docx())
        .await
        .expect("document should parse");
    assert_eq!(report.project_name(), Some("Acme Protocol"));

    // Refresh the parsed report against the stub vendors
    let orchestrator = RefreshOrchestrator::new(ctx);
    let refreshed = orchestrator
        .refresh_report(&report, report.token_address(), report.token_chain(), None)
        .await
        .expect("refresh should succeed");

    // Technical stage ran against the live snapshot
    assert_eq!(
        refreshed.ticker_analytic,
        "Concentrated holders and thin liquidity."
    );
    let snapshot = refreshed.token_info.as_ref().expect("snapshot present");
    assert_eq!(snapshot.holders_count, 4211);
    assert_eq!(snapshot.top_holders, "8.4;3.1;1.9");
    assert_eq!(snapshot.current_price, NO_LIQUIDITY_SENTINEL);

    // Repo activity flowed into the listing and the narrative
    assert!(refreshed.repos_info.contains("acme-protocol/core"));
    assert_eq!(
        refreshed.updated_development_status,
        "Active development across two repositories."
    );

    // Social refresh kept both entries; the failed Telegram fetch degraded
    // to zero followers
    assert_eq!(refreshed.updated_platforms.len(), 2);
    assert_eq!(refreshed.updated_platforms[0].followers, 1500);
    assert_eq!(refreshed.updated_platforms[1].followers, 0);

    // Deterministic social deltas against the prior report
    assert_eq!(
        refreshed.social_conclusion[0]["twitter"]["followers"]["change"],
        500
    );
    assert_eq!(
        refreshed.social_conclusion[1]["telegram"]["followers"]["change"],
        -500
    );

    assert_eq!(refreshed.final_conclusion, "Hold off until liquidity deepens.");
}
