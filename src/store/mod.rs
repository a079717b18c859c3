//! Persistence layer: token identity plus append-only research history.
//! Token identity is canonical by case-insensitive name; history tables are
//! insert-only and read newest-first.

use crate::data::DataResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Identity anchor for a research subject. Address and chain are optional:
/// pre-launch projects have neither.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: Uuid,
    pub token_name: String,
    pub token_address: Option<String>,
    pub token_chain: Option<String>,
    pub last_research_at: DateTime<Utc>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Immutable snapshot of one parsed source document
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResearchInput {
    pub id: Uuid,
    pub token_id: Uuid,
    pub token_name: String,
    pub token_address: Option<String>,
    pub token_chain: Option<String>,
    pub data: Value,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Immutable snapshot of one refresh cycle's synthesized output
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AiReport {
    pub id: Uuid,
    pub token_id: Uuid,
    pub token_name: String,
    pub token_address: Option<String>,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

/// Flattened single-document verdict, one per (address, chain)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenAnalysisRecord {
    pub id: Uuid,
    pub token_name: String,
    pub token_symbol: String,
    pub token_address: String,
    pub token_chain: String,
    pub current_price: String,
    pub current_holders_count: String,
    pub technical_analysis: String,
    pub community_analysis: String,
    pub final_decision: String,
    pub final_confidence: String,
    pub explanation: String,
    pub price_change: Option<String>,
    pub holder_change: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Uploaded-file metadata backing the upload and chat routes
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// Data access over the token/research tables
#[derive(Clone)]
pub struct TokenStore {
    pool: PgPool,
}

impl TokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Single conditional insert: creates the token on first sight of the
    /// name, otherwise touches the research timestamp and backfills
    /// address/chain if they were unknown. Atomic under concurrent
    /// refreshes, so the same project can never get two identity rows.
    pub async fn upsert_token(
        &self,
        name: &str,
        address: Option<&str>,
        chain: Option<&str>,
    ) -> DataResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO tokens (id, token_name, token_address, token_chain, last_research_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (lower(token_name)) DO UPDATE SET
                token_address = COALESCE(tokens.token_address, EXCLUDED.token_address),
                token_chain = COALESCE(tokens.token_chain, EXCLUDED.token_chain),
                last_research_at = now()
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(address)
        .bind(chain)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn get_token_by_name(&self, name: &str) -> DataResult<Option<Token>> {
        let token = sqlx::query_as::<_, Token>(
            "SELECT * FROM tokens WHERE lower(token_name) = lower($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    pub async fn get_token_by_address(
        &self,
        address: &str,
        chain: &str,
    ) -> DataResult<Option<Token>> {
        let token = sqlx::query_as::<_, Token>(
            "SELECT * FROM tokens WHERE token_address = $1 AND token_chain = $2",
        )
        .bind(address)
        .bind(chain)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    pub async fn touch_last_research(&self, token_id: Uuid) -> DataResult<()> {
        sqlx::query("UPDATE tokens SET last_research_at = now() WHERE id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_tokens(
        &self,
        name_filter: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DataResult<Vec<Token>> {
        let tokens = sqlx::query_as::<_, Token>(
            r#"
            SELECT * FROM tokens
            WHERE ($1::text IS NULL OR token_name ILIKE '%' || $1 || '%')
            ORDER BY last_research_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(name_filter)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(tokens)
    }

    pub async fn count_tokens(&self, name_filter: Option<&str>) -> DataResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM tokens WHERE ($1::text IS NULL OR token_name ILIKE '%' || $1 || '%')",
        )
        .bind(name_filter)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Append one research input row; history is never updated in place.
    pub async fn insert_research_input(
        &self,
        token_id: Uuid,
        token_name: &str,
        token_address: Option<&str>,
        token_chain: Option<&str>,
        data: &Value,
        metadata: Option<&Value>,
    ) -> DataResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO research_inputs (id, token_id, token_name, token_address, token_chain, data, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(token_id)
        .bind(token_name)
        .bind(token_address)
        .bind(token_chain)
        .bind(data)
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        info!("Recorded research input {} for token {}", id, token_id);
        Ok(id)
    }

    pub async fn latest_research_input(
        &self,
        token_id: Uuid,
    ) -> DataResult<Option<ResearchInput>> {
        let input = sqlx::query_as::<_, ResearchInput>(
            "SELECT * FROM research_inputs WHERE token_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(input)
    }

    pub async fn list_research_inputs(
        &self,
        token_id: Uuid,
        limit: i64,
    ) -> DataResult<Vec<ResearchInput>> {
        let inputs = sqlx::query_as::<_, ResearchInput>(
            "SELECT * FROM research_inputs WHERE token_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(token_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(inputs)
    }

    /// Append one AI report row; prior reports are never mutated.
    pub async fn insert_ai_report(
        &self,
        token_id: Uuid,
        token_name: &str,
        token_address: Option<&str>,
        data: &Value,
    ) -> DataResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO ai_reports (id, token_id, token_name, token_address, data)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(token_id)
        .bind(token_name)
        .bind(token_address)
        .bind(data)
        .execute(&self.pool)
        .await?;

        info!("Recorded AI report {} for token {}", id, token_id);
        Ok(id)
    }

    pub async fn latest_ai_report(&self, token_id: Uuid) -> DataResult<Option<AiReport>> {
        let report = sqlx::query_as::<_, AiReport>(
            "SELECT * FROM ai_reports WHERE token_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(report)
    }

    pub async fn list_ai_reports(&self, token_id: Uuid, limit: i64) -> DataResult<Vec<AiReport>> {
        let reports = sqlx::query_as::<_, AiReport>(
            "SELECT * FROM ai_reports WHERE token_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(token_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    /// One decision record per (address, chain); repeated decisions replace
    /// the previous row.
    pub async fn upsert_analysis(&self, record: &TokenAnalysisRecord) -> DataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO token_analyses
                (id, token_name, token_symbol, token_address, token_chain,
                 current_price, current_holders_count, technical_analysis,
                 community_analysis, final_decision, final_confidence,
                 explanation, price_change, holder_change)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (token_address, token_chain) DO UPDATE SET
                token_name = EXCLUDED.token_name,
                token_symbol = EXCLUDED.token_symbol,
                current_price = EXCLUDED.current_price,
                current_holders_count = EXCLUDED.current_holders_count,
                technical_analysis = EXCLUDED.technical_analysis,
                community_analysis = EXCLUDED.community_analysis,
                final_decision = EXCLUDED.final_decision,
                final_confidence = EXCLUDED.final_confidence,
                explanation = EXCLUDED.explanation,
                price_change = EXCLUDED.price_change,
                holder_change = EXCLUDED.holder_change,
                updated_at = now()
            "#,
        )
        .bind(record.id)
        .bind(&record.token_name)
        .bind(&record.token_symbol)
        .bind(&record.token_address)
        .bind(&record.token_chain)
        .bind(&record.current_price)
        .bind(&record.current_holders_count)
        .bind(&record.technical_analysis)
        .bind(&record.community_analysis)
        .bind(&record.final_decision)
        .bind(&record.final_confidence)
        .bind(&record.explanation)
        .bind(&record.price_change)
        .bind(&record.holder_change)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn latest_analysis(
        &self,
        address: &str,
        chain: &str,
    ) -> DataResult<Option<TokenAnalysisRecord>> {
        let record = sqlx::query_as::<_, TokenAnalysisRecord>(
            "SELECT * FROM token_analyses WHERE token_address = $1 AND token_chain = $2",
        )
        .bind(address)
        .bind(chain)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn list_analyses(
        &self,
        address_filter: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DataResult<Vec<TokenAnalysisRecord>> {
        let records = sqlx::query_as::<_, TokenAnalysisRecord>(
            r#"
            SELECT * FROM token_analyses
            WHERE ($1::text IS NULL OR token_address = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(address_filter)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn count_analyses(&self, address_filter: Option<&str>) -> DataResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM token_analyses WHERE ($1::text IS NULL OR token_address = $1)",
        )
        .bind(address_filter)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn save_attachment(
        &self,
        filename: &str,
        file_path: &str,
        content_type: Option<&str>,
        size_bytes: i64,
    ) -> DataResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO attachments (id, filename, file_path, content_type, size_bytes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(filename)
        .bind(file_path)
        .bind(content_type)
        .bind(size_bytes)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn get_attachment(&self, id: Uuid) -> DataResult<Option<Attachment>> {
        let attachment =
            sqlx::query_as::<_, Attachment>("SELECT * FROM attachments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(attachment)
    }
}
