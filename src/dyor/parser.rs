//! Model-backed report parser: flatten the uploaded document, ask the
//! generative capability for the structured JSON, decode strictly.

use super::docx;
use super::schema::DyorReport;
use crate::analysis::prompts;
use crate::data::{DataError, DataResult};
use crate::llm::{extract_json_from_text, TextGenerator};
use std::sync::Arc;
use tracing::info;

pub struct ReportParser {
    llm: Arc<dyn TextGenerator>,
}

impl ReportParser {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Parse an uploaded .docx document into a structured report.
    /// Nothing is persisted here; that is the orchestrator's job.
    pub async fn parse_docx(&self, bytes: &[u8]) -> DataResult<DyorReport> {
        let flattened = docx::flatten_document(bytes)?;
        info!("Flattened document to {} chars", flattened.len());
        self.parse_text(&flattened).await
    }

    /// Parse already-flattened document text.
    pub async fn parse_text(&self, flattened: &str) -> DataResult<DyorReport> {
        let prompt = prompts::report_extraction_prompt(flattened);
        let raw = self
            .llm
            .complete(prompts::REPORT_PARSER_LORE, &prompt)
            .await?;
        decode_report(&raw)
    }
}

/// Strict decode of the model output into the report schema. Anything that
/// is not valid JSON for the schema is a hard error carrying the raw text.
pub fn decode_report(raw: &str) -> DataResult<DyorReport> {
    let json_text = extract_json_from_text(raw).ok_or_else(|| {
        DataError::parse_error("structured report", "no JSON object in model output", raw)
    })?;

    serde_json::from_str(&json_text)
        .map_err(|e| DataError::parse_error("structured report", e.to_string(), raw))
}
