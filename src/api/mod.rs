//! HTTP route layer. Thin handlers over the orchestrators and the store;
//! every failure renders as a uniform `{status:"error", message}` envelope.

use crate::chat::ChatAgent;
use crate::data::DataError;
use crate::dyor::ReportParser;
use crate::orchestrator::{AppContext, DecisionOrchestrator, RefreshOrchestrator};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload_file))
        .route("/analyze-dyor", post(analyze_dyor))
        .route("/update-report-by-name/:token_name", get(update_report_by_name))
        .route("/token-decision/:chain/:token_address", get(token_decision))
        .route("/token-analyses", get(list_token_analyses))
        .route("/tokens", get(list_tokens))
        .route("/token-by-name/:token_name", get(token_by_name))
        .route("/token/:chain/:token_address", get(token_by_address))
        .route("/chat", post(chat))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Error wrapper mapping the taxonomy onto HTTP statuses
pub struct ApiError(DataError);

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DataError::NotFound(_) => StatusCode::NOT_FOUND,
            DataError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self.0);
        }
        let body = json!({"status": "error", "message": self.0.to_string()});
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<i64>,
    per_page: Option<i64>,
    token: Option<String>,
    token_name: Option<String>,
}

impl PageParams {
    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(10).clamp(1, 100)
    }

    fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}

fn pagination(total: i64, params: &PageParams) -> Value {
    let per_page = params.per_page();
    json!({
        "total": total,
        "page": params.page(),
        "per_page": per_page,
        "total_pages": (total + per_page - 1) / per_page,
    })
}

async fn health() -> &'static str {
    "ok"
}

/// Pull the first file out of a multipart body
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError(DataError::Validation(format!("malformed multipart body: {e}")))
    })? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(|e| {
            ApiError(DataError::Validation(format!("failed to read upload: {e}")))
        })?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(ApiError(DataError::Validation(
        "request contains no file".to_string(),
    )))
}

/// POST /upload — store a document and record its attachment metadata.
async fn upload_file(
    State(ctx): State<Arc<AppContext>>,
    mut multipart: Multipart,
) -> ApiResult {
    let (filename, bytes) = read_upload(&mut multipart).await?;
    let path = ctx.storage.save_file(&filename, &bytes).await?;
    let attachment_id = ctx
        .store
        .save_attachment(
            &filename,
            &path.to_string_lossy(),
            None,
            bytes.len() as i64,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "attachment_id": attachment_id,
        "filename": filename,
    })))
}

/// POST /analyze-dyor — parse an uploaded .docx research document, persist
/// token + research input, run a refresh and return both reports.
async fn analyze_dyor(
    State(ctx): State<Arc<AppContext>>,
    mut multipart: Multipart,
) -> ApiResult {
    let (filename, bytes) = read_upload(&mut multipart).await?;
    if !filename.to_lowercase().ends_with(".docx") {
        return Err(ApiError(DataError::Validation(
            "Invalid file format. Please upload a .docx file".to_string(),
        )));
    }

    let orchestrator = RefreshOrchestrator::new(ctx);
    let outcome = orchestrator.ingest_document(&bytes).await?;

    Ok(Json(json!({
        "status": "success",
        "input_report": outcome.input_report,
        "updated_report": outcome.updated_report,
    })))
}

/// GET /update-report-by-name/:token_name — refresh a known token.
async fn update_report_by_name(
    State(ctx): State<Arc<AppContext>>,
    Path(token_name): Path<String>,
) -> ApiResult {
    let orchestrator = RefreshOrchestrator::new(ctx);
    let updated = orchestrator.refresh_token_by_name(&token_name).await?;
    Ok(Json(json!({"status": "success", "data": updated})))
}

/// GET /token-decision/:chain/:token_address — legacy flattened decision.
async fn token_decision(
    State(ctx): State<Arc<AppContext>>,
    Path((chain, token_address)): Path<(String, String)>,
) -> ApiResult {
    let orchestrator = DecisionOrchestrator::new(ctx);
    let record = orchestrator.decide(&chain, &token_address).await?;
    Ok(Json(json!({"status": "success", "data": record})))
}

/// GET /token-analyses — paginated decision records with display prices.
async fn list_token_analyses(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<PageParams>,
) -> ApiResult {
    let total = ctx.store.count_analyses(params.token.as_deref()).await?;
    let records = ctx
        .store
        .list_analyses(params.token.as_deref(), params.per_page(), params.offset())
        .await?;

    let data: Vec<Value> = records
        .into_iter()
        .map(|record| {
            let mut value = serde_json::to_value(&record).unwrap_or_else(|_| json!({}));
            value["current_price"] = json!(format_display_price(&record.current_price));
            value
        })
        .collect();

    Ok(Json(json!({
        "status": "success",
        "data": data,
        "pagination": pagination(total, &params),
    })))
}

/// GET /tokens — paginated token list with each token's latest history.
async fn list_tokens(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<PageParams>,
) -> ApiResult {
    let total = ctx.store.count_tokens(params.token_name.as_deref()).await?;
    let tokens = ctx
        .store
        .list_tokens(
            params.token_name.as_deref(),
            params.per_page(),
            params.offset(),
        )
        .await?;

    let mut data = Vec::with_capacity(tokens.len());
    for token in tokens {
        let latest_input = ctx.store.latest_research_input(token.id).await?;
        let latest_report = ctx.store.latest_ai_report(token.id).await?;

        let mut value = serde_json::to_value(&token).unwrap_or_else(|_| json!({}));
        value["latest_data"] = latest_input.map(|i| i.data).unwrap_or_else(|| json!({}));
        value["latest_report"] = latest_report.map(|r| r.data).unwrap_or_else(|| json!({}));
        data.push(value);
    }

    Ok(Json(json!({
        "status": "success",
        "data": data,
        "pagination": pagination(total, &params),
    })))
}

#[derive(Debug, Deserialize)]
struct TokenByNameParams {
    include_researches: Option<bool>,
}

/// GET /token-by-name/:token_name — token with its research history.
async fn token_by_name(
    State(ctx): State<Arc<AppContext>>,
    Path(token_name): Path<String>,
    Query(params): Query<TokenByNameParams>,
) -> ApiResult {
    let token = ctx
        .store
        .get_token_by_name(&token_name)
        .await?
        .ok_or_else(|| DataError::NotFound(format!("token {token_name}")))?;

    let mut value = serde_json::to_value(&token).map_err(DataError::from)?;
    if params.include_researches.unwrap_or(true) {
        value["research_inputs"] =
            serde_json::to_value(ctx.store.list_research_inputs(token.id, 100).await?)
                .map_err(DataError::from)?;
        value["ai_reports"] = serde_json::to_value(ctx.store.list_ai_reports(token.id, 100).await?)
            .map_err(DataError::from)?;
    }

    Ok(Json(json!({"status": "success", "data": value})))
}

#[derive(Debug, Deserialize)]
struct TokenByAddressParams {
    include_research: Option<bool>,
}

/// GET /token/:chain/:token_address — token addressed by its on-chain key.
async fn token_by_address(
    State(ctx): State<Arc<AppContext>>,
    Path((chain, token_address)): Path<(String, String)>,
    Query(params): Query<TokenByAddressParams>,
) -> ApiResult {
    let token = ctx
        .store
        .get_token_by_address(&token_address, &chain)
        .await?
        .ok_or_else(|| DataError::NotFound(format!("token {token_address} on {chain}")))?;

    let mut value = serde_json::to_value(&token).map_err(DataError::from)?;
    if params.include_research.unwrap_or(true) {
        value["research_inputs"] =
            serde_json::to_value(ctx.store.list_research_inputs(token.id, 100).await?)
                .map_err(DataError::from)?;
        value["ai_reports"] = serde_json::to_value(ctx.store.list_ai_reports(token.id, 100).await?)
            .map_err(DataError::from)?;
    }

    Ok(Json(json!({"status": "success", "data": value})))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    attachment_ids: Option<Vec<Uuid>>,
}

/// POST /chat — assistant reply, or a re-parse of an uploaded attachment.
async fn chat(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<ChatRequest>,
) -> ApiResult {
    if let Some(ids) = request.attachment_ids.filter(|ids| !ids.is_empty()) {
        let attachment = ctx
            .store
            .get_attachment(ids[0])
            .await?
            .ok_or_else(|| DataError::NotFound(format!("attachment {}", ids[0])))?;

        let bytes = ctx.storage.read_file(&attachment.file_path).await?;
        let parser = ReportParser::new(ctx.llm.clone());
        let report = parser.parse_docx(&bytes).await?;

        return Ok(Json(json!({
            "success": true,
            "response": report,
            "type": "parsed_dyor",
        })));
    }

    let agent = ChatAgent::new(ctx.llm.clone());
    let reply = agent.respond(&request.message).await?;
    Ok(Json(serde_json::to_value(reply).map_err(DataError::from)?))
}

/// Render a stored price string for listings: scientific notation for
/// sub-cent prices, five decimals otherwise. Unparseable strings pass
/// through untouched.
fn format_display_price(stored: &str) -> String {
    match crate::analysis::verdict::parse_price(stored) {
        Some(price) if price < 0.01 => format!("${price:.2e}"),
        Some(price) => format!("${price:.5}"),
        None => stored.to_string(),
    }
}
