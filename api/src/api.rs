use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use simple_storage_sdk::utils::serialize_display;
use simple_storage_sdk::{EventsQuery, SimpleStorageClient, U256};

use crate::error::ApiError;

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: SimpleStorageClient,
    /// Blocks looked back from the head when `fromBlock` is missing.
    pub default_lookback: u64,
}

#[derive(Serialize)]
struct ValueResponse {
    #[serde(serialize_with = "serialize_display")]
    value: U256,
}

/// Query string of `GET /blockchain/events`. Every field is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsParams {
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Body of `POST /blockchain/events`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsBody {
    pub from_block: u64,
    pub to_block: u64,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Clamps a signed page or limit into `u32`; negatives become 0 and fail validation.
fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn with_paging(query: EventsQuery, page: Option<i64>, limit: Option<i64>) -> EventsQuery {
    let query = match page {
        Some(page) => query.with_page(clamp_u32(page)),
        None => query,
    };
    match limit {
        Some(limit) => query.with_limit(clamp_u32(limit)),
        None => query,
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub async fn get_value(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let value = state.client.get_value().await?;
    Ok(HttpResponse::Ok().json(ValueResponse { value }))
}

pub async fn get_events(
    state: web::Data<AppState>,
    params: web::Query<EventsParams>,
) -> Result<HttpResponse, ApiError> {
    let params = params.into_inner();
    let query = match (params.from_block, params.to_block) {
        (Some(from_block), Some(to_block)) => EventsQuery::new(from_block, to_block),
        (from_block, to_block) => {
            let current = state.client.get_current_block_number().await?;
            EventsQuery::new(
                from_block.unwrap_or(current.saturating_sub(state.default_lookback)),
                to_block.unwrap_or(current),
            )
        }
    };
    let query = with_paging(query, params.page, params.limit);
    log::debug!("GET events {query:?}");

    let page = state.client.get_events_page(query).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn post_events(
    state: web::Data<AppState>,
    body: web::Json<EventsBody>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let query = with_paging(
        EventsQuery::new(body.from_block, body.to_block),
        body.page,
        body.limit,
    );
    log::debug!("POST events {query:?}");

    let page = state.client.get_events_page(query).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::bad_request(format!("Invalid query parameters: {err}")).into()
    }))
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::bad_request(format!("Invalid request body: {err}")).into()
    }))
    .route("/health", web::get().to(health))
    .service(
        web::scope("/blockchain")
            .route("/value", web::get().to(get_value))
            .route("/events", web::get().to(get_events))
            .route("/events", web::post().to(post_events)),
    );
}
