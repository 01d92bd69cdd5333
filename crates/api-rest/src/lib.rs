//! # API REST
//!
//! REST API implementation for the IPS converter.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (status codes, content types, CORS)
//!
//! Conversion itself is delegated to [`ips_core::ConversionService`].

#![warn(rust_2018_idioms)]

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use ips_core::{ConversionError, ConversionMode, ConversionService};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers.
#[derive(Clone)]
struct AppState {
    service: ConversionService,
}

/// Health check response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body returned with every non-2xx conversion response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, convert_record, convert_bundle, convert_record_to_bundle),
    components(schemas(HealthRes, ErrorRes))
)]
pub struct ApiDoc;

/// Build the REST router around `service`.
///
/// Routes:
/// - `GET /health`
/// - `POST /convert/record`, `POST /convert/bundle`, `POST /convert/record-to-bundle`
/// - OpenAPI document at `/api-docs/openapi.json`, Swagger UI under `/swagger-ui`
pub fn router(service: ConversionService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/convert/record", post(convert_record))
        .route("/convert/bundle", post(convert_bundle))
        .route("/convert/record-to-bundle", post(convert_record_to_bundle))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { service })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "IPS converter is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/convert/record",
    request_body(content = String, description = "HL7 v2 message", content_type = "text/plain"),
    responses(
        (status = 200, description = "Intermediate record JSON", content_type = "application/json"),
        (status = 400, description = "Empty request body", body = ErrorRes),
        (status = 422, description = "Conversion failed", body = ErrorRes)
    )
)]
/// Convert an HL7 v2 message to an intermediate record
#[axum::debug_handler]
async fn convert_record(State(state): State<AppState>, body: String) -> Response {
    convert(&state, ConversionMode::Record, &body)
}

#[utoipa::path(
    post,
    path = "/convert/bundle",
    request_body(content = String, description = "HL7 v2 message", content_type = "text/plain"),
    responses(
        (status = 200, description = "IPS document Bundle JSON", content_type = "application/json"),
        (status = 400, description = "Empty request body", body = ErrorRes),
        (status = 422, description = "Conversion failed", body = ErrorRes)
    )
)]
/// Convert an HL7 v2 message straight to an IPS document Bundle
#[axum::debug_handler]
async fn convert_bundle(State(state): State<AppState>, body: String) -> Response {
    convert(&state, ConversionMode::Bundle, &body)
}

#[utoipa::path(
    post,
    path = "/convert/record-to-bundle",
    request_body(content = String, description = "Intermediate record JSON", content_type = "application/json"),
    responses(
        (status = 200, description = "IPS document Bundle JSON", content_type = "application/json"),
        (status = 400, description = "Empty request body", body = ErrorRes),
        (status = 422, description = "Record does not match the schema", body = ErrorRes)
    )
)]
/// Convert an intermediate record to an IPS document Bundle
///
/// The body is read as text rather than through `Json` so that schema errors carry the
/// failing path.
#[axum::debug_handler]
async fn convert_record_to_bundle(State(state): State<AppState>, body: String) -> Response {
    convert(&state, ConversionMode::RecordToBundle, &body)
}

fn convert(state: &AppState, mode: ConversionMode, body: &str) -> Response {
    match state.service.convert(mode, body) {
        Ok(conversion) => {
            let mut response =
                ([(header::CONTENT_TYPE, "application/json")], conversion.json).into_response();
            let disposition = format!("inline; filename=\"{}\"", conversion.suggested_filename);
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                response
                    .headers_mut()
                    .insert(header::CONTENT_DISPOSITION, value);
            }
            response
        }
        Err(e) => error_response(mode, e),
    }
}

fn error_response(mode: ConversionMode, error: ConversionError) -> Response {
    let status = match &error {
        ConversionError::EmptyInput => StatusCode::BAD_REQUEST,
        ConversionError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };

    if status.is_server_error() {
        tracing::error!(mode = %mode, "conversion error: {error:?}");
    } else {
        tracing::warn!(mode = %mode, "rejected conversion: {error}");
    }

    (
        status,
        Json(ErrorRes {
            error: error.to_string(),
        }),
    )
        .into_response()
}
