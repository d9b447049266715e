use crate::directory::DirectoryService;
use crate::domain::{Item, Point, PointFilter, PointRegistration};
use crate::error::{DirectoryError, Result};
use crate::registration::RegistrationService;
use crate::storage::Storage;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<RegistrationService>,
    pub directory: Arc<DirectoryService>,
    pub public_url: String,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, public_url: String) -> Self {
        Self {
            registration: Arc::new(RegistrationService::new(storage.clone())),
            directory: Arc::new(DirectoryService::new(storage)),
            public_url,
        }
    }
}

/// Resolves a stored relative image reference against the configured
/// public base URL.
fn image_url(public_url: &str, image: &str) -> String {
    format!("{}/uploads/{}", public_url.trim_end_matches('/'), image)
}

#[derive(Debug, Serialize)]
struct ItemResponse {
    id: Uuid,
    title: String,
    image_url: String,
}

impl ItemResponse {
    fn from_item(item: Item, public_url: &str) -> Result<Self> {
        let id = item.id.ok_or_else(|| DirectoryError::Database {
            message: "item row is missing its id".to_string(),
        })?;
        Ok(Self {
            id,
            title: item.title,
            image_url: image_url(public_url, &item.image),
        })
    }
}

#[derive(Debug, Serialize)]
struct PointResponse {
    id: Uuid,
    name: String,
    email: String,
    whatsapp: String,
    city: String,
    uf: String,
    latitude: f64,
    longitude: f64,
    image_url: String,
}

impl PointResponse {
    fn from_point(point: Point, public_url: &str) -> Result<Self> {
        let id = point.id.ok_or_else(|| DirectoryError::Database {
            message: "point row is missing its id".to_string(),
        })?;
        Ok(Self {
            id,
            name: point.name,
            email: point.email,
            whatsapp: point.whatsapp,
            city: point.city,
            uf: point.uf,
            latitude: point.latitude,
            longitude: point.longitude,
            image_url: image_url(public_url, &point.image),
        })
    }
}

#[derive(Debug, Serialize)]
struct ItemSummary {
    title: String,
    image_url: String,
}

/// Detail responses nest the accepted items; list responses stay light.
#[derive(Debug, Serialize)]
struct PointDetailResponse {
    point: PointResponse,
    items: Vec<ItemSummary>,
}

#[derive(Debug, Serialize)]
struct RegisteredResponse {
    id: Uuid,
    name: String,
    email: String,
    whatsapp: String,
    city: String,
    uf: String,
    latitude: f64,
    longitude: f64,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<String>>,
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let (status, fields) = match &self {
            DirectoryError::Validation { fields } => {
                (StatusCode::BAD_REQUEST, Some(fields.clone()))
            }
            DirectoryError::NotFound { .. } => (StatusCode::NOT_FOUND, None),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };
        let body = ErrorBody {
            error: self.to_string(),
            fields,
        };
        (status, Json(body)).into_response()
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "coleta-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn list_items(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<ItemResponse>>, DirectoryError> {
    let items = state.directory.list_items().await?;
    let body = items
        .into_iter()
        .map(|item| ItemResponse::from_item(item, &state.public_url))
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(body))
}

async fn register_point(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<RegisteredResponse>), DirectoryError> {
    // A body that is not JSON at all never reaches the member checks
    let Json(body) = body.map_err(|_| DirectoryError::invalid_field("body"))?;
    let input = parse_registration_body(&body)?;
    let point = state.registration.register(input).await?;
    let id = point.id.ok_or_else(|| DirectoryError::Database {
        message: "registered point is missing its id".to_string(),
    })?;

    let body = RegisteredResponse {
        id,
        name: point.name,
        email: point.email,
        whatsapp: point.whatsapp,
        city: point.city,
        uf: point.uf,
        latitude: point.latitude,
        longitude: point.longitude,
        message: "Collection point registered".to_string(),
    };
    Ok((StatusCode::CREATED, Json(body)))
}

#[derive(Debug, Deserialize)]
struct PointsQuery {
    uf: Option<String>,
    city: Option<String>,
    /// Comma-separated item ids
    items: Option<String>,
}

fn parse_items_param(raw: &str) -> Result<Vec<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| Uuid::parse_str(part).map_err(|_| DirectoryError::invalid_field("items")))
        .collect()
}

/// Deserializes the registration body, mapping a missing or type-mismatched
/// member onto the same structured validation error the service reports for
/// semantically invalid input.
fn parse_registration_body(body: &Value) -> Result<PointRegistration> {
    PointRegistration::deserialize(body).map_err(|_| DirectoryError::Validation {
        fields: malformed_body_fields(body),
    })
}

/// Names the body members that are missing or carry the wrong JSON type.
fn malformed_body_fields(body: &Value) -> Vec<String> {
    let mut fields = Vec::new();

    for key in ["name", "email", "whatsapp", "uf", "city"] {
        if !body.get(key).map_or(false, Value::is_string) {
            fields.push(key.to_string());
        }
    }
    for key in ["latitude", "longitude"] {
        if !body.get(key).map_or(false, Value::is_number) {
            fields.push(key.to_string());
        }
    }

    let items_ok = body.get("items").and_then(Value::as_array).map_or(false, |items| {
        items
            .iter()
            .all(|v| v.as_str().map_or(false, |s| Uuid::parse_str(s).is_ok()))
    });
    if !items_ok {
        fields.push("items".to_string());
    }

    // Optional member: absent and null are both fine
    if let Some(image) = body.get("image") {
        if !image.is_null() && !image.is_string() {
            fields.push("image".to_string());
        }
    }

    fields
}

async fn list_points(
    State(state): State<AppState>,
    Query(query): Query<PointsQuery>,
) -> std::result::Result<Json<Vec<PointResponse>>, DirectoryError> {
    let filter = PointFilter {
        uf: query.uf.filter(|uf| !uf.trim().is_empty()),
        city: query.city.filter(|city| !city.trim().is_empty()),
        items: match query.items.as_deref() {
            Some(raw) => parse_items_param(raw)?,
            None => Vec::new(),
        },
    };

    let points = state.directory.list_points(filter).await?;
    let body = points
        .into_iter()
        .map(|point| PointResponse::from_point(point, &state.public_url))
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(body))
}

async fn point_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<PointDetailResponse>, DirectoryError> {
    let id = Uuid::parse_str(&id).map_err(|_| DirectoryError::invalid_field("id"))?;
    let detail = state.directory.get_point(id).await?;

    let body = PointDetailResponse {
        point: PointResponse::from_point(detail.point, &state.public_url)?,
        items: detail
            .items
            .into_iter()
            .map(|item| ItemSummary {
                image_url: image_url(&state.public_url, &item.image),
                title: item.title,
            })
            .collect(),
    };
    Ok(Json(body))
}

/// Create the HTTP router with all routes
pub fn app_router(state: AppState) -> Router {
    // Browser and mobile clients live on other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/items", get(list_items))
        .route("/points", post(register_point).get(list_points))
        .route("/points/:id", get(point_detail))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, port: u16) -> Result<()> {
    let app = app_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("♻️  Items:        http://localhost:{port}/items");
    println!("📍 Points:       http://localhost:{port}/points");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_joins_base_and_reference() {
        assert_eq!(
            image_url("http://localhost:3333", "oleo.svg"),
            "http://localhost:3333/uploads/oleo.svg"
        );
        // Trailing slash on the base must not double up
        assert_eq!(
            image_url("http://localhost:3333/", "oleo.svg"),
            "http://localhost:3333/uploads/oleo.svg"
        );
    }

    #[test]
    fn items_param_parsing() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let parsed = parse_items_param(&format!("{a}, {b}")).unwrap();
        assert_eq!(parsed, vec![a, b]);

        assert!(parse_items_param("not-a-uuid").is_err());
        assert!(parse_items_param("").unwrap().is_empty());
    }

    fn body() -> Value {
        serde_json::json!({
            "name": "Mercado Central",
            "email": "contato@mercado.com",
            "whatsapp": "+55 11 99999-0000",
            "uf": "SP",
            "city": "Campinas",
            "latitude": -22.9,
            "longitude": -47.06,
            "items": [Uuid::new_v4().to_string()],
        })
    }

    #[test]
    fn well_typed_body_deserializes() {
        assert!(parse_registration_body(&body()).is_ok());
    }

    #[test]
    fn malformed_body_names_the_offending_members() {
        let mut body = body();
        body["latitude"] = serde_json::json!("oops");

        match parse_registration_body(&body).unwrap_err() {
            DirectoryError::Validation { fields } => assert_eq!(fields, vec!["latitude"]),
            other => panic!("expected validation error, got {other}"),
        }

        body.as_object_mut().unwrap().remove("whatsapp");
        assert_eq!(malformed_body_fields(&body), vec!["whatsapp", "latitude"]);

        body["items"] = serde_json::json!(["not-a-uuid"]);
        assert!(malformed_body_fields(&body).contains(&"items".to_string()));
    }
}
