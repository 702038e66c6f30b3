use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRequest, Path, Query, RawQuery, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, delete, get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const DEFAULT_LIMIT: usize = 20;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub token: String,
    pub invoice_number: String,
    pub email: String,
    pub status: String,
    pub tracking_number: Option<String>,
    pub final_grand_total: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrder {
    pub status: Option<String>,
    pub tracking_number: Option<String>,
}

#[derive(Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Discount {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub rate: f64,
}

#[derive(Deserialize)]
pub struct NewDiscount {
    pub name: String,
    pub code: String,
    pub rate: f64,
}

pub type Orders = Arc<RwLock<Vec<Order>>>;
pub type Discounts = Arc<RwLock<HashMap<Uuid, Discount>>>;

#[derive(Clone)]
pub struct AppState {
    pub orders: Orders,
    pub discounts: Discounts,
}

impl AppState {
    /// Three orders, two of them `Processed`, and no discounts.
    pub fn seeded() -> Self {
        let order = |n: u32, status: &str, total: f64| Order {
            token: format!("ord-{n}"),
            invoice_number: format!("SNIP-{n}"),
            email: format!("customer{n}@example.com"),
            status: status.to_string(),
            tracking_number: None,
            final_grand_total: total,
        };
        Self {
            orders: Arc::new(RwLock::new(vec![
                order(1001, "Processed", 49.5),
                order(1002, "Shipped", 120.0),
                order(1003, "Processed", 15.25),
            ])),
            discounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

pub fn app() -> Router {
    let api = Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{token}", get(get_order).put(update_order))
        .route("/discounts", post(create_discount))
        .route("/discounts/{id}", delete(delete_discount))
        .route("/echo", any(echo))
        .route("/ping", get(ping))
        .layer(middleware::from_fn(require_basic_auth))
        .with_state(AppState::seeded());
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

/// Accepts `Basic base64(user:password)` with a non-empty user.
async fn require_basic_auth(request: Request, next: Next) -> Response {
    let user = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .and_then(|credentials| credentials.split(':').next().map(str::to_string))
        .filter(|user| !user.is_empty());

    if user.is_none() {
        tracing::debug!(uri = %request.uri(), "rejecting request without api key");
        return message(StatusCode::UNAUTHORIZED, "An API key is required.");
    }
    next.run(request).await
}

async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrdersQuery>,
    RawQuery(raw): RawQuery,
) -> Json<Value> {
    let orders = state.orders.read().await;
    let matching: Vec<&Order> = orders
        .iter()
        .filter(|o| params.status.as_deref().map_or(true, |s| o.status == s))
        .collect();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let items: Vec<&Order> = matching.iter().skip(offset).take(limit).copied().collect();
    Json(json!({
        "totalItems": matching.len(),
        "offset": offset,
        "limit": limit,
        "items": items,
        "query": raw,
    }))
}

async fn get_order(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    let orders = state.orders.read().await;
    match orders.iter().find(|o| o.token == token) {
        Some(order) => Json(order.clone()).into_response(),
        None => message(StatusCode::NOT_FOUND, "Order not found."),
    }
}

async fn update_order(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(input): Json<UpdateOrder>,
) -> Response {
    let mut orders = state.orders.write().await;
    let Some(order) = orders.iter_mut().find(|o| o.token == token) else {
        return message(StatusCode::NOT_FOUND, "Order not found.");
    };
    if let Some(status) = input.status {
        order.status = status;
    }
    if let Some(tracking_number) = input.tracking_number {
        order.tracking_number = Some(tracking_number);
    }
    Json(order.clone()).into_response()
}

/// Takes the discount as JSON or as a urlencoded form, by content type.
async fn create_discount(State(state): State<AppState>, request: Request) -> Response {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    let input = if is_form {
        match Form::<NewDiscount>::from_request(request, &()).await {
            Ok(Form(input)) => input,
            Err(rejection) => return rejection.into_response(),
        }
    } else {
        match Json::<NewDiscount>::from_request(request, &()).await {
            Ok(Json(input)) => input,
            Err(rejection) => return rejection.into_response(),
        }
    };

    let discount = Discount {
        id: Uuid::new_v4(),
        name: input.name,
        code: input.code,
        rate: input.rate,
    };
    state.discounts.write().await.insert(discount.id, discount.clone());
    (StatusCode::CREATED, Json(discount)).into_response()
}

async fn delete_discount(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.discounts.write().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => message(StatusCode::NOT_FOUND, "Discount not found."),
    }
}

/// Reflects what arrived so callers can check their own encoding.
async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: String) -> Json<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    Json(json!({
        "method": method.as_str(),
        "query": query,
        "contentType": content_type,
        "body": body,
    }))
}

async fn ping() -> &'static str {
    "pong"
}
