//! In-memory mock of the logbook driver backend.
//!
//! Sign-in issues a bearer token; every protected route checks it and
//! answers 401 with a `session_expired` code otherwise. The `/echo` route
//! reflects the request back so client tests can assert on headers, query
//! strings and bodies. Upload routes reflect the received multipart parts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    routing::{any, get, patch, post, put},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Default)]
pub struct ApiState {
    sessions: HashSet<String>,
    freights: HashMap<i64, Value>,
    deposits: Vec<Value>,
    travels: Vec<Value>,
    restocks: Vec<Value>,
    next_id: i64,
}

pub type Db = Arc<RwLock<ApiState>>;

type Reply = (StatusCode, Json<Value>);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(ApiState::default()));
    Router::new()
        .route("/v1/driver/signin", post(sign_in))
        .route("/driver/code-request", post(code_request))
        .route("/driver/code-validation", post(code_validation))
        .route("/v1/driver/profile", get(profile))
        .route("/v1/driver/notifications", get(notifications))
        .route(
            "/v1/driver/notifications/allread",
            post(read_all_notifications),
        )
        .route("/v1/driver/notifications/{id}", put(read_notification))
        .route(
            "/v1/driver/activate/push-receive-notifications",
            post(activate_push),
        )
        .route("/v1/driver/financial/current", get(current_statement))
        .route("/v1/driver/freight", post(create_freight))
        .route("/v1/driver/freight/{id}", patch(update_freight))
        .route("/v1/driver/freight/finished-trip/{id}", put(finish_trip))
        .route("/driver/freight/{id}", get(get_freight))
        .route(
            "/driver/freight/upload-documents/{id}",
            patch(upload_freight_documents),
        )
        .route("/v1/driver/travel/upload-documents", patch(upload_documents))
        .route(
            "/v1/driver/deposit/upload-documents",
            patch(upload_documents),
        )
        .route("/driver/deposits", get(list_deposits))
        .route("/driver/deposit", post(create_deposit))
        .route("/driver/travels", get(list_travels))
        .route("/driver/travel", post(create_travel))
        .route("/driver/restocks", get(list_restocks))
        .route("/driver/restock", post(create_restock))
        .route("/echo", any(echo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn unauthorized() -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "code": "session_expired",
            "msg": "Sessão expirada, faça login novamente"
        })),
    )
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

async fn authorize(db: &Db, headers: &HeaderMap) -> Result<(), Reply> {
    match bearer(headers) {
        Some(token) if db.read().await.sessions.contains(token) => Ok(()),
        _ => Err(unauthorized()),
    }
}

// --- auth ---

#[derive(Deserialize)]
struct SignInPayload {
    #[allow(dead_code)]
    cpf: String,
    password: String,
}

async fn sign_in(State(db): State<Db>, Json(payload): Json<SignInPayload>) -> Reply {
    if payload.password == "wrong" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "code": "invalid_credentials",
                "msg": "CPF ou senha inválidos"
            })),
        );
    }

    let token = Uuid::new_v4().to_string();
    db.write().await.sessions.insert(token.clone());
    (StatusCode::OK, Json(json!({ "data": { "token": token } })))
}

async fn code_request(headers: HeaderMap, Json(_payload): Json<Value>) -> Reply {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    (
        StatusCode::OK,
        Json(json!({ "data": { "authorization": authorization } })),
    )
}

async fn code_validation(Json(payload): Json<Value>) -> Reply {
    let valid = payload
        .get("code")
        .and_then(Value::as_str)
        .is_some_and(|code| code.len() == 6);
    if valid {
        (StatusCode::OK, Json(json!({ "data": {} })))
    } else {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "code": "invalid_code", "msg": "Código inválido" })),
        )
    }
}

async fn profile(State(db): State<Db>, headers: HeaderMap) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "data": {
                "id": 1,
                "name": "João Motorista",
                "cpf": "00000000000",
                "credit": 150000,
                "daily": 8000,
                "number_cnh": null,
                "valid_cnh": null,
                "percentage": 10.0,
                "value_fix": 0
            }
        })),
    ))
}

// --- notifications ---

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default = "default_page")]
    page: i64,
}

fn default_page() -> i64 {
    1
}

async fn notifications(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "total": 2,
            "totalPages": 1,
            "currentPage": query.page,
            "data": [
                {
                    "id": 1,
                    "content": "Sua cotação foi aprovada",
                    "read": false,
                    "created_at": now()
                },
                {
                    "id": 2,
                    "content": "Novo frete disponível",
                    "read": true,
                    "created_at": now()
                }
            ]
        })),
    ))
}

async fn read_all_notifications(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    Ok((StatusCode::OK, Json(json!({}))))
}

async fn read_notification(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    Ok((StatusCode::OK, Json(json!({}))))
}

async fn activate_push(State(db): State<Db>, headers: HeaderMap) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    Ok((StatusCode::OK, Json(json!({}))))
}

// --- finances and freights ---

fn base_freight(id: i64) -> Value {
    json!({
        "id": id,
        "financial_statements_id": 1,
        "start_freight_city": "Cuiabá MT",
        "final_freight_city": "Rondonópolis MT",
        "location_of_the_truck": "Cuiabá MT",
        "contractor": "Agro Ltda",
        "truck_current_km": 120000.0,
        "liter_of_fuel_per_km": 2.1,
        "preview_tonne": 37.0,
        "preview_value_diesel": 590,
        "value_tonne": 14500,
        "status": "DRAFT",
        "createdAt": now(),
        "updatedAt": now()
    })
}

fn merge(mut base: Value, patch: &Map<String, Value>) -> Value {
    if let Some(target) = base.as_object_mut() {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
    base
}

async fn current_statement(State(db): State<Db>, headers: HeaderMap) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "data": {
                "id": 1,
                "creator_user_id": 1,
                "driver_id": 1,
                "truck_id": 1,
                "cart_id": 1,
                "status": true,
                "start_km": 119000,
                "final_km": null,
                "start_date": "2024-03-01",
                "final_date": null,
                "driver_name": "João Motorista",
                "truck_models": "FH 540",
                "truck_board": "ABC1D23",
                "truck_avatar": "https://cdn.example.com/truck.png",
                "cart_models": "Graneleiro",
                "cart_board": "DEF4G56",
                "invoicing_all": null,
                "medium_fuel_all": null,
                "total_value": 0,
                "freight": [base_freight(1)],
                "createdAt": now(),
                "updatedAt": now()
            }
        })),
    ))
}

async fn create_freight(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;

    if !payload.contains_key("start_freight_city") {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "errors": { "start_freight_city": "obrigatório" }
            })),
        ));
    }

    let mut state = db.write().await;
    state.next_id += 1;
    let id = state.next_id;
    let freight = merge(base_freight(id), &payload);
    state.freights.insert(id, freight.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": freight }))))
}

async fn update_freight(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;

    let mut state = db.write().await;
    let Some(existing) = state.freights.get(&id).cloned() else {
        return Err(freight_not_found());
    };
    let freight = merge(existing, &payload);
    state.freights.insert(id, freight.clone());
    Ok((StatusCode::OK, Json(json!({ "data": freight }))))
}

async fn finish_trip(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(mut payload): Json<Map<String, Value>>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;

    payload.insert("status".to_string(), Value::String("FINISHED".to_string()));
    let mut state = db.write().await;
    let Some(existing) = state.freights.get(&id).cloned() else {
        return Err(freight_not_found());
    };
    let freight = merge(existing, &payload);
    state.freights.insert(id, freight.clone());
    Ok((StatusCode::OK, Json(json!({ "data": freight }))))
}

async fn get_freight(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;

    let state = db.read().await;
    match state.freights.get(&id) {
        Some(freight) => Ok((StatusCode::OK, Json(json!({ "data": freight })))),
        None => Err(freight_not_found()),
    }
}

fn freight_not_found() -> Reply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "code": "freight_not_found", "msg": "Frete não encontrado" })),
    )
}

// --- movements ---

fn stamp(mut record: Map<String, Value>, id: i64) -> Value {
    record.insert("id".to_string(), Value::from(id));
    record.insert("createdAt".to_string(), Value::String(now()));
    record.insert("updatedAt".to_string(), Value::String(now()));
    Value::Object(record)
}

fn filter_by(records: &[Value], key: &str, wanted: Option<i64>) -> Vec<Value> {
    records
        .iter()
        .filter(|record| match wanted {
            Some(wanted) => record.get(key).and_then(Value::as_i64) == Some(wanted),
            None => true,
        })
        .cloned()
        .collect()
}

#[derive(Deserialize)]
struct DepositQuery {
    #[serde(rename = "financialStatementId")]
    financial_statement_id: Option<i64>,
}

async fn list_deposits(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<DepositQuery>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    let state = db.read().await;
    let data = filter_by(
        &state.deposits,
        "financial_statements_id",
        query.financial_statement_id,
    );
    Ok((StatusCode::OK, Json(json!({ "data": data }))))
}

async fn create_deposit(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    let mut state = db.write().await;
    state.next_id += 1;
    let record = stamp(payload, state.next_id);
    state.deposits.push(record.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": record }))))
}

#[derive(Deserialize)]
struct FreightQuery {
    freight_id: Option<i64>,
}

async fn list_travels(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<FreightQuery>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    let state = db.read().await;
    let data = filter_by(&state.travels, "freight_id", query.freight_id);
    Ok((StatusCode::OK, Json(json!({ "data": data }))))
}

async fn create_travel(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    let mut state = db.write().await;
    state.next_id += 1;
    let record = stamp(payload, state.next_id);
    state.travels.push(record.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": record }))))
}

async fn list_restocks(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<FreightQuery>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    let state = db.read().await;
    let data = filter_by(&state.restocks, "freight_id", query.freight_id);
    Ok((StatusCode::OK, Json(json!({ "data": data }))))
}

async fn create_restock(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    let mut state = db.write().await;
    state.next_id += 1;
    let record = stamp(payload, state.next_id);
    state.restocks.push(record.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": record }))))
}

// --- uploads ---

async fn upload_freight_documents(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
    multipart: Multipart,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    collect_multipart(multipart).await
}

async fn upload_documents(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Reply, Reply> {
    authorize(&db, &headers).await?;
    collect_multipart(multipart).await
}

/// Reflect the received parts so tests can assert on naming and fields.
async fn collect_multipart(mut multipart: Multipart) -> Result<Reply, Reply> {
    let mut parts = Vec::new();
    let mut fields = Map::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(filename) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string).unwrap_or_default();
            let bytes = field.bytes().await.map_err(bad_multipart)?;
            parts.push(json!({
                "name": name,
                "filename": filename,
                "content_type": content_type,
                "size": bytes.len()
            }));
        } else {
            let text = field.text().await.map_err(bad_multipart)?;
            fields.insert(name, Value::String(text));
        }
    }

    Ok((
        StatusCode::OK,
        Json(json!({ "data": { "parts": parts, "fields": fields } })),
    ))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> Reply {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "code": "bad_multipart", "msg": err.to_string() })),
    )
}

// --- echo ---

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Reply {
    let headers: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();

    let body = serde_json::from_str(&body).unwrap_or(Value::String(body));

    (
        StatusCode::OK,
        Json(json!({
            "method": method.as_str(),
            "uri": uri.to_string(),
            "headers": headers,
            "body": body
        })),
    )
}
