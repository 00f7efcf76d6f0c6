use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn signed_in_token(app: &axum::Router) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/driver/signin",
            r#"{"cpf":"00000000000","password":"secret"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

// --- auth ---

#[tokio::test]
async fn sign_in_issues_a_token() {
    let app = app();
    let token = signed_in_token(&app).await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn sign_in_with_wrong_password_is_401_with_code() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/v1/driver/signin",
            r#"{"cpf":"00000000000","password":"wrong"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "invalid_credentials");
}

#[tokio::test]
async fn profile_without_token_is_401() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/v1/driver/profile")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "session_expired");
}

#[tokio::test]
async fn profile_with_token_returns_driver() {
    let app = app();
    let token = signed_in_token(&app).await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/v1/driver/profile")
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["name"], "João Motorista");
}

// --- freights ---

#[tokio::test]
async fn create_freight_without_start_city_is_422() {
    let app = app();
    let token = signed_in_token(&app).await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/driver/freight")
                .header(http::header::CONTENT_TYPE, "application/json")
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(r#"{}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["errors"]["start_freight_city"], "obrigatório");
}

#[tokio::test]
async fn unknown_freight_is_404_with_code() {
    let app = app();
    let token = signed_in_token(&app).await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/driver/freight/99")
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "freight_not_found");
}

// --- uploads ---

#[tokio::test]
async fn upload_reflects_multipart_parts() {
    let app = app();
    let token = signed_in_token(&app).await;

    let boundary = "logbook-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"cte.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         fakebytes\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"category\"\r\n\r\n\
         documents\r\n\
         --{boundary}--\r\n"
    );

    let resp = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/v1/driver/travel/upload-documents")
                .header(
                    http::header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["parts"][0]["name"], "file");
    assert_eq!(body["data"]["parts"][0]["filename"], "cte.jpg");
    assert_eq!(body["data"]["parts"][0]["content_type"], "image/jpeg");
    assert_eq!(body["data"]["fields"]["category"], "documents");
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_method_uri_and_headers() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/echo?a=1")
                .header("x-trace", "42")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["method"], "GET");
    assert_eq!(body["uri"], "/echo?a=1");
    assert_eq!(body["headers"]["x-trace"], "42");
}
