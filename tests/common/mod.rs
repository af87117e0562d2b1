#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use flowdock::{build_router, WorkflowRegistry, WorkflowStorage};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

pub const API_PREFIX: &str = "/api/v1";

/// A router over a fresh, empty workflows directory.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub fn build_test_app() -> (TempDir, Router) {
    let tmp = TempDir::new().unwrap();
    let registry = WorkflowRegistry::new(WorkflowStorage::new(tmp.path().join("workflows")));
    registry.init_from_storage().unwrap();
    (tmp, build_router(Arc::new(registry), API_PREFIX))
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
