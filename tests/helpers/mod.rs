// ABOUTME: Test helper for driving axum routers without a live socket
// ABOUTME: Wraps tower's oneshot into a small request builder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs, dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;

/// Request builder that sends through `Router::oneshot`
pub struct AxumTestRequest {
    method: Method,
    uri: String,
    body: Option<Value>,
}

impl AxumTestRequest {
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_owned(),
            body: None,
        }
    }

    /// Attach a JSON body
    pub fn json(mut self, body: &Value) -> Self {
        self.body = Some(body.clone());
        self
    }

    /// Send the request through the router and collect the response
    pub async fn send(self, router: Router) -> TestResponse {
        let builder = Request::builder().method(self.method).uri(self.uri);
        let request = match self.body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&value).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse { status, body }
    }
}

/// Collected response: status plus buffered body
pub struct TestResponse {
    status: StatusCode,
    body: axum::body::Bytes,
}

impl TestResponse {
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap()
    }
}
