//! Shared helpers for HTTP API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use cdn_store::api::{create_router, session::SessionStore};
use cdn_store::config::{AuthConfig, Config, NodeConfig};
use cdn_store::service::Service;
use cdn_store::storage::models::{Identity, Password};
use cdn_store::storage::Database;
use cdn_store::AppState;

pub const ADMIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const USER_PASSWORD: &str = "user-password";
pub const BOUNDARY: &str = "cdn-store-test-boundary";

/// A router over a fresh database with `admin` bootstrapped.
pub struct TestServer {
    pub router: Router,
    _dir: tempfile::TempDir,
}

impl TestServer {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let data_dir = dir.path().join("data");

        let config = Config {
            node: NodeConfig {
                bind_address: "127.0.0.1:0".to_string(),
                data_dir: data_dir.to_string_lossy().to_string(),
            },
            auth: AuthConfig {
                bootstrap_admin: ADMIN.to_string(),
                bootstrap_admin_password: Some(Password::new(ADMIN_PASSWORD)),
                ..AuthConfig::default()
            },
            max_request_body: 10 * 1024 * 1024,
        };

        let db = Database::open(&data_dir).expect("Failed to open test database");
        let mut service = Service::new(db);
        service
            .bootstrap(
                &Identity::new(ADMIN),
                config.auth.bootstrap_admin_password.as_ref(),
            )
            .expect("Failed to bootstrap admin");

        let state = Arc::new(AppState {
            sessions: SessionStore::new(config.auth.session_ttl_secs),
            service: Mutex::new(service),
            config,
        });

        Self {
            router: create_router(state),
            _dir: dir,
        }
    }

    /// Send a request and decode the JSON body (Null when not JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn json_request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let body = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    /// Log in as `name` and return the session token.
    pub async fn login(&self, name: &str, password: &str) -> String {
        let (status, body) = self
            .json_request(
                "POST",
                "/auth/login",
                Some(json!({ "name": name, "password": password })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    pub async fn login_admin(&self) -> String {
        self.login(ADMIN, ADMIN_PASSWORD).await
    }

    /// Register `name` with [`USER_PASSWORD`] and log it in as a Viewer.
    pub async fn viewer(&self, name: &str) -> String {
        let (status, body) = self
            .json_request(
                "POST",
                "/auth/register",
                Some(json!({ "name": name, "password": USER_PASSWORD })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        self.login(name, USER_PASSWORD).await
    }

    /// Register `name`, have the admin grant it `role`, and log it in.
    pub async fn user_with_role(&self, name: &str, role: &str) -> String {
        let token = self.viewer(name).await;

        let admin = self.login_admin().await;
        let (status, _) = self
            .json_request("PUT", &format!("/roles/{name}/{role}"), None, Some(&admin))
            .await;
        assert_eq!(status, StatusCode::OK);

        token
    }

    pub async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        content: &[u8],
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/files")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let body = multipart_body(filename, content_type, content);
        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}

/// Build a multipart/form-data body with a single `file` field.
pub fn multipart_body(filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}
