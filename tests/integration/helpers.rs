//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::Utc;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use clubhouse_api::AppState;
use clubhouse_auth::JwtEncoder;
use clubhouse_core::config::AppConfig;
use clubhouse_database::Stores;
use clubhouse_device::{DeviceEndpoint, DeviceGateway, MockDeviceConnector, MockTerminal};
use clubhouse_entity::staff::Staff;
use clubhouse_entity::user::{User, UserRole};
use clubhouse_service::Services;

const BOUNDARY: &str = "clubhouse-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// In-memory stores shared with the router
    pub stores: Stores,
    /// Simulated terminals
    pub mock: MockDeviceConnector,
    /// Application config
    pub config: AppConfig,
    encoder: JwtEncoder,
}

/// A stored user with a signed token.
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    /// Create a new test application on in-memory stores and mock terminals
    pub fn new() -> Self {
        let config = AppConfig::default();
        let stores = Stores::memory();
        let mock = MockDeviceConnector::new();
        let gateway = DeviceGateway::new(Arc::new(mock.clone()), &config.device);
        let services = Services::new(&stores, gateway, &config);
        let encoder = JwtEncoder::new(&config.auth);
        let router = clubhouse_api::router::build_router(AppState::new(config.clone(), services));

        Self {
            router,
            stores,
            mock,
            config,
            encoder,
        }
    }

    /// Store a user and sign a token carrying `permissions`
    pub async fn user(&self, username: &str, role: UserRole, permissions: &[&str]) -> TestUser {
        let user = self
            .stores
            .users
            .create(&User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                display_name: Some(format!("{username} (test)")),
                role,
                is_active: true,
                created_at: Utc::now(),
            })
            .await
            .expect("Failed to create user");
        let issued = self
            .encoder
            .issue(
                user.id,
                &user.username,
                user.display_name.as_deref(),
                role,
                permissions.iter().map(|p| p.to_string()).collect(),
            )
            .expect("Failed to issue token");
        TestUser {
            id: user.id,
            token: issued.token,
        }
    }

    /// Store an active staff member
    pub async fn staff(&self, staff_id: &str, name: &str) {
        let now = Utc::now();
        self.stores
            .staff
            .create(&Staff {
                id: Uuid::new_v4(),
                staff_id: staff_id.to_string(),
                name: name.to_string(),
                is_active: true,
                biometric_device_id: None,
                biometric_device_user_id: None,
                biometric_registered_at: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("Failed to create staff");
    }

    /// Bring up a reachable mock terminal
    pub fn terminal(&self, ip: &str) -> DeviceEndpoint {
        let endpoint = DeviceEndpoint::new(ip, 4370);
        self.mock.add_terminal(endpoint.clone(), MockTerminal::default());
        endpoint
    }

    /// Register machine `machine_id` at `ip` through the API
    pub async fn machine(&self, token: &str, machine_id: &str, ip: &str) -> Value {
        self.terminal(ip);
        let response = self
            .request(
                "POST",
                "/api/biometric/machines",
                Some(serde_json::json!({
                    "machine_id": machine_id,
                    "name": format!("{machine_id} terminal"),
                    "ip_address": ip,
                    "location": "Front desk",
                })),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"].clone()
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Upload an export file as multipart form data
    pub async fn upload(
        &self,
        path: &str,
        machine_id: &str,
        file_name: &str,
        content: &str,
        token: &str,
    ) -> TestResponse {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"machine_id\"\r\n\r\n\
             {machine_id}\r\n\
             --{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );

        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::from(body))
            .expect("Failed to build request");

        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
        let text = String::from_utf8_lossy(&body_bytes).to_string();

        TestResponse {
            status,
            body,
            text,
            content_type,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
    /// Raw body text
    pub text: String,
    /// Response content type
    pub content_type: String,
}
