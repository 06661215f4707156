//! Shared test helpers for cdn-store unit tests.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::session::SessionStore;
use crate::config::{AuthConfig, Config, NodeConfig};
use crate::service::Service;
use crate::storage::models::{Identity, Password};
use crate::storage::Database;
use crate::AppState;

pub const TEST_ADMIN_PASSWORD: &str = "admin-test-password";

/// Create a test AppState with a temporary database and `admin` bootstrapped.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");

    let config = Config {
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        auth: AuthConfig {
            bootstrap_admin_password: Some(Password::new(TEST_ADMIN_PASSWORD)),
            ..AuthConfig::default()
        },
        max_request_body: 10 * 1024 * 1024, // 10MB for tests
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let mut service = Service::new(db);
    service
        .bootstrap(
            &Identity::new(config.auth.bootstrap_admin.clone()),
            config.auth.bootstrap_admin_password.as_ref(),
        )
        .expect("Failed to bootstrap admin");

    Arc::new(AppState {
        sessions: SessionStore::new(config.auth.session_ttl_secs),
        service: Mutex::new(service),
        config,
    })
}
