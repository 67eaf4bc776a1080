// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;

use crate::config::issuer::{IssuerConfig, SecretConfig, SecretEncoding, SecretSource};
use crate::config::settings::{MetricsConfig, ServerConfig, SettingsConfig};
use crate::grant::issuer::GrantIssuer;
use crate::secret::shared_secret::SharedSecret;

pub const TEST_SECRET: &str = "test-secret-0123456789-abcdefghij";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn issuer_config(secret: &str) -> IssuerConfig {
    IssuerConfig {
        algorithm: Default::default(),
        secret: SecretConfig {
            source: SecretSource::Literal { value: secret.to_string() },
            encoding: SecretEncoding::Plain,
        },
        min_secret_bytes: 32,
        default_validity_minutes: 60,
        max_validity_minutes: 24 * 60,
        leeway_seconds: 0,
    }
}

pub fn build_issuer(secret: &str) -> Arc<GrantIssuer> {
    let config = issuer_config(secret);
    let secret = SharedSecret::load(&config.secret, config.min_secret_bytes).expect("test secret");
    Arc::new(GrantIssuer::new(Arc::new(secret), &config))
}

pub fn settings(metrics_enabled: bool) -> SettingsConfig {
    SettingsConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: "0".to_string(),
        },
        metrics: MetricsConfig {
            path: "/metrics".to_string(),
            is_enabled: metrics_enabled,
        },
        logging: None,
    }
}
