#![allow(dead_code)]

use dues_service::config::{Config, DatabaseConfig, ServerConfig};
use dues_service::startup::Application;
use secrecy::Secret;
use std::time::Duration;

pub const TEST_ADMIN: &str = "admin@firm.example";
pub const TEST_CLIENT: &str = "client@example.com";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: mongodb::Database,
    pub db_name: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_name = format!("dues_test_{}", uuid::Uuid::new_v4());

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new(
                    std::env::var("TEST_MONGODB_URI")
                        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                ),
                db_name: db_name.clone(),
                op_timeout_secs: 5,
            },
            service_name: "dues-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the HTTP server to come up.
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        Self {
            address,
            port,
            db,
            db_name,
        }
    }

    /// Request builder with the identity headers the frontends send.
    pub fn request(
        &self,
        client: &reqwest::Client,
        method: reqwest::Method,
        path: &str,
        email: &str,
        admin: bool,
    ) -> reqwest::RequestBuilder {
        let builder = client
            .request(method, format!("{}{}", self.address, path))
            .header("X-User-Email", email);
        if admin {
            builder.header("X-User-Role", "admin")
        } else {
            builder
        }
    }

    pub async fn cleanup(&self) {
        self.db.drop(None).await.ok();
    }
}
