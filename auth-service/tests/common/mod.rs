use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth_service::domain::admission::models::BucketPolicy;
use auth_service::domain::admission::service::AdmissionController;
use auth_service::domain::credential::service::CredentialService;
use auth_service::domain::credential::validator::TokenValidator;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::repositories::InMemoryCredentialStore;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Knobs for a spawned test server
pub struct TestSettings {
    pub requests_per_second: f64,
    pub burst: f64,
    pub trust_forwarded_for: bool,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            requests_per_second: 1000.0,
            burst: 1000.0,
            trust_forwarded_for: false,
        }
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub authenticator: Authenticator,
}

impl TestApp {
    /// Spawn the application with a permissive rate limit
    pub async fn spawn() -> Self {
        Self::spawn_with(TestSettings::default()).await
    }

    /// Spawn the application in a background task and return TestApp
    pub async fn spawn_with(settings: TestSettings) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(InMemoryCredentialStore::new());
        let authenticator = Arc::new(Authenticator::new(TEST_SECRET, TOKEN_TTL));
        let store_timeout = Duration::from_secs(3);

        let validator = Arc::new(TokenValidator::new(
            Arc::clone(&store),
            Arc::clone(&authenticator),
            store_timeout,
        ));
        let credential_service = Arc::new(CredentialService::new(
            store,
            authenticator,
            Arc::clone(&validator),
            store_timeout,
        ));
        let admission = Arc::new(AdmissionController::new(BucketPolicy::new(
            settings.requests_per_second,
            settings.burst,
            Duration::from_secs(180),
        )));

        let router = create_router(
            credential_service,
            validator,
            admission,
            settings.trust_forwarded_for,
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            authenticator: Authenticator::new(TEST_SECRET, TOKEN_TTL),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register a user and return the response `data` object
    pub async fn sign_up(&self, email: &str, password: &str, username: &str) -> serde_json::Value {
        let response = self
            .post("/api/auth/signup")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "username": username,
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"].clone()
    }
}
