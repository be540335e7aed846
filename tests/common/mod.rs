#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

use profile_api::config::{AppConfig, Environment};
use profile_api::identity::{JwtVerifier, TokenIssuer};
use profile_api::profile::{Profile, ProfileFields, ProfileRepository};
use profile_api::store::MemoryProfileStore;
use profile_api::{router, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router served in-process on a free port, backed by a memory store.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryProfileStore>,
    issuer: TokenIssuer,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(Vec::new()).await
    }

    pub async fn spawn_with(profiles: Vec<Profile>) -> Result<Self> {
        let mut config = AppConfig::for_environment(Environment::Development);
        config.security.jwt_secret = TEST_SECRET.to_string();
        config.server.enable_request_logging = false;

        let store = Arc::new(MemoryProfileStore::with_profiles(profiles).await);
        let verifier = JwtVerifier::from_config(&config.security)?;
        let repository = ProfileRepository::new(store.clone(), config.profile.clone());
        let app = router(AppState::new(repository, Arc::new(verifier)), &config);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            issuer: TokenIssuer::from_config(&config.security)?,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token_for(&self, email: &str) -> Result<String> {
        Ok(self.issuer.issue(&format!("uid-{}", email), email)?)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub fn profile(id: &str, email: &str, ratings: f64, rents: u32, active: i64) -> Profile {
    Profile {
        id: id.to_string(),
        fields: ProfileFields {
            name: Some(format!("User {}", id)),
            email: Some(email.to_string()),
            age: Some(30.0),
            total_average_weight_ratings: Some(ratings),
            number_of_rents: Some(rents),
            recently_active: Some(active),
            ..Default::default()
        },
    }
}
