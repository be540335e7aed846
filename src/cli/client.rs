//! Thin HTTP client for the Profile API.

use anyhow::{anyhow, bail, Context};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use crate::profile::{Profile, RankedPage};

pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url).with_context(|| format!("invalid API URL {:?}", base_url))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("invalid endpoint path {:?}", path))
    }

    pub async fn verify_user(&self, token: &str) -> anyhow::Result<bool> {
        let body: Value = self
            .send(self.request(Method::POST, "api/verify-user")?.json(&json!({ "tokenId": token })))
            .await?;
        Ok(body["isLoggedIn"].as_bool().unwrap_or(false))
    }

    pub async fn fetch_profile(&self) -> anyhow::Result<Profile> {
        self.send(self.authorized(Method::GET, "api/fetch-user-data")?).await
    }

    pub async fn update_profile(&self, patch: &Value) -> anyhow::Result<Value> {
        self.send(self.authorized(Method::PUT, "api/update-user-data")?.json(patch))
            .await
    }

    /// Returns the id of the new profile.
    pub async fn create_profile(&self, fields: &Value) -> anyhow::Result<String> {
        let body: Value = self
            .send(self.request(Method::POST, "api/create-user")?.json(fields))
            .await?;
        body["userId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("response has no userId: {}", body))
    }

    pub async fn grouped_users(&self, page_size: u32, last_visible_id: Option<&str>) -> anyhow::Result<RankedPage> {
        let mut url = self.endpoint("api/grouped-user")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &page_size.to_string());
            if let Some(id) = last_visible_id {
                query.append_pair("lastVisibleId", id);
            }
        }
        self.send(self.http.get(url)).await
    }

    pub async fn health(&self) -> anyhow::Result<Value> {
        self.send(self.request(Method::GET, "health")?).await
    }

    fn request(&self, method: Method, path: &str) -> anyhow::Result<RequestBuilder> {
        Ok(self.http.request(method, self.endpoint(path)?))
    }

    fn authorized(&self, method: Method, path: &str) -> anyhow::Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("no token given; pass --token or set PROFILE_API_TOKEN"))?;
        Ok(self.request(method, path)?.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> anyhow::Result<T> {
        let response = request.send().await.context("request failed")?;
        let status = response.status();
        if !status.is_success() {
            bail!("{}", error_message(status, response).await);
        }
        response.json::<T>().await.context("unexpected response body")
    }
}

async fn error_message(status: StatusCode, response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or(text);
    format!("{} ({})", detail, status)
}
