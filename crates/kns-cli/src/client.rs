//! Async HTTP client wrapping the KNS JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use kns_core::{
  group::Group,
  hierarchy::MoveKind,
  notification::DrawerSection,
  profile::Profile,
  tree::GroupNode,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

/// Header naming the acting profile.
const ACTING_HEADER: &str = "x-kns-profile";

/// Connection settings for the KNS API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Slug of the acting profile; empty for anonymous reads.
  pub profile:  String,
}

/// Body of `GET /api/notifications`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Drawer {
  pub count:    usize,
  pub sections: Vec<DrawerSection>,
}

/// Async HTTP client for the KNS JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  pub fn has_profile(&self) -> bool { !self.config.profile.is_empty() }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn acting(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.profile.is_empty() {
      req
    } else {
      req.header(ACTING_HEADER, &self.config.profile)
    }
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    tracing::debug!(path, "GET");
    let resp = self
      .acting(self.client.get(self.url(path)))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    let resp = check(resp, "GET", path).await?;
    resp.json().await.with_context(|| format!("deserialising {path}"))
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  /// `GET /api/groups`
  pub async fn list_groups(&self) -> Result<Vec<Group>> { self.get("/groups").await }

  /// `GET /api/groups/{slug}/tree`
  pub async fn tree(&self, slug: &str) -> Result<GroupNode> {
    self.get(&format!("/groups/{slug}/tree")).await
  }

  /// `GET /api/groups/{slug}/members`
  pub async fn members(&self, slug: &str) -> Result<Vec<Profile>> {
    self.get(&format!("/groups/{slug}/members")).await
  }

  /// `POST /api/groups/{slug}/move-to-child` or `/move-to-sister`
  pub async fn move_member(
    &self,
    kind: MoveKind,
    group_slug: &str,
    profile_slug: &str,
    target_slug: &str,
  ) -> Result<()> {
    let action = match kind {
      MoveKind::ChildGroup => "move-to-child",
      MoveKind::SisterGroup => "move-to-sister",
    };
    let path = format!("/groups/{group_slug}/{action}");
    tracing::info!(path, profile = profile_slug, target = target_slug, "moving member");
    let resp = self
      .acting(self.client.post(self.url(&path)))
      .json(&json!({ "profile_slug": profile_slug, "target_group_slug": target_slug }))
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    check(resp, "POST", &path).await?;
    Ok(())
  }

  // ── Drawer ────────────────────────────────────────────────────────────────

  /// `GET /api/notifications`
  pub async fn drawer(&self) -> Result<Drawer> { self.get("/notifications").await }
}

/// Turn a non-2xx response into an error carrying the API's message.
async fn check(resp: Response, method: &str, path: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = resp
    .json::<serde_json::Value>()
    .await
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
    .unwrap_or_default();
  tracing::warn!(method, path, %status, reason = %message, "request refused");
  Err(anyhow!("{method} {path} → {status} {message}"))
}
