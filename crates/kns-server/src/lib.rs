//! HTTP server for the Kingdom Nurturing Suite.
//!
//! Mounts the JSON API under `/api` and serves the few static assets that
//! live outside it.

use std::{io, path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::State,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
  routing::get,
};
use kns_core::{settings::Settings, store::CommunityStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `KNS_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// The blank consent form offered at `/consent-form.pdf`.
  pub consent_form_path: PathBuf,
  /// Overrides the stored adult age when set.
  #[serde(default)]
  pub adult_age:         Option<u32>,
}

impl ServerConfig {
  /// Write any configured overrides into the store's settings row.
  pub async fn apply_overrides<S: CommunityStore>(&self, store: &S) -> Result<Settings, S::Error> {
    let mut settings = store.settings().await?;
    let Some(adult_age) = self.adult_age else {
      return Ok(settings);
    };
    if settings.adult_age != adult_age {
      settings.adult_age = adult_age;
      settings = store.update_settings(settings).await?;
      tracing::info!(adult_age, "adult age overridden from config");
    }
    Ok(settings)
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// State for the routes outside `/api`.
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full server router for `store`.
pub fn router<S>(store: Arc<S>, config: Arc<ServerConfig>) -> Router
where
  S: CommunityStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .route("/consent-form.pdf", get(consent_form))
    .with_state(AppState { config })
    .nest("/api", kns_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

/// `GET /consent-form.pdf`
async fn consent_form(State(state): State<AppState>) -> Response {
  let path = &state.config.consent_form_path;
  match tokio::fs::read(path).await {
    Ok(bytes) => (
      [
        (header::CONTENT_TYPE, "application/pdf"),
        (header::CONTENT_DISPOSITION, "attachment; filename=\"consent-form.pdf\""),
      ],
      bytes,
    )
      .into_response(),
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      tracing::warn!(path = %path.display(), "consent form template missing");
      (StatusCode::NOT_FOUND, "consent form not available").into_response()
    }
    Err(e) => {
      tracing::error!(path = %path.display(), error = %e, "failed to read consent form");
      StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{body::Body, http::Request};
  use kns_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  fn config(consent_form_path: PathBuf) -> ServerConfig {
    ServerConfig {
      host: "127.0.0.1".to_string(),
      port: 8080,
      store_path: PathBuf::from(":memory:"),
      consent_form_path,
      adult_age: None,
    }
  }

  async fn app(consent_form_path: PathBuf) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(Arc::new(store), Arc::new(config(consent_form_path)))
  }

  async fn get(app: Router, uri: &str) -> Response {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(req).await.unwrap()
  }

  #[tokio::test]
  async fn health_is_ok() {
    let resp = get(app(PathBuf::from("missing.pdf")).await, "/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_is_nested() {
    let resp = get(app(PathBuf::from("missing.pdf")).await, "/api/countries").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get(app(PathBuf::from("missing.pdf")).await, "/countries").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn consent_form_is_served_as_download() {
    let path = std::env::temp_dir().join(format!("kns-consent-{}.pdf", Uuid::new_v4()));
    std::fs::write(&path, b"%PDF-1.4 test").unwrap();

    let resp = get(app(path.clone()).await, "/consent-form.pdf").await;
    std::fs::remove_file(&path).ok();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment"), "{disposition}");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"%PDF-1.4 test");
  }

  #[tokio::test]
  async fn missing_consent_form_is_404() {
    let path = std::env::temp_dir().join(format!("kns-missing-{}.pdf", Uuid::new_v4()));
    let resp = get(app(path).await, "/consent-form.pdf").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn adult_age_override_is_persisted() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let untouched = config(PathBuf::new()).apply_overrides(&store).await.unwrap();
    assert_eq!(untouched.adult_age, 16);

    let cfg = ServerConfig { adult_age: Some(18), ..config(PathBuf::new()) };
    let applied = cfg.apply_overrides(&store).await.unwrap();
    assert_eq!(applied.adult_age, 18);
    assert_eq!(store.settings().await.unwrap().adult_age, 18);
  }
}
