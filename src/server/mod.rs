//! Read-only dashboard over the persisted snapshot.

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::IntoResponse;
use axum::Router;
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::server::api::{Dashboard, DashboardError};

pub mod api;
pub mod routes;
pub mod views;

/// Static assets under `/static`, everything else through [`routes::route_request`].
pub fn router(dashboard: Arc<Dashboard>, static_dir: &Path) -> Router {
    Router::new()
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(dispatch)
        .with_state(dashboard)
}

async fn dispatch(State(dashboard): State<Arc<Dashboard>>, method: Method, uri: Uri) -> impl IntoResponse {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let response = routes::route_request(&dashboard, method.as_str(), &path);
    tracing::debug!(%method, path = %path, status = response.status_code, "request");
    response
}

pub async fn serve(config: &AppConfig) -> Result<(), DashboardError> {
    let dashboard = Arc::new(Dashboard::load(config)?);
    tracing::info!(
        rows = dashboard.table().len(),
        countries = views::countries(dashboard.table()).len(),
        "snapshot loaded"
    );

    let app = router(dashboard, &config.dashboard.static_dir);
    let listener = tokio::net::TcpListener::bind(config.dashboard.bind.as_str()).await?;
    tracing::info!("dashboard listening on http://{}", config.dashboard.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
