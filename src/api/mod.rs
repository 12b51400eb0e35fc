//! Conversation backend: reply generation and reports over HTTP

pub mod conversation;
pub mod health;
mod history;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use history::SessionHistory;

use crate::model::LanguageModel;
use crate::{Error, Result};

/// State shared by the conversation handlers
#[derive(Clone)]
pub struct ApiState {
    pub model: Arc<dyn LanguageModel>,
    pub history: SessionHistory,
}

impl ApiState {
    /// Fresh state with empty history
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            history: SessionHistory::new(),
        }
    }
}

/// The backend service
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    widget_dir: Option<PathBuf>,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            port,
            widget_dir: None,
        }
    }

    /// Serve the widget page from `dir` for paths no endpoint matches
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.widget_dir = dir;
        self
    }

    /// Endpoints plus the widget fallback, CORS and request tracing
    #[must_use]
    pub fn router(&self) -> Router {
        let app = Router::new()
            .merge(conversation::router(Arc::clone(&self.state)))
            .merge(health::router());

        let app = match self.widget_dir.as_deref() {
            Some(dir) => app.fallback_service(widget_service(dir)),
            None => app,
        };

        // the widget may be opened from another origin
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        app.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Bind all interfaces on the configured port and serve
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be bound or the server stops with an error
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("cannot bind {addr}: {e}")))?;

        self.serve(listener).await
    }

    /// Serve on a listener the caller already bound
    ///
    /// # Errors
    ///
    /// Returns error if the server stops with an error
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "conversation backend listening");

        let app = self.router();
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Static files from `dir`, with `index.html` for anything missing
fn widget_service(dir: &Path) -> ServeDir<ServeFile> {
    tracing::info!(path = %dir.display(), "serving widget page");
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}
