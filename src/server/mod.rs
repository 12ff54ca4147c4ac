use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::directory::{fetch_live_payload, DirectoryView};
use crate::output::page;
use crate::proxy::{self, ProxyState, SettingsSource};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub bind: String,
    pub port: u16,
    /// Where the view fetches live data from. Defaults to this server's own
    /// proxy route.
    pub proxy_url: Option<String>,
    pub api_root: String,
    pub timeout_seconds: u64,
    pub settings: SettingsSource,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8888,
            proxy_url: None,
            api_root: proxy::DEFAULT_API_ROOT.to_string(),
            timeout_seconds: 10,
            settings: SettingsSource::Environment,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub view: Arc<Mutex<DirectoryView>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

async fn index(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Html<String> {
    let term = query.q.unwrap_or_default();
    let mut view = state.view.lock().await;
    view.filter(&term);
    Html(page::render_page(view.rendered(), &term))
}

async fn results_fragment(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Html<String> {
    let term = query.q.unwrap_or_default();
    let mut view = state.view.lock().await;
    view.filter(&term);
    Html(page::render_results_fragment(view.rendered()))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let view = state.view.lock().await;
    Json(json!({
        "status": "ok",
        "view": view.status(),
        "last_load": view.last_load(),
    }))
}

pub fn build_router(proxy_state: Arc<ProxyState>, view: Arc<Mutex<DirectoryView>>) -> Router {
    let pages = Router::new()
        .route("/", get(index))
        .route("/results", get(results_fragment))
        .route("/health", get(health))
        .with_state(AppState { view });
    pages
        .merge(proxy::router(proxy_state))
        .layer(TraceLayer::new_for_http())
}

pub fn build_http_client(timeout_seconds: u64) -> Result<reqwest::Client, ServerError> {
    reqwest::Client::builder()
        .user_agent(concat!("company-directory/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| ServerError::HttpClientBuild { source: e })
}

/// The one live load. The fetch runs without the view lock so filters keep
/// working on placeholder data until it resolves.
pub fn spawn_live_load(
    view: Arc<Mutex<DirectoryView>>,
    client: reqwest::Client,
    proxy_url: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let fetched = fetch_live_payload(&client, &proxy_url).await;
        let mut view = view.lock().await;
        view.apply_live(fetched);
    })
}

fn self_proxy_url(local: SocketAddr) -> String {
    let host = match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}{}", SocketAddr::new(host, local.port()), proxy::ROUTE)
}

/// A bound listener with its router and shared view. The live load is
/// already in flight once this exists.
pub struct BoundServer {
    listener: TcpListener,
    local: SocketAddr,
    app: Router,
    view: Arc<Mutex<DirectoryView>>,
}

impl BoundServer {
    pub async fn bind(options: &ServerOptions) -> Result<Self, ServerError> {
        let client = build_http_client(options.timeout_seconds)?;

        let addr = format!("{}:{}", options.bind, options.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;
        let local = listener.local_addr().map_err(|e| ServerError::Bind {
            addr: addr.clone(),
            source: e,
        })?;

        let proxy_state = Arc::new(ProxyState::new(
            client.clone(),
            &options.api_root,
            options.settings.clone(),
        ));
        let view = Arc::new(Mutex::new(DirectoryView::default()));
        let app = build_router(proxy_state, Arc::clone(&view));

        let proxy_url = options
            .proxy_url
            .clone()
            .unwrap_or_else(|| self_proxy_url(local));
        info!(%local, %proxy_url, "directory server listening");
        spawn_live_load(Arc::clone(&view), client, proxy_url);

        Ok(Self {
            listener,
            local,
            app,
            view,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    pub fn view(&self) -> Arc<Mutex<DirectoryView>> {
        Arc::clone(&self.view)
    }

    pub async fn run(self) -> Result<(), ServerError> {
        axum::serve(self.listener, self.app)
            .await
            .map_err(|e| ServerError::Serve { source: e })
    }
}

pub async fn serve(options: ServerOptions) -> Result<(), ServerError> {
    BoundServer::bind(&options).await?.run().await
}
