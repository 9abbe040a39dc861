//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the dispatch handler
//! - Wire up middleware (tracing, timeout, request ID, concurrency limit)
//! - Resolve every request path through the alias router
//! - Redirect to canonical aliases, hand everything else to the dispatcher
//! - Apply hot-reloaded bindings and flush the router cache on shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    extract::{Request, State},
    http::Method,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::{AdminConfig, AppConfig, RouterConfig};
use crate::dispatch::{DispatchRequest, Dispatcher, EchoDispatcher, RequestPath, RouteTarget};
use crate::http::request::{request_id, RequestUuid};
use crate::http::response::permanent_redirect;
use crate::observability::metrics;
use crate::routing::AliasRouter;
use crate::store::file::FileStore;
use crate::store::StoreError;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<AliasRouter>,
    pub dispatcher: Arc<dyn Dispatcher>,
    pub config: Arc<ArcSwap<RouterConfig>>,
    pub admin: Arc<AdminConfig>,
}

impl AppState {
    /// Take over the router settings and binding list of a reloaded config.
    pub fn reload(&self, config: RouterConfig) {
        let current = self.config.load();
        if current.cache_file != config.cache_file {
            tracing::warn!(
                current = ?current.cache_file,
                requested = ?config.cache_file,
                "Cache file changes take effect on restart"
            );
        }

        self.router.set_autosave(config.autosave);
        let changed = self.router.apply(config.binding_pairs());
        tracing::info!(
            bindings = config.bindings.len(),
            changed,
            "Router configuration reloaded"
        );
        self.config.store(Arc::new(config));
    }
}

/// HTTP front end of the dispatcher.
pub struct HttpServer {
    app: Router,
    state: AppState,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server that answers with the [`EchoDispatcher`].
    pub fn new(config: AppConfig) -> Result<Self, StoreError> {
        Self::with_dispatcher(config, EchoDispatcher)
    }

    /// Create a server around an application dispatcher.
    ///
    /// Attaches the cache file (if configured) before applying the
    /// configured bindings, so bindings already in the cache are kept along
    /// with their memoized answers.
    pub fn with_dispatcher<D: Dispatcher>(config: AppConfig, dispatcher: D) -> Result<Self, StoreError> {
        let router = Arc::new(AliasRouter::new());
        router.set_autosave(config.router.autosave);

        if let Some(path) = &config.router.cache_file {
            attach_cache(&router, path)?;
            tracing::info!(path = %path, bindings = router.len(), "Router cache attached");
        }

        router.apply(config.router.binding_pairs());

        let state = AppState {
            router,
            dispatcher: Arc::new(dispatcher),
            config: Arc::new(ArcSwap::from_pointee(config.router.clone())),
            admin: Arc::new(config.admin.clone()),
        };

        let app = Self::build_app(&config, state.clone());
        Ok(Self { app, state, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RequestUuid))
    }

    /// The alias router behind this server.
    pub fn router(&self) -> Arc<AliasRouter> {
        self.state.router.clone()
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations arriving on `config_updates` are applied as they come.
    /// The admin API is served on its own listener when enabled. The router
    /// cache is flushed once both listeners have stopped.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let Self { app, state, config } = self;

        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            bindings = state.router.len(),
            "HTTP server starting"
        );

        let reload_state = state.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(new_config) => reload_state.reload(new_config.router),
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        let admin_task = if config.admin.enabled {
            let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
            let admin_app = setup_admin_router(state.clone());
            let mut admin_shutdown = shutdown.resubscribe();
            tracing::info!(address = %config.admin.bind_address, "Admin API listening");

            Some(tokio::spawn(async move {
                let served = axum::serve(admin_listener, admin_app)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = served {
                    tracing::error!(error = %e, "Admin API failed");
                }
            }))
        } else {
            None
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Some(task) = admin_task {
            let _ = task.await;
        }

        match state.router.flush() {
            Ok(true) => tracing::info!("Router cache flushed"),
            Ok(false) => {}
            Err(e) => tracing::error!(error = %e, "Failed to flush router cache"),
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Attach the cache file at `path`.
///
/// A cache that exists but cannot be parsed is moved aside and replaced by an
/// empty one; the bindings come back from the config.
fn attach_cache(router: &AliasRouter, path: &str) -> Result<(), StoreError> {
    let store = FileStore::open(path)?;
    match router.attach_store(store.clone()) {
        Err(StoreError::Corrupt(reason)) => {
            let moved_to = store.quarantine()?;
            tracing::error!(
                path = %path,
                moved_to = ?moved_to,
                reason = %reason,
                "Router cache is corrupt, starting with an empty cache"
            );
            router.attach_store(FileStore::open(path)?)
        }
        attached => attached,
    }
}

/// Resolve the request path and redirect or dispatch.
async fn dispatch_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().clone();
    let config = state.config.load_full();

    let path = RequestPath::parse(request.uri().path(), request.uri().query(), &config.base_path);
    let route = state.router.route_for(&path.alias);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        alias = %path.alias,
        route = %route,
        "Request resolved"
    );

    if config.canonical_redirect && (method == Method::GET || method == Method::HEAD) {
        let canonical = state.router.alias_for(&route);
        // Only redirect when the canonical alias leads back here.
        if canonical != path.alias && state.router.route_for(&canonical) == route {
            let location = path.location_for(&config.base_path, &canonical);
            match permanent_redirect(&location) {
                Ok(response) => {
                    tracing::debug!(
                        request_id = %request_id,
                        alias = %path.alias,
                        location = %location,
                        "Redirecting to canonical alias"
                    );
                    metrics::record_redirect();
                    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
                    return response;
                }
                Err(e) => {
                    tracing::warn!(request_id = %request_id, location = %location, error = %e, "Unusable redirect location");
                }
            }
        }
    }

    let target = RouteTarget::from_route(&route, &config.default_controller, &config.default_action);
    let response = state.dispatcher.dispatch(DispatchRequest {
        request_id,
        method: method.clone(),
        alias: path.alias,
        route,
        target,
        format: path.format,
        query: path.query,
    });

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}
