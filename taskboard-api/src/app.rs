/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_shared::store::PgRecordStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let state = AppState::new(Arc::new(PgRecordStore::new(pool)), config);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, build_router(state)).await?;
/// # Ok(())
/// # }
/// ```
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, put},
    Router,
};
use taskboard_shared::commands::{TaskCommandService, UserCommandService};
use taskboard_shared::dashboard::DashboardData;
use taskboard_shared::query::TaskQueryService;
use taskboard_shared::store::RecordStore;
use taskboard_shared::views::ViewCache;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;
use crate::middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer};
use crate::routes;

/// Shared application state
///
/// Cloned per request by Axum's `State` extractor; every field is an `Arc`
/// or wraps one.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub views: Arc<ViewCache>,
    pub config: Arc<Config>,
    pub queries: TaskQueryService,
    pub tasks: TaskCommandService,
    pub users: UserCommandService,
    pub dashboard: DashboardData,
}

impl AppState {
    /// Wires the services over one store and one view cache
    pub fn new(store: Arc<dyn RecordStore>, config: Config) -> Self {
        let views = Arc::new(ViewCache::new());

        Self {
            queries: TaskQueryService::new(store.clone()),
            tasks: TaskCommandService::new(store.clone(), views.clone()),
            users: UserCommandService::new(store.clone(), views.clone()),
            dashboard: DashboardData::new(store.clone(), views.clone()),
            store,
            views,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token validation
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                        # public
/// └── /api                               # Bearer JWT required
///     ├── GET    /tasks                  # filtered, paginated listing
///     ├── POST   /tasks                  # create
///     ├── PUT    /tasks/:id              # full update
///     ├── DELETE /tasks/:id
///     ├── PATCH  /tasks/:id/status
///     ├── PATCH  /tasks/:id/priority
///     ├── GET    /board?page=N           # priority lanes for the caller
///     ├── GET    /users                  # admin
///     ├── POST   /users                  # admin
///     └── DELETE /users/:id              # admin, deletes the user's tasks
/// ```
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let api_routes = Router::new()
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id/status", patch(routes::tasks::update_task_status))
        .route(
            "/tasks/:id/priority",
            patch(routes::tasks::update_task_priority),
        )
        .route("/board", get(routes::board::get_board))
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route("/users/:id", delete(routes::users::delete_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
