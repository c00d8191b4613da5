use axum::http::HeaderValue;
use axum::routing::{delete, get, patch, post, put};
use axum::{middleware, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fuse_api::config::AppConfig;
use fuse_api::database::DatabaseManager;
use fuse_api::handlers::{protected, public};
use fuse_api::middleware::session_auth_middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = fuse_api::config::config();
    tracing::info!("Starting FUSE API in {:?} mode", config.environment);

    // Migrations are best-effort at boot: a missing database leaves the
    // server up in degraded mode (health reports it) rather than refusing
    // to start.
    if let Err(e) = DatabaseManager::migrate().await {
        tracing::warn!("Skipping migrations, database unavailable: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("FUSE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("FUSE API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        // Protected API behind the session middleware
        .merge(api_routes().layer(middleware::from_fn(session_auth_middleware)))
        // Global middleware
        .layer(cors_layer(fuse_api::config::config()))
        .layer(TraceLayer::new_for_http())
}

/// CORS from config: the configured origin list when one is given, wide open
/// when the list is empty, and a no-origin layer when CORS is disabled.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.api.enable_cors {
        return CorsLayer::new();
    }
    let origins = allowed_origins(config);
    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

fn allowed_origins(config: &AppConfig) -> Vec<HeaderValue> {
    config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect()
}

fn auth_routes() -> Router {
    use public::{session, sign_in};

    Router::new()
        .route("/auth/sign-in", post(sign_in::sign_in_post))
        .route("/auth/verify", post(sign_in::verify_post))
        .route(
            "/auth/session",
            get(session::session_get).delete(session::session_delete),
        )
}

fn api_routes() -> Router {
    account_routes()
        .merge(user_routes())
        .merge(audit_routes())
        .merge(record_routes())
}

fn account_routes() -> Router {
    use protected::account;

    Router::new()
        .route("/api/account", get(account::account_get))
        .route("/api/account/profile", patch(account::profile_patch))
        .route("/api/account/theme", put(account::theme_put))
        .route("/api/account/avatar", put(account::avatar_put))
        .route("/api/account/widgets", put(account::widgets_put))
        .route("/api/account/email", post(account::email_post))
        .route(
            "/api/account/setup-complete",
            post(account::setup_complete_post),
        )
}

fn user_routes() -> Router {
    use protected::users;

    Router::new()
        .route("/api/users", get(users::users_list))
        .route("/api/users/:id/rank", put(users::rank_put))
        .route("/api/users/:id/subscription", put(users::subscription_put))
        .route("/api/users/:id", delete(users::user_delete))
        .route("/api/users/delete-batch", post(users::users_delete_batch))
}

fn audit_routes() -> Router {
    use protected::audit;

    Router::new()
        .route("/api/audit", get(audit::audit_list))
        .route("/api/audit/:id", delete(audit::audit_delete))
}

fn record_routes() -> Router {
    use protected::records;

    Router::new()
        .route(
            "/api/projects",
            get(records::projects_list).post(records::project_post),
        )
        .route(
            "/api/projects/:id",
            patch(records::project_patch).delete(records::project_delete),
        )
        .route(
            "/api/clients",
            get(records::clients_list).post(records::client_post),
        )
        .route(
            "/api/clients/:id",
            patch(records::client_patch).delete(records::client_delete),
        )
        .route(
            "/api/transactions",
            get(records::transactions_list).post(records::transaction_post),
        )
        .route(
            "/api/transactions/:id",
            patch(records::transaction_patch).delete(records::transaction_delete),
        )
        .route(
            "/api/productivity",
            get(records::productivity_list).post(records::productivity_post),
        )
        .route(
            "/api/productivity/:id",
            patch(records::productivity_patch).delete(records::productivity_delete),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "FUSE API",
            "version": version,
            "description": "Business management backend with rank-based access",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/sign-in, /auth/verify, /auth/session (public)",
                "account": "/api/account/* (protected - self-scoped)",
                "users": "/api/users/* (protected - commodore+)",
                "audit": "/api/audit (protected - commodore+)",
                "records": "/api/projects, /api/clients, /api/transactions, /api/productivity (protected)",
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_origins_parse_into_header_values() {
        let config = fuse_api::config::config();
        let origins = allowed_origins(config);
        assert_eq!(origins.len(), config.api.cors_origins.len());
    }
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
