//! Web服务器

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use clinic_core::{ClinicError, Result};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::{
    auth_middleware, current_user_handler, login_handler, logout_handler, register_handler,
};
use crate::handlers::{
    api_root, create_appointment, dashboard_overview, get_provider, health, list_appointments,
    search_providers, submit_contact, AppState,
};
use crate::intake::{get_intake_session, intake_go_back, start_intake, submit_intake_step};

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self {
            addr,
            app: Self::create_app(state),
        }
    }

    fn create_app(state: AppState) -> Router {
        // 需要认证的路由
        let protected = Router::new()
            .route("/auth/me", get(current_user_handler))
            .nest("/api/v1", protected_api_routes())
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ));

        Router::new()
            // 认证路由（无需token）
            .route("/auth/login", post(login_handler))
            .route("/auth/register", post(register_handler))
            .route("/auth/logout", post(logout_handler))
            // 根路径
            .route("/", get(api_root))
            // 健康检查
            .route("/health", get(health))
            // 公开API路由
            .nest("/api/v1", public_api_routes())
            .merge(protected)
            .with_state(state)
            // 全局中间件
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    ),
            )
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ClinicError::Internal(format!("Failed to bind {}: {}", self.addr, e)))?;
        axum::serve(listener, self.app)
            .await
            .map_err(|e| ClinicError::Internal(format!("Web server terminated: {}", e)))?;

        Ok(())
    }
}

/// 无需认证的 API v1 路由
fn public_api_routes() -> Router<AppState> {
    Router::new()
        .route("/providers", get(search_providers))
        .route("/providers/:provider_id", get(get_provider))
        .route("/contact", post(submit_contact))
}

/// 需要认证的 API v1 路由
fn protected_api_routes() -> Router<AppState> {
    Router::new()
        .route("/intake/sessions", post(start_intake))
        .route("/intake/sessions/:session_id", get(get_intake_session))
        .route(
            "/intake/sessions/:session_id/steps/:step",
            post(submit_intake_step),
        )
        .route("/intake/sessions/:session_id/back", post(intake_go_back))
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route("/dashboard", get(dashboard_overview))
}
