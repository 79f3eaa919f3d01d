//! 用户认证
//!
//! 对外部认证后端的轻薄封装：登录、注册、注销和当前用户查询。
//! 会话由外部服务拥有，这里只缓存当前值和一个加载中标志。
//! 注销失败只记录日志，不向用户暴露（静默失败策略）。

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use clinic_core::validation::{validate_email, validate_name, validate_password};
use clinic_core::{ClinicError, FieldErrors, Result, Session, User};
use clinic_store::AuthBackend;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::handlers::{ApiError, ApiResult, AppState};

/// 认证服务
///
/// 三种界面状态：加载中、已登录、匿名。
#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn AuthBackend>,
    sessions: Arc<RwLock<HashMap<String, User>>>,
    /// 外部注销失败时留下的令牌墓碑；注销成功的令牌由外部服务失效，无需记录
    revoked: Arc<RwLock<HashSet<String>>>,
    in_flight: Arc<AtomicUsize>,
}

/// 统计在途后端调用的守卫
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AuthService {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            revoked: Arc::new(RwLock::new(HashSet::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 是否有在途的认证调用
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// 用户登录
    ///
    /// 失败时只返回统一的"请检查凭据"提示，不区分具体原因。
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let mut errors = FieldErrors::new();
        if let Some(err) = validate_email(email) {
            errors.add("email", err.message);
        }
        if password.is_empty() {
            errors.add("password", "Password is required");
        }
        if !errors.is_empty() {
            return Err(ClinicError::Validation(errors));
        }

        let _guard = InFlightGuard::enter(&self.in_flight);
        let session = self.backend.login(email, password).await?;

        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.user.clone());
        info!("User logged in: {}", session.user.email);
        Ok(session)
    }

    /// 注册新账号并视为已登录
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let mut errors = FieldErrors::new();
        if let Some(err) = validate_name(name) {
            errors.add("name", err.message);
        }
        if let Some(err) = validate_email(email) {
            errors.add("email", err.message);
        }
        if let Some(err) = validate_password(password) {
            errors.add("password", err.message);
        }
        if !errors.is_empty() {
            return Err(ClinicError::Validation(errors));
        }

        let _guard = InFlightGuard::enter(&self.in_flight);
        let session = self.backend.register(email, password, name).await?;

        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.user.clone());
        info!("User registered: {}", session.user.email);
        Ok(session)
    }

    /// 注销会话
    ///
    /// 外部调用失败只记录日志；本地缓存无条件清除，调用方永远成功。
    pub async fn logout(&self, token: &str) {
        let _guard = InFlightGuard::enter(&self.in_flight);
        if let Err(e) = self.backend.logout(token).await {
            warn!("Logout call failed (ignored): {}", e);
            // 外部会话可能仍然存活，本地记为已注销
            self.revoked.write().await.insert(token.to_string());
        }
        self.sessions.write().await.remove(token);
    }

    /// 查询会话对应的当前用户
    ///
    /// 本地已注销的令牌一律视为匿名，不再回查外部服务。
    pub async fn current_user(&self, token: &str) -> Result<Option<User>> {
        if self.revoked.read().await.contains(token) {
            return Ok(None);
        }
        if let Some(user) = self.sessions.read().await.get(token) {
            return Ok(Some(user.clone()));
        }

        let _guard = InFlightGuard::enter(&self.in_flight);
        let user = self.backend.get_current_user(token).await?;
        if let Some(ref user) = user {
            self.sessions
                .write()
                .await
                .insert(token.to_string(), user.clone());
        }
        Ok(user)
    }
}

/// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 注册请求
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// 会话响应
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
    pub redirect_to: &'static str,
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// 认证中间件：解析 Bearer token 并将用户注入请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let token = bearer_token(&request)
        .map(|t| t.to_string())
        .ok_or(ClinicError::Authentication)?;

    match state.auth.current_user(&token).await? {
        Some(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        None => Err(ClinicError::Authentication.into()),
    }
}

/// 登录处理器
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(SessionResponse {
        token: session.token,
        user: session.user,
        redirect_to: "/dashboard",
    }))
}

/// 注册处理器
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .auth
        .register(&request.name, &request.email, &request.password)
        .await?;
    Ok(Json(SessionResponse {
        token: session.token,
        user: session.user,
        redirect_to: "/dashboard",
    }))
}

/// 注销处理器（无 token 或无效 token 也一律成功）
pub async fn logout_handler(State(state): State<AppState>, request: Request) -> Json<serde_json::Value> {
    if let Some(token) = bearer_token(&request) {
        state.auth.logout(token).await;
    }
    Json(serde_json::json!({ "status": "logged_out" }))
}

/// 当前用户处理器
pub async fn current_user_handler(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
