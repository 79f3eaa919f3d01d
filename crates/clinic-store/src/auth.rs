//! 认证后端
//!
//! 会话生命周期完全委托给外部认证服务；本模块只定义访问接口
//! 和两个实现：HTTP 后端（生产）与内存后端（测试/演示）。
//! 登录失败对调用方不透明，统一映射为通用的凭据错误。

use async_trait::async_trait;
use chrono::Utc;
use clinic_core::{ClinicError, Result, Session, User};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// 外部认证服务的操作面
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// 登录；失败时返回不区分原因的凭据错误
    async fn login(&self, email: &str, password: &str) -> Result<Session>;

    /// 注册并视为已登录
    async fn register(&self, email: &str, password: &str, name: &str) -> Result<Session>;

    /// 注销会话
    async fn logout(&self, token: &str) -> Result<()>;

    /// 查询会话对应的当前用户
    async fn get_current_user(&self, token: &str) -> Result<Option<User>>;
}

/// HTTP 认证后端
pub struct HttpAuthBackend {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct WireSession {
    token: String,
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: Uuid,
    name: String,
    email: String,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        User {
            id: wire.id,
            name: wire.name,
            email: wire.email,
        }
    }
}

impl HttpAuthBackend {
    pub fn new(endpoint: String, project_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            project_id,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }

    fn session_from(&self, wire: WireSession) -> Session {
        Session {
            token: wire.token,
            user: wire.user.into(),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.url("/account/sessions"))
            .header("X-Clinic-Project", &self.project_id)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))?;

        if !response.status().is_success() {
            // 不区分用户不存在与密码错误
            return Err(ClinicError::Authentication);
        }

        let wire: WireSession = response
            .json()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))?;
        Ok(self.session_from(wire))
    }

    async fn register(&self, email: &str, password: &str, name: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.url("/account"))
            .header("X-Clinic-Project", &self.project_id)
            .json(&serde_json::json!({ "email": email, "password": password, "name": name }))
            .send()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClinicError::Registration(
                "Could not create the account. Please try again.".to_string(),
            ));
        }

        let wire: WireSession = response
            .json()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))?;
        Ok(self.session_from(wire))
    }

    async fn logout(&self, token: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url("/account/sessions/current"))
            .header("X-Clinic-Project", &self.project_id)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClinicError::Network(format!(
                "Logout failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn get_current_user(&self, token: &str) -> Result<Option<User>> {
        let response = self
            .client
            .get(self.url("/account"))
            .header("X-Clinic-Project", &self.project_id)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ClinicError::Network(format!(
                "Current user lookup failed with status {}",
                response.status()
            )));
        }

        let wire: WireUser = response
            .json()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))?;
        Ok(Some(wire.into()))
    }
}

struct MemoryAccount {
    user: User,
    password: String,
}

/// 内存认证后端（测试与演示模式）
#[derive(Default)]
pub struct MemoryAuthBackend {
    accounts: RwLock<HashMap<String, MemoryAccount>>,
    sessions: RwLock<HashMap<String, User>>,
}

impl MemoryAuthBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthBackend for MemoryAuthBackend {
    async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let accounts = self.accounts.read().await;
        let account = match accounts.get(email) {
            Some(account) if account.password == password => account,
            // 不区分用户不存在与密码错误
            _ => {
                warn!("Login failed for {}", email);
                return Err(ClinicError::Authentication);
            }
        };

        let token = Uuid::new_v4().to_string();
        let user = account.user.clone();
        drop(accounts);

        self.sessions.write().await.insert(token.clone(), user.clone());
        info!("User {} logged in", user.email);

        Ok(Session {
            token,
            user,
            created_at: Utc::now(),
        })
    }

    async fn register(&self, email: &str, password: &str, name: &str) -> Result<Session> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(ClinicError::Registration(
                "An account with this email already exists".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
        };
        accounts.insert(
            email.to_string(),
            MemoryAccount {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        drop(accounts);

        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), user.clone());
        info!("Registered user {}", user.email);

        Ok(Session {
            token,
            user,
            created_at: Utc::now(),
        })
    }

    async fn logout(&self, token: &str) -> Result<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn get_current_user(&self, token: &str) -> Result<Option<User>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_register_then_login() {
        let backend = MemoryAuthBackend::new();

        let session = backend
            .register("jo@x.com", "Abcdef!", "Jo")
            .await
            .unwrap();
        assert_eq!(session.user.email, "jo@x.com");

        // 注册即视为已登录
        let current = backend.get_current_user(&session.token).await.unwrap();
        assert_eq!(current.unwrap().name, "Jo");

        let relogin = backend.login("jo@x.com", "Abcdef!").await.unwrap();
        assert_eq!(relogin.user.email, "jo@x.com");
    }

    #[tokio::test]
    async fn test_memory_login_failures_are_opaque() {
        let backend = MemoryAuthBackend::new();
        backend
            .register("jo@x.com", "Abcdef!", "Jo")
            .await
            .unwrap();

        let unknown_user = backend.login("nobody@x.com", "Abcdef!").await.unwrap_err();
        let wrong_password = backend.login("jo@x.com", "wrong").await.unwrap_err();

        // 两种失败对调用方不可区分
        assert_eq!(unknown_user.to_string(), wrong_password.to_string());
        assert!(matches!(unknown_user, ClinicError::Authentication));
    }

    #[tokio::test]
    async fn test_memory_duplicate_registration_rejected() {
        let backend = MemoryAuthBackend::new();
        backend
            .register("jo@x.com", "Abcdef!", "Jo")
            .await
            .unwrap();
        let err = backend
            .register("jo@x.com", "Other1!", "Jo Again")
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::Registration(_)));
    }

    #[tokio::test]
    async fn test_memory_logout_clears_session() {
        let backend = MemoryAuthBackend::new();
        let session = backend
            .register("jo@x.com", "Abcdef!", "Jo")
            .await
            .unwrap();

        backend.logout(&session.token).await.unwrap();
        assert!(backend
            .get_current_user(&session.token)
            .await
            .unwrap()
            .is_none());
    }
}
