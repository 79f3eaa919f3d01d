//! # Clinic Web
//!
//! 诊所患者门户的 HTTP 层：认证服务与中间件、医生搜索、
//! 多步登记、预约与联系消息的处理器，以及 axum 服务器装配。

pub mod auth;
pub mod handlers;
pub mod intake;
pub mod server;

pub use auth::AuthService;
pub use handlers::{ApiError, ApiResult, AppState};
pub use server::WebServer;
