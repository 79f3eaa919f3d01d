//! # Clinic Store
//!
//! 外部 BaaS（文档数据库 + 认证服务）的访问适配层：
//! 环境配置、HTTP 客户端、文档集合的类型化读写和认证后端。
//! 持久化完全委托给外部服务，本地不保存任何数据。

pub mod auth;
pub mod collections;
pub mod config;
pub mod documents;

pub use auth::{AuthBackend, HttpAuthBackend, MemoryAuthBackend};
pub use collections::Collections;
pub use config::StoreConfig;
pub use documents::{Document, DocumentStore, HttpDocumentStore, MemoryDocumentStore};
