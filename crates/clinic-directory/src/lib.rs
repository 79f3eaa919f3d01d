//! # Clinic Directory
//!
//! 医生目录：规范化的医生记录、静态种子数据和大小写不敏感的子串搜索。
//! 目录在本范围内只读，无任何修改路径。

pub mod provider;
pub mod search;
pub mod seed;

pub use provider::{AppointmentSlot, Provider};
pub use search::{search_providers, DirectoryService};
