//! # Clinic Core
//!
//! 诊所患者门户系统的核心模块，提供基础数据结构、错误定义、字段校验和通用工具。

pub mod error;
pub mod models;
pub mod utils;
pub mod validation;

pub use error::{ClinicError, FieldErrors, Result};
pub use models::*;
