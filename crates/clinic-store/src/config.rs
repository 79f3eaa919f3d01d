//! BaaS 连接配置
//!
//! 端点与各类标识符由进程环境提供；任何必需标识符缺失
//! 都是致命的配置错误，在使用点立即返回 `ClinicError::Config`。

use clinic_core::{ClinicError, Result};

// 必需的环境变量名
pub const ENV_ENDPOINT: &str = "CLINIC_BAAS_ENDPOINT";
pub const ENV_PROJECT_ID: &str = "CLINIC_BAAS_PROJECT_ID";
pub const ENV_DATABASE_ID: &str = "CLINIC_BAAS_DATABASE_ID";
pub const ENV_PATIENTS_COLLECTION: &str = "CLINIC_BAAS_PATIENTS_COLLECTION";
pub const ENV_CONTACTS_COLLECTION: &str = "CLINIC_BAAS_EMERGENCY_CONTACTS_COLLECTION";
pub const ENV_APPOINTMENTS_COLLECTION: &str = "CLINIC_BAAS_APPOINTMENTS_COLLECTION";
pub const ENV_MESSAGES_COLLECTION: &str = "CLINIC_BAAS_CONTACT_MESSAGES_COLLECTION";

/// 外部文档库/认证服务的完整配置
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub patients_collection: String,
    pub emergency_contacts_collection: String,
    pub appointments_collection: String,
    pub contact_messages_collection: String,
}

impl StoreConfig {
    /// 从进程环境读取配置
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// 从任意查找函数读取配置（便于测试）
    pub fn from_source<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            endpoint: required(&get, ENV_ENDPOINT)?,
            project_id: required(&get, ENV_PROJECT_ID)?,
            database_id: required(&get, ENV_DATABASE_ID)?,
            patients_collection: required(&get, ENV_PATIENTS_COLLECTION)?,
            emergency_contacts_collection: required(&get, ENV_CONTACTS_COLLECTION)?,
            appointments_collection: required(&get, ENV_APPOINTMENTS_COLLECTION)?,
            contact_messages_collection: required(&get, ENV_MESSAGES_COLLECTION)?,
        })
    }
}

fn required<F>(get: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ClinicError::Config(format!(
            "Missing required environment identifier: {}",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_source() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (ENV_ENDPOINT, "https://baas.example.com/v1"),
            (ENV_PROJECT_ID, "clinic-project"),
            (ENV_DATABASE_ID, "clinic-db"),
            (ENV_PATIENTS_COLLECTION, "patients"),
            (ENV_CONTACTS_COLLECTION, "emergency_contacts"),
            (ENV_APPOINTMENTS_COLLECTION, "appointments"),
            (ENV_MESSAGES_COLLECTION, "contact_messages"),
        ])
    }

    #[test]
    fn test_complete_config_loads() {
        let source = full_source();
        let config = StoreConfig::from_source(|k| source.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.endpoint, "https://baas.example.com/v1");
        assert_eq!(config.patients_collection, "patients");
    }

    #[test]
    fn test_missing_identifier_is_config_error() {
        let mut source = full_source();
        source.remove(ENV_DATABASE_ID);

        let err = StoreConfig::from_source(|k| source.get(k).map(|v| v.to_string())).unwrap_err();
        match err {
            ClinicError::Config(msg) => assert!(msg.contains(ENV_DATABASE_ID)),
            other => panic!("expected config error, got {}", other),
        }
    }

    #[test]
    fn test_blank_identifier_is_config_error() {
        let mut source = full_source();
        source.insert(ENV_PROJECT_ID, "  ");

        assert!(matches!(
            StoreConfig::from_source(|k| source.get(k).map(|v| v.to_string())),
            Err(ClinicError::Config(_))
        ));
    }
}
