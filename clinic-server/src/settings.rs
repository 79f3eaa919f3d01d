//! 服务器设置
//!
//! 来源优先级：配置文件 < 环境变量（`CLINIC_SERVER_` 前缀）< 命令行参数。

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::info;

/// 服务器运行设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 日志级别
    pub log_level: String,
    /// 后端模式："http"（外部 BaaS）或 "memory"（进程内，用于本地开发）
    pub backend: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            backend: "http".to_string(),
        }
    }
}

impl ServerSettings {
    /// 加载设置，配置文件可选
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("CLINIC_SERVER"))
            .build()?;

        let settings: ServerSettings = settings.try_deserialize()?;
        if let Some(path) = config_path {
            info!("Settings loaded from: {}", path);
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_without_config_file() {
        let settings = ServerSettings::load(None).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.backend, "http");
    }
}
