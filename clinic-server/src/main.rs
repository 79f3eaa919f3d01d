//! 诊所患者门户服务器主程序

mod settings;

use clap::Parser;
use clinic_core::{ClinicError, Result};
use clinic_directory::DirectoryService;
use clinic_intake::IntakeSessionManager;
use clinic_store::{
    AuthBackend, Collections, DocumentStore, HttpAuthBackend, HttpDocumentStore,
    MemoryAuthBackend, MemoryDocumentStore, StoreConfig,
};
use clinic_web::{AppState, AuthService, WebServer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::settings::ServerSettings;

/// 诊所服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "clinic-server")]
#[command(about = "诊所患者门户服务器")]
struct Args {
    /// 监听主机
    #[arg(long)]
    host: Option<String>,

    /// 监听端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 后端模式：http 或 memory
    #[arg(short, long)]
    backend: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = ServerSettings::load(args.config.as_deref())
        .map_err(|e| ClinicError::Config(format!("Failed to load settings: {}", e)))?;
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(backend) = args.backend {
        settings.backend = backend;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(&settings.log_level)
        .init();

    info!("启动诊所服务器...");
    info!("  监听地址: {}:{}", settings.host, settings.port);
    info!("  后端模式: {}", settings.backend);

    let state = build_state(&settings.backend)?;

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| ClinicError::Config(format!("Invalid listen address: {}", e)))?;

    let server = WebServer::new(addr, state);
    if let Err(e) = server.run().await {
        error!("服务器启动失败: {}", e);
        return Err(e);
    }

    Ok(())
}

/// 根据后端模式装配应用状态
fn build_state(backend: &str) -> Result<AppState> {
    let (auth_backend, document_store, config): (
        Arc<dyn AuthBackend>,
        Arc<dyn DocumentStore>,
        StoreConfig,
    ) = match backend {
        "memory" => {
            // 本地开发模式，不接外部服务
            let config = StoreConfig {
                endpoint: "memory".to_string(),
                project_id: "local".to_string(),
                database_id: "local".to_string(),
                patients_collection: "patients".to_string(),
                emergency_contacts_collection: "emergency_contacts".to_string(),
                appointments_collection: "appointments".to_string(),
                contact_messages_collection: "contact_messages".to_string(),
            };
            (
                Arc::new(MemoryAuthBackend::new()),
                Arc::new(MemoryDocumentStore::new()),
                config,
            )
        }
        "http" => {
            let config = StoreConfig::from_env()?;
            (
                Arc::new(HttpAuthBackend::new(
                    config.endpoint.clone(),
                    config.project_id.clone(),
                )),
                Arc::new(HttpDocumentStore::new(config.clone())),
                config,
            )
        }
        other => {
            return Err(ClinicError::Config(format!(
                "Unknown backend mode '{}', expected 'http' or 'memory'",
                other
            )))
        }
    };

    Ok(AppState {
        auth: AuthService::new(auth_backend),
        directory: Arc::new(DirectoryService::new()),
        intake: Arc::new(RwLock::new(IntakeSessionManager::new())),
        collections: Arc::new(Collections::new(document_store, config)),
    })
}
