//! 文档库访问
//!
//! 外部文档数据库的最小操作面：列出集合文档、创建文档。
//! 网络失败包装为 `ClinicError::Network`，由调用方在页面边界恢复。

use crate::config::StoreConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinic_core::{ClinicError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// 外部文档库中的一条文档
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub collection_id: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 文档库操作接口
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 列出集合中的全部文档
    async fn list_documents(&self, collection_id: &str) -> Result<Vec<Document>>;

    /// 在集合中创建新文档
    async fn create_document(&self, collection_id: &str, data: Value) -> Result<Document>;
}

/// 基于 HTTP 的外部文档库客户端
pub struct HttpDocumentStore {
    client: reqwest::Client,
    config: StoreConfig,
}

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    documents: Vec<Document>,
}

impl HttpDocumentStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn collection_url(&self, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint.trim_end_matches('/'),
            self.config.database_id,
            collection_id
        )
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn list_documents(&self, collection_id: &str) -> Result<Vec<Document>> {
        let url = self.collection_url(collection_id);
        debug!("Listing documents from {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Clinic-Project", &self.config.project_id)
            .send()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClinicError::Network(format!(
                "Document list failed with status {}",
                response.status()
            )));
        }

        let body: ListDocumentsResponse = response
            .json()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))?;

        Ok(body.documents)
    }

    async fn create_document(&self, collection_id: &str, data: Value) -> Result<Document> {
        let url = self.collection_url(collection_id);
        info!("Creating document in collection {}", collection_id);

        let response = self
            .client
            .post(&url)
            .header("X-Clinic-Project", &self.config.project_id)
            .json(&serde_json::json!({ "data": data }))
            .send()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClinicError::Network(format!(
                "Document create failed with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ClinicError::Network(e.to_string()))
    }
}

/// 内存文档库（测试与演示模式）
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_documents(&self, collection_id: &str) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection_id).cloned().unwrap_or_default())
    }

    async fn create_document(&self, collection_id: &str, data: Value) -> Result<Document> {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4().to_string(),
            collection_id: collection_id.to_string(),
            data,
            created_at: now,
            updated_at: now,
        };

        let mut collections = self.collections.write().await;
        collections
            .entry(collection_id.to_string())
            .or_default()
            .push(document.clone());

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_create_and_list() {
        let store = MemoryDocumentStore::new();

        assert!(store.list_documents("patients").await.unwrap().is_empty());

        let doc = store
            .create_document("patients", serde_json::json!({ "first_name": "Emily" }))
            .await
            .unwrap();
        assert_eq!(doc.collection_id, "patients");

        let docs = store.list_documents("patients").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].data["first_name"], "Emily");

        // 其他集合不受影响
        assert!(store.list_documents("appointments").await.unwrap().is_empty());
    }
}
