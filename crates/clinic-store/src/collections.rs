//! 类型化集合操作
//!
//! 领域模型与文档负载之间的映射集中在这一层，
//! 渲染层和处理器不直接接触松散的文档结构。

use crate::config::StoreConfig;
use crate::documents::{Document, DocumentStore};
use clinic_core::{
    Appointment, ClinicError, ContactMessage, EmergencyContact, PatientIntakeRecord, Result,
};
use std::sync::Arc;
use tracing::info;

/// 各业务集合的类型化读写入口
pub struct Collections {
    store: Arc<dyn DocumentStore>,
    config: StoreConfig,
}

impl Collections {
    pub fn new(store: Arc<dyn DocumentStore>, config: StoreConfig) -> Self {
        Self { store, config }
    }

    // ========== 患者相关操作 ==========

    /// 持久化患者聚合记录（含紧急联系人，各自落入所属集合）
    ///
    /// 按患者标识符幂等：两次写入之间失败后的重试只补齐缺失的
    /// 文档，不会产生重复记录。
    pub async fn create_patient(&self, record: &PatientIntakeRecord) -> Result<Document> {
        let existing = self
            .store
            .list_documents(&self.config.patients_collection)
            .await?;
        let document = match find_by_patient_id(&existing, &record.patient_id) {
            Some(document) => {
                info!("Patient record {} already persisted, skipping", record.patient_id);
                document
            }
            None => {
                self.store
                    .create_document(
                        &self.config.patients_collection,
                        serde_json::to_value(record)?,
                    )
                    .await?
            }
        };

        let contacts = self
            .store
            .list_documents(&self.config.emergency_contacts_collection)
            .await?;
        if find_by_patient_id(&contacts, &record.patient_id).is_none() {
            self.store
                .create_document(
                    &self.config.emergency_contacts_collection,
                    serde_json::to_value(&record.emergency_contact)?,
                )
                .await?;
        }

        info!("Persisted patient record {}", record.patient_id);
        Ok(document)
    }

    /// 列出全部患者记录
    pub async fn list_patients(&self) -> Result<Vec<PatientIntakeRecord>> {
        let documents = self
            .store
            .list_documents(&self.config.patients_collection)
            .await?;
        decode_all(documents)
    }

    /// 列出某患者的紧急联系人
    pub async fn list_emergency_contacts(&self, patient_id: &str) -> Result<Vec<EmergencyContact>> {
        let documents = self
            .store
            .list_documents(&self.config.emergency_contacts_collection)
            .await?;
        let contacts: Vec<EmergencyContact> = decode_all(documents)?;
        Ok(contacts
            .into_iter()
            .filter(|c| c.patient_id == patient_id)
            .collect())
    }

    // ========== 预约相关操作 ==========

    /// 创建预约（单一保存路径）
    pub async fn create_appointment(&self, appointment: &Appointment) -> Result<Document> {
        let document = self
            .store
            .create_document(
                &self.config.appointments_collection,
                serde_json::to_value(appointment)?,
            )
            .await?;
        info!("Persisted appointment {}", appointment.appointment_id);
        Ok(document)
    }

    /// 列出预约，可按患者过滤
    pub async fn list_appointments(&self, patient_id: Option<&str>) -> Result<Vec<Appointment>> {
        let documents = self
            .store
            .list_documents(&self.config.appointments_collection)
            .await?;
        let appointments: Vec<Appointment> = decode_all(documents)?;
        Ok(match patient_id {
            Some(id) => appointments
                .into_iter()
                .filter(|a| a.patient_id == id)
                .collect(),
            None => appointments,
        })
    }

    // ========== 联系消息相关操作 ==========

    /// 保存联系表单消息
    pub async fn create_contact_message(&self, message: &ContactMessage) -> Result<Document> {
        self.store
            .create_document(
                &self.config.contact_messages_collection,
                serde_json::to_value(message)?,
            )
            .await
    }

    /// 列出全部联系消息
    pub async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>> {
        let documents = self
            .store
            .list_documents(&self.config.contact_messages_collection)
            .await?;
        decode_all(documents)
    }
}

fn find_by_patient_id(documents: &[Document], patient_id: &str) -> Option<Document> {
    documents
        .iter()
        .find(|doc| doc.data.get("patient_id").and_then(|v| v.as_str()) == Some(patient_id))
        .cloned()
}

fn decode_all<T: serde::de::DeserializeOwned>(documents: Vec<Document>) -> Result<Vec<T>> {
    documents
        .into_iter()
        .map(|doc| {
            serde_json::from_value(doc.data)
                .map_err(|e| ClinicError::Internal(format!("Malformed document {}: {}", doc.id, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::documents::MemoryDocumentStore;
    use chrono::{NaiveDate, Utc};
    use clinic_core::{
        AllergyInfo, AppointmentStatus, Gender, InsuranceInfo, MedicationInfo,
    };

    fn test_config() -> StoreConfig {
        StoreConfig {
            endpoint: "http://localhost:9999".to_string(),
            project_id: "test-project".to_string(),
            database_id: "test-db".to_string(),
            patients_collection: "patients".to_string(),
            emergency_contacts_collection: "emergency_contacts".to_string(),
            appointments_collection: "appointments".to_string(),
            contact_messages_collection: "contact_messages".to_string(),
        }
    }

    fn collections() -> Collections {
        Collections::new(Arc::new(MemoryDocumentStore::new()), test_config())
    }

    fn sample_record() -> PatientIntakeRecord {
        let now = Utc::now();
        PatientIntakeRecord {
            patient_id: "PAT-0123456789abcdef0123456789abcdef".to_string(),
            user_id: None,
            first_name: "Emily".to_string(),
            last_name: "Chen".to_string(),
            phone: "555-123-4567".to_string(),
            email: "emily@x.com".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17),
            gender: Gender::Female,
            address: "12 Main Street".to_string(),
            city: "Oakland".to_string(),
            state: "CA".to_string(),
            zip_code: "94607".to_string(),
            emergency_contact: EmergencyContact {
                contact_id: "CON-0123456789abcdef0123456789abcdef".to_string(),
                patient_id: "PAT-0123456789abcdef0123456789abcdef".to_string(),
                first_name: "Marcus".to_string(),
                last_name: "Patel".to_string(),
                relationship: "Spouse".to_string(),
                phone_primary: "555-987-6543".to_string(),
                phone_secondary: None,
                email: None,
                priority_order: 1,
                created_at: now,
                updated_at: now,
                is_active: true,
            },
            insurance: InsuranceInfo {
                provider_name: "Blue Shield".to_string(),
                policy_number: "BS-123456".to_string(),
                group_number: None,
                subscriber_name: None,
            },
            allergies: AllergyInfo::default(),
            medications: MedicationInfo::default(),
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_patient_round_trip_with_emergency_contact() {
        let collections = collections();
        let record = sample_record();

        collections.create_patient(&record).await.unwrap();

        let patients = collections.list_patients().await.unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].first_name, "Emily");

        let contacts = collections
            .list_emergency_contacts(&record.patient_id)
            .await
            .unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].first_name, "Marcus");

        // 其他患者查不到该联系人
        assert!(collections
            .list_emergency_contacts("PAT-other")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_patient_retry_is_idempotent() {
        let collections = collections();
        let record = sample_record();

        collections.create_patient(&record).await.unwrap();
        collections.create_patient(&record).await.unwrap();

        assert_eq!(collections.list_patients().await.unwrap().len(), 1);
        assert_eq!(
            collections
                .list_emergency_contacts(&record.patient_id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    /// 第一次写紧急联系人集合时失败的文档库，用于验证部分写入后的重试
    struct FailingContactStore {
        inner: MemoryDocumentStore,
        failed_once: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl crate::documents::DocumentStore for FailingContactStore {
        async fn list_documents(&self, collection_id: &str) -> Result<Vec<Document>> {
            self.inner.list_documents(collection_id).await
        }

        async fn create_document(
            &self,
            collection_id: &str,
            data: serde_json::Value,
        ) -> Result<Document> {
            if collection_id == "emergency_contacts"
                && !self.failed_once.swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                return Err(ClinicError::Network("connection reset".to_string()));
            }
            self.inner.create_document(collection_id, data).await
        }
    }

    #[tokio::test]
    async fn test_partial_write_retry_completes_without_duplicates() {
        let store = Arc::new(FailingContactStore {
            inner: MemoryDocumentStore::new(),
            failed_once: std::sync::atomic::AtomicBool::new(false),
        });
        let collections = Collections::new(store, test_config());
        let record = sample_record();

        // 患者文档已写入，联系人写入失败
        assert!(collections.create_patient(&record).await.is_err());
        assert_eq!(collections.list_patients().await.unwrap().len(), 1);

        // 重试只补写联系人，不产生重复患者
        collections.create_patient(&record).await.unwrap();
        assert_eq!(collections.list_patients().await.unwrap().len(), 1);
        assert_eq!(
            collections
                .list_emergency_contacts(&record.patient_id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_appointment_save_and_filter() {
        let collections = collections();
        let appointment = Appointment {
            appointment_id: "APT-0123456789abcdef0123456789abcdef".to_string(),
            patient_id: "PAT-1".to_string(),
            provider_id: "PRV-001".to_string(),
            appointment_type_id: "checkup".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            appointment_time: "09:00".to_string(),
            reason_for_visit: "Annual physical".to_string(),
            status: AppointmentStatus::Scheduled,
            notes: None,
            start_time: "09:00".to_string(),
            length_minutes: 30,
            created_at: Utc::now(),
        };

        collections.create_appointment(&appointment).await.unwrap();

        let all = collections.list_appointments(None).await.unwrap();
        assert_eq!(all.len(), 1);

        let mine = collections.list_appointments(Some("PAT-1")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(collections
            .list_appointments(Some("PAT-2"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_contact_message_round_trip() {
        let collections = collections();
        let message = ContactMessage {
            name: "Jo".to_string(),
            email: "jo@x.com".to_string(),
            subject: "Question".to_string(),
            message: "What are your hours?".to_string(),
            created_at: Utc::now(),
        };

        collections.create_contact_message(&message).await.unwrap();
        let messages = collections.list_contact_messages().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].subject, "Question");
    }
}
