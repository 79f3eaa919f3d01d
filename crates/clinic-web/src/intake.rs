//! 登记流程HTTP处理器
//!
//! 每个登记会话归属已登录用户，非属主的任何访问一律按会话
//! 不存在处理。最后一步通过后先持久化聚合记录，持久化成功
//! 才把会话推进到终态并释放，保证恰好保存一次。

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use clinic_core::{ClinicError, User};
use clinic_intake::{IntakeSession, IntakeStep, StepOutcome};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::handlers::{ApiResult, AppState};

/// 步骤提交响应
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResponse {
    /// 前进到下一步
    Advanced { next_step: String },
    /// 全部步骤完成且记录已保存
    Submitted { patient_id: String },
}

/// 会话归属校验：非属主视角下该会话不存在
fn ensure_owner(session: &IntakeSession, user: &User) -> ApiResult<()> {
    if session.user_id != Some(user.id) {
        return Err(ClinicError::NotFound(format!("Intake session {} not found", session.id)).into());
    }
    Ok(())
}

/// 开始登记会话
pub async fn start_intake(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> impl IntoResponse {
    let session = state.intake.write().await.start_session(Some(user.id));
    (StatusCode::CREATED, Json(session))
}

/// 查询登记会话
pub async fn get_intake_session(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let manager = state.intake.read().await;
    let session = manager.get_session(session_id)?;
    ensure_owner(session, &user)?;
    Ok(Json(session.clone()))
}

/// 提交当前步骤
///
/// 步骤名取自路径（`patient-info` 等短横线形式）。
pub async fn submit_intake_step(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((session_id, step)): Path<(Uuid, String)>,
    Json(fields): Json<HashMap<String, String>>,
) -> ApiResult<Json<StepResponse>> {
    let step = IntakeStep::parse(&step)
        .ok_or_else(|| ClinicError::NotFound(format!("Unknown intake step '{}'", step)))?;

    let outcome = {
        let mut manager = state.intake.write().await;
        ensure_owner(manager.get_session(session_id)?, &user)?;
        manager.submit_step(session_id, step, fields)?
    };

    match outcome {
        StepOutcome::Advanced { next } => Ok(Json(StepResponse::Advanced {
            next_step: next.as_str().to_string(),
        })),
        StepOutcome::Completed { record } => {
            // 先持久化，成功后才进入终态；保存失败时会话停在
            // 最后一步，重新提交沿用同一患者标识符
            state.collections.create_patient(&record).await?;
            {
                let mut manager = state.intake.write().await;
                manager.mark_submitted(session_id)?;
                manager.remove_session(session_id);
            }
            info!("Intake session {} persisted patient {}", session_id, record.patient_id);
            Ok(Json(StepResponse::Submitted {
                patient_id: record.patient_id.clone(),
            }))
        }
    }
}

/// 回到上一步，返回该步此前填写的数据
pub async fn intake_go_back(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut manager = state.intake.write().await;
    ensure_owner(manager.get_session(session_id)?, &user)?;
    let (step, values) = manager.go_back(session_id)?;
    Ok(Json(json!({
        "step": step.as_str(),
        "values": values,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthService;
    use clinic_directory::DirectoryService;
    use clinic_intake::IntakeSessionManager;
    use clinic_store::{Collections, MemoryAuthBackend, MemoryDocumentStore, StoreConfig};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn test_state() -> AppState {
        let config = StoreConfig {
            endpoint: "http://localhost:9999".to_string(),
            project_id: "test-project".to_string(),
            database_id: "test-db".to_string(),
            patients_collection: "patients".to_string(),
            emergency_contacts_collection: "emergency_contacts".to_string(),
            appointments_collection: "appointments".to_string(),
            contact_messages_collection: "contact_messages".to_string(),
        };
        AppState {
            auth: AuthService::new(Arc::new(MemoryAuthBackend::new())),
            directory: Arc::new(DirectoryService::new()),
            intake: Arc::new(RwLock::new(IntakeSessionManager::new())),
            collections: Arc::new(Collections::new(
                Arc::new(MemoryDocumentStore::new()),
                config,
            )),
        }
    }

    fn user(name: &str, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    fn patient_info() -> HashMap<String, String> {
        [
            ("first_name", "Alice"),
            ("last_name", "Zhang"),
            ("phone", "555-123-4567"),
            ("email", "alice@x.com"),
            ("gender", "female"),
            ("address", "12 Main Street"),
            ("city", "Oakland"),
            ("state", "CA"),
            ("zip_code", "94607"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn assert_not_found(err: crate::handlers::ApiError) {
        assert!(matches!(err.0, ClinicError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_session_access_limited_to_owner() {
        let state = test_state();
        let alice = user("Alice", "alice@x.com");
        let other = user("Nadia", "nadia@x.com");

        let session = state.intake.write().await.start_session(Some(alice.id));
        submit_intake_step(
            State(state.clone()),
            Extension(alice.clone()),
            Path((session.id, "patient-info".to_string())),
            Json(patient_info()),
        )
        .await
        .unwrap();

        // 非属主既读不到会话也驱动不了它
        let err = get_intake_session(
            State(state.clone()),
            Extension(other.clone()),
            Path(session.id),
        )
        .await
        .err()
        .unwrap();
        assert_not_found(err);

        let err = intake_go_back(
            State(state.clone()),
            Extension(other.clone()),
            Path(session.id),
        )
        .await
        .err()
        .unwrap();
        assert_not_found(err);

        let err = submit_intake_step(
            State(state.clone()),
            Extension(other),
            Path((session.id, "emergency-contact".to_string())),
            Json(HashMap::new()),
        )
        .await
        .err()
        .unwrap();
        assert_not_found(err);

        // 属主视角不受影响
        assert!(get_intake_session(State(state.clone()), Extension(alice), Path(session.id))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_completed_session_is_released() {
        let state = test_state();
        let alice = user("Alice", "alice@x.com");
        let session = state.intake.write().await.start_session(Some(alice.id));

        let steps: Vec<(&str, HashMap<String, String>)> = vec![
            ("patient-info", patient_info()),
            (
                "emergency-contact",
                [
                    ("first_name", "Marcus"),
                    ("last_name", "Patel"),
                    ("relationship", "Spouse"),
                    ("phone_primary", "555-987-6543"),
                ]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ),
            (
                "insurance",
                [("provider_name", "Blue Shield"), ("policy_number", "BS-1")]
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ("allergies", HashMap::new()),
            ("medications", HashMap::new()),
        ];

        let mut last = None;
        for (step, fields) in steps {
            last = Some(
                submit_intake_step(
                    State(state.clone()),
                    Extension(alice.clone()),
                    Path((session.id, step.to_string())),
                    Json(fields),
                )
                .await
                .unwrap(),
            );
        }
        assert!(matches!(last.unwrap().0, StepResponse::Submitted { .. }));

        // 记录已保存
        let patients = state.collections.list_patients().await.unwrap();
        assert_eq!(patients.len(), 1);

        // 提交完成后会话被释放
        let err = get_intake_session(State(state.clone()), Extension(alice), Path(session.id))
            .await
            .err()
            .unwrap();
        assert_not_found(err);
    }
}
