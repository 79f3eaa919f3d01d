//! 登记会话控制器
//!
//! 持有每个登记会话的当前步骤和"已捕获数据"累积器。
//! 每步提交先过模式校验，失败时状态不变；全部步骤通过后
//! 合并为患者聚合记录，交由持久化协作方一次性保存。

use crate::schema::schema_for;
use crate::state_machine::{IntakeEvent, IntakeStateMachine, IntakeStep};
use chrono::{NaiveDate, Utc};
use clinic_core::utils::{generate_contact_id, generate_patient_id};
use clinic_core::{
    AllergyInfo, ClinicError, EmergencyContact, Gender, InsuranceInfo, MedicationInfo,
    PatientIntakeRecord, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// 单个登记会话
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeSession {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub current_step: IntakeStep,
    /// 已捕获的每步数据，回退时用于重新填充表单
    pub captured: HashMap<IntakeStep, HashMap<String, String>>,
    /// 首次到达最后一步时分配，重试提交沿用同一标识符
    pub patient_id: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// 步骤提交的结果
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// 前进到下一步
    Advanced { next: IntakeStep },
    /// 所有步骤已通过，聚合记录待持久化
    Completed { record: Box<PatientIntakeRecord> },
}

/// 登记会话管理器
#[derive(Debug)]
pub struct IntakeSessionManager {
    sessions: HashMap<Uuid, IntakeSession>,
    machine: IntakeStateMachine,
}

impl IntakeSessionManager {
    /// 创建新的会话管理器
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            machine: IntakeStateMachine::new(),
        }
    }

    /// 开始一个新的登记会话
    pub fn start_session(&mut self, user_id: Option<Uuid>) -> IntakeSession {
        let now = Utc::now();
        let session = IntakeSession {
            id: Uuid::new_v4(),
            user_id,
            current_step: IntakeStep::PatientInfo,
            captured: HashMap::new(),
            patient_id: None,
            created_at: now,
            updated_at: now,
        };
        info!("Started intake session {}", session.id);
        self.sessions.insert(session.id, session.clone());
        session
    }

    /// 查询会话
    pub fn get_session(&self, session_id: Uuid) -> Result<&IntakeSession> {
        self.sessions
            .get(&session_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Intake session {} not found", session_id)))
    }

    /// 提交一个步骤的数据
    ///
    /// 校验失败时返回按字段聚合的错误且状态不变；
    /// 校验通过则捕获数据并恰好前进一步；最后一步通过时
    /// 返回合并后的聚合记录（状态推进到 Submitted 由
    /// `mark_submitted` 在持久化成功后完成）。
    pub fn submit_step(
        &mut self,
        session_id: Uuid,
        step: IntakeStep,
        fields: HashMap<String, String>,
    ) -> Result<StepOutcome> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Intake session {} not found", session_id)))?;

        // 只接受当前步骤的提交
        if step != session.current_step {
            return Err(ClinicError::InvalidStepTransition {
                from: session.current_step.as_str().to_string(),
                event: format!("submit {}", step.as_str()),
            });
        }

        let errors = schema_for(step).validate(&fields);
        if !errors.is_empty() {
            debug!("Intake session {} step {} rejected: {}", session_id, step.as_str(), errors);
            return Err(ClinicError::Validation(errors));
        }

        session.captured.insert(step, fields);
        session.updated_at = Utc::now();

        if step == IntakeStep::Medications {
            // 最后一步：合并聚合记录，待持久化成功后再进入终态。
            // 患者标识符只分配一次，失败重试不会换新标识符
            if session.patient_id.is_none() {
                session.patient_id = Some(generate_patient_id());
            }
            let record = build_record(session)?;
            info!("Intake session {} ready to submit patient {}", session_id, record.patient_id);
            return Ok(StepOutcome::Completed {
                record: Box::new(record),
            });
        }

        let next = self
            .machine
            .transition(&session.current_step, &IntakeEvent::StepCompleted)?;
        session.current_step = next;
        debug!("Intake session {} advanced to {}", session_id, next.as_str());

        Ok(StepOutcome::Advanced { next })
    }

    /// 返回上一步，并返回该步此前捕获的数据用于重新填充表单
    pub fn go_back(&mut self, session_id: Uuid) -> Result<(IntakeStep, HashMap<String, String>)> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Intake session {} not found", session_id)))?;

        let previous = self
            .machine
            .transition(&session.current_step, &IntakeEvent::Back)?;
        session.current_step = previous;
        session.updated_at = Utc::now();

        let values = session.captured.get(&previous).cloned().unwrap_or_default();
        Ok((previous, values))
    }

    /// 持久化成功后标记会话为已提交（终态）
    pub fn mark_submitted(&mut self, session_id: Uuid) -> Result<()> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Intake session {} not found", session_id)))?;

        if session.current_step == IntakeStep::Submitted {
            return Err(ClinicError::InvalidStepTransition {
                from: IntakeStep::Submitted.as_str().to_string(),
                event: "submit".to_string(),
            });
        }
        if session.current_step != IntakeStep::Medications
            || !session.captured.contains_key(&IntakeStep::Medications)
        {
            return Err(ClinicError::InvalidStepTransition {
                from: session.current_step.as_str().to_string(),
                event: "mark submitted".to_string(),
            });
        }

        session.current_step = IntakeStep::Submitted;
        session.updated_at = Utc::now();
        info!("Intake session {} submitted", session_id);
        Ok(())
    }

    /// 删除会话（提交完成后由调用方释放）
    pub fn remove_session(&mut self, session_id: Uuid) -> Option<IntakeSession> {
        self.sessions.remove(&session_id)
    }
}

impl Default for IntakeSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 把各步骤捕获的数据合并为患者聚合记录
fn build_record(session: &IntakeSession) -> Result<PatientIntakeRecord> {
    let patient = captured(session, IntakeStep::PatientInfo)?;
    let emergency = captured(session, IntakeStep::EmergencyContact)?;
    let insurance = captured(session, IntakeStep::Insurance)?;
    let allergies = captured(session, IntakeStep::Allergies)?;
    let medications = captured(session, IntakeStep::Medications)?;

    let gender = Gender::from_str(field(patient, "gender"))
        .map_err(|e| ClinicError::Internal(format!("Captured gender failed to parse: {}", e)))?;

    let date_of_birth = match field(patient, "date_of_birth") {
        "" => None,
        raw => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| ClinicError::Internal(format!("Captured date failed to parse: {}", e)))?,
        ),
    };

    let now = Utc::now();
    let patient_id = session
        .patient_id
        .clone()
        .ok_or_else(|| ClinicError::Internal("Patient identifier not assigned".to_string()))?;

    let emergency_contact = EmergencyContact {
        contact_id: generate_contact_id(),
        patient_id: patient_id.clone(),
        first_name: field(emergency, "first_name").to_string(),
        last_name: field(emergency, "last_name").to_string(),
        relationship: field(emergency, "relationship").to_string(),
        phone_primary: field(emergency, "phone_primary").to_string(),
        phone_secondary: optional_field(emergency, "phone_secondary"),
        email: optional_field(emergency, "email"),
        priority_order: 1,
        created_at: now,
        updated_at: now,
        is_active: true,
    };

    Ok(PatientIntakeRecord {
        patient_id,
        user_id: session.user_id,
        first_name: field(patient, "first_name").to_string(),
        last_name: field(patient, "last_name").to_string(),
        phone: field(patient, "phone").to_string(),
        email: field(patient, "email").to_string(),
        date_of_birth,
        gender,
        address: field(patient, "address").to_string(),
        city: field(patient, "city").to_string(),
        state: field(patient, "state").to_string(),
        zip_code: field(patient, "zip_code").to_string(),
        emergency_contact,
        insurance: InsuranceInfo {
            provider_name: field(insurance, "provider_name").to_string(),
            policy_number: field(insurance, "policy_number").to_string(),
            group_number: optional_field(insurance, "group_number"),
            subscriber_name: optional_field(insurance, "subscriber_name"),
        },
        allergies: AllergyInfo {
            allergies: optional_field(allergies, "allergies"),
            reaction: optional_field(allergies, "reaction"),
        },
        medications: MedicationInfo {
            medications: optional_field(medications, "medications"),
            dosage: optional_field(medications, "dosage"),
            frequency: optional_field(medications, "frequency"),
        },
        created_at: now,
        updated_at: now,
        is_active: true,
    })
}

fn captured(session: &IntakeSession, step: IntakeStep) -> Result<&HashMap<String, String>> {
    session
        .captured
        .get(&step)
        .ok_or_else(|| ClinicError::Internal(format!("Step {} was never captured", step.as_str())))
}

fn field<'a>(values: &'a HashMap<String, String>, name: &str) -> &'a str {
    values.get(name).map(|v| v.trim()).unwrap_or("")
}

fn optional_field(values: &HashMap<String, String>, name: &str) -> Option<String> {
    match field(values, name) {
        "" => None,
        v => Some(v.to_string()),
    }
}
