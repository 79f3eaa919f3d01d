//! 核心数据模型定义

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 当前登录用户
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// 会话信息，由外部认证服务创建，本地仅缓存
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

/// 性别枚举
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "o" => Ok(Gender::Other),
            "prefer_not_to_say" => Ok(Gender::PreferNotToSay),
            _ => Err(format!("Unknown gender value: {}", s)),
        }
    }
}

/// 患者登记聚合记录
///
/// 由多步录入表单逐步组装，所有步骤校验通过后一次性持久化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientIntakeRecord {
    pub patient_id: String,
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub emergency_contact: EmergencyContact,
    pub insurance: InsuranceInfo,
    pub allergies: AllergyInfo,
    pub medications: MedicationInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// 紧急联系人，从属于患者记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub contact_id: String,
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub relationship: String,
    pub phone_primary: String,
    pub phone_secondary: Option<String>,
    pub email: Option<String>,
    pub priority_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// 保险信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceInfo {
    pub provider_name: String,
    pub policy_number: String,
    pub group_number: Option<String>,
    pub subscriber_name: Option<String>,
}

/// 过敏史
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllergyInfo {
    pub allergies: Option<String>,
    pub reaction: Option<String>,
}

/// 用药史
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationInfo {
    pub medications: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
}

/// 预约状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Canceled,
}

/// 预约记录（单一保存路径，无更新/取消流程）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: String,
    pub patient_id: String,
    pub provider_id: String,
    pub appointment_type_id: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub reason_for_visit: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub start_time: String,
    pub length_minutes: i32,
    pub created_at: DateTime<Utc>,
}

/// 联系表单消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_gender_from_str() {
        assert_eq!(Gender::from_str("Female").unwrap(), Gender::Female);
        assert_eq!(Gender::from_str("m").unwrap(), Gender::Male);
        assert!(Gender::from_str("unknown").is_err());
    }
}
