//! 通用工具函数

use uuid::Uuid;

/// 生成患者记录标识符
pub fn generate_patient_id() -> String {
    format!("PAT-{}", Uuid::new_v4().simple())
}

/// 生成紧急联系人标识符
pub fn generate_contact_id() -> String {
    format!("CON-{}", Uuid::new_v4().simple())
}

/// 生成预约标识符
pub fn generate_appointment_id() -> String {
    format!("APT-{}", Uuid::new_v4().simple())
}

/// 验证记录标识符格式：前缀-32位十六进制
pub fn is_valid_record_id(id: &str) -> bool {
    match id.split_once('-') {
        Some((prefix, rest)) => {
            !prefix.is_empty()
                && prefix.chars().all(|c| c.is_ascii_uppercase())
                && rest.len() == 32
                && rest.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}
