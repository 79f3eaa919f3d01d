//! 医生记录模型
//!
//! 源数据中姓名/地点字段命名混杂且多为可选，这里在数据访问边界
//! 统一为单一显式模式：必填与可选字段一次性声明清楚。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 可预约时段
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentSlot {
    pub date: NaiveDate,
    pub start_time: String,
    pub length_minutes: i32,
}

/// 医生记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub provider_id: String,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub education: String,
    pub practice_name: String,
    pub languages_spoken: Vec<String>,
    pub rating: f32,
    pub appointments: Vec<AppointmentSlot>,
}

impl Provider {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
