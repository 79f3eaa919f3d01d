//! 每步字段模式定义
//!
//! 每个登记步骤的字段规则独立声明：必填性、最小长度和格式。
//! 校验失败只阻止当前步骤推进，不影响已捕获的其他步骤数据。

use crate::state_machine::IntakeStep;
use clinic_core::validation::{
    validate_date, validate_email, validate_name, validate_phone, validate_state, validate_zip,
};
use clinic_core::{FieldErrors, Gender};
use std::collections::HashMap;
use std::str::FromStr;

/// 字段格式种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Email,
    Phone,
    Zip,
    Date,
    State,
    Gender,
    FreeText,
}

/// 单个字段的校验规则
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub min_len: usize,
    pub kind: FieldKind,
}

impl FieldRule {
    fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: true,
            min_len: 1,
            kind,
        }
    }

    fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: false,
            min_len: 0,
            kind,
        }
    }

    fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }
}

/// 一个登记步骤的完整字段模式
#[derive(Debug, Clone)]
pub struct StepSchema {
    pub step: IntakeStep,
    pub fields: Vec<FieldRule>,
}

impl StepSchema {
    /// 校验提交的字段值，返回按字段聚合的错误
    pub fn validate(&self, values: &HashMap<String, String>) -> FieldErrors {
        let mut errors = FieldErrors::new();

        for rule in &self.fields {
            let raw = values.get(rule.name).map(|v| v.trim()).unwrap_or("");

            if raw.is_empty() {
                if rule.required {
                    errors.add(rule.name, format!("{} is required", label(rule.name)));
                }
                continue;
            }

            if raw.chars().count() < rule.min_len {
                errors.add(
                    rule.name,
                    format!("{} must be at least {} characters", label(rule.name), rule.min_len),
                );
                continue;
            }

            let field_error = match rule.kind {
                FieldKind::Name => validate_name(raw),
                FieldKind::Email => validate_email(raw),
                FieldKind::Phone => validate_phone(raw),
                FieldKind::Zip => validate_zip(raw),
                FieldKind::Date => validate_date(raw),
                FieldKind::State => validate_state(raw),
                FieldKind::Gender => match Gender::from_str(raw) {
                    Ok(_) => None,
                    Err(_) => Some(clinic_core::validation::FieldError {
                        kind: clinic_core::validation::FieldErrorKind::Format,
                        message: "Please select a valid gender".to_string(),
                    }),
                },
                FieldKind::FreeText => None,
            };

            if let Some(err) = field_error {
                errors.add(rule.name, err.message);
            }
        }

        errors
    }
}

/// 获取指定步骤的字段模式
pub fn schema_for(step: IntakeStep) -> StepSchema {
    let fields = match step {
        IntakeStep::PatientInfo => vec![
            FieldRule::required("first_name", FieldKind::Name).with_min_len(2),
            FieldRule::required("last_name", FieldKind::Name).with_min_len(2),
            FieldRule::required("phone", FieldKind::Phone),
            FieldRule::required("email", FieldKind::Email),
            FieldRule::optional("date_of_birth", FieldKind::Date),
            FieldRule::required("gender", FieldKind::Gender),
            FieldRule::required("address", FieldKind::FreeText).with_min_len(5),
            FieldRule::required("city", FieldKind::FreeText).with_min_len(2),
            FieldRule::required("state", FieldKind::State),
            FieldRule::required("zip_code", FieldKind::Zip),
        ],
        IntakeStep::EmergencyContact => vec![
            FieldRule::required("first_name", FieldKind::Name).with_min_len(2),
            FieldRule::required("last_name", FieldKind::Name).with_min_len(2),
            FieldRule::required("relationship", FieldKind::FreeText).with_min_len(2),
            FieldRule::required("phone_primary", FieldKind::Phone),
            FieldRule::optional("phone_secondary", FieldKind::Phone),
            FieldRule::optional("email", FieldKind::Email),
        ],
        IntakeStep::Insurance => vec![
            FieldRule::required("provider_name", FieldKind::FreeText).with_min_len(2),
            FieldRule::required("policy_number", FieldKind::FreeText).with_min_len(2),
            FieldRule::optional("group_number", FieldKind::FreeText),
            FieldRule::optional("subscriber_name", FieldKind::Name),
        ],
        IntakeStep::Allergies => vec![
            FieldRule::optional("allergies", FieldKind::FreeText),
            FieldRule::optional("reaction", FieldKind::FreeText),
        ],
        IntakeStep::Medications => vec![
            FieldRule::optional("medications", FieldKind::FreeText),
            FieldRule::optional("dosage", FieldKind::FreeText),
            FieldRule::optional("frequency", FieldKind::FreeText),
        ],
        // 终态没有可提交的字段
        IntakeStep::Submitted => vec![],
    };

    StepSchema { step, fields }
}

fn label(field_name: &str) -> String {
    let mut out = String::with_capacity(field_name.len());
    for (i, part) in field_name.split('_').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = part.chars();
        if i == 0 {
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
                continue;
            }
        }
        out.push_str(part);
    }
    out
}
