//! 字段校验模块
//!
//! 纯函数式的表单字段校验：输入字段值，返回可选的错误。
//! 无副作用，每次输入变化时可安全地重复调用。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 密码必须包含的特殊字符集合
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// 密码最小长度
pub const PASSWORD_MIN_LEN: usize = 6;

/// 姓名最小长度
pub const NAME_MIN_LEN: usize = 2;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

static ZIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("invalid zip regex"));

static PHONE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d\s().-]+$").expect("invalid phone regex"));

/// 字段错误种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    Format,
    TooShort,
    MissingUppercase,
    MissingSpecialChar,
    InvalidChars,
}

/// 单个字段的校验错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    fn new(kind: FieldErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

/// 校验邮箱格式：local@domain.tld
pub fn validate_email(value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        return Some(FieldError::new(FieldErrorKind::Required, "Email is required"));
    }
    if !EMAIL_RE.is_match(value.trim()) {
        return Some(FieldError::new(
            FieldErrorKind::Format,
            "Please enter a valid email address",
        ));
    }
    None
}

/// 校验密码复杂度
///
/// 各项检查独立求值，但只返回按顺序遇到的第一个失败项：
/// 必填 -> 长度 -> 大写字母 -> 特殊字符
pub fn validate_password(value: &str) -> Option<FieldError> {
    if value.is_empty() {
        return Some(FieldError::new(FieldErrorKind::Required, "Password is required"));
    }
    if value.chars().count() < PASSWORD_MIN_LEN {
        return Some(FieldError::new(
            FieldErrorKind::TooShort,
            "Password must be at least 6 characters",
        ));
    }
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        return Some(FieldError::new(
            FieldErrorKind::MissingUppercase,
            "Password must contain an uppercase letter",
        ));
    }
    if !value.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Some(FieldError::new(
            FieldErrorKind::MissingSpecialChar,
            "Password must contain a special character",
        ));
    }
    None
}

/// 校验姓名：仅允许字母和空格
pub fn validate_name(value: &str) -> Option<FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(FieldError::new(FieldErrorKind::Required, "Name is required"));
    }
    if trimmed.chars().count() < NAME_MIN_LEN {
        return Some(FieldError::new(
            FieldErrorKind::TooShort,
            "Name must be at least 2 characters",
        ));
    }
    if !trimmed.chars().all(|c| c.is_alphabetic() || c == ' ') {
        return Some(FieldError::new(
            FieldErrorKind::InvalidChars,
            "Name may only contain letters and spaces",
        ));
    }
    None
}

/// 校验电话号码：10-15位数字，允许分隔符和前导+
pub fn validate_phone(value: &str) -> Option<FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(FieldError::new(
            FieldErrorKind::Required,
            "Phone number is required",
        ));
    }
    let digit_count = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if !PHONE_CHARS_RE.is_match(trimmed) || digit_count < 10 || digit_count > 15 {
        return Some(FieldError::new(
            FieldErrorKind::Format,
            "Please enter a valid phone number",
        ));
    }
    None
}

/// 校验邮政编码：5位数字，可带4位扩展
pub fn validate_zip(value: &str) -> Option<FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(FieldError::new(
            FieldErrorKind::Required,
            "Zip code is required",
        ));
    }
    if !ZIP_RE.is_match(trimmed) {
        return Some(FieldError::new(
            FieldErrorKind::Format,
            "Please enter a valid zip code",
        ));
    }
    None
}

/// 校验日期格式：YYYY-MM-DD
pub fn validate_date(value: &str) -> Option<FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(FieldError::new(FieldErrorKind::Required, "Date is required"));
    }
    if chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_err() {
        return Some(FieldError::new(
            FieldErrorKind::Format,
            "Please enter a valid date (YYYY-MM-DD)",
        ));
    }
    None
}

/// 校验美国州缩写：两个字母
pub fn validate_state(value: &str) -> Option<FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(FieldError::new(FieldErrorKind::Required, "State is required"));
    }
    if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(FieldError::new(
            FieldErrorKind::Format,
            "Please enter a two-letter state code",
        ));
    }
    None
}
