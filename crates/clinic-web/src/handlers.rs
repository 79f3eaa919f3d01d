//! HTTP处理器

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::{NaiveDate, Utc};
use clinic_core::utils::generate_appointment_id;
use clinic_core::validation::{validate_date, validate_email, validate_name};
use clinic_core::{
    Appointment, AppointmentStatus, ClinicError, ContactMessage, FieldErrors, User,
};
use clinic_directory::DirectoryService;
use clinic_intake::IntakeSessionManager;
use clinic_store::Collections;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::auth::AuthService;

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub directory: Arc<DirectoryService>,
    pub intake: Arc<RwLock<IntakeSessionManager>>,
    pub collections: Arc<Collections>,
}

/// HTTP 层错误包装，负责错误到响应的映射
#[derive(Debug)]
pub struct ApiError(pub ClinicError);

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            ClinicError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": true,
                    "message": "Validation failed",
                    "fields": errors,
                }),
            ),
            ClinicError::Authentication => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": true,
                    "message": ClinicError::Authentication.to_string(),
                }),
            ),
            ClinicError::Registration(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": true, "message": msg }),
            ),
            ClinicError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": true, "message": msg }),
            ),
            ClinicError::InvalidStepTransition { from, event } => (
                StatusCode::CONFLICT,
                json!({
                    "error": true,
                    "message": format!("Cannot perform '{}' from step '{}'", event, from),
                }),
            ),
            ClinicError::Config(msg) => {
                // 配置细节只进日志，不外泄
                error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": true, "message": "Service is misconfigured" }),
                )
            }
            ClinicError::Network(msg) => {
                error!("External call failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": true, "message": "An external service is unavailable. Please try again." }),
                )
            }
            ClinicError::Serialization(e) => {
                error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": true, "message": "Internal error" }),
                )
            }
            ClinicError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": true, "message": "Internal error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// HTTP 层统一结果类型
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Clinic Patient Portal API",
        "version": "1.0.0",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "auth": "/auth",
            "api": "/api/v1"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": "1.0.0"
    }))
}

/// 医生搜索查询参数
#[derive(Debug, Deserialize)]
pub struct ProviderQueryParams {
    pub query: Option<String>,
}

/// 医生搜索处理器
pub async fn search_providers(
    State(state): State<AppState>,
    Query(params): Query<ProviderQueryParams>,
) -> impl IntoResponse {
    let query = params.query.unwrap_or_default();
    info!("Searching providers with query: {:?}", query);

    let providers = state.directory.search(&query);
    let total = providers.len();
    Json(json!({
        "providers": providers,
        "total": total,
    }))
}

/// 医生详情处理器
pub async fn get_provider(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let provider = state.directory.get(&provider_id)?;
    Ok(Json(provider.clone()))
}

/// 联系表单请求
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// 联系表单处理器
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut errors = FieldErrors::new();
    if let Some(err) = validate_name(&request.name) {
        errors.add("name", err.message);
    }
    if let Some(err) = validate_email(&request.email) {
        errors.add("email", err.message);
    }
    if request.subject.trim().is_empty() {
        errors.add("subject", "Subject is required");
    }
    if request.message.trim().is_empty() {
        errors.add("message", "Message is required");
    }
    if !errors.is_empty() {
        return Err(ClinicError::Validation(errors).into());
    }

    let message = ContactMessage {
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        subject: request.subject.trim().to_string(),
        message: request.message.trim().to_string(),
        created_at: Utc::now(),
    };
    state.collections.create_contact_message(&message).await?;

    Ok((StatusCode::CREATED, Json(json!({ "status": "received" }))))
}

/// 创建预约请求
#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub provider_id: String,
    pub appointment_type_id: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason_for_visit: String,
    pub notes: Option<String>,
    pub length_minutes: Option<i32>,
}

/// 创建预约处理器（单一保存路径，无更新/取消流程）
pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut errors = FieldErrors::new();
    if let Some(err) = validate_date(&request.appointment_date) {
        errors.add("appointment_date", err.message);
    }
    if request.appointment_time.trim().is_empty() {
        errors.add("appointment_time", "Appointment time is required");
    }
    if request.reason_for_visit.trim().is_empty() {
        errors.add("reason_for_visit", "Reason for visit is required");
    }
    if !errors.is_empty() {
        return Err(ClinicError::Validation(errors).into());
    }

    // 医生必须存在于目录中
    state.directory.get(&request.provider_id)?;

    let appointment = Appointment {
        appointment_id: generate_appointment_id(),
        patient_id: request.patient_id,
        provider_id: request.provider_id,
        appointment_type_id: request.appointment_type_id,
        appointment_date: NaiveDate::parse_from_str(request.appointment_date.trim(), "%Y-%m-%d")
            .map_err(|e| ClinicError::Internal(format!("Validated date failed to parse: {}", e)))?,
        appointment_time: request.appointment_time.trim().to_string(),
        reason_for_visit: request.reason_for_visit.trim().to_string(),
        status: AppointmentStatus::Scheduled,
        notes: request.notes,
        start_time: request.appointment_time.trim().to_string(),
        length_minutes: request.length_minutes.unwrap_or(30),
        created_at: Utc::now(),
    };
    state.collections.create_appointment(&appointment).await?;

    info!("Appointment {} created", appointment.appointment_id);
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// 预约列表查询参数
#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub patient_id: Option<String>,
}

/// 预约列表处理器
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
    Query(params): Query<AppointmentQueryParams>,
) -> ApiResult<impl IntoResponse> {
    let appointments = state
        .collections
        .list_appointments(params.patient_id.as_deref())
        .await?;
    let total = appointments.len();
    Ok(Json(json!({
        "appointments": appointments,
        "total": total,
    })))
}

/// 仪表盘概览
#[derive(Debug, Serialize)]
pub struct DashboardOverview {
    pub user: User,
    pub patients: usize,
    pub appointments: usize,
    pub messages: usize,
    pub providers: usize,
}

/// 仪表盘概览处理器
pub async fn dashboard_overview(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    let patients = state.collections.list_patients().await?;
    let appointments = state.collections.list_appointments(None).await?;
    let messages = state.collections.list_contact_messages().await?;

    Ok(Json(DashboardOverview {
        user,
        patients: patients.len(),
        appointments: appointments.len(),
        messages: messages.len(),
        providers: state.directory.all().len(),
    }))
}
