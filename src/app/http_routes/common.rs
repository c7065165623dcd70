use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::app::state::AppState;

// ==========================================
// 公共工具：错误映射、操作人解析、阻塞调用
// ==========================================

/// 调用方用户 ID 的请求头
pub const USER_HEADER: &str = "x-user-id";

/// 错误响应（返回给前端）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

pub type HttpError = (StatusCode, Json<ErrorResponse>);
pub(super) type HttpResult<T> = Result<Json<T>, HttpError>;

/// 将ApiError转换为 HTTP 状态码 + JSON 错误体
pub fn map_api_error(err: ApiError) -> HttpError {
    let (status, code) = match &err {
        ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        ApiError::FormValidationError { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "FORM_VALIDATION_ERROR")
        }
        ApiError::OutputExceedsInput { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "OUTPUT_EXCEEDS_INPUT")
        }
        ApiError::DuplicatePhone { .. } => (StatusCode::CONFLICT, "DUPLICATE_PHONE"),
        ApiError::DuplicateTag(_) => (StatusCode::CONFLICT, "DUPLICATE_TAG"),
        ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ApiError::NotAuthenticated(_) => (StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED"),
        ApiError::BusinessRuleViolation(_) => (StatusCode::CONFLICT, "BUSINESS_RULE_VIOLATION"),
        ApiError::InvalidStateTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_STATE_TRANSITION")
        }
        ApiError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        ApiError::DatabaseTransactionError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_TRANSACTION_ERROR")
        }
        ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ApiError::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "OTHER_ERROR"),
    };

    if status.is_server_error() {
        tracing::error!(code, "请求失败: {}", err);
    }

    // 表单类错误直接给出可展示的原因
    let message = match &err {
        ApiError::FormValidationError { reason, .. } => reason.clone(),
        ApiError::OutputExceedsInput { message, .. } => message.clone(),
        ApiError::DuplicateTag(msg) | ApiError::NotAuthenticated(msg) => msg.clone(),
        ApiError::DuplicatePhone { phone, existing } => crate::i18n::t_with_args(
            "customer.duplicate_phone",
            &[("phone", phone.as_str()), ("name", existing.customer_name.as_str())],
        ),
        _ => err.to_string(),
    };

    let details = match &err {
        ApiError::FormValidationError { violations, .. } => {
            Some(serde_json::json!({ "violations": violations }))
        }
        ApiError::OutputExceedsInput {
            input,
            output_total,
            ..
        } => Some(serde_json::json!({
            "input": input,
            "output_total": output_total,
        })),
        ApiError::DuplicatePhone { phone, existing } => Some(serde_json::json!({
            "phone": phone,
            "existing": existing,
        })),
        ApiError::InvalidStateTransition { from, to } => Some(serde_json::json!({
            "from": from,
            "to": to,
        })),
        _ => None,
    };

    (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            message,
            details,
        }),
    )
}

/// 在阻塞线程池上执行同步 API 调用
///
/// 仓储层持有 rusqlite 连接锁并做同步 IO，不能占用 async worker
pub(super) async fn blocking<T, F>(f: F) -> HttpResult<T>
where
    F: FnOnce() -> Result<T, HttpError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map(Json),
        Err(e) => Err(map_api_error(ApiError::InternalError(format!(
            "任务执行失败: {}",
            e
        )))),
    }
}

/// 解析操作人（请求头 → 已启用用户）
pub(super) fn actor_of(state: &AppState, headers: &HeaderMap) -> Result<String, HttpError> {
    let user_id = headers.get(USER_HEADER).and_then(|v| v.to_str().ok());
    state
        .user_api
        .current_user(user_id)
        .map(|u| u.user_id)
        .map_err(map_api_error)
}

/// 请求头中的用户 ID（只读接口用，不校验）
pub(super) fn user_id_of(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_HEADER).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ValidationViolation;

    #[tokio::test]
    async fn test_blocking_maps_panic_to_internal_error() {
        let ok = blocking(|| Ok::<_, HttpError>(7)).await;
        assert_eq!(ok.map(|Json(v)| v).ok(), Some(7));

        let err = blocking(|| -> Result<i32, HttpError> { panic!("boom") })
            .await
            .err();
        let (status, body) = err.unwrap();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "INTERNAL_ERROR");
    }

    #[test]
    fn test_status_mapping() {
        let (status, body) = map_api_error(ApiError::NotFound("x".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "NOT_FOUND");

        let (status, _) = map_api_error(ApiError::NotAuthenticated("no".into()));
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = map_api_error(ApiError::InvalidStateTransition {
            from: "completed".into(),
            to: "completed".into(),
        });
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = map_api_error(ApiError::InternalError("boom".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_form_error_carries_reason_and_violations() {
        let err = ApiError::FormValidationError {
            reason: "Phone must be 10 digits".into(),
            violations: vec![ValidationViolation::new("phone", "Phone must be 10 digits")],
        };
        let (status, body) = map_api_error(err);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.message, "Phone must be 10 digits");
        let details = body.details.clone().unwrap_or_default();
        assert_eq!(details["violations"][0]["field"], "phone");
    }

    #[test]
    fn test_output_exceeds_input_details() {
        let (_, body) = map_api_error(ApiError::OutputExceedsInput {
            message: "Output exceeds input".into(),
            input: 100.0,
            output_total: 105.0,
        });
        assert_eq!(body.code, "OUTPUT_EXCEEDS_INPUT");
        let details = body.details.clone().unwrap_or_default();
        assert_eq!(details["output_total"], 105.0);
    }
}
