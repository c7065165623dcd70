// ==========================================
// Just Pressed 运营管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户可读的错误
// 分类:
// - 表单校验（就地提示，可重新编辑）
// - 后端拒绝（记录日志，返回通用错误）
// - 未找到（独立的 NotFound 结果）
// ==========================================

use crate::domain::customer::Customer;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与表单错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 表单校验失败（逐字段原因）
    #[error("表单校验失败: {reason}")]
    FormValidationError {
        reason: String,
        violations: Vec<ValidationViolation>,
    },

    /// 产出超过投入（停止提取/过滤）
    #[error("产出超过投入: {message}")]
    OutputExceedsInput {
        message: String,
        input: f64,
        output_total: f64,
    },

    /// 手机号已被其他客户使用，需确认后再提交
    #[error("手机号重复: {phone} 已属于客户 {}", existing.customer_id)]
    DuplicatePhone {
        phone: String,
        existing: Box<Customer>,
    },

    #[error("标签已存在: {0}")]
    DuplicateTag(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("未登录: {0}")]
    NotAuthenticated(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 单字段表单错误
    pub fn field(field: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        ApiError::FormValidationError {
            reason: reason.clone(),
            violations: vec![ValidationViolation::new(field, reason)],
        }
    }

    /// 给单字段表单错误附加详情（其他变体原样返回）
    pub fn with_detail(self, details: serde_json::Value) -> Self {
        match self {
            ApiError::FormValidationError { reason, mut violations } => {
                if let Some(v) = violations.first_mut() {
                    v.details = Some(details);
                }
                ApiError::FormValidationError { reason, violations }
            }
            other => other,
        }
    }

    /// 多字段表单错误；无违规时返回 None
    pub fn from_violations(violations: Vec<ValidationViolation>) -> Option<Self> {
        let first = violations.first()?.reason.clone();
        Some(ApiError::FormValidationError {
            reason: first,
            violations,
        })
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::field(&field, message)
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 校验违规详情
// ==========================================

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationViolation {
    /// 表单字段名
    pub field: String,
    /// 面向用户的原因（已本地化）
    pub reason: String,
    pub details: Option<serde_json::Value>,
}

impl ValidationViolation {
    pub fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::not_found("Customer", "C001").into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Customer"));
                assert!(msg.contains("C001"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let api_err: ApiError = RepositoryError::InvalidStateTransition {
            from: "completed".into(),
            to: "completed".into(),
        }
        .into();
        assert!(matches!(api_err, ApiError::InvalidStateTransition { .. }));

        let api_err: ApiError = RepositoryError::FieldValueError {
            field: "phone".into(),
            message: "bad".into(),
        }
        .into();
        match api_err {
            ApiError::FormValidationError { violations, .. } => {
                assert_eq!(violations[0].field, "phone");
            }
            other => panic!("Expected FormValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_from_violations() {
        assert!(ApiError::from_violations(Vec::new()).is_none());
        let err = ApiError::from_violations(vec![
            ValidationViolation::new("phone", "Phone must be 10 digits"),
            ValidationViolation::new("pincode", "Pincode must be 6 digits"),
        ])
        .unwrap();
        match err {
            ApiError::FormValidationError { reason, violations } => {
                assert_eq!(reason, "Phone must be 10 digits");
                assert_eq!(violations.len(), 2);
            }
            other => panic!("Expected FormValidationError, got {:?}", other),
        }
    }
}
