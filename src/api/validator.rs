// ==========================================
// Just Pressed 运营管理系统 - 表单校验器
// ==========================================
// 职责: 表单字段格式、数量、媒体文件、产出平衡、日期区间校验
// 约束: 面向用户的文案一律经 i18n 输出
// ==========================================

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult, ValidationViolation};
use crate::clock::days_before;
use crate::domain::customer::{is_valid_phone, is_valid_pincode, CustomerDraft};
use crate::domain::production::OutputBalance;
use crate::domain::returns::MediaAsset;
use crate::domain::types::MediaKind;
use crate::i18n::{t, t_with_args};

// ==========================================
// 字段级校验
// ==========================================

/// 必填文本（trim 后非空）
pub fn require_text(field: &str, label: &str, value: &str) -> Option<ValidationViolation> {
    if value.trim().is_empty() {
        Some(ValidationViolation::new(
            field,
            t_with_args("validation.required", &[("field", label)]),
        ))
    } else {
        None
    }
}

/// 手机号: 可空，非空时必须恰好 10 位数字
pub fn check_phone(phone: Option<&str>) -> Option<ValidationViolation> {
    match phone {
        Some(p) if !is_valid_phone(p) => {
            Some(ValidationViolation::new("phone", t("validation.phone_digits")))
        }
        _ => None,
    }
}

/// 邮编: 可空，非空时必须恰好 6 位数字
pub fn check_pincode(pincode: Option<&str>) -> Option<ValidationViolation> {
    match pincode {
        Some(p) if !is_valid_pincode(p) => Some(ValidationViolation::new(
            "pincode",
            t("validation.pincode_digits"),
        )),
        _ => None,
    }
}

/// 客户表单整体校验（草稿需已清洗）
pub fn validate_customer_draft(draft: &CustomerDraft) -> ApiResult<()> {
    let mut violations = Vec::new();

    if draft.customer_name.is_empty() {
        violations.push(ValidationViolation::new(
            "customer_name",
            t("validation.customer_name_required"),
        ));
    }
    violations.extend(check_phone(draft.phone.as_deref()));
    violations.extend(check_pincode(draft.pincode.as_deref()));

    match ApiError::from_violations(violations) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// 数量必须 > 0（NaN 视为无效）
pub fn require_positive(field: &str, label: &str, qty: f64) -> ApiResult<()> {
    if qty.is_finite() && qty > 0.0 {
        Ok(())
    } else {
        Err(ApiError::field(
            field,
            t_with_args("validation.positive_qty", &[("field", label)]),
        ))
    }
}

/// 数量必须 ≥ 0
pub fn require_non_negative(field: &str, label: &str, qty: f64) -> ApiResult<()> {
    if qty.is_finite() && qty >= 0.0 {
        Ok(())
    } else {
        Err(ApiError::field(
            field,
            t_with_args("validation.non_negative_qty", &[("field", label)]),
        ))
    }
}

// ==========================================
// 产出平衡
// ==========================================

/// 停止提取: oil + cake ≤ 投入
pub fn check_batch_balance<B: OutputBalance>(
    batch: &B,
    oil: f64,
    cake: f64,
    tolerance: f64,
) -> ApiResult<()> {
    let total = oil + cake;
    batch.check_output(total, tolerance).map_err(|v| {
        let message = t_with_args(
            "validation.batch_output_exceeds_input",
            &[
                ("input", &fmt_qty(v.input)),
                ("unit", v.unit.to_db_str()),
                ("oil", &fmt_qty(oil)),
                ("cake", &fmt_qty(cake)),
                ("total", &fmt_qty(v.output_total)),
            ],
        );
        ApiError::OutputExceedsInput {
            message,
            input: v.input,
            output_total: v.output_total,
        }
    })
}

/// 停止过滤: 过滤油 ≤ 投入
pub fn check_filter_balance<B: OutputBalance>(
    entry: &B,
    filtered: f64,
    tolerance: f64,
) -> ApiResult<()> {
    entry.check_output(filtered, tolerance).map_err(|v| {
        let message = t_with_args(
            "validation.filter_output_exceeds_input",
            &[("input", &fmt_qty(v.input)), ("output", &fmt_qty(v.output_total))],
        );
        ApiError::OutputExceedsInput {
            message,
            input: v.input,
            output_total: v.output_total,
        }
    })
}

/// 数量展示: 去掉多余的小数 0
fn fmt_qty(v: f64) -> String {
    let s = format!("{:.3}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

// ==========================================
// 媒体文件
// ==========================================

/// 类型前缀 + 大小上限
pub fn validate_media_asset(asset: &MediaAsset, kind: MediaKind, max_bytes: u64) -> ApiResult<()> {
    let (type_key, size_key, field) = match kind {
        MediaKind::Image => ("validation.image_type", "validation.image_size", "photos"),
        MediaKind::Video => ("validation.video_type", "validation.video_size", "videos"),
    };

    if !asset.matches_kind(kind) {
        return Err(ApiError::field(field, t(type_key)));
    }
    if asset.size_bytes > max_bytes {
        let limit_mb = format!("{}", max_bytes / (1024 * 1024));
        return Err(ApiError::field(
            field,
            t_with_args(
                size_key,
                &[("limit", &limit_mb), ("size", &asset.size_mb_display())],
            ),
        )
        .with_detail(serde_json::json!({ "file_name": asset.file_name })));
    }
    Ok(())
}

// ==========================================
// 日期区间
// ==========================================

/// 自定义区间: from ≤ to，且 from 不早于 today - lookback_days
pub fn validate_date_range(
    from: NaiveDate,
    to: NaiveDate,
    today_ist: NaiveDate,
    lookback_days: i64,
) -> ApiResult<()> {
    if from > to {
        return Err(ApiError::field("from", t("validation.date_range_order")));
    }
    if from < days_before(today_ist, lookback_days) {
        return Err(ApiError::field(
            "from",
            t_with_args(
                "validation.date_range_lookback",
                &[("days", &lookback_days.to_string())],
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::production::RunningBatchView;
    use crate::domain::types::QtyUnit;
    use crate::i18n::tests::LOCALE_TEST_LOCK;

    fn running(input: f64) -> RunningBatchView {
        RunningBatchView {
            batch_id: "BP-260203-1234".into(),
            machine_id: "m1".into(),
            machine_code: "P1".into(),
            raw_material_id: "r1".into(),
            seed_name: "Groundnut".into(),
            seed_input_qty: input,
            unit: QtyUnit::Kg,
            start_time_ist: "03-Feb-2026 10:00:00".into(),
            start_epoch: 0,
        }
    }

    #[test]
    fn test_batch_balance_boundaries() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        crate::i18n::set_locale("en");

        let b = running(100.0);
        assert!(check_batch_balance(&b, 60.0, 35.0, 1e-6).is_ok());
        assert!(check_batch_balance(&b, 60.0, 40.0, 1e-6).is_ok());
        // 浮点噪声
        assert!(check_batch_balance(&b, 0.1 + 0.2, 99.7, 1e-6).is_ok());

        match check_batch_balance(&b, 60.0, 45.0, 1e-6) {
            Err(ApiError::OutputExceedsInput { message, output_total, .. }) => {
                assert_eq!(output_total, 105.0);
                assert_eq!(
                    message,
                    "Output exceeds input. Input was 100 kg, but Oil (60) + Cake (45) = 105 kg"
                );
            }
            other => panic!("Expected OutputExceedsInput, got {:?}", other),
        }
    }

    #[test]
    fn test_customer_draft_collects_all_violations() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        crate::i18n::set_locale("en");

        let draft = CustomerDraft {
            customer_name: String::new(),
            phone: Some("98765".into()),
            pincode: Some("56001".into()),
            ..Default::default()
        };
        match validate_customer_draft(&draft) {
            Err(ApiError::FormValidationError { violations, .. }) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, vec!["customer_name", "phone", "pincode"]);
            }
            other => panic!("Expected FormValidationError, got {:?}", other),
        }

        let ok = CustomerDraft {
            customer_name: "Meera".into(),
            phone: Some("9876543210".into()),
            pincode: Some("560001".into()),
            ..Default::default()
        };
        assert!(validate_customer_draft(&ok).is_ok());
    }

    #[test]
    fn test_media_asset_limits() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        crate::i18n::set_locale("en");

        let limit = 2 * 1024 * 1024;
        let photo = MediaAsset {
            file_name: "a.jpg".into(),
            mime_type: "image/jpeg".into(),
            size_bytes: limit,
        };
        assert!(validate_media_asset(&photo, MediaKind::Image, limit).is_ok());

        let big = MediaAsset { size_bytes: limit + 1, ..photo.clone() };
        match validate_media_asset(&big, MediaKind::Image, limit) {
            Err(ApiError::FormValidationError { reason, violations }) => {
                assert!(reason.starts_with("Image must be less than 2MB"));
                assert!(violations[0].details.is_some());
            }
            other => panic!("Expected FormValidationError, got {:?}", other),
        }

        assert!(validate_media_asset(&photo, MediaKind::Video, limit).is_err());
    }

    #[test]
    fn test_date_range_rules() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let d = |m, day| NaiveDate::from_ymd_opt(2026, m, day).unwrap();
        assert!(validate_date_range(d(2, 1), d(2, 10), today, 365).is_ok());
        assert!(validate_date_range(d(2, 5), d(2, 5), today, 365).is_ok());
        assert!(validate_date_range(d(2, 6), d(2, 5), today, 365).is_err());
        assert!(validate_date_range(d(1, 1), d(2, 5), today, 30).is_err());
    }

    #[test]
    fn test_quantities() {
        assert!(require_positive("qty", "Quantity", 0.5).is_ok());
        assert!(require_positive("qty", "Quantity", 0.0).is_err());
        assert!(require_positive("qty", "Quantity", f64::NAN).is_err());
        assert!(require_non_negative("qty", "Quantity", 0.0).is_ok());
        assert!(require_non_negative("qty", "Quantity", -1.0).is_err());
    }
}
