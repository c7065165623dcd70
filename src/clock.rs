// ==========================================
// Just Pressed 运营管理系统 - IST 时间工具
// ==========================================
// 所有业务事件时间同时保存两种形式:
// - epoch 毫秒（用于范围查询/排序）
// - IST 展示字符串 "DD-Mon-YYYY HH:MM:SS"（UTC+05:30）
// ==========================================

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// IST 相对 UTC 的偏移（秒）
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// 一天的毫秒数
pub const DAY_MS: i64 = 86_400_000;

/// IST 时区
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// 事件时间戳（epoch + IST 展示串）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IstTimestamp {
    pub epoch_ms: i64,
    pub formatted: String,
}

impl IstTimestamp {
    /// 当前时间
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// 从 UTC 时间构造
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self {
            epoch_ms: dt.timestamp_millis(),
            formatted: format_ist(dt),
        }
    }

    /// 从 epoch 毫秒构造（非法值回退到 epoch 0）
    pub fn from_epoch_ms(epoch_ms: i64) -> Self {
        let dt = Utc
            .timestamp_millis_opt(epoch_ms)
            .single()
            .unwrap_or_default();
        Self::from_utc(dt)
    }

    /// IST 日期
    pub fn ist_date(&self) -> NaiveDate {
        ist_date_of(self.epoch_ms)
    }
}

/// 格式化为 IST 展示串: 03-Feb-2026 14:30:05
pub fn format_ist(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&ist()).format("%d-%b-%Y %H:%M:%S").to_string()
}

/// epoch 毫秒对应的 IST 日期
pub fn ist_date_of(epoch_ms: i64) -> NaiveDate {
    let dt = Utc
        .timestamp_millis_opt(epoch_ms)
        .single()
        .unwrap_or_default();
    dt.with_timezone(&ist()).date_naive()
}

/// 今天（IST）
pub fn today_ist() -> NaiveDate {
    Utc::now().with_timezone(&ist()).date_naive()
}

/// IST 日期的起止 epoch 毫秒: [00:00:00.000, 23:59:59.999]
pub fn ist_day_bounds_ms(date: NaiveDate) -> (i64, i64) {
    let start = date
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| ist().from_local_datetime(&naive).single())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0);
    (start, start + DAY_MS - 1)
}

/// 以 IST 日期生成 YYMMDD 前缀（用于批次/退货编号）
pub fn yymmdd(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// 以 IST 日期生成 DDMMYY（用于调拨友好编号）
pub fn ddmmyy(date: NaiveDate) -> String {
    date.format("%d%m%y").to_string()
}

/// 往前推 N 天
pub fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    date - Duration::days(days)
}
