// ==========================================
// Just Pressed 运营管理系统 - 仓储公共工具
// ==========================================
// 职责: 时间戳/日期/JSON 列的编解码、LIKE 模式、IN 子句
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;

/// 审计时间戳的存储格式（UTC）
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 时间戳 → 存储串
pub fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 存储串 → 时间戳（兼容带小数秒与 RFC3339 的 T 分隔）
pub fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 存储串 → 日期
pub fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 字符串数组 JSON 列 → Vec<String>（损坏数据视为空）
pub fn parse_string_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str::<Vec<String>>(&s).ok())
        .unwrap_or_default()
}

/// Vec<String> → JSON 列
pub fn string_list_json(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// 子串匹配 LIKE 模式，转义 % _ \
///
/// 配合 `LIKE ? ESCAPE '\'` 使用
pub fn like_contains(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// 构建 IN 子句的 SQL 片段，空列表返回永假条件
pub fn build_in_clause<T: AsRef<str>>(column_name: &str, values: &[T]) -> String {
    if values.is_empty() {
        return "1 = 0".to_string();
    }

    let placeholders = values.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    format!("{} IN ({})", column_name, placeholders)
}

/// 未识别的枚举存储值
pub fn invalid_enum(idx: usize, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unknown enum value: {}", raw).into(),
    )
}
