// ==========================================
// Just Pressed 运营管理系统 - 主数据模型
// ==========================================
// 地点 / 机台 / 原料(油籽) / 产品 / SKU
// ==========================================

use serde::{Deserialize, Serialize};

/// 过滤机的 machine_type，榨油机 = 其他所有类型
pub const FILTER_MACHINE_TYPE: &str = "Filter";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: String,
    pub location_name: String,
    pub location_code: String,
    pub location_type: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub machine_id: String,
    pub machine_code: String,
    pub machine_name: String,
    pub machine_type: String,
    pub status: String,
    pub location_id: Option<String>,
}

impl Machine {
    /// 是否为可用的榨油机（active 且非过滤机）
    pub fn is_active_press(&self) -> bool {
        self.status == "active" && self.machine_type != FILTER_MACHINE_TYPE
    }
}

/// 原料（油籽）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterial {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    pub sku_id: String,
    pub product_id: String,
    pub sku_code: String,
    pub variant_name: Option<String>,
    pub size_value: f64,
    pub size_unit: String,
    pub is_active: bool,
}

/// SKU 视图（带产品名与展示标签）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuView {
    pub sku_id: String,
    pub sku_code: String,
    pub product_id: String,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub size_value: f64,
    pub size_unit: String,
    pub display_label: String,
}

/// 展示标签: "产品 规格 容量 单位"，缺失部分省略
pub fn sku_display_label(
    product_name: &str,
    variant_name: Option<&str>,
    size_value: f64,
    size_unit: &str,
) -> String {
    let size = if size_value.fract() == 0.0 {
        format!("{}", size_value as i64)
    } else {
        format!("{}", size_value)
    };

    [
        product_name.trim(),
        variant_name.map(str::trim).unwrap_or(""),
        size.as_str(),
        size_unit.trim(),
    ]
    .iter()
    .filter(|p| !p.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku_display_label() {
        assert_eq!(
            sku_display_label("Groundnut Oil", Some("Cold Pressed"), 1.0, "L"),
            "Groundnut Oil Cold Pressed 1 L"
        );
        assert_eq!(sku_display_label("Sesame Oil", None, 0.5, "L"), "Sesame Oil 0.5 L");
    }

    #[test]
    fn test_press_machine_excludes_filter() {
        let mut m = Machine {
            machine_id: "m1".into(),
            machine_code: "P1".into(),
            machine_name: "Press 1".into(),
            machine_type: "Expeller".into(),
            status: "active".into(),
            location_id: None,
        };
        assert!(m.is_active_press());
        m.machine_type = FILTER_MACHINE_TYPE.into();
        assert!(!m.is_active_press());
    }
}
