// ==========================================
// DispatchApi / ReturnApi 集成测试
// ==========================================
// 测试范围:
// 1. 发货: 必填校验、有效明细过滤、查询
// 2. 退货: 报废需照片、编号格式、预留编号
// 3. 媒体: 类型与大小校验
// ==========================================

mod helpers;

use chrono::NaiveDate;
use helpers::api_test_helper::*;
use helpers::test_data_builder::ReturnBuilder;
use just_pressed_ops::api::{ApiError, CreateDispatchRequest, DispatchLineInput};
use just_pressed_ops::domain::returns::MediaAsset;
use just_pressed_ops::domain::types::{MediaKind, ReturnAction, ReturnCondition};

fn dispatch_request(shipped_to: &str, lines: &[(&str, i64)]) -> CreateDispatchRequest {
    CreateDispatchRequest {
        from_location_id: LOC_MILL.to_string(),
        shipped_to: shipped_to.to_string(),
        dispatch_date: None,
        remarks: None,
        lines: lines
            .iter()
            .map(|(sku, qty)| DispatchLineInput {
                sku_id: sku.to_string(),
                quantity: *qty,
            })
            .collect(),
    }
}

// ==========================================
// 发货
// ==========================================

#[test]
fn test_dispatch_requires_destination_and_items() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let (field, reason) = assert_form_error(
        env.dispatch_api
            .create_dispatch(&dispatch_request("   ", &[(SKU_GROUNDNUT_500, 4)]), OPERATOR),
    );
    assert_eq!(field, "shipped_to");
    assert_eq!(reason, "Please select location and enter shipped to");

    let (field, _) = assert_form_error(env.dispatch_api.create_dispatch(
        &dispatch_request("Amazon FC", &[("", 3), (SKU_GROUNDNUT_500, 0)]),
        OPERATOR,
    ));
    assert_eq!(field, "lines");

    let mut unknown_from = dispatch_request("Amazon FC", &[(SKU_GROUNDNUT_500, 4)]);
    unknown_from.from_location_id = "loc-missing".to_string();
    assert_not_found(env.dispatch_api.create_dispatch(&unknown_from, OPERATOR));

    assert_eq!(env.count_logs("CreateDispatch"), 0);
}

#[test]
fn test_create_dispatch_keeps_valid_lines() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let mut req = dispatch_request(
        " Amazon FC ",
        &[(SKU_GROUNDNUT_500, 12), ("", 5), (SKU_SESAME_500, 6), (SKU_GROUNDNUT_1L, -1)],
    );
    req.dispatch_date = NaiveDate::from_ymd_opt(2026, 3, 1);
    req.remarks = Some("  ".to_string());

    let dispatch = env
        .dispatch_api
        .create_dispatch(&req, OPERATOR)
        .expect("发货失败");
    assert_eq!(dispatch.shipped_to, "Amazon FC");
    assert_eq!(dispatch.items.len(), 2);
    assert_eq!(dispatch.total_units(), 18);
    assert_eq!(dispatch.remarks, None);
    assert_eq!(dispatch.dispatch_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());

    let loaded = env.dispatch_api.get_dispatch(&dispatch.dispatch_id).unwrap();
    assert_eq!(loaded, dispatch);
    assert_eq!(env.count_logs("CreateDispatch"), 1);

    assert_not_found(env.dispatch_api.get_dispatch("d-missing"));
}

#[test]
fn test_list_recent_dispatches_clamps_limit() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    for dest in ["Store A", "Store B", "Store C"] {
        env.dispatch_api
            .create_dispatch(&dispatch_request(dest, &[(SKU_GROUNDNUT_500, 1)]), OPERATOR)
            .unwrap();
    }

    assert_eq!(env.dispatch_api.list_recent(2).unwrap().len(), 2);
    assert_eq!(env.dispatch_api.list_recent(0).unwrap().len(), 1);
    assert_eq!(env.dispatch_api.list_recent(10_000).unwrap().len(), 3);
}

// ==========================================
// 退货
// ==========================================

#[test]
fn test_dispose_requires_photos() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let no_photo = ReturnBuilder::new(LOC_STORE)
        .line(SKU_GROUNDNUT_500, 2, ReturnCondition::Leakage, ReturnAction::Dispose)
        .build();
    let (field, reason) = assert_form_error(env.return_api.create_return(&no_photo, None, OPERATOR));
    assert_eq!(field, "photos");
    assert_eq!(reason, "Photos required when action is Dispose");

    // 仅空白 URL 视为无照片
    let blank_photo = ReturnBuilder::new(LOC_STORE)
        .line(SKU_GROUNDNUT_500, 2, ReturnCondition::Leakage, ReturnAction::Dispose)
        .photo("   ")
        .build();
    let (field, _) = assert_form_error(env.return_api.create_return(&blank_photo, None, OPERATOR));
    assert_eq!(field, "photos");

    // 全部 Restock 时照片可选
    env.return_api
        .create_return(
            &ReturnBuilder::new(LOC_STORE)
                .line(SKU_GROUNDNUT_500, 1, ReturnCondition::Ok, ReturnAction::Restock)
                .build(),
            None,
            OPERATOR,
        )
        .expect("Restock 不需要照片");
}

#[test]
fn test_return_validation_order() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let (field, _) = assert_form_error(env.return_api.create_return(
        &ReturnBuilder::new(" ")
            .line(SKU_GROUNDNUT_500, 1, ReturnCondition::Ok, ReturnAction::Restock)
            .build(),
        None,
        OPERATOR,
    ));
    assert_eq!(field, "received_location_id");

    let (field, _) = assert_form_error(env.return_api.create_return(
        &ReturnBuilder::new(LOC_STORE)
            .line("", 1, ReturnCondition::Ok, ReturnAction::Restock)
            .line(SKU_GROUNDNUT_500, 0, ReturnCondition::Ok, ReturnAction::Dispose)
            .build(),
        None,
        OPERATOR,
    ));
    assert_eq!(field, "lines");

    assert_not_found(env.return_api.create_return(
        &ReturnBuilder::new("loc-missing")
            .line(SKU_GROUNDNUT_500, 1, ReturnCondition::Ok, ReturnAction::Restock)
            .build(),
        None,
        OPERATOR,
    ));
    assert_eq!(env.count_logs("CreateReturn"), 0);
}

#[test]
fn test_create_return_assigns_code_and_persists_items() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let req = ReturnBuilder::new(LOC_STORE)
        .order("ORD-1001", "AWB778899")
        .line(SKU_GROUNDNUT_500, 2, ReturnCondition::Leakage, ReturnAction::Dispose)
        .line(SKU_SESAME_500, 1, ReturnCondition::IncorrectProduct, ReturnAction::Restock)
        .photo("https://media.example/returns/a.jpg")
        .build();
    let ret = env
        .return_api
        .create_return(&req, None, OPERATOR)
        .expect("退货登记失败");

    assert!(ret.return_code.starts_with("RET-"));
    assert_eq!(ret.return_code.len(), "RET-YYMMDD-NNNN".len());
    assert_eq!(&ret.return_code[4..10], ret.received_date.format("%y%m%d").to_string());

    let loaded = env.return_api.get_return(&ret.return_id).unwrap();
    assert_eq!(loaded.items.len(), 2);
    assert_eq!(loaded.photos, vec!["https://media.example/returns/a.jpg".to_string()]);
    assert_eq!(loaded.order_id.as_deref(), Some("ORD-1001"));

    let by_code = env.return_api.get_return_by_code(&ret.return_code).unwrap();
    assert_eq!(by_code.return_id, ret.return_id);
    assert_eq!(env.count_logs("CreateReturn"), 1);
}

#[test]
fn test_reserved_code_is_used_then_regenerated_on_conflict() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let slot = env.return_api.reserve_media_slot();
    assert_eq!(slot.media_folder, format!("returns/{}", slot.return_code));

    let build = || {
        ReturnBuilder::new(LOC_STORE)
            .line(SKU_GROUNDNUT_1L, 1, ReturnCondition::Damaged, ReturnAction::Restock)
            .build()
    };

    let first = env
        .return_api
        .create_return(&build(), Some(&slot.return_code), OPERATOR)
        .unwrap();
    assert_eq!(first.return_code, slot.return_code);

    // 同一预留编号再次提交: 换号保存
    let second = env
        .return_api
        .create_return(&build(), Some(&slot.return_code), OPERATOR)
        .unwrap();
    assert_ne!(second.return_code, first.return_code);
    assert!(second.return_code.starts_with("RET-"));

    assert_not_found(env.return_api.get_return_by_code("RET-000000-0000"));
}

// ==========================================
// 媒体校验
// ==========================================

fn asset(name: &str, mime: &str, size: u64) -> MediaAsset {
    MediaAsset {
        file_name: name.to_string(),
        mime_type: mime.to_string(),
        size_bytes: size,
    }
}

#[test]
fn test_validate_media_type_and_size() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    const MB: u64 = 1024 * 1024;

    env.return_api
        .validate_media(&[asset("a.jpg", "image/jpeg", MB)], MediaKind::Image)
        .expect("合法图片");

    let (field, reason) = assert_form_error(
        env.return_api
            .validate_media(&[asset("a.mp4", "video/mp4", MB)], MediaKind::Image),
    );
    assert_eq!(field, "photos");
    assert_eq!(reason, "File must be an image");

    let (field, reason) = assert_form_error(env.return_api.validate_media(
        &[asset("ok.png", "image/png", MB), asset("big.png", "image/png", 3 * MB)],
        MediaKind::Image,
    ));
    assert_eq!(field, "photos");
    assert_eq!(reason, "Image must be less than 2MB (current: 3.00MB)");

    let (field, _) = assert_form_error(
        env.return_api
            .validate_media(&[asset("clip.mov", "video/quicktime", 6 * MB)], MediaKind::Video),
    );
    assert_eq!(field, "videos");

    // 上限可配置
    env.config_manager
        .set_global_config_value("media_video_max_bytes", &(10 * MB).to_string())
        .unwrap();
    env.return_api
        .validate_media(&[asset("clip.mov", "video/quicktime", 6 * MB)], MediaKind::Video)
        .expect("放宽上限后应通过");

    match env
        .return_api
        .validate_media(&[asset("doc.pdf", "application/pdf", 10)], MediaKind::Video)
    {
        Err(ApiError::FormValidationError { reason, .. }) => {
            assert_eq!(reason, "File must be a video")
        }
        other => panic!("预期FormValidationError，但得到: {:?}", other),
    }
}
