// ==========================================
// ProductionApi 集成测试
// ==========================================
// 测试范围:
// 1. 开机: 字段校验、机台类型、机台占用
// 2. 停机: 产出平衡、状态转换
// 3. 过滤: 地点回退、停止校验
// 4. 灌装: SKU 与产品归属
// 5. 看板: 运行中列表与空闲机台数
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use just_pressed_ops::api::{
    ApiError, RecordBottlingRequest, StartExtractionRequest, StartFilteringRequest,
};
use just_pressed_ops::domain::types::{BatchStatus, QtyUnit};

fn extraction(machine_id: &str, seed_id: &str, qty: f64) -> StartExtractionRequest {
    StartExtractionRequest {
        machine_id: machine_id.to_string(),
        raw_material_id: seed_id.to_string(),
        seed_input_qty: qty,
        unit: QtyUnit::Kg,
    }
}

// ==========================================
// 开机
// ==========================================

#[test]
fn test_start_extraction_creates_running_batch() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let batch = env
        .production_api
        .start_extraction(&extraction(MACHINE_P1, SEED_GROUNDNUT, 100.0), OPERATOR)
        .expect("开机失败");

    assert!(batch.batch_id.starts_with("BP-"));
    assert_eq!(batch.batch_id.len(), "BP-YYMMDD-NNNN".len());
    assert_eq!(batch.batch_status, BatchStatus::InProgress);
    assert_eq!(batch.seed_type, "Groundnut");
    assert_eq!(batch.operator_id, OPERATOR);
    assert_eq!(batch.location_id.as_deref(), Some(LOC_MILL));

    let running = env.production_api.list_running_batches().unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].machine_code, "P1");
    assert_eq!(running[0].seed_name, "Groundnut");

    assert_eq!(env.production_api.idle_machine_count().unwrap(), 1);
    assert_eq!(env.count_logs("StartExtraction"), 1);
}

#[test]
fn test_start_extraction_validates_fields_before_lookup() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env
        .production_api
        .start_extraction(&extraction("", " ", 10.0), OPERATOR)
        .expect_err("缺字段应失败");
    match err {
        ApiError::FormValidationError { violations, .. } => {
            let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
            assert_eq!(fields, vec!["machine_id", "raw_material_id"]);
        }
        other => panic!("预期FormValidationError，但得到: {:?}", other),
    }

    let (field, _) = assert_form_error(
        env.production_api
            .start_extraction(&extraction(MACHINE_P1, SEED_GROUNDNUT, 0.0), OPERATOR),
    );
    assert_eq!(field, "seed_input_qty");

    let (field, _) = assert_form_error(
        env.production_api
            .start_extraction(&extraction(MACHINE_P1, SEED_GROUNDNUT, f64::NAN), OPERATOR),
    );
    assert_eq!(field, "seed_input_qty");
}

#[test]
fn test_start_extraction_rejects_filter_machine_and_unknown_seed() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    assert_not_found(
        env.production_api
            .start_extraction(&extraction(MACHINE_FILTER, SEED_GROUNDNUT, 10.0), OPERATOR),
    );
    assert_not_found(
        env.production_api
            .start_extraction(&extraction(MACHINE_P1, "rm-missing", 10.0), OPERATOR),
    );
    assert_eq!(env.count_logs("StartExtraction"), 0);
}

#[test]
fn test_busy_machine_is_rejected() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    env.production_api
        .start_extraction(&extraction(MACHINE_P1, SEED_GROUNDNUT, 50.0), OPERATOR)
        .unwrap();

    let result = env
        .production_api
        .start_extraction(&extraction(MACHINE_P1, SEED_SESAME, 20.0), OPERATOR);
    match result {
        Err(ApiError::BusinessRuleViolation(msg)) => assert!(msg.contains("P1"), "{}", msg),
        other => panic!("预期BusinessRuleViolation，但得到: {:?}", other),
    }

    // 另一台机台不受影响
    env.production_api
        .start_extraction(&extraction(MACHINE_P2, SEED_SESAME, 20.0), OPERATOR)
        .expect("P2 应可开机");
    assert_eq!(env.production_api.idle_machine_count().unwrap(), 0);
    assert_eq!(env.production_api.list_running_batches().unwrap().len(), 2);
}

// ==========================================
// 停机
// ==========================================

#[test]
fn test_stop_extraction_enforces_balance() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let batch = env
        .production_api
        .start_extraction(&extraction(MACHINE_P1, SEED_GROUNDNUT, 100.0), OPERATOR)
        .unwrap();

    let err = env
        .production_api
        .stop_extraction(&batch.batch_id, 60.0, 45.0, OPERATOR)
        .expect_err("产出超过投入应失败");
    match err {
        ApiError::OutputExceedsInput {
            message,
            input,
            output_total,
        } => {
            assert_eq!(input, 100.0);
            assert_eq!(output_total, 105.0);
            assert_eq!(
                message,
                "Output exceeds input. Input was 100 kg, but Oil (60) + Cake (45) = 105 kg"
            );
        }
        other => panic!("预期OutputExceedsInput，但得到: {:?}", other),
    }

    let still_running = env.production_api.get_batch(&batch.batch_id).unwrap();
    assert_eq!(still_running.batch_status, BatchStatus::InProgress);
    assert_eq!(still_running.oil_output_qty, None);

    let (field, _) = assert_form_error(env.production_api.stop_extraction(
        &batch.batch_id,
        -1.0,
        10.0,
        OPERATOR,
    ));
    assert_eq!(field, "oil_output_qty");

    let done = env
        .production_api
        .stop_extraction(&batch.batch_id, 38.5, 58.0, OPERATOR)
        .expect("停机失败");
    assert_eq!(done.batch_status, BatchStatus::Completed);
    assert!(done.end_epoch.is_some());

    let stored = env.production_api.get_batch(&batch.batch_id).unwrap();
    assert_eq!(stored.batch_status, BatchStatus::Completed);
    assert_eq!(stored.oil_output_qty, Some(38.5));
    assert_eq!(stored.cake_output_qty, Some(58.0));

    assert!(env.production_api.list_running_batches().unwrap().is_empty());
    assert_eq!(env.count_logs("StopExtraction"), 1);
}

#[test]
fn test_configured_tolerance_cannot_admit_excess_output() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.config_manager
        .set_global_config_value("balance_tolerance", "10")
        .unwrap();

    let batch = env
        .production_api
        .start_extraction(&extraction(MACHINE_P1, SEED_GROUNDNUT, 100.0), OPERATOR)
        .unwrap();
    let result = env
        .production_api
        .stop_extraction(&batch.batch_id, 60.0, 45.0, OPERATOR);
    assert!(matches!(result, Err(ApiError::OutputExceedsInput { .. })));
    assert_eq!(
        env.production_api.get_batch(&batch.batch_id).unwrap().batch_status,
        BatchStatus::InProgress
    );

    let entry = env
        .production_api
        .start_filtering(
            &StartFilteringRequest {
                raw_material_id: SEED_GROUNDNUT.to_string(),
                input_qty_kg: 30.0,
                location_id: None,
            },
            OPERATOR,
        )
        .unwrap();
    assert!(matches!(
        env.production_api.stop_filtering(&entry.id, 35.0, OPERATOR),
        Err(ApiError::OutputExceedsInput { .. })
    ));
    assert_eq!(env.count_logs("StopExtraction"), 0);
    assert_eq!(env.count_logs("StopFiltering"), 0);
}

#[test]
fn test_stop_extraction_state_transitions() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    assert_not_found(
        env.production_api
            .stop_extraction("BP-000000-0000", 1.0, 1.0, OPERATOR),
    );

    let batch = env
        .production_api
        .start_extraction(&extraction(MACHINE_P1, SEED_GROUNDNUT, 10.0), OPERATOR)
        .unwrap();
    env.production_api
        .stop_extraction(&batch.batch_id, 4.0, 6.0, OPERATOR)
        .unwrap();

    assert_invalid_transition(
        env.production_api
            .stop_extraction(&batch.batch_id, 4.0, 6.0, OPERATOR),
    );

    // 完成后机台空出
    env.production_api
        .start_extraction(&extraction(MACHINE_P1, SEED_GROUNDNUT, 10.0), OPERATOR)
        .expect("机台应已空闲");
}

// ==========================================
// 过滤
// ==========================================

#[test]
fn test_filtering_defaults_to_first_location_and_balances() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let entry = env
        .production_api
        .start_filtering(
            &StartFilteringRequest {
                raw_material_id: SEED_GROUNDNUT.to_string(),
                input_qty_kg: 38.5,
                location_id: Some("  ".to_string()),
            },
            OPERATOR,
        )
        .expect("开始过滤失败");
    assert_eq!(entry.location_id.as_deref(), Some(LOC_MILL));

    let running = env.production_api.list_running_filters().unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].seed_name, "Groundnut");

    let err = env
        .production_api
        .stop_filtering(&entry.id, 40.0, OPERATOR)
        .expect_err("过滤油超过投入应失败");
    assert!(matches!(err, ApiError::OutputExceedsInput { .. }));

    let stopped = env
        .production_api
        .stop_filtering(&entry.id, 38.5, OPERATOR)
        .expect("等于投入应允许");
    assert_eq!(stopped.filtered_oil_kg, Some(38.5));
    assert_eq!(stopped.stopped_by.as_deref(), Some(OPERATOR));
    assert!(env.production_api.list_running_filters().unwrap().is_empty());

    match env.production_api.stop_filtering(&entry.id, 1.0, OPERATOR) {
        Err(ApiError::InvalidStateTransition { from, to }) => {
            assert_eq!(from, "stopped");
            assert_eq!(to, "stopped");
        }
        other => panic!("预期InvalidStateTransition，但得到: {:?}", other),
    }
    assert_eq!(env.count_logs("StartFiltering"), 1);
    assert_eq!(env.count_logs("StopFiltering"), 1);
}

#[test]
fn test_filtering_keeps_explicit_location() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let entry = env
        .production_api
        .start_filtering(
            &StartFilteringRequest {
                raw_material_id: SEED_SESAME.to_string(),
                input_qty_kg: 12.0,
                location_id: Some(LOC_STORE.to_string()),
            },
            OPERATOR,
        )
        .unwrap();
    assert_eq!(entry.location_id.as_deref(), Some(LOC_STORE));

    let (field, _) = assert_form_error(env.production_api.start_filtering(
        &StartFilteringRequest {
            raw_material_id: SEED_SESAME.to_string(),
            input_qty_kg: -3.0,
            location_id: None,
        },
        OPERATOR,
    ));
    assert_eq!(field, "input_qty_kg");
}

// ==========================================
// 灌装
// ==========================================

#[test]
fn test_record_bottling_checks_sku_product() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let entry = env
        .production_api
        .record_bottling(
            &RecordBottlingRequest {
                product_id: PRODUCT_GROUNDNUT.to_string(),
                sku_id: SKU_GROUNDNUT_500.to_string(),
                bottles_filled: 60,
                location_id: Some(LOC_MILL.to_string()),
            },
            OPERATOR,
        )
        .expect("灌装登记失败");
    assert_eq!(entry.bottles_filled, 60);
    assert_eq!(env.production_api.get_bottling(&entry.id).unwrap(), entry);
    assert_not_found(env.production_api.get_bottling("b-missing"));

    let mismatch = env.production_api.record_bottling(
        &RecordBottlingRequest {
            product_id: PRODUCT_GROUNDNUT.to_string(),
            sku_id: SKU_SESAME_500.to_string(),
            bottles_filled: 10,
            location_id: None,
        },
        OPERATOR,
    );
    assert!(matches!(mismatch, Err(ApiError::BusinessRuleViolation(_))));

    let (field, _) = assert_form_error(env.production_api.record_bottling(
        &RecordBottlingRequest {
            product_id: PRODUCT_GROUNDNUT.to_string(),
            sku_id: SKU_GROUNDNUT_1L.to_string(),
            bottles_filled: 0,
            location_id: None,
        },
        OPERATOR,
    ));
    assert_eq!(field, "bottles_filled");

    assert_eq!(env.count_logs("RecordBottling"), 1);
}

#[test]
fn test_overview_reports_idle_presses() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let overview = env.production_api.overview().unwrap();
    assert!(overview.running_batches.is_empty());
    assert!(overview.running_filters.is_empty());
    assert_eq!(overview.idle_machine_count, 2, "过滤机不计入压榨机台");

    let presses = env.production_api.list_press_machines().unwrap();
    let codes: Vec<&str> = presses.iter().map(|m| m.machine_code.as_str()).collect();
    assert_eq!(codes, vec!["P1", "P2"]);
}
