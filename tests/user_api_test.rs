// ==========================================
// UserApi 集成测试
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use just_pressed_ops::api::ApiError;

fn assert_not_authenticated<T: std::fmt::Debug>(result: Result<T, ApiError>) {
    match result {
        Err(ApiError::NotAuthenticated(msg)) => assert!(!msg.is_empty()),
        other => panic!("预期NotAuthenticated，但得到: {:?}", other),
    }
}

#[test]
fn test_current_user_requires_known_active_user() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    assert_not_authenticated(env.user_api.current_user(None));
    assert_not_authenticated(env.user_api.current_user(Some("   ")));
    assert_not_authenticated(env.user_api.current_user(Some("u-nobody")));
    assert_not_authenticated(env.user_api.current_user(Some(INACTIVE_USER)));

    let user = env.user_api.current_user(Some(OPERATOR)).unwrap();
    assert_eq!(user.full_name, "Ravi K");
}

#[test]
fn test_modules_follow_display_order_and_view_grant() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let modules = env.user_api.get_user_modules(Some(OPERATOR)).unwrap();
    let keys: Vec<&str> = modules.iter().map(|m| m.module_key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["production_tracking", "stock_movement", "dispatch", "customers", "returns"]
    );
    assert!(modules.iter().all(|m| m.can_view && m.can_write && !m.can_edit));

    // can_view = false 的授权不可见
    let viewer = env.user_api.get_user_modules(Some(VIEWER)).unwrap();
    assert_eq!(viewer.len(), 1);
    assert_eq!(viewer[0].module_key, "customers");
    assert!(!viewer[0].can_write);

    assert_not_authenticated(env.user_api.get_user_modules(Some(INACTIVE_USER)));
}

#[test]
fn test_home_splits_live_and_upcoming() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let home = env.user_api.get_user_home(Some(OPERATOR)).unwrap();
    assert_eq!(home.user.user_id, OPERATOR);

    let live: Vec<&str> = home.live_modules.iter().map(|m| m.module_key.as_str()).collect();
    let upcoming: Vec<&str> = home
        .upcoming_modules
        .iter()
        .map(|m| m.module_key.as_str())
        .collect();
    assert_eq!(live, vec!["production_tracking", "stock_movement", "dispatch"]);
    assert_eq!(upcoming, vec!["customers", "returns"]);
    assert_eq!(home.live_modules[0].route_path(), "/production-tracking");

    let viewer_home = env.user_api.get_user_home(Some(VIEWER)).unwrap();
    assert!(viewer_home.live_modules.is_empty());
    assert_eq!(viewer_home.upcoming_modules.len(), 1);
}
