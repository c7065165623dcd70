// ==========================================
// Just Pressed 运营管理系统 - 用户模块权限 API
// ==========================================
// 登录/会话不在本系统内；调用方传入已认证的 user_id
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::user::{partition_live, User, UserModule};
use crate::i18n::t;
use crate::repository::user_repo::UserRepository;

/// 首页模块入口
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserHome {
    pub user: User,
    pub live_modules: Vec<UserModule>,
    pub upcoming_modules: Vec<UserModule>,
}

pub struct UserApi {
    user_repo: Arc<UserRepository>,
}

impl UserApi {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    /// 当前用户（缺失或未知 ⇒ NotAuthenticated）
    pub fn current_user(&self, user_id: Option<&str>) -> ApiResult<User> {
        let user_id = user_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::NotAuthenticated(t("auth.not_authenticated")))?;

        match self.user_repo.find_user(user_id)? {
            Some(user) if user.is_active => Ok(user),
            _ => {
                tracing::warn!(user_id, "未知或已停用用户");
                Err(ApiError::NotAuthenticated(t("auth.not_authenticated")))
            }
        }
    }

    /// 用户可见模块（按 display_order）
    pub fn get_user_modules(&self, user_id: Option<&str>) -> ApiResult<Vec<UserModule>> {
        let user = self.current_user(user_id)?;
        Ok(self.user_repo.list_viewable_modules(&user.user_id)?)
    }

    /// 首页: 已上线 / 即将上线模块
    pub fn get_user_home(&self, user_id: Option<&str>) -> ApiResult<UserHome> {
        let user = self.current_user(user_id)?;
        let modules = self.user_repo.list_viewable_modules(&user.user_id)?;
        let (live_modules, upcoming_modules) = partition_live(modules);
        Ok(UserHome {
            user,
            live_modules,
            upcoming_modules,
        })
    }
}
