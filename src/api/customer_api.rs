// ==========================================
// Just Pressed 运营管理系统 - 客户管理 API
// ==========================================
// 职责: 客户新建/编辑/查看/列表/软删除，客户标签
// 红线: 非删除客户中手机号唯一（重复需调用方确认后重新提交）
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_customer_draft;
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::customer::{Customer, CustomerDraft, CustomerPage, CustomerTag, MatchType};
use crate::i18n::t;
use crate::repository::customer_repo::{CustomerRepository, PhoneGuard};
use crate::repository::customer_tag_repo::CustomerTagRepository;

/// 客户详情（含已解析标签）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(flatten)]
    pub customer: Customer,
    pub tag_details: Vec<CustomerTag>,
}

// ==========================================
// CustomerApi - 客户管理 API
// ==========================================

/// 客户管理API
///
/// 职责：
/// 1. 表单清洗与校验（姓名必填、手机号 10 位、邮编 6 位）
/// 2. 手机号查重（与写入同一事务）
/// 3. 列表分页与搜索（手机号/姓名子串）
/// 4. 标签创建（颜色轮换）与查询
/// 5. ActionLog记录
pub struct CustomerApi {
    customer_repo: Arc<CustomerRepository>,
    tag_repo: Arc<CustomerTagRepository>,
    config: Arc<ConfigManager>,
}

impl CustomerApi {
    pub fn new(
        customer_repo: Arc<CustomerRepository>,
        tag_repo: Arc<CustomerTagRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            customer_repo,
            tag_repo,
            config,
        }
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 新建客户
    ///
    /// # 参数
    /// - draft: 表单数据（本方法内清洗）
    /// - actor: 操作人 user_id
    /// - allow_duplicate_phone: 用户已确认重复手机号时为 true
    ///
    /// # 返回
    /// - Ok(Customer): 已保存的客户
    /// - Err(ApiError::DuplicatePhone): 手机号已被占用，未保存
    /// - Err(ApiError::FormValidationError): 表单校验失败
    pub fn create_customer(
        &self,
        draft: CustomerDraft,
        actor: &str,
        allow_duplicate_phone: bool,
    ) -> ApiResult<Customer> {
        let draft = draft.normalized();
        validate_customer_draft(&draft)?;

        let now = Utc::now().naive_utc();
        let country_code = match draft.country_code.clone() {
            Some(code) => code,
            None => self
                .config
                .get_default_country_code()
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        };

        let customer = Customer {
            customer_id: uuid::Uuid::new_v4().to_string(),
            customer_name: draft.customer_name,
            country_code,
            phone: draft.phone,
            pincode: draft.pincode,
            address_line1: draft.address_line1,
            address_line2: draft.address_line2,
            lat_long: draft.lat_long,
            google_maps_code: draft.google_maps_code,
            landmark: draft.landmark,
            city: draft.city,
            state: draft.state,
            tags: draft.tags,
            notes: draft.notes,
            is_active: true,
            is_deleted: false,
            created_by: Some(actor.to_string()),
            created_at: now,
            updated_at: now,
        };

        let log = ActionLog::new(
            ActionType::CreateCustomer,
            actor,
            "customer",
            &customer.customer_id,
        )
        .with_payload(&serde_json::json!({
            "customer_name": customer.customer_name,
            "phone": customer.phone,
            "duplicate_phone_confirmed": allow_duplicate_phone,
        }));

        if let PhoneGuard::Duplicate(existing) =
            self.customer_repo
                .insert_guarded(&customer, allow_duplicate_phone, &log)?
        {
            tracing::warn!(
                phone = ?customer.phone,
                existing_id = %existing.customer_id,
                "新建客户: 手机号重复，等待确认"
            );
            return Err(ApiError::DuplicatePhone {
                phone: customer.phone.clone().unwrap_or_default(),
                existing: Box::new(existing),
            });
        }

        tracing::info!(customer_id = %customer.customer_id, "客户已创建");
        Ok(customer)
    }

    /// 编辑客户（查重排除自身）
    pub fn update_customer(
        &self,
        customer_id: &str,
        draft: CustomerDraft,
        actor: &str,
        allow_duplicate_phone: bool,
    ) -> ApiResult<Customer> {
        let current = self.get_customer(customer_id)?;
        let draft = draft.normalized();
        validate_customer_draft(&draft)?;

        let updated = Customer {
            customer_name: draft.customer_name,
            country_code: draft.country_code.unwrap_or(current.country_code.clone()),
            phone: draft.phone,
            pincode: draft.pincode,
            address_line1: draft.address_line1,
            address_line2: draft.address_line2,
            lat_long: draft.lat_long,
            google_maps_code: draft.google_maps_code,
            landmark: draft.landmark,
            city: draft.city,
            state: draft.state,
            tags: draft.tags,
            notes: draft.notes,
            updated_at: Utc::now().naive_utc(),
            ..current
        };

        let log = ActionLog::new(ActionType::UpdateCustomer, actor, "customer", customer_id)
            .with_payload(&serde_json::json!({
                "customer_name": updated.customer_name,
                "phone": updated.phone,
                "duplicate_phone_confirmed": allow_duplicate_phone,
            }));

        if let PhoneGuard::Duplicate(existing) =
            self.customer_repo
                .update_guarded(&updated, allow_duplicate_phone, &log)?
        {
            tracing::warn!(
                customer_id = %customer_id,
                existing_id = %existing.customer_id,
                "编辑客户: 手机号重复，等待确认"
            );
            return Err(ApiError::DuplicatePhone {
                phone: updated.phone.clone().unwrap_or_default(),
                existing: Box::new(existing),
            });
        }

        tracing::info!(customer_id = %customer_id, "客户已更新");
        Ok(updated)
    }

    /// 软删除客户
    pub fn delete_customer(&self, customer_id: &str, actor: &str) -> ApiResult<()> {
        if customer_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("customer_id 不能为空".to_string()));
        }

        let log = ActionLog::new(ActionType::DeleteCustomer, actor, "customer", customer_id)
            .with_detail("soft delete");
        self.customer_repo
            .soft_delete(customer_id, &Utc::now().naive_utc(), &log)?;

        tracing::info!(customer_id = %customer_id, "客户已软删除");
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查看客户（已删除视为不存在）
    pub fn get_customer(&self, customer_id: &str) -> ApiResult<Customer> {
        self.customer_repo
            .find_by_id(customer_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Customer(id={})不存在", customer_id)))
    }

    /// 查看客户及其激活标签
    pub fn get_customer_info(&self, customer_id: &str) -> ApiResult<CustomerInfo> {
        let customer = self.get_customer(customer_id)?;
        let tag_details = self.tag_repo.find_active_by_ids(&customer.tags)?;
        Ok(CustomerInfo {
            customer,
            tag_details,
        })
    }

    /// 客户列表（第 page 页，从 1 开始）
    ///
    /// 有搜索词时，根据第一条结果判断命中方式（手机号优先）
    pub fn list_customers(&self, search: Option<&str>, page: i64) -> ApiResult<CustomerPage> {
        let page = page.max(1);
        let page_size = self
            .config
            .get_customer_page_size()
            .map_err(|e| ApiError::InternalError(e.to_string()))?
            .max(1);
        let term = search.map(str::trim).filter(|s| !s.is_empty());
        let offset = (page - 1).checked_mul(page_size).ok_or_else(|| {
            ApiError::InvalidInput(format!("page 超出范围: {}", page))
        })?;

        let (customers, has_more) = self.customer_repo.list_page(term, offset, page_size)?;

        let match_type = term.and_then(|term| {
            let needle = term.to_lowercase();
            customers.first().and_then(|first| {
                if first
                    .phone
                    .as_deref()
                    .map_or(false, |p| p.to_lowercase().contains(&needle))
                {
                    Some(MatchType::Phone)
                } else if first.customer_name.to_lowercase().contains(&needle) {
                    Some(MatchType::Name)
                } else {
                    None
                }
            })
        });

        Ok(CustomerPage {
            customers,
            page,
            page_size,
            has_more,
            match_type,
        })
    }

    // ==========================================
    // 标签
    // ==========================================

    /// 新建标签（名称忽略大小写唯一，颜色轮换）
    pub fn create_tag(&self, tag_name: &str, actor: &str) -> ApiResult<CustomerTag> {
        let name = tag_name.trim();
        if name.is_empty() {
            return Err(ApiError::field("tag_name", t("validation.tag_name_required")));
        }

        let tag_id = uuid::Uuid::new_v4().to_string();
        let log = ActionLog::new(ActionType::CreateTag, actor, "customer_tag", &tag_id);
        let tag = self
            .tag_repo
            .create_with_rotation(&tag_id, name, &Utc::now().naive_utc(), log)?
            .ok_or_else(|| ApiError::DuplicateTag(t("validation.tag_exists")))?;

        tracing::info!(tag_id = %tag.tag_id, tag_name = %tag.tag_name, "客户标签已创建");
        Ok(tag)
    }

    pub fn list_tags(&self) -> ApiResult<Vec<CustomerTag>> {
        Ok(self.tag_repo.list_active()?)
    }

    /// 按 ID 批量查询激活标签（列表页展示用）
    pub fn lookup_tags(&self, tag_ids: &[String]) -> ApiResult<Vec<CustomerTag>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.tag_repo.find_active_by_ids(tag_ids)?)
    }
}
