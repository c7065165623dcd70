// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use just_pressed_ops::api::{
    CreateReturnRequest, ReturnLineInput, SendTransferRequest, TransferLineInput,
};
use just_pressed_ops::domain::customer::CustomerDraft;
use just_pressed_ops::domain::types::{ReturnAction, ReturnCondition, TransferReason};

// ==========================================
// CustomerDraft 构建器
// ==========================================

pub struct CustomerBuilder {
    draft: CustomerDraft,
}

impl CustomerBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            draft: CustomerDraft {
                customer_name: name.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn phone(mut self, phone: &str) -> Self {
        self.draft.phone = Some(phone.to_string());
        self
    }

    pub fn pincode(mut self, pincode: &str) -> Self {
        self.draft.pincode = Some(pincode.to_string());
        self
    }

    pub fn city(mut self, city: &str) -> Self {
        self.draft.city = Some(city.to_string());
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.draft.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn build(self) -> CustomerDraft {
        self.draft
    }
}

// ==========================================
// 调拨请求构建器
// ==========================================

pub struct TransferBuilder {
    from: String,
    to: String,
    lines: Vec<TransferLineInput>,
}

impl TransferBuilder {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, sku_id: &str, qty: i64) -> Self {
        self.lines.push(TransferLineInput {
            sku_id: sku_id.to_string(),
            qty_sent: qty,
            reason: TransferReason::FreshStock,
        });
        self
    }

    pub fn line_with_reason(mut self, sku_id: &str, qty: i64, reason: TransferReason) -> Self {
        self.lines.push(TransferLineInput {
            sku_id: sku_id.to_string(),
            qty_sent: qty,
            reason,
        });
        self
    }

    pub fn build(self) -> SendTransferRequest {
        SendTransferRequest {
            from_location_id: self.from,
            to_location_id: self.to,
            notes: None,
            lines: self.lines,
        }
    }
}

// ==========================================
// 退货请求构建器
// ==========================================

pub struct ReturnBuilder {
    req: CreateReturnRequest,
}

impl ReturnBuilder {
    pub fn new(location_id: &str) -> Self {
        Self {
            req: CreateReturnRequest {
                received_location_id: location_id.to_string(),
                order_id: None,
                awb_number: None,
                remarks: None,
                photos: Vec::new(),
                videos: Vec::new(),
                lines: Vec::new(),
            },
        }
    }

    pub fn order(mut self, order_id: &str, awb: &str) -> Self {
        self.req.order_id = Some(order_id.to_string());
        self.req.awb_number = Some(awb.to_string());
        self
    }

    pub fn line(
        mut self,
        sku_id: &str,
        qty: i64,
        condition: ReturnCondition,
        action: ReturnAction,
    ) -> Self {
        self.req.lines.push(ReturnLineInput {
            sku_id: sku_id.to_string(),
            quantity: qty,
            physical_condition: condition,
            action_taken: action,
        });
        self
    }

    pub fn photo(mut self, url: &str) -> Self {
        self.req.photos.push(url.to_string());
        self
    }

    pub fn build(self) -> CreateReturnRequest {
        self.req
    }
}
