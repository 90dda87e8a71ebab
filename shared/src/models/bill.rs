//! Bill Model
//!
//! 一张账单对应一张桌的一个占用窗口（两次 `last_cleared_at` 之间）。
//! 同一窗口内重复结账会就地更新账单，不会产生重复账单。

use serde::{Deserialize, Serialize};

use super::{DiningTable, Order};

/// 支付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PaymentMethod {
    Cash,
    Qrcode,
    Transfer,
    CreditCard,
}

impl PaymentMethod {
    /// Methods accepted at the checkout endpoint (others are card-terminal
    /// flows recorded by back office, not self-service checkout)
    pub fn is_checkout_method(self) -> bool {
        matches!(self, Self::Cash | Self::Qrcode)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Qrcode => write!(f, "qrcode"),
            Self::Transfer => write!(f, "transfer"),
            Self::CreditCard => write!(f, "credit_card"),
        }
    }
}

/// Bill entity
///
/// `order_ids` 为反规范化的订单 ID 列表（存储为 JSON），
/// “每个订单恰好属于一张账单”由结账事务保证，而非外键。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: i64,
    pub table_id: i64,
    pub total_amount: f64,
    pub order_ids: Vec<i64>,
    pub payment_method: PaymentMethod,
    pub payment_time: i64,
    pub created_at: i64,
}

/// Bill with its covered orders resolved (receipt view)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillWithOrders {
    #[serde(flatten)]
    pub bill: Bill,
    pub orders: Vec<Order>,
}

/// Checkout result: the bill, the closed-out table, billed-order count
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub bill: Bill,
    pub table: DiningTable,
    pub orders_billed: u32,
}

/// Staff-call preview — what a checkout *would* bill right now.
/// Read-only computation; never creates a bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillPreview {
    pub table_id: i64,
    pub table_number: i32,
    pub order_count: u32,
    pub total_amount: f64,
    pub order_ids: Vec<i64>,
}
