//! Order Model
//!
//! 订单 + 订单行。行价格是下单时刻的菜单价快照，
//! 总额在创建时计算一次，此后不再变化。

use serde::{Deserialize, Serialize};

/// Order status enum
///
/// 状态机只允许向前推进（new → preparing → ready → served），
/// 取消可以从任何非终态发起；`served` / `cancelled` 是终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    New,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    /// 终态：不再接受任何变更
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Served | Self::Cancelled)
    }

    /// Allowed-transition table. Same-status is an accepted no-op,
    /// except on terminal states (served/cancelled orders are immutable).
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self == next {
            return !self.is_terminal();
        }
        match self {
            Self::New => matches!(
                next,
                Self::Preparing | Self::Ready | Self::Served | Self::Cancelled
            ),
            Self::Preparing => matches!(next, Self::Ready | Self::Served | Self::Cancelled),
            Self::Ready => matches!(next, Self::Served | Self::Cancelled),
            Self::Served | Self::Cancelled => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Preparing => write!(f, "preparing"),
            Self::Ready => write!(f, "ready"),
            Self::Served => write!(f, "served"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub table_id: i64,
    /// Σ(item.price × item.quantity)，创建时用 Decimal 计算，落库为 f64
    pub total_amount: f64,
    pub status: OrderStatus,
    pub order_time: i64,
    pub customer_name: Option<String>,
    pub note: Option<String>,
}

/// Order line item — price and name are creation-time snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub note: Option<String>,
}

/// Order with resolved line items (API response shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Create order payload (one customer cart submission)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub table_id: i64,
    pub items: Vec<OrderItemCreate>,
    pub customer_name: Option<String>,
    pub note: Option<String>,
}

/// Cart line in a create-order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemCreate {
    pub menu_item_id: i64,
    pub quantity: i32,
    pub note: Option<String>,
}

/// Update order payload (status and/or note, at least one required)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub note: Option<String>,
}
