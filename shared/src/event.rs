//! 领域事件
//!
//! 引擎在状态落库之后向两类受众广播事件：
//!
//! - `Topic::Dashboard` — 全体员工控制台
//! - `Topic::Table(id)` — 仅该桌的点餐会话
//!
//! 主题是带标签的枚举而非自由拼接的字符串，避免主题碰撞。
//! 每个事件载荷至少包含相关实体 ID 和 RFC 3339 时间戳。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{OrderStatus, TableStatus};

/// 事件投递地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Topic {
    /// 员工看板（所有工作台）
    Dashboard,
    /// 单桌频道，仅到达该桌的点餐页面
    Table(i64),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dashboard => write!(f, "dashboard"),
            Self::Table(id) => write!(f, "table-{id}"),
        }
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "dashboard" {
            return Ok(Self::Dashboard);
        }
        if let Some(id) = s.strip_prefix("table-") {
            return id
                .parse()
                .map(Self::Table)
                .map_err(|_| format!("Invalid table topic: {s}"));
        }
        Err(format!("Unknown topic: {s}"))
    }
}

/// 领域事件（序列化后 `event` 字段为事件名）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum DomainEvent {
    /// 新订单已创建（dashboard）
    #[serde(rename_all = "camelCase")]
    NewOrder {
        order_id: i64,
        table_id: i64,
        total_amount: f64,
        timestamp: String,
    },

    /// 订单状态变更（dashboard）
    #[serde(rename_all = "camelCase")]
    OrderStatusChanged {
        order_id: i64,
        table_id: i64,
        status: OrderStatus,
        timestamp: String,
    },

    /// 订单状态变更（下单桌位自己的频道）
    #[serde(rename_all = "camelCase")]
    OrderStatusUpdated {
        order_id: i64,
        table_id: i64,
        status: OrderStatus,
        timestamp: String,
    },

    /// 桌台状态变更（dashboard）
    #[serde(rename_all = "camelCase")]
    TableStatusChanged {
        table_id: i64,
        status: TableStatus,
        timestamp: String,
    },

    /// 顾客呼叫买单（dashboard）
    #[serde(rename_all = "camelCase")]
    CallStaffForBill {
        table_id: i64,
        table_number: i32,
        order_count: u32,
        total_amount: f64,
        order_ids: Vec<i64>,
        timestamp: String,
    },

    /// 呼叫确认（下单桌位频道）
    #[serde(rename_all = "camelCase")]
    StaffCalled {
        table_id: i64,
        order_count: u32,
        total_amount: f64,
        timestamp: String,
    },

    /// 账单已生成（下单桌位频道，用于跳转小票页）
    #[serde(rename_all = "camelCase")]
    BillCreated {
        bill_id: i64,
        table_id: i64,
        total_amount: f64,
        timestamp: String,
    },

    /// 结账汇总（dashboard）
    #[serde(rename_all = "camelCase")]
    TableCheckedOut {
        table_id: i64,
        bill_id: i64,
        total_amount: f64,
        orders_billed: u32,
        timestamp: String,
    },
}

impl DomainEvent {
    /// 事件名（与序列化后的 `event` 字段一致）
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewOrder { .. } => "newOrder",
            Self::OrderStatusChanged { .. } => "orderStatusChanged",
            Self::OrderStatusUpdated { .. } => "orderStatusUpdated",
            Self::TableStatusChanged { .. } => "tableStatusChanged",
            Self::CallStaffForBill { .. } => "callStaffForBill",
            Self::StaffCalled { .. } => "staffCalled",
            Self::BillCreated { .. } => "billCreated",
            Self::TableCheckedOut { .. } => "tableCheckedOut",
        }
    }
}
