//! 数据模型
//!
//! POS 核心实体：桌台、菜单、订单、账单。
//! 所有时间戳为 UTC 毫秒；JSON 字段名统一 camelCase（与前端约定一致）。

pub mod bill;
pub mod dining_table;
pub mod menu_item;
pub mod order;

pub use bill::{Bill, BillPreview, BillWithOrders, CheckoutSummary, PaymentMethod};
pub use dining_table::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatus};
pub use menu_item::{MenuItem, MenuItemCreate, MenuItemUpdate};
pub use order::{
    Order, OrderCreate, OrderItem, OrderItemCreate, OrderStatus, OrderUpdate, OrderWithItems,
};
