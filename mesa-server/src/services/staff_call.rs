//! Staff-Call Coordinator
//!
//! 顾客点“买单”时的只读预览：算出此刻结账会覆盖哪些订单、
//! 金额多少，广播给员工看板，但绝不落库。候选集排除该桌
//! 历史上出现在任何账单里的订单（全量排除，不限当前窗口）。

use std::sync::Arc;

use sqlx::SqlitePool;

use shared::models::BillPreview;
use shared::util;
use shared::{DomainEvent, Topic};

use crate::db::repository::{bill, dining_table, order};
use crate::money;
use crate::notify::EventSink;
use crate::utils::{AppError, AppResult};

pub struct StaffCall {
    pool: SqlitePool,
    events: Arc<dyn EventSink>,
}

impl StaffCall {
    pub fn new(pool: SqlitePool, events: Arc<dyn EventSink>) -> Self {
        Self { pool, events }
    }

    /// 呼叫买单：广播预览，不创建账单，不改任何状态。
    pub async fn call_for_bill(&self, table_id: i64) -> AppResult<BillPreview> {
        let table = dining_table::find_by_id(&self.pool, table_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Table {table_id} not found")))?;

        let open_orders = order::find_open_by_table(&self.pool, table_id).await?;
        let billed = bill::billed_order_ids(&self.pool, table_id).await?;

        let candidates: Vec<_> = open_orders
            .into_iter()
            .filter(|o| !billed.contains(&o.id))
            .collect();
        if candidates.is_empty() {
            return Err(AppError::not_found(format!(
                "Nothing to bill for table {}",
                table.number
            )));
        }

        let preview = BillPreview {
            table_id,
            table_number: table.number,
            order_count: candidates.len() as u32,
            total_amount: money::sum(candidates.iter().map(|o| o.total_amount)),
            order_ids: candidates.iter().map(|o| o.id).collect(),
        };

        let timestamp = util::now_rfc3339();
        self.events.publish(
            Topic::Dashboard,
            DomainEvent::CallStaffForBill {
                table_id,
                table_number: preview.table_number,
                order_count: preview.order_count,
                total_amount: preview.total_amount,
                order_ids: preview.order_ids.clone(),
                timestamp: timestamp.clone(),
            },
        );
        self.events.publish(
            Topic::Table(table_id),
            DomainEvent::StaffCalled {
                table_id,
                order_count: preview.order_count,
                total_amount: preview.total_amount,
                timestamp,
            },
        );

        Ok(preview)
    }
}
