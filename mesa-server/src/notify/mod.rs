//! 事件广播
//!
//! 引擎在事务提交之后通过 [`EventSink`] 发布领域事件；投递是
//! best-effort（至多一次），发布失败只记日志，绝不影响已提交的
//! 状态变更。
//!
//! ```text
//! OrderLifecycle / CheckoutEngine / StaffCall
//!        │ publish(Topic, DomainEvent)
//!        ▼
//!    EventSink (trait)
//!        ├── EventBus  — broadcast 通道，SSE 端点订阅
//!        └── NoopSink  — 测试用空实现
//! ```

mod bus;

pub use bus::{BusEvent, EventBus};

use shared::{DomainEvent, Topic};

/// Publish-only interface the engines depend on.
///
/// 实现方必须自行吞掉投递失败（记日志），publish 永不返回错误 ——
/// 触发它的事务早已提交。
pub trait EventSink: Send + Sync {
    fn publish(&self, topic: Topic, event: DomainEvent);
}

/// No-op sink for tests and offline tooling
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn publish(&self, _topic: Topic, _event: DomainEvent) {}
}
