//! In-process event bus
//!
//! 单个 broadcast 通道承载所有主题；订阅方（SSE 端点）按
//! [`Topic`] 过滤。每个主题维护独立的递增序号，客户端可据此
//! 判断是否漏收。

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use shared::{DomainEvent, Topic};

use super::EventSink;

/// 默认通道容量
const DEFAULT_CAPACITY: usize = 1024;

/// A published event with its addressing and per-topic sequence number
#[derive(Debug, Clone, Serialize)]
pub struct BusEvent {
    pub topic: Topic,
    pub seq: u64,
    #[serde(flatten)]
    pub event: DomainEvent,
}

/// 事件总线
///
/// Clone 共享同一底层通道（Arc 浅拷贝）。
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
    /// Per-topic sequence counters, lock-free
    seqs: Arc<DashMap<String, u64>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            seqs: Arc::new(DashMap::new()),
        }
    }

    /// 订阅全部事件（订阅方自行按 topic 过滤）
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn next_seq(&self, topic: &Topic) -> u64 {
        let mut entry = self.seqs.entry(topic.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBus {
    fn publish(&self, topic: Topic, event: DomainEvent) {
        let seq = self.next_seq(&topic);
        let name = event.name();
        let bus_event = BusEvent { topic, seq, event };
        match self.tx.send(bus_event) {
            Ok(receivers) => {
                tracing::debug!(topic = %topic, event = name, seq, receivers, "Event published");
            }
            // broadcast::send fails only when nobody is subscribed —
            // normal during startup and in tests, never an error
            Err(_) => {
                tracing::debug!(topic = %topic, event = name, seq, "Event dropped (no subscribers)");
            }
        }
    }
}
