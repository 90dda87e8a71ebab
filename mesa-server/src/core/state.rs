use std::sync::Arc;

use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::notify::{EventBus, EventSink};
use crate::services::{CheckoutEngine, OrderLifecycle, StaffCall};

/// 服务器状态 - 持有配置、连接池和事件总线的共享引用
///
/// Clone 是浅拷贝（池和总线内部都是 Arc），每个请求处理器
/// 拿到的都是同一份底层状态。
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// 事件总线
    pub events: Arc<EventBus>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 确保工作目录结构存在
    /// 2. 打开数据库并跑迁移 (work_dir/database/mesa.db)
    /// 3. 创建事件总线
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.db_path();
        let db = DbService::new(&db_path.to_string_lossy()).await?;
        let events = Arc::new(EventBus::with_capacity(config.event_channel_capacity));

        Ok(Self {
            config: config.clone(),
            pool: db.pool,
            events,
        })
    }

    /// 测试用：给定池和总线直接构造
    pub fn with_parts(config: Config, pool: SqlitePool, events: Arc<EventBus>) -> Self {
        Self {
            config,
            pool,
            events,
        }
    }

    /// 引擎依赖的事件出口
    pub fn sink(&self) -> Arc<dyn EventSink> {
        self.events.clone()
    }

    pub fn order_lifecycle(&self) -> OrderLifecycle {
        OrderLifecycle::new(self.pool.clone(), self.sink())
    }

    pub fn checkout_engine(&self) -> CheckoutEngine {
        CheckoutEngine::new(self.pool.clone(), self.sink())
    }

    pub fn staff_call(&self) -> StaffCall {
        StaffCall::new(self.pool.clone(), self.sink())
    }
}
