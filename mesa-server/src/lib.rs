//! Mesa Server - 桌台计费餐厅服务端
//!
//! # 架构概述
//!
//! 围绕“占用窗口”组织的餐厅 POS 服务端：顾客扫码下单，订单按
//! 桌台聚合，结账把一个窗口内的订单收成一张账单并推进窗口边界。
//!
//! - **订单引擎** (`services/order_lifecycle`): 创建、状态机推进、撤单
//! - **结账引擎** (`services/checkout`): 窗口聚合、账单、翻台
//! - **呼叫协调** (`services/staff_call`): 只读买单预览 + 广播
//! - **事件广播** (`notify`): broadcast 总线 + SSE 投递
//! - **HTTP API** (`api`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! mesa-server/src/
//! ├── core/          # 配置、状态、服务器生命周期
//! ├── services/      # 三个业务引擎
//! ├── api/           # HTTP 路由和处理器
//! ├── notify/        # 事件总线
//! ├── db/            # 连接池、迁移、repository
//! └── utils/         # 错误类型、日志
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod money;
pub mod notify;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use notify::{EventBus, EventSink, NoopSink};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment(config: &Config) {
    let _ = dotenv::dotenv();
    let log_dir = config.log_dir();
    init_logger_with_file(None, log_dir.to_str());
}

pub fn print_banner() {
    println!(
        r#"
    __  ___
   /  |/  /__  _________ _
  / /|_/ / _ \/ ___/ __ `/
 / /  / /  __(__  ) /_/ /
/_/  /_/\___/____/\__,_/
    "#
    );
}
