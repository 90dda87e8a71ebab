use mesa_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载配置、准备工作目录和日志
    let config = Config::from_env();
    config.ensure_work_dir_structure()?;
    setup_environment(&config);

    print_banner();
    tracing::info!("Mesa server starting...");

    // 2. 初始化服务器状态 (数据库 + 事件总线)
    let state = ServerState::initialize(&config).await?;

    // 3. 启动 HTTP 服务器
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
