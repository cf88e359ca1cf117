pub mod commands;
pub mod infrastructure;
pub mod modules;
pub mod shared;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use infrastructure::{AppState, EventBus};
use modules::chat::application::spawn_consumer;
use modules::chat::{
    BusRequestPublisher, BusResponseSubscriber, LoopbackResponder, RelayDispatcher,
    ResponseSubscriber,
};
use modules::config::AppConfig;
use modules::{ChatModule, ConfigModule, ConnectionHandler, ConnectionRegistry};
use shared::{AppError, AppResult};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// `start()` 返回的句柄，持有所有后台任务
pub struct ServerHandle {
    pub port: u16,
    bus: Arc<EventBus>,
    state: AppState,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<()>,
    consumer: JoinHandle<()>,
    loopback: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// 事件总线，外部流水线（或测试）通过它收发记录
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// 停止服务：关闭总线、停止 HTTP 服务并等待中继排空
    pub async fn shutdown(self) {
        tracing::info!("Chat relay shutting down...");

        self.bus.close().await;
        let _ = self.shutdown_tx.send(());

        if tokio::time::timeout(SHUTDOWN_GRACE, self.server).await.is_err() {
            tracing::warn!("HTTP server did not stop within {:?}", SHUTDOWN_GRACE);
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, self.consumer).await.is_err() {
            tracing::warn!("Relay consumer did not stop within {:?}", SHUTDOWN_GRACE);
        }
        if let Some(loopback) = self.loopback {
            let _ = loopback.await;
        }

        tracing::info!("Chat relay stopped");
    }
}

/// 构造所有组件并启动服务
pub async fn start(config: AppConfig) -> AppResult<ServerHandle> {
    config
        .validate()
        .map_err(|errors| modules::config::ConfigError::ValidationError { errors })?;

    let bus = Arc::new(EventBus::new(
        config.bus.channel_capacity,
        Duration::from_millis(config.bus.publish_timeout_ms),
    ));

    // 先订阅响应主题，之后发布的记录都不会丢失
    let responses = BusResponseSubscriber::new(bus.clone(), config.bus.response_topic.clone())
        .subscribe_responses()
        .await
        .map_err(|e| AppError::TransportUnavailable(e.to_string()))?;

    let publisher = Arc::new(BusRequestPublisher::new(
        bus.clone(),
        config.bus.request_topic.clone(),
    ));
    let chat_module = Arc::new(ChatModule::new(publisher));
    let connection_registry = Arc::new(ConnectionRegistry::new());

    // 中继：后台消费 -> 分片 worker -> 连接发送队列
    let relay = Arc::new(chat_module.streaming_relay(connection_registry.clone()));
    let dispatcher = RelayDispatcher::spawn(
        relay,
        config.relay.workers,
        config.relay.shard_queue_capacity,
    );
    let consumer = spawn_consumer(responses, dispatcher);

    let loopback = if config.bus.loopback_responder {
        tracing::warn!("Loopback responder enabled, replies are echoes");
        let responder = LoopbackResponder::new(
            bus.clone(),
            config.bus.request_topic.clone(),
            config.bus.response_topic.clone(),
        );
        Some(
            responder
                .spawn()
                .await
                .map_err(|e| AppError::TransportUnavailable(e.to_string()))?,
        )
    } else {
        None
    };

    let connection_handler = Arc::new(ConnectionHandler::new(
        chat_module.clone(),
        connection_registry.clone(),
        config.connection.send_queue_capacity,
    ));
    let state = AppState::new(chat_module, connection_registry, connection_handler);
    let router = commands::build_router(state.clone());

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tracing::info!(
        port = local_addr.port(),
        "Chat relay listening on {}",
        local_addr
    );

    Ok(ServerHandle {
        port: local_addr.port(),
        bus,
        state,
        shutdown_tx,
        server,
        consumer,
        loopback,
    })
}

/// 初始化日志，RUST_LOG 优先于配置
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// 加载配置并运行直到 Ctrl-C
pub async fn run() -> AppResult<()> {
    let config = ConfigModule::from_env().load().await?;
    init_tracing(&config.logging.level);

    tracing::info!("Chat relay starting...");

    let handle = start(config).await?;

    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;

    Ok(())
}
