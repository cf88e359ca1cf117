// Chat Module - 聊天模块
//
// 实现六边形架构（Hexagonal Architecture）：
// - domain: 领域层，包含实体、值对象、片段累积器和总线记录
// - ports: 端口层，定义会话仓储、事件总线和投递的抽象接口
// - infrastructure: 基础设施层，实现端口的具体适配器
// - application: 应用层，实现 CQRS 命令和查询处理器以及流式中继

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// 重新导出常用类型
pub use application::{
    // Traits
    ApplicationError,
    CommandHandler,
    // Commands
    CreateSessionCommand,
    CreateSessionHandler,
    CreateSessionResponse,
    DeleteSessionCommand,
    DeleteSessionHandler,
    DeleteSessionResponse,
    // Queries
    GetSessionHandler,
    GetSessionQuery,
    GetSessionResponse,
    ListMessagesHandler,
    ListMessagesQuery,
    ListMessagesResponse,
    ListSessionsHandler,
    ListSessionsQuery,
    ListSessionsResponse,
    QueryHandler,
    SendMessageCommand,
    SendMessageHandler,
    SendMessageResponse,
    // Relay
    RelayDispatcher,
    RelayError,
    RelayOutcome,
    StreamingRelay,
};

pub use domain::{
    ChatRequestRecord, ChatResponseRecord, Fragment, Message, MessageRole, Session, SessionId,
    SessionSummary,
};

pub use infrastructure::{
    BusRequestPublisher, BusResponseSubscriber, InMemorySessionRepository, LoopbackResponder,
};

pub use ports::{
    BusError, DeliveryOutcome, DeliveryTarget, RawRecord, RepositoryError, RequestPublisher,
    ResponseSubscriber, SessionRepository,
};

use std::sync::Arc;

/// Chat 模块容器
///
/// 管理模块内的依赖注入
pub struct ChatModule {
    // Repositories
    session_repository: Arc<dyn SessionRepository>,
    // Handlers
    create_session_handler: CreateSessionHandler,
    delete_session_handler: DeleteSessionHandler,
    send_message_handler: SendMessageHandler,
    get_session_handler: GetSessionHandler,
    list_sessions_handler: ListSessionsHandler,
    list_messages_handler: ListMessagesHandler,
}

impl ChatModule {
    /// 创建新的 ChatModule 实例（内存存储）
    ///
    /// # Arguments
    /// * `request_publisher` - 用户消息发往后端流水线的出口
    pub fn new(request_publisher: Arc<dyn RequestPublisher>) -> Self {
        let session_repository: Arc<dyn SessionRepository> =
            Arc::new(InMemorySessionRepository::new());

        Self::with_repository(session_repository, request_publisher)
    }

    /// 使用自定义仓储创建 ChatModule
    pub fn with_repository(
        session_repository: Arc<dyn SessionRepository>,
        request_publisher: Arc<dyn RequestPublisher>,
    ) -> Self {
        let create_session_handler = CreateSessionHandler::new(session_repository.clone());
        let delete_session_handler = DeleteSessionHandler::new(session_repository.clone());
        let send_message_handler =
            SendMessageHandler::new(session_repository.clone(), request_publisher);
        let get_session_handler = GetSessionHandler::new(session_repository.clone());
        let list_sessions_handler = ListSessionsHandler::new(session_repository.clone());
        let list_messages_handler = ListMessagesHandler::new(session_repository.clone());

        Self {
            session_repository,
            create_session_handler,
            delete_session_handler,
            send_message_handler,
            get_session_handler,
            list_sessions_handler,
            list_messages_handler,
        }
    }

    /// 创建绑定到本模块会话仓储的流式中继
    pub fn streaming_relay(&self, delivery: Arc<dyn DeliveryTarget>) -> StreamingRelay {
        StreamingRelay::new(self.session_repository.clone(), delivery)
    }

    // Command handlers

    /// 创建会话
    pub async fn create_session(
        &self,
        command: CreateSessionCommand,
    ) -> Result<CreateSessionResponse, ApplicationError> {
        self.create_session_handler.handle(command).await
    }

    /// 删除会话
    pub async fn delete_session(
        &self,
        command: DeleteSessionCommand,
    ) -> Result<DeleteSessionResponse, ApplicationError> {
        self.delete_session_handler.handle(command).await
    }

    /// 发送消息：写入历史并发布到请求主题
    pub async fn send_message(
        &self,
        command: SendMessageCommand,
    ) -> Result<SendMessageResponse, ApplicationError> {
        self.send_message_handler.handle(command).await
    }

    // Query handlers

    /// 获取会话
    pub async fn get_session(
        &self,
        query: GetSessionQuery,
    ) -> Result<GetSessionResponse, ApplicationError> {
        self.get_session_handler.handle(query).await
    }

    /// 列出所有会话
    pub async fn list_sessions(
        &self,
        query: ListSessionsQuery,
    ) -> Result<ListSessionsResponse, ApplicationError> {
        self.list_sessions_handler.handle(query).await
    }

    /// 列出会话消息
    pub async fn list_messages(
        &self,
        query: ListMessagesQuery,
    ) -> Result<ListMessagesResponse, ApplicationError> {
        self.list_messages_handler.handle(query).await
    }

    // Accessors

    /// 获取会话仓储
    pub fn session_repository(&self) -> &Arc<dyn SessionRepository> {
        &self.session_repository
    }
}
