//! # Consent IQ
//!
//! 文档分析助手的客户端：上传文档、选择分类、获取风险/权利/责任分析、
//! 就文档向助手提问，并在余额授权后查询文档可信度。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 通用的异步操作包装器
//! - `AsyncOperation<T>` - 统一暴露 data / error / loading，以及 execute / reset
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 每个后端能力一个方法，失败统一规整为 `OperationError`
//! - `DocumentApi` - 流程层依赖的接口
//! - `ApiClient` - 基于 reqwest 的实现
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 文档状态仓库 `DocumentStore`，显式注入，不做全局单例
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 按 upload → analyze → {chat, trust} 的依赖关系编排操作
//! - `DocumentFlow` - 用户事件入口
//! - `ViewState` - 派生视图状态（忙碌标记、首个错误、处理阶段）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/app` - 按配置驱动一次完整会话
//! - `orchestrator/results_loader` - 结果页数据加载
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ApiClient, DocumentApi};
pub use config::{AppMode, Config};
pub use error::{AppError, AppResult, OperationError};
pub use infrastructure::{AsyncOperation, OperationState, OperationStatus};
pub use models::{
    AnalysisFlags, AnalysisResult, Category, ChatReply, DocumentFile, TokenBalanceResult, TrustResult,
    UploadResult,
};
pub use orchestrator::{App, ResultsData, ResultsLoader};
pub use services::{DocumentState, DocumentStore};
pub use workflow::{DocumentFlow, JourneyStage, ViewState};
