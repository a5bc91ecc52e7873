//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责把配置变成一次完整的会话，是整个程序的"指挥中心"。
//!
//! ### `app` - 会话驱动
//! - 管理应用生命周期（初始化、运行、写报告）
//! - 按配置依次触发用户事件（余额 → 分类 → 文件 → 提问 → 可信度）
//! - 每一步之后输出派生视图状态
//!
//! ### `results_loader` - 结果页加载
//! - 读取仓库中的文件和分类，走备用上传路径获取分析结果
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (一次会话)
//!     ↓
//! workflow::DocumentFlow (按依赖关系编排操作)
//!     ↓
//! infrastructure::AsyncOperation (loading / data / error)
//!     ↓
//! clients::DocumentApi (远程调用)
//! ```

pub mod app;
pub mod results_loader;

pub use app::{App, SessionStats};
pub use results_loader::{load_results, ResultsData, ResultsLoader, MISSING_INPUT_MESSAGE};
