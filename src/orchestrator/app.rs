//! 会话驱动 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、创建 API 客户端、文档仓库和处理流程
//! 2. **事件驱动**：按配置依次触发用户事件，相当于一次界面操作过程
//! 3. **状态输出**：每一步之后输出派生视图状态（忙碌标记、错误横幅、阶段）
//! 4. **会话报告**：结束时把结果写入报告文件

use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::{ApiClient, DocumentApi};
use crate::config::{AppMode, Config};
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::{load_document, Category, ChatExchange};
use crate::orchestrator::results_loader::{ResultsData, ResultsLoader};
use crate::services::DocumentStore;
use crate::utils::logging::{self, log_analysis, log_stage, log_trust, print_session_summary};
use crate::workflow::{DocumentFlow, ViewState};

/// 会话统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub succeeded: usize,
    pub failed: usize,
}

impl SessionStats {
    fn record(&mut self, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    api: Arc<dyn DocumentApi>,
    store: DocumentStore,
    flow: DocumentFlow,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        let api: Arc<dyn DocumentApi> = Arc::new(ApiClient::new(&config)?);
        Ok(Self::with_api(config, api))
    }

    /// 使用指定的 API 实现创建应用
    pub fn with_api(config: Config, api: Arc<dyn DocumentApi>) -> Self {
        let mode = match config.mode {
            AppMode::Session => "session",
            AppMode::Results => "results",
        };
        logging::log_startup(&config.api_base_url, mode);

        let store = DocumentStore::new();
        let flow = DocumentFlow::new(api.clone(), store.clone(), &config);
        Self {
            config,
            api,
            store,
            flow,
        }
    }

    pub fn flow(&self) -> &DocumentFlow {
        &self.flow
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<SessionStats> {
        let category = self.configured_category()?;

        let stats = match self.config.mode {
            AppMode::Session => self.run_session(category).await?,
            AppMode::Results => self.run_results(category).await?,
        };

        print_session_summary(stats.succeeded, stats.failed, &self.config.output_log_file);
        Ok(stats)
    }

    /// 按配置依次触发用户事件
    async fn run_session(&self, category: Option<Category>) -> Result<SessionStats> {
        let mut stats = SessionStats::default();

        log_stage("余额查询");
        let balance = self.flow.check_balance().await;
        stats.record(balance.is_some());
        self.log_view();

        if let Some(category) = category {
            log_stage("选择分类");
            self.flow.select_category(category).await;
            self.log_view();
        }

        if let Some(path) = &self.config.document_path {
            log_stage("上传文档");
            let file = load_document(Path::new(path)).await?;
            self.flow.select_file(file).await;
            stats.record(self.flow.upload_op().error().is_none());
            // 选择文件会先重置分析包装器，之后有数据或错误说明这次触发了分析
            let analyze = self.flow.analyze_op().state();
            if analyze.data.is_some() || analyze.error.is_some() {
                stats.record(analyze.error.is_none());
            }
            self.log_view();

            if let Some(analysis) = self.store.analysis() {
                log_analysis(&analysis);
            }
        } else {
            warn!("⚠️ 未配置文档路径，跳过上传");
        }

        for question in &self.config.chat_questions {
            if !self.flow.chat_enabled() {
                warn!("⚠️ 缺少提取文本或分类，跳过提问: {}", question);
                continue;
            }
            log_stage("提问");
            match self.flow.ask(question.as_str()).await {
                Some(reply) => {
                    info!("🤖 回答: {}", reply.response);
                    stats.record(true);
                }
                None => stats.record(false),
            }
            self.log_view();
        }

        if self.config.check_trust {
            if self.flow.trust_available() {
                log_stage("可信度查询");
                let trust = self.flow.check_trust().await;
                if let Some(trust) = &trust {
                    log_trust(trust);
                }
                stats.record(trust.is_some());
                self.log_view();
            } else {
                info!("可信度查询不可达（需要完成分析且余额授权），跳过");
            }
        }

        let view = self.flow.view_state();
        write_report(&self.config.output_log_file, &view, &self.flow.transcript(), None)?;
        Ok(stats)
    }

    /// 结果页模式：把文件和分类放入仓库后一次性加载
    async fn run_results(&self, category: Option<Category>) -> Result<SessionStats> {
        let mut stats = SessionStats::default();

        let path = self
            .config
            .document_path
            .as_deref()
            .ok_or_else(|| AppError::Other("结果页模式需要配置文档路径".to_string()))?;
        let file = load_document(Path::new(path)).await?;

        self.store.set_file(Some(file));
        self.store.set_category(category);

        log_stage("加载结果页");
        let loader = ResultsLoader::new(self.api.clone(), self.store.clone());
        match loader.load().await {
            Some(results) => {
                info!("📄 文档: {}", results.document_name);
                log_analysis(&results.analysis);
                if let Some(trust) = &results.trust_score {
                    log_trust(trust);
                }
                stats.record(true);
            }
            None => {
                if let Some(err) = loader.state().error {
                    error!("❌ 结果页加载失败: {}", err);
                }
                stats.record(false);
            }
        }

        // 结果页的分析只属于这一页，不写回仓库
        let view = self.flow.view_state();
        let results = loader.state().data;
        write_report(&self.config.output_log_file, &view, &[], results.as_ref())?;
        Ok(stats)
    }

    fn configured_category(&self) -> AppResult<Option<Category>> {
        match &self.config.category {
            None => Ok(None),
            Some(name) => Category::parse(name).map(Some).ok_or_else(|| {
                AppError::Config(ConfigError::UnknownCategory {
                    value: name.clone(),
                })
            }),
        }
    }

    fn log_view(&self) {
        let view = self.flow.view_state();
        info!(
            "📍 阶段: {} | 忙碌: {} | 可提问: {} | 可查询可信度: {}",
            view.stage, view.busy, view.chat_enabled, view.trust_available
        );
        if let Some(err) = &view.error {
            error!("❌ 错误: {}", describe_error(err));
        }
        if let Some(err) = &view.balance_error {
            warn!("⚠️ 余额查询错误: {}", describe_error(err));
        }
    }
}

fn describe_error(err: &crate::error::OperationError) -> String {
    match err.status {
        Some(status) => format!("{} (HTTP {})", err.message, status),
        None => err.message.clone(),
    }
}

/// 生成会话报告文本
///
/// 结果页模式传入 `results`，分析和可信度取自结果页数据而不是仓库
pub fn render_report(view: &ViewState, transcript: &[ChatExchange], results: Option<&ResultsData>) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "文档分析报告 - {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "{}\n", rule);

    let document = &view.document;
    let name = document.file.as_ref().map_or("-", |f| f.name.as_str());
    let category = document.category.map_or("-", |c| c.as_str());
    let _ = writeln!(out, "文档: {}", name);
    let _ = writeln!(out, "分类: {}", category);
    let _ = writeln!(out, "阶段: {}", view.stage);

    let analysis = match results {
        Some(results) => Some(&results.analysis),
        None => document.analysis.as_ref(),
    };
    if let Some(analysis) = analysis {
        let _ = writeln!(out, "\n摘要: {}", analysis.summary);
        for (title, items) in [
            ("风险", &analysis.flags.risks),
            ("权利", &analysis.flags.rights),
            ("责任", &analysis.flags.responsibilities),
        ] {
            let _ = writeln!(out, "{}:", title);
            for item in items {
                let _ = writeln!(out, "  - {}", item);
            }
        }
    }

    if !transcript.is_empty() {
        let _ = writeln!(out, "\n对话记录:");
        for exchange in transcript {
            let _ = writeln!(out, "  问: {}", exchange.question);
            let _ = writeln!(out, "  答: {}", exchange.answer);
        }
    }

    // 只有余额授予访问权限时才展示可信度
    let trust = match results {
        Some(results) => results.trust_score.as_ref(),
        None => document.trust_score.as_ref(),
    };
    if let Some(trust) = trust.filter(|_| view.balance.as_ref().is_some_and(|b| b.access_granted)) {
        let _ = writeln!(
            out,
            "\n可信度: {:.0}% (已验证: {}, 机构: {})",
            trust.display_score(),
            trust.verified,
            trust.organization
        );
    }

    if let Some(err) = &view.error {
        let _ = writeln!(out, "\n错误: {}", describe_error(err));
    }

    out
}

fn write_report(
    path: &str,
    view: &ViewState,
    transcript: &[ChatExchange],
    results: Option<&ResultsData>,
) -> AppResult<()> {
    std::fs::write(path, render_report(view, transcript, results)).map_err(|e| AppError::file_write_failed(path, e))
}
