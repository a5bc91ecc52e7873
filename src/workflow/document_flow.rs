//! 文档处理流程 - 流程层
//!
//! 核心职责：按依赖关系编排五个远程操作
//!
//! ```text
//! upload ──► analyze ──► chat
//!                   └──► trust（需要 balance 授权）
//! balance（独立，由用户触发）
//! ```
//!
//! 规则：
//! 1. 选择文件后上传；上传成功且已选分类时立即分析
//! 2. 选择分类后记录分类；已有提取文本时按新分类重新分析
//! 3. 同时具备提取文本和分类时才能提问，提问发出时清空输入框
//! 4. 余额授权通过后才能查询可信度
//! 5. 余额查询没有上游依赖
//!
//! 前置条件不满足时直接不发起调用，不算作操作错误。
//! 仓库只在包装器采纳了成功结果之后才写入，过期结果不会落入仓库。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::clients::DocumentApi;
use crate::config::Config;
use crate::infrastructure::AsyncOperation;
use crate::models::{
    AnalysisResult, Category, ChatExchange, ChatReply, DocumentFile, TokenBalanceResult, TrustResult,
    UploadResult,
};
use crate::services::DocumentStore;
use crate::utils::document_identifier;
use crate::workflow::view_state::{first_error, JourneyStage, ViewState};

/// 文档处理流程
///
/// - 持有五个异步操作包装器，每个都可以独立重新触发
/// - 文档仓库由外部注入，流程只通过仓库的读写接口访问它
/// - 所有方法都只需要 `&self`，界面可以在操作进行中随时读取视图状态
pub struct DocumentFlow {
    api: Arc<dyn DocumentApi>,
    store: DocumentStore,
    user_id: String,
    wallet: String,

    upload: AsyncOperation<UploadResult>,
    analyze: AsyncOperation<AnalysisResult>,
    chat: AsyncOperation<ChatReply>,
    trust: AsyncOperation<TrustResult>,
    balance: AsyncOperation<TokenBalanceResult>,

    question: Mutex<String>,
    transcript: Mutex<Vec<ChatExchange>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DocumentFlow {
    /// 使用配置中的用户 ID 和钱包创建流程
    pub fn new(api: Arc<dyn DocumentApi>, store: DocumentStore, config: &Config) -> Self {
        Self::with_identity(api, store, config.user_id.clone(), config.wallet.clone())
    }

    pub fn with_identity(
        api: Arc<dyn DocumentApi>,
        store: DocumentStore,
        user_id: impl Into<String>,
        wallet: impl Into<String>,
    ) -> Self {
        Self {
            api,
            store,
            user_id: user_id.into(),
            wallet: wallet.into(),
            upload: AsyncOperation::new("upload"),
            analyze: AsyncOperation::new("analyze"),
            chat: AsyncOperation::new("chat"),
            trust: AsyncOperation::new("trust"),
            balance: AsyncOperation::new("balance"),
            question: Mutex::new(String::new()),
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn upload_op(&self) -> &AsyncOperation<UploadResult> {
        &self.upload
    }

    pub fn analyze_op(&self) -> &AsyncOperation<AnalysisResult> {
        &self.analyze
    }

    pub fn chat_op(&self) -> &AsyncOperation<ChatReply> {
        &self.chat
    }

    pub fn trust_op(&self) -> &AsyncOperation<TrustResult> {
        &self.trust
    }

    pub fn balance_op(&self) -> &AsyncOperation<TokenBalanceResult> {
        &self.balance
    }

    // ========== 用户事件 ==========

    /// 选择文件：上传，成功后如已选分类则立即分析
    ///
    /// 新文件开启新的处理过程，上一份文档的文本、分析和可信度结果被清空
    pub async fn select_file(&self, file: DocumentFile) {
        info!("📄 选择文件: {} ({} 字节)", file.name, file.len());

        self.store.set_file(Some(file.clone()));
        self.store.set_extracted_text(None);
        self.store.set_analysis(None);
        self.store.set_trust_score(None);
        self.analyze.reset();
        self.chat.reset();
        self.trust.reset();
        lock(&self.transcript).clear();

        let Some(uploaded) = self.upload.execute(self.api.upload(&file)).await else {
            return;
        };

        info!(
            "✓ 上传完成，提取文本 {} 字符",
            uploaded.extracted_text.chars().count()
        );
        self.store.set_extracted_text(Some(uploaded.extracted_text.clone()));

        if uploaded.extracted_text.is_empty() {
            debug!("提取文本为空，不发起分析");
            return;
        }

        match self.store.category() {
            Some(category) => self.run_analysis(&uploaded.extracted_text, category).await,
            None => debug!("尚未选择分类，等待分类后再分析"),
        }
    }

    /// 选择分类：记录分类，已有提取文本时按新分类分析
    ///
    /// 新的分析结果覆盖旧结果，不保留历史
    pub async fn select_category(&self, category: Category) {
        info!("🏷️ 选择分类: {}", category);
        self.store.set_category(Some(category));

        match self.extracted_text() {
            Some(text) => self.run_analysis(&text, category).await,
            None => debug!("尚无提取文本，暂不分析"),
        }
    }

    /// 更新提问输入框
    pub fn set_question(&self, text: impl Into<String>) {
        *lock(&self.question) = text.into();
    }

    pub fn question(&self) -> String {
        lock(&self.question).clone()
    }

    /// 提问功能是否可用（有提取文本且已选分类）
    pub fn chat_enabled(&self) -> bool {
        self.extracted_text().is_some() && self.store.category().is_some()
    }

    /// 当前输入能否提交
    pub fn can_submit_question(&self) -> bool {
        self.chat_enabled() && !lock(&self.question).trim().is_empty()
    }

    /// 提交输入框中的问题
    ///
    /// 输入为空白或前置条件不满足时不发起调用。输入框在发出请求时清空，而不是在完成时
    pub async fn submit_question(&self) -> Option<ChatReply> {
        let (Some(text), Some(category)) = (self.extracted_text(), self.store.category()) else {
            debug!("缺少提取文本或分类，不发起对话");
            return None;
        };

        let message = {
            let mut input = lock(&self.question);
            if input.trim().is_empty() {
                debug!("问题为空，不发起对话");
                return None;
            }
            std::mem::take(&mut *input)
        };

        info!("💬 提问: {}", crate::utils::truncate_text(&message, 80));
        let reply = self
            .chat
            .execute(self.api.chat(category.as_str(), &message, &text))
            .await?;

        lock(&self.transcript).push(ChatExchange {
            question: message,
            answer: reply.response.clone(),
        });
        Some(reply)
    }

    /// 填入问题并立即提交
    pub async fn ask(&self, question: impl Into<String>) -> Option<ChatReply> {
        self.set_question(question);
        self.submit_question().await
    }

    /// 查询代币余额
    ///
    /// 查询结束后没有访问权限（未授予或查询失败）时，清掉已有的可信度结果
    pub async fn check_balance(&self) -> Option<TokenBalanceResult> {
        info!("💰 查询余额 (用户: {})", self.user_id);
        let accepted = self
            .balance
            .execute(self.api.check_token_balance(&self.user_id))
            .await;

        if !self.balance.is_loading() && !self.access_granted() {
            self.revoke_trust();
        }

        let balance = accepted?;
        info!(
            "✓ 余额: {} | 访问权限: {}",
            balance.balance,
            if balance.access_granted { "已授予" } else { "未授予" }
        );
        Some(balance)
    }

    /// 可信度查询是否可达
    ///
    /// 需要余额查询成功且授予访问权限，并且当前文档已完成分析
    pub fn trust_available(&self) -> bool {
        self.access_granted() && self.store.analysis().is_some() && self.extracted_text().is_some()
    }

    /// 查询可信度，不可达时不发起调用
    pub async fn check_trust(&self) -> Option<TrustResult> {
        if !self.trust_available() {
            debug!("可信度查询不可达，不发起调用");
            return None;
        }
        let text = self.extracted_text()?;
        let document_hash = document_identifier(&text);

        info!("🛡️ 查询可信度");
        let trust = self
            .trust
            .execute(self.api.check_trust_score(&document_hash, &self.wallet))
            .await?;
        self.store.set_trust_score(Some(trust.clone()));
        Some(trust)
    }

    /// 开始处理新文档：清空仓库、文档相关的包装器、输入框和对话记录
    ///
    /// 余额属于用户而不属于文档，保留不变
    pub fn start_new_document(&self) {
        info!("🔄 开始处理新文档");
        self.store.reset();
        self.upload.reset();
        self.analyze.reset();
        self.chat.reset();
        self.trust.reset();
        lock(&self.question).clear();
        lock(&self.transcript).clear();
    }

    // ========== 派生状态 ==========

    pub fn transcript(&self) -> Vec<ChatExchange> {
        lock(&self.transcript).clone()
    }

    /// 任一包装器进行中
    pub fn is_busy(&self) -> bool {
        [
            self.upload.is_loading(),
            self.analyze.is_loading(),
            self.chat.is_loading(),
            self.trust.is_loading(),
            self.balance.is_loading(),
        ]
        .into_iter()
        .any(|loading| loading)
    }

    /// 按 upload > analyze > chat > trust 顺序取第一个错误
    pub fn first_error(&self) -> Option<crate::error::OperationError> {
        let errors = [
            self.upload.error(),
            self.analyze.error(),
            self.chat.error(),
            self.trust.error(),
        ];
        first_error(errors.iter().map(Option::as_ref))
    }

    pub fn stage(&self) -> JourneyStage {
        JourneyStage::derive(&self.store.snapshot(), self.access_granted())
    }

    pub fn view_state(&self) -> ViewState {
        let document = self.store.snapshot();
        let access_granted = self.access_granted();
        ViewState {
            busy: self.is_busy(),
            error: self.first_error(),
            balance_error: self.balance.error(),
            stage: JourneyStage::derive(&document, access_granted),
            chat_enabled: self.chat_enabled(),
            trust_available: self.trust_available(),
            document,
            balance: self.balance.data(),
            latest_reply: self.chat.data().map(|reply| reply.response),
        }
    }

    // ========== 内部辅助 ==========

    fn access_granted(&self) -> bool {
        self.balance.data().is_some_and(|b| b.access_granted)
    }

    fn revoke_trust(&self) {
        if self.store.trust_score().is_some() || self.trust.data().is_some() {
            warn!("⚠️ 余额未授予访问权限，清除可信度结果");
        }
        self.store.set_trust_score(None);
        self.trust.reset();
    }

    fn extracted_text(&self) -> Option<String> {
        self.store.extracted_text().filter(|text| !text.is_empty())
    }

    async fn run_analysis(&self, text: &str, category: Category) {
        info!("🔍 分析文档 (分类: {})", category);
        if let Some(analysis) = self
            .analyze
            .execute(self.api.analyze(text, category.as_str()))
            .await
        {
            info!(
                "✓ 分析完成: 风险 {} 项, 权利 {} 项, 责任 {} 项",
                analysis.flags.risks.len(),
                analysis.flags.rights.len(),
                analysis.flags.responsibilities.len()
            );
            self.store.set_analysis(Some(analysis));
        }
    }
}
