//! 文档状态仓库 - 业务能力层
//!
//! 保存当前文档的文件、提取文本、分类、分析结果和可信度结果。
//! 仓库通过构造参数显式注入给需要它的组件，不提供全局单例。

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::models::{AnalysisResult, Category, DocumentFile, TrustResult};

/// 仓库中的文档状态
///
/// `analysis` 只有在 `extracted_text` 和 `category` 都存在时才有意义；
/// `trust_score` 只有在 `analysis` 存在且余额校验通过后才有意义
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentState {
    pub file: Option<DocumentFile>,
    pub extracted_text: Option<String>,
    pub category: Option<Category>,
    pub analysis: Option<AnalysisResult>,
    pub trust_score: Option<TrustResult>,
}

impl DocumentState {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 共享的文档状态仓库
///
/// 克隆得到的是同一份状态的句柄。读者数量不限；
/// 写操作每次只修改一个字段，写入只发生在用户事件驱动的单一逻辑线程上
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    inner: Arc<RwLock<DocumentState>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, DocumentState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DocumentState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 当前状态的只读快照
    pub fn snapshot(&self) -> DocumentState {
        self.read().clone()
    }

    pub fn file(&self) -> Option<DocumentFile> {
        self.read().file.clone()
    }

    pub fn extracted_text(&self) -> Option<String> {
        self.read().extracted_text.clone()
    }

    pub fn category(&self) -> Option<Category> {
        self.read().category
    }

    pub fn analysis(&self) -> Option<AnalysisResult> {
        self.read().analysis.clone()
    }

    pub fn trust_score(&self) -> Option<TrustResult> {
        self.read().trust_score.clone()
    }

    pub fn set_file(&self, file: Option<DocumentFile>) {
        debug!("仓库更新: file = {:?}", file.as_ref().map(|f| f.name.as_str()));
        self.write().file = file;
    }

    pub fn set_extracted_text(&self, text: Option<String>) {
        debug!("仓库更新: extracted_text ({} 字符)", text.as_ref().map_or(0, |t| t.chars().count()));
        self.write().extracted_text = text;
    }

    pub fn set_category(&self, category: Option<Category>) {
        debug!("仓库更新: category = {:?}", category);
        self.write().category = category;
    }

    pub fn set_analysis(&self, analysis: Option<AnalysisResult>) {
        debug!("仓库更新: analysis = {}", analysis.is_some());
        self.write().analysis = analysis;
    }

    pub fn set_trust_score(&self, trust_score: Option<TrustResult>) {
        debug!("仓库更新: trust_score = {:?}", trust_score.as_ref().map(|t| t.score));
        self.write().trust_score = trust_score;
    }

    /// 整体恢复为空状态
    pub fn reset(&self) {
        debug!("仓库重置");
        *self.write() = DocumentState::default();
    }
}
