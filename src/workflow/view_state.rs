//! 派生视图状态
//!
//! 把五个包装器和文档仓库的组合状态归纳成界面需要的几个信号

use std::fmt::Display;

use crate::error::OperationError;
use crate::models::TokenBalanceResult;
use crate::services::DocumentState;

/// 单个文档的处理阶段
///
/// `Empty -> FileSelected -> TextExtracted -> Categorized -> Analyzed -> TrustReady`，
/// 只有对应操作成功后才会前进，失败时停在最后一个成功的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JourneyStage {
    Empty,
    FileSelected,
    TextExtracted,
    /// 已有提取文本且已选择分类
    Categorized,
    Analyzed,
    /// 已分析且余额校验授予了访问权限
    TrustReady,
}

impl JourneyStage {
    /// 根据仓库内容和余额授权推导阶段
    pub fn derive(document: &DocumentState, access_granted: bool) -> Self {
        let has_text = document
            .extracted_text
            .as_deref()
            .is_some_and(|t| !t.is_empty());

        match (has_text, document.category.is_some(), document.analysis.is_some()) {
            (true, true, true) if access_granted => JourneyStage::TrustReady,
            (true, true, true) => JourneyStage::Analyzed,
            (true, true, false) => JourneyStage::Categorized,
            (true, false, _) => JourneyStage::TextExtracted,
            _ if document.file.is_some() => JourneyStage::FileSelected,
            _ => JourneyStage::Empty,
        }
    }
}

impl Display for JourneyStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JourneyStage::Empty => "等待上传",
            JourneyStage::FileSelected => "已选择文件",
            JourneyStage::TextExtracted => "已提取文本",
            JourneyStage::Categorized => "已选择分类",
            JourneyStage::Analyzed => "已完成分析",
            JourneyStage::TrustReady => "可查询可信度",
        };
        f.write_str(label)
    }
}

/// 界面一次渲染所需的全部状态
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// 任一操作进行中
    pub busy: bool,
    /// 按 upload > analyze > chat > trust 顺序找到的第一个错误
    pub error: Option<OperationError>,
    /// 余额查询的错误单独展示
    pub balance_error: Option<OperationError>,
    pub stage: JourneyStage,
    pub chat_enabled: bool,
    pub trust_available: bool,
    pub document: DocumentState,
    pub balance: Option<TokenBalanceResult>,
    pub latest_reply: Option<String>,
}

impl ViewState {
    pub fn shows_busy_overlay(&self) -> bool {
        self.busy
    }

    pub fn shows_error_banner(&self) -> bool {
        self.error.is_some()
    }
}

/// 按给定顺序返回第一个非空错误
pub fn first_error<'a, I>(errors: I) -> Option<OperationError>
where
    I: IntoIterator<Item = Option<&'a OperationError>>,
{
    errors.into_iter().flatten().next().cloned()
}
