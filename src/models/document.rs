use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 待上传的文档句柄
///
/// 内容使用 `Arc` 共享，克隆成本很低
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub name: String,
    pub content_type: String,
    bytes: Arc<[u8]>,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 上传接口的返回
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub extracted_text: String,
}

/// 分析结果中的三类标注
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFlags {
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub rights: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

/// 文档分析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default)]
    pub flags: AnalysisFlags,
}

/// 助手回复
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// 一问一答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    pub question: String,
    pub answer: String,
}

/// 可信度查询结果，`score` 取值 0–100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustResult {
    pub score: f64,
    pub verified: bool,
    pub organization: String,
}

impl TrustResult {
    /// 限制在 [0, 100] 内的分数，用于展示
    pub fn display_score(&self) -> f64 {
        self.score.clamp(0.0, 100.0)
    }
}

/// 代币余额查询结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalanceResult {
    pub balance: f64,
    pub access_granted: bool,
}
