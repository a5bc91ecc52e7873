//! 结果页数据加载
//!
//! 结果页走另一条调用路径：把仓库中的文件和分类一起上传，直接拿回分析结果。
//! 这条路径的错误信息取自响应体的 `detail` 字段。

use std::sync::Arc;
use tracing::info;

use crate::clients::DocumentApi;
use crate::error::OperationError;
use crate::infrastructure::{AsyncOperation, OperationState};
use crate::models::{AnalysisResult, TrustResult};
use crate::services::DocumentStore;

/// 仓库中缺少文件或分类时的提示
pub const MISSING_INPUT_MESSAGE: &str = "No document or category available";

/// 结果页展示的数据
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsData {
    pub document_name: String,
    pub analysis: AnalysisResult,
    /// 仓库中已有的可信度结果，没有查询过时为空
    pub trust_score: Option<TrustResult>,
}

/// 读取仓库中的文件和分类，调用备用上传路径获取分析结果
pub async fn load_results(api: &dyn DocumentApi, store: &DocumentStore) -> Result<ResultsData, OperationError> {
    let (Some(file), Some(category)) = (store.file(), store.category()) else {
        return Err(OperationError {
            message: MISSING_INPUT_MESSAGE.to_string(),
            status: None,
        });
    };

    info!("📥 加载结果页: {} (分类: {})", file.name, category);
    let analysis = api.upload_for_analysis(&file, category.as_str()).await?;

    Ok(ResultsData {
        document_name: file.name.clone(),
        analysis,
        trust_score: store.trust_score(),
    })
}

/// 结果页加载器，加载状态与其他操作一样通过包装器暴露
pub struct ResultsLoader {
    api: Arc<dyn DocumentApi>,
    store: DocumentStore,
    results: AsyncOperation<ResultsData>,
}

impl ResultsLoader {
    pub fn new(api: Arc<dyn DocumentApi>, store: DocumentStore) -> Self {
        Self {
            api,
            store,
            results: AsyncOperation::new("results"),
        }
    }

    pub async fn load(&self) -> Option<ResultsData> {
        self.results
            .execute(load_results(&*self.api, &self.store))
            .await
    }

    pub fn state(&self) -> OperationState<ResultsData> {
        self.results.state()
    }
}
