//! 后端 API 客户端
//!
//! 每个后端能力对应一个方法，统一把失败规整为 [`OperationError`]：
//! - 收到响应但状态码非 2xx：`status` 取响应状态码，`message` 取响应体中的错误字段
//! - 没有收到响应：只有 `message`，没有 `status`
//!
//! 客户端从不自动重试，重试由调用方重新触发

use futures::future::{BoxFuture, FutureExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, OperationError};
use crate::models::{
    AnalysisResult, ChatReply, DocumentFile, TokenBalanceResult, TrustResult, UploadResult,
};

/// 远程操作结果
pub type ApiResult<T> = Result<T, OperationError>;

/// 后端能力接口
///
/// 流程层只依赖这个 trait，测试中可以换成内存实现
pub trait DocumentApi: Send + Sync {
    /// 上传文档，返回提取出的文本
    fn upload<'a>(&'a self, file: &'a DocumentFile) -> BoxFuture<'a, ApiResult<UploadResult>>;

    /// 按分类分析文档文本，分类原样透传，由后端校验
    fn analyze<'a>(&'a self, text: &'a str, category: &'a str) -> BoxFuture<'a, ApiResult<AnalysisResult>>;

    /// 无状态对话，每次都带上完整的文档文本
    fn chat<'a>(
        &'a self,
        category: &'a str,
        message: &'a str,
        document_text: &'a str,
    ) -> BoxFuture<'a, ApiResult<ChatReply>>;

    /// 查询文档可信度
    fn check_trust_score<'a>(&'a self, document_hash: &'a str, wallet: &'a str) -> BoxFuture<'a, ApiResult<TrustResult>>;

    /// 查询代币余额及访问权限
    fn check_token_balance<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, ApiResult<TokenBalanceResult>>;

    /// 结果页使用的备用路径：文件和分类一起上传，直接返回分析结果
    fn upload_for_analysis<'a>(
        &'a self,
        file: &'a DocumentFile,
        category: &'a str,
    ) -> BoxFuture<'a, ApiResult<AnalysisResult>>;
}

/// 错误响应体中读取 message 的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorField {
    /// `{"message": ...}`
    Message,
    /// `{"detail": ...}`，结果页路径使用
    Detail,
}

impl ErrorField {
    fn key(self) -> &'static str {
        match self {
            ErrorField::Message => "message",
            ErrorField::Detail => "detail",
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            ErrorField::Message => "An error occurred",
            ErrorField::Detail => "An error occurred while analyzing the document",
        }
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    category: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    category: &'a str,
    message: &'a str,
    document_text: &'a str,
}

#[derive(Serialize)]
struct TrustRequest<'a> {
    doc_hash: &'a str,
    wallet: &'a str,
}

#[derive(Serialize)]
struct BalanceRequest<'a> {
    user_id: &'a str,
}

/// 基于 reqwest 的后端客户端
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// 使用配置中的后端地址创建客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_base_url(&config.api_base_url)
    }

    /// 使用指定的后端地址创建客户端
    pub fn with_base_url(base_url: &str) -> AppResult<Self> {
        if reqwest::Url::parse(base_url).is_err() {
            return Err(AppError::Api(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
            }));
        }

        // 不设置超时：挂起的请求会一直处于 loading
        let client = Client::builder().build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!("POST {}", url);
        let sent = self.client.post(&url).json(body).send().await;
        read_response(sent, ErrorField::Message).await
    }

    async fn post_multipart<R>(&self, path: &str, form: Form, error_field: ErrorField) -> ApiResult<R>
    where
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!("POST {} (multipart)", url);
        let sent = self.client.post(&url).multipart(form).send().await;
        read_response(sent, error_field).await
    }
}

impl DocumentApi for ApiClient {
    fn upload<'a>(&'a self, file: &'a DocumentFile) -> BoxFuture<'a, ApiResult<UploadResult>> {
        async move {
            let form = Form::new().part("file", file_part(file));
            self.post_multipart("/upload", form, ErrorField::Message)
                .await
                .map_err(|e| {
                    warn!("上传失败: {}", e);
                    e
                })
        }
        .boxed()
    }

    fn analyze<'a>(&'a self, text: &'a str, category: &'a str) -> BoxFuture<'a, ApiResult<AnalysisResult>> {
        async move {
            self.post_json("/analyze", &AnalyzeRequest { text, category })
                .await
                .map_err(|e| {
                    warn!("分析失败: {}", e);
                    e
                })
        }
        .boxed()
    }

    fn chat<'a>(
        &'a self,
        category: &'a str,
        message: &'a str,
        document_text: &'a str,
    ) -> BoxFuture<'a, ApiResult<ChatReply>> {
        async move {
            let request = ChatRequest {
                category,
                message,
                document_text,
            };
            self.post_json("/chat", &request).await.map_err(|e| {
                warn!("对话失败: {}", e);
                e
            })
        }
        .boxed()
    }

    fn check_trust_score<'a>(&'a self, document_hash: &'a str, wallet: &'a str) -> BoxFuture<'a, ApiResult<TrustResult>> {
        async move {
            let request = TrustRequest {
                doc_hash: document_hash,
                wallet,
            };
            self.post_json("/trust", &request).await.map_err(|e| {
                warn!("可信度查询失败: {}", e);
                e
            })
        }
        .boxed()
    }

    fn check_token_balance<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, ApiResult<TokenBalanceResult>> {
        async move {
            self.post_json("/check-balance", &BalanceRequest { user_id })
                .await
                .map_err(|e| {
                    warn!("余额查询失败: {}", e);
                    e
                })
        }
        .boxed()
    }

    fn upload_for_analysis<'a>(
        &'a self,
        file: &'a DocumentFile,
        category: &'a str,
    ) -> BoxFuture<'a, ApiResult<AnalysisResult>> {
        async move {
            let form = Form::new()
                .part("file", file_part(file))
                .text("category", category.to_string());
            self.post_multipart("/upload", form, ErrorField::Detail)
                .await
                .map_err(|e| {
                    warn!("结果页分析失败: {}", e);
                    e
                })
        }
        .boxed()
    }
}

/// 构建 multipart 文件段，内容类型无法识别时不带 MIME
fn file_part(file: &DocumentFile) -> Part {
    let build = || Part::bytes(file.bytes().to_vec()).file_name(file.name.clone());
    match build().mime_str(&file.content_type) {
        Ok(part) => part,
        Err(_) => build(),
    }
}

/// 读取响应并规整错误
async fn read_response<R>(sent: Result<Response, reqwest::Error>, error_field: ErrorField) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let response = sent.map_err(|e| OperationError::transport(transport_message(&e)))?;
    let status = response.status().as_u16();

    if !response.status().is_success() {
        let body = response.bytes().await.unwrap_or_default();
        return Err(normalize_error_body(status, &body, error_field));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| OperationError::response(status, format!("Invalid response body: {}", e)))
}

fn transport_message(err: &reqwest::Error) -> String {
    let message = err.to_string();
    if message.is_empty() {
        "Network error occurred".to_string()
    } else {
        message
    }
}

/// 把非 2xx 响应体规整为 `OperationError`
///
/// 响应体不是 JSON、缺少字段或字段不是非空字符串时使用默认文案
pub fn normalize_error_body(status: u16, body: &[u8], error_field: ErrorField) -> OperationError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get(error_field.key())
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| error_field.fallback().to_string());

    OperationError::response(status, message)
}
