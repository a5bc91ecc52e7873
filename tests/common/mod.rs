#![allow(dead_code)]

use consent_iq::clients::{ApiResult, DocumentApi};
use consent_iq::{
    AnalysisFlags, AnalysisResult, ChatReply, DocumentFile, OperationError, TokenBalanceResult, TrustResult,
    UploadResult,
};
use futures::future::{BoxFuture, FutureExt};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// 记录下来的远程调用
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload { file: String },
    Analyze { text: String, category: String },
    Chat { category: String, message: String, document_text: String },
    Trust { doc_hash: String, wallet: String },
    Balance { user_id: String },
    UploadForAnalysis { file: String, category: String },
}

enum Reply<T> {
    Now(ApiResult<T>),
    Gated(oneshot::Receiver<ApiResult<T>>),
}

/// 按顺序返回预设结果的响应队列
pub struct Script<T> {
    replies: Mutex<VecDeque<Reply<T>>>,
}

impl<T: Send + 'static> Script<T> {
    fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, reply: ApiResult<T>) {
        self.replies.lock().unwrap().push_back(Reply::Now(reply));
    }

    /// 下一次调用会一直挂起，直到通过返回的 sender 给出结果
    pub fn gate(&self) -> oneshot::Sender<ApiResult<T>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Reply::Gated(rx));
        tx
    }

    fn next(&self) -> BoxFuture<'static, ApiResult<T>> {
        let reply = self.replies.lock().unwrap().pop_front();
        async move {
            match reply {
                Some(Reply::Now(result)) => result,
                Some(Reply::Gated(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(OperationError::transport("gate dropped"))),
                None => Err(OperationError::transport("no scripted response")),
            }
        }
        .boxed()
    }
}

/// 内存中的 `DocumentApi`，记录每次调用并返回预设结果
pub struct ScriptedApi {
    calls: Mutex<Vec<Call>>,
    pub upload: Script<UploadResult>,
    pub analyze: Script<AnalysisResult>,
    pub chat: Script<ChatReply>,
    pub trust: Script<TrustResult>,
    pub balance: Script<TokenBalanceResult>,
    pub results: Script<AnalysisResult>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            upload: Script::new(),
            analyze: Script::new(),
            chat: Script::new(),
            trust: Script::new(),
            balance: Script::new(),
            results: Script::new(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn analyze_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Analyze { .. }))
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl DocumentApi for ScriptedApi {
    fn upload<'a>(&'a self, file: &'a DocumentFile) -> BoxFuture<'a, ApiResult<UploadResult>> {
        self.record(Call::Upload {
            file: file.name.clone(),
        });
        self.upload.next()
    }

    fn analyze<'a>(&'a self, text: &'a str, category: &'a str) -> BoxFuture<'a, ApiResult<AnalysisResult>> {
        self.record(Call::Analyze {
            text: text.to_string(),
            category: category.to_string(),
        });
        self.analyze.next()
    }

    fn chat<'a>(
        &'a self,
        category: &'a str,
        message: &'a str,
        document_text: &'a str,
    ) -> BoxFuture<'a, ApiResult<ChatReply>> {
        self.record(Call::Chat {
            category: category.to_string(),
            message: message.to_string(),
            document_text: document_text.to_string(),
        });
        self.chat.next()
    }

    fn check_trust_score<'a>(&'a self, document_hash: &'a str, wallet: &'a str) -> BoxFuture<'a, ApiResult<TrustResult>> {
        self.record(Call::Trust {
            doc_hash: document_hash.to_string(),
            wallet: wallet.to_string(),
        });
        self.trust.next()
    }

    fn check_token_balance<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, ApiResult<TokenBalanceResult>> {
        self.record(Call::Balance {
            user_id: user_id.to_string(),
        });
        self.balance.next()
    }

    fn upload_for_analysis<'a>(
        &'a self,
        file: &'a DocumentFile,
        category: &'a str,
    ) -> BoxFuture<'a, ApiResult<AnalysisResult>> {
        self.record(Call::UploadForAnalysis {
            file: file.name.clone(),
            category: category.to_string(),
        });
        self.results.next()
    }
}

// ========== 测试数据 ==========

pub const SAMPLE_TEXT: &str = "Sample contract text";

pub fn sample_file() -> DocumentFile {
    DocumentFile::new("contract.pdf", "application/pdf", b"%PDF-1.4 sample".to_vec())
}

pub fn uploaded(text: &str) -> UploadResult {
    UploadResult {
        extracted_text: text.to_string(),
    }
}

pub fn legal_analysis() -> AnalysisResult {
    AnalysisResult {
        summary: "Subscription agreement with automatic renewal.".to_string(),
        flags: AnalysisFlags {
            risks: vec!["Auto-renewal clause".to_string()],
            rights: vec!["Right to cancel within 30 days".to_string()],
            responsibilities: vec!["Timely payment".to_string()],
        },
    }
}

pub fn analysis_with_summary(summary: &str) -> AnalysisResult {
    AnalysisResult {
        summary: summary.to_string(),
        flags: AnalysisFlags::default(),
    }
}

pub fn balance(access_granted: bool) -> TokenBalanceResult {
    TokenBalanceResult {
        balance: if access_granted { 25.0 } else { 0.0 },
        access_granted,
    }
}

pub fn trust_result() -> TrustResult {
    TrustResult {
        score: 87.0,
        verified: true,
        organization: "Masumi Verified".to_string(),
    }
}

pub fn reply(text: &str) -> ChatReply {
    ChatReply {
        response: text.to_string(),
    }
}

pub fn server_error() -> OperationError {
    OperationError::response(500, "An error occurred")
}
