pub mod category;
pub mod document;
pub mod loaders;

pub use category::Category;
pub use document::{
    AnalysisFlags, AnalysisResult, ChatExchange, ChatReply, DocumentFile, TokenBalanceResult,
    TrustResult, UploadResult,
};
pub use loaders::load_document;
