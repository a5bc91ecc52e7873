pub mod api_client;

pub use api_client::{normalize_error_body, ApiClient, ApiResult, DocumentApi, ErrorField};
