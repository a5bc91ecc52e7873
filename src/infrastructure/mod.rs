pub mod async_operation;

pub use async_operation::{AsyncOperation, OperationState, OperationStatus};
