pub mod document_flow;
pub mod view_state;

pub use document_flow::DocumentFlow;
pub use view_state::{first_error, JourneyStage, ViewState};
