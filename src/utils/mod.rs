pub mod doc_hash;
pub mod logging;

pub use doc_hash::document_identifier;
pub use logging::truncate_text;
