pub mod file_loader;

pub use file_loader::{guess_content_type, load_document};
