pub mod format;
pub mod types;
pub mod writer;

pub use format::{detail_rows, format_field_name, format_field_value};
pub use types::{DetailRow, ExportError, ExportedDocument};
pub use writer::{DocumentExporter, TextDocumentExporter};
