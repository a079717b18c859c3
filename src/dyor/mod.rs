//! DYOR report handling: the persisted document schema, .docx flattening
//! and the model-backed structured parser.

pub mod docx;
pub mod parser;
pub mod schema;

pub use parser::ReportParser;
pub use schema::DyorReport;
