//! Core types shared by the sampling pipeline and its callers
//!
//! This crate holds the row and cell model every stage of the pipeline
//! speaks, plus the cooperative abort signal callers use to stop a pass.

pub mod cancel;
pub mod row;
pub mod value;

// Re-export commonly used types
pub use cancel::AbortSignal;
pub use row::{ColumnSchema, Row};
pub use value::{CellValue, ColumnKind};
