//! Submodule pointer changes: parsing them out of the staged diff and
//! resolving the commit history each move spans.

pub mod parser;
pub mod resolver;

pub use parser::{SubmodulePointerChange, parse_pointer_changes, parse_pointer_line};
pub use resolver::{HistoryResolver, SubmoduleHistoryResolver};
