//! Node (folder/file) domain entities.

pub mod model;
pub mod name;
pub mod upload;

pub use model::{Node, NodeType};
pub use name::{ensure_unique_name, with_suffix};
pub use upload::{NewFile, PDF_MIME};
