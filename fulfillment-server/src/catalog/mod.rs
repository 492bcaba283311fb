//! 商品目录 - 只读快照
//!
//! Catalog CRUD lives elsewhere; this service only reads products and, at
//! startup, may insert missing ones from a seed file.

pub mod reader;

pub use reader::{CatalogError, CatalogReader};
