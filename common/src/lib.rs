pub mod config;
pub mod errors;
pub mod repository;
pub mod util;

pub use repository::*;

/// 文档主键（自增计数器分配）
pub type DocId = i64;
