pub mod db;
pub mod index_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod memory_repository;
pub mod query_builder;
pub mod repository_util;
