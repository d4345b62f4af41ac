pub mod flash;
pub mod handlers;
pub mod result;
