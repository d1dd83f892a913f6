pub mod attach;
pub mod check_storage;
pub mod check_url;
pub mod common;
pub mod remove;
pub mod show;
