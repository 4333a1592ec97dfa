pub mod git;
pub mod identity;
pub mod log_store;
pub mod parameters;
pub mod repository_host;
