pub mod log_relay;
pub mod repo_mirror;
