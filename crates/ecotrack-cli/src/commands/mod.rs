pub mod auth;
pub mod config;
pub mod goal;
pub mod merge;
pub mod status;
pub mod task;
