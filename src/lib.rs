pub mod collector;
pub mod config;
pub mod service;
pub mod snapshot_core;
pub mod sqlite_pragma;
