pub mod config;
pub mod error;
pub mod logging;

// Dispatch pipeline.
pub mod browser;
pub mod dispatch;
pub mod event;
pub mod os;
pub mod policy;
pub mod sandbox;
pub mod shorturl;
