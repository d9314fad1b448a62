use std::sync::Arc;
use tokio::sync::Mutex;

pub mod batch_service;
pub mod dispatch;
pub mod feed_parser;
pub mod messaging_service;
pub mod report;
pub mod session;

/// Serializes access to the transport: at most one batch or single send at a time.
pub type DispatchLock = Arc<Mutex<()>>;
