pub mod session_monitor;

pub use session_monitor::SessionMonitorWorker;
