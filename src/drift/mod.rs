//! Drift Module - prediction skew detection and retrain triggering
//!
//! - `detector` - pure skew decision over one window
//! - `cooldown` - rate limit between successful triggers
//! - `monitor` - one cycle: query, decide, trigger, advance cooldown
//! - `scheduler` - periodic loop with graceful shutdown

pub mod cooldown;
pub mod detector;
pub mod monitor;
pub mod scheduler;


pub use cooldown::CooldownGate;
pub use detector::{DetectionConfig, DriftDetector};
pub use monitor::{DriftMonitor, MonitorStatus};

use std::sync::Arc;
use parking_lot::RwLock;

/// Status snapshot shared with the HTTP API
pub type SharedStatus = Arc<RwLock<MonitorStatus>>;
