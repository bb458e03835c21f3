//! # GIOP ORB Configuration
//!
//! Configuration consumed by the framing layer and a helper that installs
//! the tracing subscriber.
//!
//! ## Features
//!
//! - **Protocol limits**: maximum GIOP version, java serialization marker, fragment size
//! - **Addressing policy**: which GIOP 1.2 target address dispositions are accepted
//! - **Request partitioning**: allowed thread pool id range and default id
//! - **Timeouts**: separate header and body read bounds
//!
//! ## Usage
//!
//! ```rust
//! use giop_config::{AddressingPolicy, OrbConfig};
//!
//! let config = OrbConfig::from_toml_str(r#"
//! [addressing]
//! policy = "handle_all"
//! "#).unwrap();
//!
//! assert_eq!(config.addressing.policy, AddressingPolicy::HandleAll);
//! ```

pub mod defaults;
pub mod logging;
pub mod orb_config;

// Re-export commonly used types
pub use logging::init_tracing;
pub use orb_config::{
    AddressingPolicy, AddressingSettings, GiopSettings, LogFormat, LoggingSettings, OrbConfig,
    PartitioningSettings, TimeoutSettings,
};
