//! Default configuration values
//!
//! Values used when a configuration file or environment variable does not
//! provide a setting.

/// Protocol defaults
pub mod giop {
    /// Fragment size used when splitting outbound messages (bytes, header included)
    pub const FRAGMENT_SIZE: u32 = 1024;

    /// Smallest fragment size accepted; must leave room for a 1.2 fragment header
    pub const MIN_FRAGMENT_SIZE: u32 = 32;

    /// Fragment sizes must keep 8-octet body alignment
    pub const FRAGMENT_SIZE_MULTIPLE: u32 = 8;

    /// Largest inbound frame accepted (bytes, header included)
    pub const MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;
}

/// Request partitioning (thread pool id) defaults
pub mod partitioning {
    pub const DEFAULT_ID: u8 = 0;
    pub const MIN_ID: u8 = 0;
    pub const MAX_ID: u8 = 63;
}

/// Frame reader and writer timeouts
pub mod timeouts {
    /// Header read timeout (milliseconds)
    pub const HEADER_READ_MS: u64 = 5_000;

    /// Body read timeout (milliseconds); typically longer than the header timeout
    pub const BODY_READ_MS: u64 = 30_000;

    /// Frame write timeout (milliseconds)
    pub const WRITE_MS: u64 = 10_000;
}

/// Logging defaults
pub mod logging {
    pub const LEVEL: &str = "info";
}

/// Prefix for environment variable overrides (`GIOP_TIMEOUTS__HEADER_READ_MS`)
pub const ENV_PREFIX: &str = "GIOP";
