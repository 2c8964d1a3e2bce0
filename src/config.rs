//! # Global runtime configuration.
//!
//! [`Config`] defines manager-wide defaults: the per-service stop timeout,
//! the event bus capacity, and the command queue bound.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use servisor::Config;
//!
//! let mut cfg = Config::default();
//! cfg.stop_timeout = Duration::from_millis(500);
//! cfg.queue_capacity = 16;
//!
//! assert_eq!(cfg.queue_capacity, 16);
//! ```

use std::time::Duration;

/// Global configuration for the manager and the services it loads.
#[derive(Clone, Debug)]
pub struct Config {
    /// Default upper bound a stopping service waits for its dependents to
    /// leave the running state before forcing its own stop. Per-service
    /// overrides go through `Service::set_stop_timeout_ms`.
    pub stop_timeout: Duration,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
    /// Capacity of the bounded command queue feeding the dispatcher.
    pub queue_capacity: usize,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `stop_timeout = 1500ms`
    /// - `bus_capacity = 1024`
    /// - `queue_capacity = 64`
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_millis(1500),
            bus_capacity: 1024,
            queue_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let cfg = Config::default();
        assert_eq!(cfg.stop_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.bus_capacity, 1024);
        assert_eq!(cfg.queue_capacity, 64);
    }
}
