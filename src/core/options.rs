//! # Per-read options.
//!
//! [`ReadOptions`] is a small builder:
//!
//! ```rust
//! use std::time::Duration;
//! use statusvisor::ReadOptions;
//!
//! let opts = ReadOptions::new()
//!     .initial_data(Vec::<String>::new())
//!     .suspense(true)
//!     .timeout_window(Duration::from_secs(10));
//! assert!(opts.initial().is_some());
//! ```
//!
//! `start_with_value` is kept as a deprecated alias of `initial_data`; when
//! both are given, `initial_data` wins.

use std::time::Duration;

/// Options recognized by a bridge read.
#[derive(Clone, Debug)]
pub struct ReadOptions<T> {
    pub(crate) initial_data: Option<T>,
    pub(crate) start_with_value: Option<T>,
    pub(crate) suspense: Option<bool>,
    pub(crate) timeout_window: Option<Duration>,
}

impl<T> Default for ReadOptions<T> {
    fn default() -> Self {
        Self {
            initial_data: None,
            start_with_value: None,
            suspense: None,
            timeout_window: None,
        }
    }
}

impl<T> ReadOptions<T> {
    /// Options with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Data to report (with `Success`) until the first real value arrives.
    pub fn initial_data(mut self, data: T) -> Self {
        self.initial_data = Some(data);
        self
    }

    /// Deprecated alias of [`initial_data`](Self::initial_data).
    #[deprecated(note = "use `initial_data` instead")]
    pub fn start_with_value(mut self, data: T) -> Self {
        self.start_with_value = Some(data);
        self
    }

    /// Overrides the bridge's default suspense mode for this read.
    pub fn suspense(mut self, enabled: bool) -> Self {
        self.suspense = Some(enabled);
        self
    }

    /// Timeout window for the subject if this read creates it.
    pub fn timeout_window(mut self, window: Duration) -> Self {
        self.timeout_window = Some(window);
        self
    }

    /// Effective initial data: `initial_data`, else `start_with_value`.
    pub fn initial(&self) -> Option<&T> {
        self.initial_data.as_ref().or(self.start_with_value.as_ref())
    }

    pub(crate) fn into_initial(self) -> Option<T> {
        self.initial_data.or(self.start_with_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(deprecated)]
    fn initial_data_wins_over_alias() {
        let opts = ReadOptions::new().start_with_value("old").initial_data("new");
        assert_eq!(opts.initial(), Some(&"new"));
        assert_eq!(opts.into_initial(), Some("new"));
    }

    #[test]
    #[allow(deprecated)]
    fn alias_alone_is_honored() {
        let opts = ReadOptions::new().start_with_value(7);
        assert_eq!(opts.into_initial(), Some(7));
    }

    #[test]
    fn nothing_set() {
        let opts: ReadOptions<u8> = ReadOptions::new();
        assert!(opts.initial().is_none());
        assert!(opts.suspense.is_none());
    }
}
