//! Runtime configuration for **evote** core.
//!
//! The [`Config`] struct centralises the tunable parameters of the voting
//! chain: the multisig quorum size and the network name. It is constructed
//! via the [`ConfigBuilder`] fluent builder pattern, enabling callers to
//! customise only the fields they care about while keeping sensible
//! defaults.
//!
//! ```
//! use evote_core::config::Config;
//!
//! let cfg = Config::default();
//! assert_eq!(cfg.network, "main");
//! ```

use serde::{Deserialize, Serialize};

/// Runtime configuration shared across the crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Human-readable name identifying the network (e.g. "main", "test").
    pub network: String,

    /// Minimum number of administrative signers a multisig must carry for
    /// `add_signature`/`verify` to be considered meaningful upstream of the
    /// verifier. The verifier itself only checks that every present pair is
    /// valid (spec §9); this is an operator-facing sanity threshold used by
    /// transaction constructors, not enforced inside `MultiSig::verify`.
    pub quorum: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: "main".into(),
            quorum: 1,
        }
    }
}

/// Fluent builder for [`Config`].
pub struct ConfigBuilder {
    inner: Config,
}

impl ConfigBuilder {
    /// Starts a new builder pre-populated with [`Config::default`].
    pub fn new() -> Self {
        Self { inner: Config::default() }
    }

    pub fn network<S: Into<String>>(mut self, name: S) -> Self {
        self.inner.network = name.into();
        self
    }

    pub fn quorum(mut self, quorum: usize) -> Self {
        self.inner.quorum = quorum;
        self
    }

    /// Consumes the builder returning an immutable configuration value.
    pub fn finish(self) -> Config {
        self.inner
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new().network("test").quorum(4).finish();
        assert_eq!(cfg.network, "test");
        assert_eq!(cfg.quorum, 4);
    }
}
