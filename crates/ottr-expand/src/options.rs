/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Expansion configuration.

use serde::{Deserialize, Serialize};

/// Default ceiling on nested template invocations.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options controlling an expansion request.
///
/// Deserializable with every field optional, so a host can embed it in its
/// own configuration file:
///
/// ```toml
/// max-depth = 64
/// check-types = false
/// blank-node-namespace = "run1"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExpandOptions {
    /// Maximum number of nested template invocations.
    pub max_depth: usize,

    /// Check arguments against declared parameter types.
    pub check_types: bool,

    /// Fixed blank node namespace. A random one is used when unset.
    pub blank_node_namespace: Option<String>,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            check_types: true,
            blank_node_namespace: None,
        }
    }
}

impl ExpandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_check_types(mut self, check: bool) -> Self {
        self.check_types = check;
        self
    }

    pub fn with_blank_node_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.blank_node_namespace = Some(namespace.into());
        self
    }
}
