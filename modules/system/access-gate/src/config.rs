use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::policy::DEFAULT_PUBLIC_ENDPOINTS;

fn default_realm() -> String {
    "Realm".to_owned()
}

fn default_base_path() -> String {
    "/actuator".to_owned()
}

fn default_exposed_endpoints() -> Vec<String> {
    ["health", "info", "env", "metrics", "refresh", "loggers"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Access gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct GateConfig {
    /// Realm announced in the `WWW-Authenticate: Basic` challenge.
    pub realm: String,

    /// CSRF protection is not applied by the gate. The gated surface is a
    /// non-browser API authenticated with basic credentials on every call.
    /// Setting this to `true` is rejected at startup rather than silently ignored.
    pub csrf_protection: bool,

    /// Access policy settings
    pub policy: AccessPolicyConfig,

    /// Management endpoint layout used to tag request paths
    pub management: ManagementConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            realm: default_realm(),
            csrf_protection: false,
            policy: AccessPolicyConfig::default(),
            management: ManagementConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct AccessPolicyConfig {
    /// Management endpoint ids reachable without credentials.
    pub public_endpoints: Vec<String>,
}

impl Default for AccessPolicyConfig {
    fn default() -> Self {
        Self {
            public_endpoints: DEFAULT_PUBLIC_ENDPOINTS
                .iter()
                .map(|id| (*id).to_owned())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ManagementConfig {
    /// Prefix under which management endpoints are mounted. `/` mounts them at the root.
    pub base_path: String,
    /// Endpoint ids served under `base_path`. Anything else is an application path.
    pub exposed: Vec<String>,
    /// Endpoint id -> path segment override, e.g. `health: healthcheck`.
    pub path_mapping: HashMap<String, String>,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            exposed: default_exposed_endpoints(),
            path_mapping: HashMap::new(),
        }
    }
}
