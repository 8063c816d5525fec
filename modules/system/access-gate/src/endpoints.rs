//! Maps request paths to management endpoint ids.
//!
//! For base path `/actuator` and exposed endpoint `health` the resolver tags
//! `/actuator/health` and everything below it (`/actuator/health/liveness`) as
//! `health`. The base path itself is the discovery page and is tagged
//! [`DISCOVERY_ENDPOINT`]. Paths outside the management namespace, and endpoints
//! that are not exposed, stay untagged. The HTTP method plays no part.

use std::collections::HashSet;

use crate::config::ManagementConfig;
use crate::policy::EndpointDescriptor;

/// Id given to the management base path (the endpoint listing).
pub const DISCOVERY_ENDPOINT: &str = "links";

#[derive(Debug, thiserror::Error)]
pub enum EndpointConfigError {
    #[error("management base path '{0}' must start with '/'")]
    InvalidBasePath(String),

    #[error("management endpoint id must not be empty")]
    EmptyEndpointId,

    #[error("management endpoint '{0}' is exposed more than once")]
    DuplicateEndpoint(String),

    #[error("path '{path}' for endpoint '{id}' must be non-empty, must not contain '{{' or '}}' and no segment may start with ':' or '*'")]
    InvalidPath { id: String, path: String },

    #[error("route '{route}' for endpoint '{id}' conflicts with another endpoint: {source}")]
    Conflict {
        id: String,
        route: String,
        #[source]
        source: matchit::InsertError,
    },
}

/// Path -> endpoint id lookup, built once from [`ManagementConfig`].
#[derive(Clone)]
pub struct EndpointResolver {
    router: matchit::Router<String>,
    prefix: String,
    /// `(id, path)` in exposure order.
    paths: Vec<(String, String)>,
}

impl std::fmt::Debug for EndpointResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointResolver")
            .field("prefix", &self.prefix)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl EndpointResolver {
    /// Build the resolver.
    ///
    /// # Errors
    /// Returns an error for a relative base path, blank or duplicate endpoint ids,
    /// mapped paths that are empty or contain route syntax, and overlapping routes.
    pub fn from_config(cfg: &ManagementConfig) -> Result<Self, EndpointConfigError> {
        let prefix = normalize_base_path(&cfg.base_path)?;
        let mut router = matchit::Router::new();
        let mut seen = HashSet::new();
        let mut paths = Vec::with_capacity(cfg.exposed.len());

        for id in &cfg.exposed {
            let id = id.trim();
            if id.is_empty() {
                return Err(EndpointConfigError::EmptyEndpointId);
            }
            if !seen.insert(id) {
                return Err(EndpointConfigError::DuplicateEndpoint(id.to_owned()));
            }

            let segment = cfg.path_mapping.get(id).map_or(id, String::as_str);
            let segment = segment.trim_matches('/');
            if segment.is_empty() || has_route_syntax(segment) {
                return Err(EndpointConfigError::InvalidPath {
                    id: id.to_owned(),
                    path: segment.to_owned(),
                });
            }

            let exact = format!("{prefix}/{segment}");
            let nested = format!("{exact}/{{*rest}}");
            insert(&mut router, id, exact.clone())?;
            insert(&mut router, id, nested)?;
            paths.push((id.to_owned(), exact));
        }

        // A root-mounted management namespace has no discovery page.
        if !prefix.is_empty() {
            insert(&mut router, DISCOVERY_ENDPOINT, prefix.clone())?;
        }

        tracing::debug!(
            base_path = %if prefix.is_empty() { "/" } else { prefix.as_str() },
            endpoints = seen.len(),
            "Management endpoint resolver built"
        );

        Ok(Self {
            router,
            prefix,
            paths,
        })
    }

    /// Management base path (`""` when mounted at the root).
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Exposed endpoints as `(id, path)` pairs, in configuration order.
    pub fn endpoints(&self) -> impl Iterator<Item = (&str, &str)> {
        self.paths.iter().map(|(id, path)| (id.as_str(), path.as_str()))
    }

    /// Path an exposed endpoint is served at.
    #[must_use]
    pub fn endpoint_path(&self, id: &str) -> Option<&str> {
        self.endpoints()
            .find_map(|(known, path)| (known == id).then_some(path))
    }

    /// Resolve a request path into an [`EndpointDescriptor`]. A single trailing
    /// slash is ignored.
    #[must_use]
    pub fn resolve(&self, path: &str) -> EndpointDescriptor {
        let lookup = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };

        match self.router.at(lookup) {
            Ok(matched) => EndpointDescriptor::management(path, matched.value.as_str()),
            Err(_) => EndpointDescriptor::application(path),
        }
    }
}

fn normalize_base_path(base_path: &str) -> Result<String, EndpointConfigError> {
    let trimmed = base_path.trim();
    if !trimmed.starts_with('/') || has_route_syntax(trimmed) {
        return Err(EndpointConfigError::InvalidBasePath(base_path.to_owned()));
    }
    Ok(trimmed.trim_end_matches('/').to_owned())
}

/// Braces anywhere, or a segment starting with `:` or `*`. Routers treat these as
/// captures or reject them outright.
fn has_route_syntax(path: &str) -> bool {
    path.contains(['{', '}'])
        || path
            .split('/')
            .any(|segment| segment.starts_with([':', '*']))
}

fn insert(
    router: &mut matchit::Router<String>,
    id: &str,
    route: String,
) -> Result<(), EndpointConfigError> {
    router
        .insert(route.as_str(), id.to_owned())
        .map_err(|source| EndpointConfigError::Conflict {
            id: id.to_owned(),
            route,
            source,
        })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolver() -> EndpointResolver {
        EndpointResolver::from_config(&ManagementConfig::default()).unwrap()
    }

    fn config(base_path: &str, exposed: &[&str]) -> ManagementConfig {
        ManagementConfig {
            base_path: base_path.to_owned(),
            exposed: exposed.iter().map(|s| (*s).to_owned()).collect(),
            path_mapping: HashMap::new(),
        }
    }

    #[test]
    fn exposed_endpoints_are_tagged() {
        let r = resolver();

        assert_eq!(r.resolve("/actuator/health").endpoint(), Some("health"));
        assert_eq!(r.resolve("/actuator/info").endpoint(), Some("info"));
        assert_eq!(r.resolve("/actuator/metrics").endpoint(), Some("metrics"));
        assert_eq!(r.resolve("/actuator/env").endpoint(), Some("env"));
    }

    #[test]
    fn nested_paths_belong_to_their_endpoint() {
        let r = resolver();

        assert_eq!(
            r.resolve("/actuator/health/liveness").endpoint(),
            Some("health")
        );
        assert_eq!(
            r.resolve("/actuator/metrics/jvm.memory.used").endpoint(),
            Some("metrics")
        );
        assert_eq!(r.resolve("/actuator/env/a/b/c").endpoint(), Some("env"));
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let r = resolver();

        let d = r.resolve("/actuator/health/");
        assert_eq!(d.endpoint(), Some("health"));
        assert_eq!(d.path(), "/actuator/health/");
        assert_eq!(r.resolve("/actuator/").endpoint(), Some(DISCOVERY_ENDPOINT));
    }

    #[test]
    fn base_path_is_the_discovery_page() {
        let r = resolver();

        assert_eq!(r.resolve("/actuator").endpoint(), Some(DISCOVERY_ENDPOINT));
    }

    #[test]
    fn lookalike_and_application_paths_are_untagged() {
        let r = resolver();

        for path in [
            "/",
            "/health",
            "/actuatorx/health",
            "/actuator/healthz",
            "/actuator/beans",
            "/api/actuator/health",
            "/Actuator/health",
        ] {
            let d = r.resolve(path);
            assert!(!d.is_management(), "{path} must be untagged");
            assert_eq!(d.path(), path);
        }
    }

    #[test]
    fn path_mapping_moves_endpoint() {
        let mut cfg = config("/manage", &["health", "info"]);
        cfg.path_mapping
            .insert("health".to_owned(), "/healthcheck/".to_owned());
        let r = EndpointResolver::from_config(&cfg).unwrap();

        assert_eq!(r.resolve("/manage/healthcheck").endpoint(), Some("health"));
        assert_eq!(
            r.resolve("/manage/healthcheck/readiness").endpoint(),
            Some("health")
        );
        assert!(!r.resolve("/manage/health").is_management());
        assert_eq!(r.resolve("/manage/info").endpoint(), Some("info"));
    }

    #[test]
    fn endpoint_paths_follow_mapping_and_order() {
        let mut cfg = config("/manage", &["info", "health"]);
        cfg.path_mapping
            .insert("health".to_owned(), "healthcheck".to_owned());
        let r = EndpointResolver::from_config(&cfg).unwrap();

        let listed: Vec<_> = r.endpoints().collect();
        assert_eq!(
            listed,
            vec![("info", "/manage/info"), ("health", "/manage/healthcheck")]
        );
        assert_eq!(r.endpoint_path("health"), Some("/manage/healthcheck"));
        assert_eq!(r.endpoint_path("metrics"), None);
    }

    #[test]
    fn root_base_path_mounts_endpoints_at_root_without_discovery() {
        let r = EndpointResolver::from_config(&config("/", &["health", "metrics"])).unwrap();

        assert_eq!(r.prefix(), "");
        assert_eq!(r.endpoint_path("health"), Some("/health"));
        assert_eq!(r.resolve("/health").endpoint(), Some("health"));
        assert_eq!(r.resolve("/metrics/http.requests").endpoint(), Some("metrics"));
        assert!(!r.resolve("/").is_management());
        assert!(!r.resolve("/orders").is_management());
    }

    #[test]
    fn base_path_trailing_slash_is_normalized() {
        let r = EndpointResolver::from_config(&config("/ops/", &["health"])).unwrap();

        assert_eq!(r.prefix(), "/ops");
        assert_eq!(r.resolve("/ops/health").endpoint(), Some("health"));
    }

    #[test]
    fn relative_base_path_is_rejected() {
        let err = EndpointResolver::from_config(&config("actuator", &["health"])).unwrap_err();
        assert!(matches!(err, EndpointConfigError::InvalidBasePath(_)));
    }

    #[test]
    fn blank_and_duplicate_ids_are_rejected() {
        let err = EndpointResolver::from_config(&config("/actuator", &["health", " "])).unwrap_err();
        assert!(matches!(err, EndpointConfigError::EmptyEndpointId));

        let err =
            EndpointResolver::from_config(&config("/actuator", &["health", "health"])).unwrap_err();
        assert!(matches!(err, EndpointConfigError::DuplicateEndpoint(id) if id == "health"));
    }

    #[test]
    fn route_syntax_in_mapping_is_rejected() {
        let mut cfg = config("/actuator", &["health"]);
        cfg.path_mapping
            .insert("health".to_owned(), "{id}".to_owned());

        let err = EndpointResolver::from_config(&cfg).unwrap_err();
        assert!(matches!(err, EndpointConfigError::InvalidPath { .. }));
    }

    #[test]
    fn colon_and_star_segments_are_rejected() {
        for base_path in ["/:mgmt", "/ops/*all", "/ops/:id/x"] {
            let err = EndpointResolver::from_config(&config(base_path, &["health"])).unwrap_err();
            assert!(
                matches!(err, EndpointConfigError::InvalidBasePath(_)),
                "{base_path} must be rejected"
            );
        }

        for mapped in [":x", "checks/:kind", "*rest"] {
            let mut cfg = config("/actuator", &["health"]);
            cfg.path_mapping
                .insert("health".to_owned(), mapped.to_owned());

            let err = EndpointResolver::from_config(&cfg).unwrap_err();
            assert!(
                matches!(err, EndpointConfigError::InvalidPath { .. }),
                "{mapped} must be rejected"
            );
        }
    }

    #[test]
    fn colon_inside_a_segment_is_allowed() {
        let mut cfg = config("/ops:v1", &["health"]);
        cfg.path_mapping
            .insert("health".to_owned(), "health:live".to_owned());
        let r = EndpointResolver::from_config(&cfg).unwrap();

        assert_eq!(r.resolve("/ops:v1/health:live").endpoint(), Some("health"));
    }

    #[test]
    fn two_ids_mapped_to_same_path_are_rejected() {
        let mut cfg = config("/actuator", &["health", "status"]);
        cfg.path_mapping
            .insert("status".to_owned(), "health".to_owned());

        let err = EndpointResolver::from_config(&cfg).unwrap_err();
        assert!(matches!(err, EndpointConfigError::Conflict { id, .. } if id == "status"));
    }

    #[test]
    fn nothing_exposed_leaves_only_discovery() {
        let r = EndpointResolver::from_config(&config("/actuator", &[])).unwrap();

        assert_eq!(r.resolve("/actuator").endpoint(), Some(DISCOVERY_ENDPOINT));
        assert!(!r.resolve("/actuator/health").is_management());
    }
}
