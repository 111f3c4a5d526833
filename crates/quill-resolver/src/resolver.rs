use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;

use quill_constants::REGISTRY_URL;
use quill_registry::RegistryClient;

use crate::cache::MetadataCache;
use crate::metadata::parse_package_metadata;
use crate::{PackageSpec, ResolutionResult, ResolvedPackage};

/// Shared by every traversal task spawned under one `resolve` call. One lock
/// guards both fields; it is held only for check-and-insert, never across
/// network I/O.
#[derive(Default)]
struct ResolutionState {
    install_map: HashMap<String, ResolvedPackage>,
    errors: Vec<String>,
}

pub struct DependencyResolver {
    registry: Arc<RegistryClient>,
    registry_url: String,
    cache: MetadataCache,
    debug: bool,
}

impl DependencyResolver {
    pub fn new(registry: Arc<RegistryClient>, cache: MetadataCache, debug: bool) -> Self {
        Self {
            registry,
            registry_url: REGISTRY_URL.to_string(),
            cache,
            debug,
        }
    }

    pub fn with_registry_url(mut self, url: &str) -> Self {
        self.registry_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Walks the full transitive dependency closure of `requested`. All
    /// failure is value-level: a failed branch lands in the error message,
    /// never a panic across this boundary.
    pub async fn resolve(&self, requested: PackageSpec) -> ResolutionResult {
        quill_logger::debug(
            &format!("Resolving dependency tree for {requested}"),
            self.debug,
        );

        let state = Arc::new(Mutex::new(ResolutionState::default()));
        let resolved = self
            .resolve_recursive(requested.clone(), state.clone(), HashSet::new())
            .await;

        let state = state.lock().await;
        if resolved {
            ResolutionResult {
                requested,
                packages_to_install: state.install_map.values().cloned().collect(),
                success: true,
                error_message: String::new(),
            }
        } else {
            let error_message = if state.errors.is_empty() {
                format!("Unknown error during resolution for {requested}")
            } else {
                state.errors.join("; ")
            };
            ResolutionResult {
                requested,
                packages_to_install: Vec::new(),
                success: false,
                error_message,
            }
        }
    }

    /// One traversal branch. `visited_on_path` is this branch's own copy of
    /// the request keys seen between the root and here; forks clone it, so
    /// sibling branches never observe each other's path.
    fn resolve_recursive<'a>(
        &'a self,
        spec: PackageSpec,
        state: Arc<Mutex<ResolutionState>>,
        mut visited_on_path: HashSet<String>,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            let request_key = spec.request_key();

            if visited_on_path.contains(&request_key) {
                // Cycle on this path: the ancestor already in flight owns the
                // subtree, so this branch is done.
                quill_logger::debug(
                    &format!("Cycle detected for {request_key} on current path"),
                    self.debug,
                );
                return true;
            }
            visited_on_path.insert(request_key.clone());

            let info = match self.fetch_and_parse(&spec).await {
                Some(info) => info,
                None => {
                    let message =
                        format!("Could not retrieve valid package info for {request_key}");
                    state.lock().await.errors.push(message);
                    return false;
                }
            };

            let resolved_key = info.resolved_key();
            {
                let mut shared = state.lock().await;
                if shared.install_map.contains_key(&resolved_key) {
                    quill_logger::debug(
                        &format!(
                            "{resolved_key} (from {request_key}) already resolved globally"
                        ),
                        self.debug,
                    );
                    return true;
                }
                // Inserted before any dependency starts walking, so a
                // descendant that rediscovers this resolved key will see it
                // and skip.
                shared.install_map.insert(resolved_key.clone(), info.clone());
            }

            if info.dependencies.is_empty() {
                return true;
            }

            quill_logger::debug(
                &format!(
                    "Walking {} dependencies of {resolved_key}",
                    info.dependencies.len()
                ),
                self.debug,
            );

            let branches: Vec<_> = info
                .dependencies
                .iter()
                .map(|(dep_name, dep_requirement)| {
                    self.resolve_recursive(
                        PackageSpec::new(dep_name, dep_requirement),
                        state.clone(),
                        visited_on_path.clone(),
                    )
                })
                .collect();

            join_all(branches).await.into_iter().all(|resolved| resolved)
        })
    }

    /// Cache-first metadata fetch. Only valid packages are cached, so a
    /// failed fetch is retried the next time the same key is referenced.
    async fn fetch_and_parse(&self, spec: &PackageSpec) -> Option<ResolvedPackage> {
        let version_to_fetch = normalize_version_requirement(&spec.version_requirement);
        if version_to_fetch != spec.version_requirement {
            quill_logger::debug(
                &format!(
                    "Version range \"{}\" for {} defaults to 'latest'",
                    spec.version_requirement, spec.name
                ),
                self.debug,
            );
        }

        let cache_key = format!("{}@{}", spec.name, version_to_fetch);
        if let Some(cached) = self.cache.lookup(&cache_key).await {
            quill_logger::debug(&format!("Metadata cache hit for {cache_key}"), self.debug);
            return Some(cached);
        }

        let url = format!("{}/{}/{}", self.registry_url, spec.name, version_to_fetch);
        let body = match self.registry.get(&url).await {
            Ok(body) => body,
            Err(e) => {
                quill_logger::error(&format!("Failed to fetch metadata for {spec}: {e}"));
                return None;
            }
        };

        let info = parse_package_metadata(&spec.name, &body)?;
        self.cache.insert(cache_key, info.clone()).await;
        Some(info)
    }
}

/// An empty requirement means `latest`; anything carrying a range operator
/// is simplified to `latest` as well, since real range resolution is out of
/// scope here.
fn normalize_version_requirement(requirement: &str) -> String {
    if requirement.is_empty() {
        return "latest".to_string();
    }

    let has_range_operator = requirement
        .chars()
        .any(|c| matches!(c, '^' | '~' | 'x' | '*' | '>' | '<'));

    if requirement != "latest" && has_range_operator {
        "latest".to_string()
    } else {
        requirement.to_string()
    }
}
