use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use quill_constants::MODULES_DIR;
use quill_error::{PackageManagerError, Result};
use quill_registry::RegistryClient;
use quill_resolver::{DependencyResolver, MetadataCache, PackageSpec};
use quill_utils::parse_package_spec;

use crate::tarball::TarballHandler;

/// Drives resolve-then-download for every user argument. The resolver's
/// metadata cache lives as long as this manager, so later arguments reuse
/// metadata fetched for earlier ones.
pub struct InstallManager {
    resolver: DependencyResolver,
    tarballs: TarballHandler,
    debug: bool,
}

impl InstallManager {
    pub fn new(debug: bool) -> Self {
        let registry = Arc::new(RegistryClient::new());
        Self {
            resolver: DependencyResolver::new(registry.clone(), MetadataCache::new(), debug),
            tarballs: TarballHandler::new(registry),
            debug,
        }
    }

    /// Points the resolver at a different registry. Used by tests to run
    /// against a local fixture server.
    pub fn with_registry_url(debug: bool, registry_url: &str) -> Self {
        let registry = Arc::new(RegistryClient::new());
        Self {
            resolver: DependencyResolver::new(registry.clone(), MetadataCache::new(), debug)
                .with_registry_url(registry_url),
            tarballs: TarballHandler::new(registry),
            debug,
        }
    }

    pub fn install_packages(&self, project_dir: &str, packages: &[String]) -> Result<()> {
        let rt = tokio::runtime::Runtime::new().map_err(|e| {
            PackageManagerError::IoError(format!("Failed to create async runtime: {e}"))
        })?;
        rt.block_on(self.install_packages_async(project_dir, packages))
    }

    /// Installs each requested package in turn. A failed argument is
    /// reported and skipped; only failure to create the destination tree
    /// aborts the whole command.
    pub async fn install_packages_async(
        &self,
        project_dir: &str,
        packages: &[String],
    ) -> Result<()> {
        if packages.is_empty() {
            quill_logger::error("No packages specified for install");
            return Ok(());
        }

        let destination = Path::new(project_dir).join(MODULES_DIR);
        if let Err(e) = std::fs::create_dir_all(&destination) {
            quill_logger::error(&format!(
                "Failed to create installation directory {}: {e}",
                destination.display()
            ));
            return Err(PackageManagerError::IoError(e.to_string()));
        }

        for raw_spec in packages {
            self.install_one(&destination, raw_spec).await;
        }

        Ok(())
    }

    async fn install_one(&self, destination: &Path, raw_spec: &str) {
        let overall_start = Instant::now();
        let (name, version_requirement) = parse_package_spec(raw_spec);
        let spec = PackageSpec::new(&name, &version_requirement);

        quill_logger::status(&format!("Resolving {spec}..."));
        let resolve_start = Instant::now();
        let result = self.resolver.resolve(spec.clone()).await;
        quill_logger::debug(
            &format!("Resolution for {spec} took {:?}", resolve_start.elapsed()),
            self.debug,
        );

        if !result.success {
            quill_logger::error(&format!(
                "Resolution failed for {spec}: {}",
                result.error_message
            ));
            return;
        }

        if result.packages_to_install.is_empty() {
            quill_logger::success(&format!("Already up-to-date: {spec}"));
            return;
        }

        quill_logger::status(&format!(
            "Installing {} packages for {spec}...",
            result.packages_to_install.len()
        ));

        let downloads: Vec<_> = result
            .packages_to_install
            .iter()
            .map(|pkg| {
                self.tarballs.download_and_extract(
                    &pkg.tarball,
                    &pkg.name,
                    &pkg.version,
                    destination,
                    self.debug,
                )
            })
            .collect();

        let mut all_ok = true;
        for outcome in join_all(downloads).await {
            if let Err(e) = outcome {
                quill_logger::error(&e.to_string());
                all_ok = false;
            }
        }

        if all_ok {
            quill_logger::success(&format!("Installed {spec}"));
        } else {
            quill_logger::error(&format!("Installation failed for {spec}"));
        }

        quill_logger::debug(
            &format!("Total time for {spec}: {:?}", overall_start.elapsed()),
            self.debug,
        );
    }
}
