use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use flate2::read::GzDecoder;
use tar::Archive;

use quill_error::{PackageManagerError, Result};
use quill_registry::RegistryClient;

/// Downloads a package tarball to a scratch file and unpacks it under the
/// destination tree. Stateless: every call gets its own scratch file and its
/// own extraction directory, so concurrent calls never contend.
pub struct TarballHandler {
    registry: Arc<RegistryClient>,
}

impl TarballHandler {
    pub fn new(registry: Arc<RegistryClient>) -> Self {
        Self { registry }
    }

    pub async fn download_and_extract(
        &self,
        tarball_url: &str,
        package_name: &str,
        package_version: &str,
        base_destination: &Path,
        debug: bool,
    ) -> Result<()> {
        // The .tar.gz suffix is part of the unique name from the start, so
        // there is no window where another call could claim the same path.
        let scratch = tempfile::Builder::new()
            .prefix("quill-")
            .suffix(".tar.gz")
            .tempfile()
            .map_err(|e| PackageManagerError::IoError(format!("creating scratch file: {e}")))?
            .into_temp_path();

        quill_logger::debug(
            &format!(
                "Downloading {package_name}@{package_version} to {}",
                scratch.display()
            ),
            debug,
        );

        if let Err(e) = self.registry.download_file(tarball_url, &scratch).await {
            quill_logger::error(&format!(
                "Failed to download tarball from {tarball_url}: {e}"
            ));
            return Err(PackageManagerError::DownloadFailed(
                package_name.to_string(),
                package_version.to_string(),
            ));
        }

        // A scoped name like @scope/pkg keeps its literal slash and becomes
        // a two-segment path under node_modules.
        let extract_dir = base_destination.join(package_name);
        fs::create_dir_all(&extract_dir).map_err(|e| {
            PackageManagerError::IoError(format!("creating {}: {e}", extract_dir.display()))
        })?;

        quill_logger::debug(
            &format!(
                "Extracting {package_name}@{package_version} into {}",
                extract_dir.display()
            ),
            debug,
        );

        Self::extract_tarball(&scratch, &extract_dir).map_err(|e| {
            PackageManagerError::ExtractionFailed(
                format!("{package_name}@{package_version}"),
                e.to_string(),
            )
        })?;

        if let Err(e) = scratch.close() {
            quill_logger::warn(&format!("Failed to remove temporary tarball: {e}"));
        }

        Ok(())
    }

    /// Unpacks a gzip-compressed tar archive, dropping the first path
    /// component of every entry. Registry tarballs wrap their contents in a
    /// top-level `package/` directory; without stripping, files would land
    /// one level too deep.
    fn extract_tarball(archive_path: &Path, extract_to: &Path) -> io::Result<()> {
        let file = fs::File::open(archive_path)?;
        let mut archive = Archive::new(GzDecoder::new(file));

        for entry in archive.entries()? {
            let mut entry = entry?;
            let entry_path = entry.path()?.into_owned();

            let stripped: PathBuf = entry_path.components().skip(1).collect();
            if stripped.as_os_str().is_empty() {
                // The top-level directory itself.
                continue;
            }
            if stripped
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                // Entries that try to climb out of the destination.
                continue;
            }

            let target = extract_to.join(&stripped);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            entry.unpack(&target)?;
        }

        Ok(())
    }
}
