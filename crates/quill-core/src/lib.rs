pub mod install;
pub mod tarball;

pub use install::InstallManager;
pub use tarball::TarballHandler;

pub fn install_packages(project_dir: &str, packages: &[String], debug: bool) -> anyhow::Result<()> {
    let manager = InstallManager::new(debug);
    manager
        .install_packages(project_dir, packages)
        .map_err(|e| anyhow::anyhow!(e))
}
