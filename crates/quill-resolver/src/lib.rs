use std::collections::HashMap;
use std::fmt;

pub mod cache;
pub mod metadata;
pub mod resolver;

pub use cache::MetadataCache;
pub use resolver::DependencyResolver;

/// A user-level or dependency-level request: a package name plus the raw
/// version requirement it was asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version_requirement: String,
}

impl PackageSpec {
    pub fn new(name: &str, version_requirement: &str) -> Self {
        Self {
            name: name.to_string(),
            version_requirement: version_requirement.to_string(),
        }
    }

    /// Identity of this node in the raw request graph.
    pub fn request_key(&self) -> String {
        format!("{}@{}", self.name, self.version_requirement)
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version_requirement)
    }
}

/// Registry metadata for one concrete package version.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    pub tarball: String,
    pub dependencies: HashMap<String, String>, // name => version requirement
}

impl ResolvedPackage {
    /// Identity of this node after registry lookup; the install map dedupes
    /// on this, not on the request key.
    pub fn resolved_key(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

#[derive(Clone, Debug)]
pub struct ResolutionResult {
    pub requested: PackageSpec,
    pub packages_to_install: Vec<ResolvedPackage>,
    pub success: bool,
    pub error_message: String,
}
