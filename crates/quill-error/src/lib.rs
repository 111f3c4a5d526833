use std::fmt;

#[derive(Debug)]
pub enum PackageManagerError {
    PackageNotFound(String),
    ResolutionFailed(String, String),
    DownloadFailed(String, String),
    ExtractionFailed(String, String),
    NetworkError(String),
    InvalidPackageSpec(String),
    IoError(String),
}

impl fmt::Display for PackageManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PackageNotFound(name) => {
                write!(f, "Package '{name}' not found")
            }
            Self::ResolutionFailed(spec, reason) => {
                write!(f, "Resolution failed for {spec}: {reason}")
            }
            Self::DownloadFailed(name, version) => {
                write!(f, "Failed to download {name}@{version}")
            }
            Self::ExtractionFailed(name, reason) => {
                write!(f, "Failed to extract '{name}': {reason}")
            }
            Self::NetworkError(msg) => {
                write!(f, "Network error: {msg}")
            }
            Self::InvalidPackageSpec(spec) => {
                write!(f, "Invalid package specification: {spec}")
            }
            Self::IoError(msg) => {
                write!(f, "IO error: {msg}")
            }
        }
    }
}

impl std::error::Error for PackageManagerError {}

impl From<std::io::Error> for PackageManagerError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PackageManagerError>;
