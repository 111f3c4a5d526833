pub mod package_spec;

pub use package_spec::parse_package_spec;
