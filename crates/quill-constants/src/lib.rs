pub const REGISTRY_URL: &str = "https://registry.npmjs.org";
pub const USER_AGENT: &str = "quill/0.1.0";
pub const MODULES_DIR: &str = "node_modules";
pub const MAX_PARALLEL_DOWNLOADS: usize = 20;
