pub fn parse_package_spec(spec: &str) -> (String, String) {
    if let Some(rest) = spec.strip_prefix('@') {
        // Scoped package: the version separator is the next '@' after the scope
        match rest.split_once('@') {
            Some((name, version)) if !version.is_empty() => {
                (format!("@{name}"), version.to_string())
            }
            Some((name, _)) => (format!("@{name}"), "latest".to_string()),
            None => (spec.to_string(), "latest".to_string()),
        }
    } else {
        match spec.split_once('@') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                (name.to_string(), version.to_string())
            }
            Some((name, _)) if !name.is_empty() => (name.to_string(), "latest".to_string()),
            _ => (spec.to_string(), "latest".to_string()),
        }
    }
}
