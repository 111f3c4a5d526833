use std::fs;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quill_core::InstallManager;

fn build_tarball(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (entry_path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, entry_path, contents.as_bytes())
            .expect("append tar entry");
    }

    builder
        .into_inner()
        .expect("finish tar stream")
        .finish()
        .expect("finish gzip stream")
}

/// Registers both the metadata document and the tarball it points at.
async fn mount_package(
    server: &MockServer,
    name: &str,
    version: &str,
    dependencies: serde_json::Value,
    files: &[(&str, &str)],
) {
    let tarball_path = format!("/tarballs/{}-{}.tgz", name.replace('/', "-"), version);
    let metadata = json!({
        "name": name,
        "version": version,
        "dist": { "tarball": format!("{}{}", server.uri(), tarball_path) },
        "dependencies": dependencies,
    });

    Mock::given(method("GET"))
        .and(path(format!("/{name}/latest")))
        .respond_with(ResponseTemplate::new(200).set_body_string(metadata.to_string()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(tarball_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(build_tarball(files), "application/octet-stream"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_install_single_leaf() {
    let server = MockServer::start().await;
    mount_package(
        &server,
        "left-pad",
        "1.3.0",
        json!({}),
        &[
            ("package/package.json", r#"{"name":"left-pad","version":"1.3.0"}"#),
            ("package/index.js", "module.exports = pad;\n"),
        ],
    )
    .await;

    let project = tempfile::tempdir().expect("tempdir");
    let manager = InstallManager::with_registry_url(false, &server.uri());
    manager
        .install_packages_async(
            project.path().to_str().expect("utf-8 path"),
            &["left-pad".to_string()],
        )
        .await
        .expect("install succeeds");

    let pkg_dir = project.path().join("node_modules").join("left-pad");
    assert!(pkg_dir.join("package.json").exists());
    assert!(pkg_dir.join("index.js").exists());
    // The archive's top-level directory must not survive extraction.
    assert!(!pkg_dir.join("package").exists());
}

#[tokio::test]
async fn test_install_scoped_package_uses_two_segment_path() {
    let server = MockServer::start().await;
    mount_package(
        &server,
        "@scope/pkg",
        "2.0.0",
        json!({}),
        &[("package/index.js", "module.exports = 1;\n")],
    )
    .await;

    let project = tempfile::tempdir().expect("tempdir");
    let manager = InstallManager::with_registry_url(false, &server.uri());
    manager
        .install_packages_async(
            project.path().to_str().expect("utf-8 path"),
            &["@scope/pkg".to_string()],
        )
        .await
        .expect("install succeeds");

    let pkg_dir = project
        .path()
        .join("node_modules")
        .join("@scope")
        .join("pkg");
    assert!(pkg_dir.join("index.js").exists());
}

#[tokio::test]
async fn test_install_diamond_extracts_every_package_once() {
    let server = MockServer::start().await;
    mount_package(
        &server,
        "a",
        "1.0.0",
        json!({ "b": "latest", "c": "latest" }),
        &[("package/a.js", "module.exports = 'a';\n")],
    )
    .await;
    mount_package(
        &server,
        "b",
        "1.0.0",
        json!({ "d": "latest" }),
        &[("package/b.js", "module.exports = 'b';\n")],
    )
    .await;
    mount_package(
        &server,
        "c",
        "1.0.0",
        json!({ "d": "latest" }),
        &[("package/c.js", "module.exports = 'c';\n")],
    )
    .await;
    mount_package(
        &server,
        "d",
        "1.0.0",
        json!({}),
        &[("package/d.js", "module.exports = 'd';\n")],
    )
    .await;

    let project = tempfile::tempdir().expect("tempdir");
    let manager = InstallManager::with_registry_url(false, &server.uri());
    manager
        .install_packages_async(
            project.path().to_str().expect("utf-8 path"),
            &["a".to_string()],
        )
        .await
        .expect("install succeeds");

    let modules = project.path().join("node_modules");
    for (name, file) in [("a", "a.js"), ("b", "b.js"), ("c", "c.js"), ("d", "d.js")] {
        assert!(modules.join(name).join(file).exists(), "{name} missing");
    }

    // d was requested twice (by b and by c) but downloaded once.
    let tarball_requests = server
        .received_requests()
        .await
        .expect("recording enabled")
        .iter()
        .filter(|r| r.url.path() == "/tarballs/d-1.0.0.tgz")
        .count();
    assert_eq!(tarball_requests, 1);
}

#[tokio::test]
async fn test_failed_download_does_not_stop_later_arguments() {
    let server = MockServer::start().await;

    // broken's metadata is fine but its tarball 404s.
    let metadata = json!({
        "name": "broken",
        "version": "1.0.0",
        "dist": { "tarball": format!("{}/tarballs/broken-1.0.0.tgz", server.uri()) },
        "dependencies": {},
    });
    Mock::given(method("GET"))
        .and(path("/broken/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(metadata.to_string()))
        .mount(&server)
        .await;

    mount_package(
        &server,
        "fine",
        "1.0.0",
        json!({}),
        &[("package/index.js", "module.exports = 'fine';\n")],
    )
    .await;

    let project = tempfile::tempdir().expect("tempdir");
    let manager = InstallManager::with_registry_url(false, &server.uri());
    manager
        .install_packages_async(
            project.path().to_str().expect("utf-8 path"),
            &["broken".to_string(), "fine".to_string()],
        )
        .await
        .expect("partial failure is not a command failure");

    let modules = project.path().join("node_modules");
    assert!(modules.join("fine").join("index.js").exists());
    assert!(!modules.join("broken").join("index.js").exists());
}

#[tokio::test]
async fn test_failed_resolution_does_not_stop_later_arguments() {
    let server = MockServer::start().await;
    mount_package(
        &server,
        "fine",
        "1.0.0",
        json!({}),
        &[("package/index.js", "module.exports = 'fine';\n")],
    )
    .await;

    let project = tempfile::tempdir().expect("tempdir");
    let manager = InstallManager::with_registry_url(false, &server.uri());
    manager
        .install_packages_async(
            project.path().to_str().expect("utf-8 path"),
            &["ghost".to_string(), "fine".to_string()],
        )
        .await
        .expect("partial failure is not a command failure");

    assert!(project
        .path()
        .join("node_modules")
        .join("fine")
        .join("index.js")
        .exists());
}

#[tokio::test]
async fn test_version_argument_is_fetched_verbatim() {
    let server = MockServer::start().await;
    let tarball_path = "/tarballs/pinned-2.2.2.tgz";
    let metadata = json!({
        "name": "pinned",
        "version": "2.2.2",
        "dist": { "tarball": format!("{}{}", server.uri(), tarball_path) },
        "dependencies": {},
    });
    Mock::given(method("GET"))
        .and(path("/pinned/2.2.2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(metadata.to_string()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(tarball_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            build_tarball(&[("package/index.js", "module.exports = 2;\n")]),
            "application/octet-stream",
        ))
        .mount(&server)
        .await;

    let project = tempfile::tempdir().expect("tempdir");
    let manager = InstallManager::with_registry_url(false, &server.uri());
    manager
        .install_packages_async(
            project.path().to_str().expect("utf-8 path"),
            &["pinned@2.2.2".to_string()],
        )
        .await
        .expect("install succeeds");

    assert!(project
        .path()
        .join("node_modules")
        .join("pinned")
        .join("index.js")
        .exists());
}

#[tokio::test]
async fn test_node_modules_created_under_project_dir() {
    let server = MockServer::start().await;
    mount_package(
        &server,
        "left-pad",
        "1.3.0",
        json!({}),
        &[("package/index.js", "module.exports = pad;\n")],
    )
    .await;

    let project = tempfile::tempdir().expect("tempdir");
    let nested = project.path().join("app");
    fs::create_dir_all(&nested).expect("create project dir");

    let manager = InstallManager::with_registry_url(false, &server.uri());
    manager
        .install_packages_async(
            nested.to_str().expect("utf-8 path"),
            &["left-pad".to_string()],
        )
        .await
        .expect("install succeeds");

    assert!(nested.join("node_modules").join("left-pad").is_dir());
}
