use std::fs;
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::thread;

use axum::Router;
use axum::routing::get;
use cs_core::config::{Invocation, RunConfiguration};
use cs_core::{GenerateError, GeneratedFile, Plugin};
use cs_openapi_fetch::{OpenApiFetchOptions, OpenApiFetchPlugin};
use cs_runner::{generate, generate_with, write_files};
use url::Url;

const PETSTORE: &str = include_str!("../../cs-core/tests/fixtures/petstore.json");

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("cs-core/tests/fixtures")
}

fn invocation(source: &str, cwd: &Path) -> Invocation {
    Invocation {
        source: Some(source.to_string()),
        outdir: Some(PathBuf::from("dist")),
        cwd: Some(cwd.to_path_buf()),
    }
}

fn types_file(files: &[GeneratedFile]) -> &str {
    &files
        .iter()
        .find(|f| f.filename == cs_typescript::TYPES_FILENAME)
        .expect("types file")
        .code
}

fn serve_petstore() -> SocketAddr {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let app = Router::new().route("/api/v3/openapi.json", get(|| async { PETSTORE }));
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

#[test]
fn officevice_local_source_forms_are_identical() {
    let tmp = tempfile::tempdir().unwrap();
    let path = fixtures_dir().join("officevice.yaml");

    let from_path = generate(&invocation(path.to_str().unwrap(), tmp.path())).unwrap();
    let url = Url::from_file_path(&path).unwrap();
    let from_url = generate(&invocation(url.as_str(), tmp.path())).unwrap();
    let from_relative = generate(&invocation("officevice.yaml", &fixtures_dir())).unwrap();

    assert_eq!(from_path.len(), 1);
    assert_eq!(types_file(&from_path), types_file(&from_url));
    assert_eq!(types_file(&from_path), types_file(&from_relative));
    insta::assert_snapshot!("officevice_types", types_file(&from_path));
}

#[test]
fn petstore_json() {
    let tmp = tempfile::tempdir().unwrap();
    let path = fixtures_dir().join("petstore.json");
    let files = generate(&invocation(path.to_str().unwrap(), tmp.path())).unwrap();

    insta::assert_snapshot!("petstore_types", types_file(&files));
}

#[test]
fn remote_source_matches_local() {
    let addr = serve_petstore();
    let tmp = tempfile::tempdir().unwrap();

    let remote = generate(&invocation(
        &format!("http://{addr}/api/v3/openapi.json"),
        tmp.path(),
    ))
    .unwrap();
    let local = generate(&invocation("petstore.json", &fixtures_dir())).unwrap();

    assert_eq!(remote, local);
}

#[test]
fn unreachable_remote_writes_nothing() {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let tmp = tempfile::tempdir().unwrap();
    let invocation = invocation(&format!("http://127.0.0.1:{port}/openapi.json"), tmp.path());

    let config = cs_runner::resolve(&invocation).unwrap();
    let err = generate_with(&config).unwrap_err();
    assert!(matches!(err, GenerateError::SourceUnreachable { .. }));
    assert_eq!(err.stage(), "source");
    assert!(!config.outdir.exists());
}

#[test]
fn openapi_fetch_client_from_config() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("create-schemas.config.yaml"),
        "plugins:\n  - openapi-fetch\n",
    )
    .unwrap();

    let path = fixtures_dir().join("petstore.json");
    let files = generate(&invocation(path.to_str().unwrap(), tmp.path())).unwrap();

    let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["types.ts", "client.ts"]);
    let client = &files[1].code;
    assert!(client.contains("import type { paths } from \"./types\";"));
    assert!(client.contains("export const defaultBaseUrl = \"/api/v3\";"));
}

#[test]
fn enums_from_config() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("create-schemas.config.json"),
        r#"{ "openApiTsOptions": { "enum": true } }"#,
    )
    .unwrap();

    let path = fixtures_dir().join("enums.yaml");
    let files = generate(&invocation(path.to_str().unwrap(), tmp.path())).unwrap();
    let types = types_file(&files);

    for name in ["Status", "Priority", "UserStatus", "TaskPriority"] {
        assert!(types.contains(&format!("export enum {name} {{")));
    }
    assert!(!types.contains("export type UserStatus = components[\"schemas\"][\"user-status\"];"));
    assert!(!types.contains("export type TaskPriority = components[\"schemas\"][\"task.priority\"];"));
    assert!(types.contains("export type Task = components[\"schemas\"][\"Task\"];"));
    insta::assert_snapshot!("enums_types", types);
}

#[test]
fn unknown_plugin_is_a_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("create-schemas.config.yaml"),
        "plugins:\n  - openapi-axios\n",
    )
    .unwrap();

    let err = generate(&invocation("petstore.json", tmp.path())).unwrap_err();
    assert!(matches!(err, GenerateError::Configuration(_)));
    assert_eq!(err.stage(), "config");
}

fn fetch_plugin(base_url: &str) -> Arc<dyn Plugin> {
    Arc::new(OpenApiFetchPlugin::new(OpenApiFetchOptions {
        base_url: Some(base_url.to_string()),
        filename: None,
    }))
}

#[test]
fn conflicting_client_files_fail_the_run() {
    let mut config = RunConfiguration::new(fixtures_dir().join("petstore.json").display().to_string());
    config.plugins = vec![fetch_plugin("https://a.test"), fetch_plugin("https://b.test")];

    match generate_with(&config).unwrap_err() {
        GenerateError::DuplicateOutputFile {
            filename,
            first_plugin,
            second_plugin,
        } => {
            assert_eq!(filename, "client.ts");
            assert_eq!(first_plugin, "openapi-fetch");
            assert_eq!(second_plugin, "openapi-fetch");
        }
        other => panic!("expected DuplicateOutputFile, got {other:?}"),
    }
}

#[test]
fn identical_client_files_merge() {
    let mut config = RunConfiguration::new(fixtures_dir().join("petstore.json").display().to_string());
    config.plugins = vec![fetch_plugin("https://a.test"), fetch_plugin("https://a.test")];

    let files = generate_with(&config).unwrap();
    let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["types.ts", "client.ts"]);
}

#[test]
fn repeated_runs_are_identical() {
    let mut config = RunConfiguration::new(fixtures_dir().join("officevice.yaml").display().to_string());
    config.compiler.enums = true;
    config.plugins = vec![fetch_plugin("https://a.test")];

    let first = generate_with(&config).unwrap();
    let second = generate_with(&config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn concurrent_runs_do_not_interfere() {
    let handles: Vec<_> = ["officevice.yaml", "petstore.json", "enums.yaml"]
        .into_iter()
        .map(|name| {
            thread::spawn(move || {
                let config = RunConfiguration::new(fixtures_dir().join(name).display().to_string());
                generate_with(&config).unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (result, name) in results.iter().zip(["officevice.yaml", "petstore.json", "enums.yaml"]) {
        let config = RunConfiguration::new(fixtures_dir().join(name).display().to_string());
        assert_eq!(result, &generate_with(&config).unwrap());
    }
}

#[test]
fn generate_then_write() {
    let tmp = tempfile::tempdir().unwrap();
    let path = fixtures_dir().join("officevice.yaml");
    let invocation = invocation(path.to_str().unwrap(), tmp.path());

    let config = cs_runner::resolve(&invocation).unwrap();
    assert_eq!(config.outdir, tmp.path().join("dist"));

    let files = generate_with(&config).unwrap();
    let written = write_files(&config.outdir, &files).unwrap();
    assert_eq!(written, vec![tmp.path().join("dist").join("types.ts")]);
    assert_eq!(fs::read_to_string(&written[0]).unwrap(), files[0].code);
}
