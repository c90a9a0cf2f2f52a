use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("gcs-upload.toml");
    fs::write(&path, body).unwrap();
    path
}

const VALID: &str = r#"
static_dirs = ["public"]

[storage_options]
endpoint = "http://127.0.0.1:9"
access_key_id = "GOOG1EXAMPLE"
secret_access_key = "secret"

[upload_options]
bucket_name = "assets"
gzip = true
"#;

#[test]
fn validate_accepts_valid_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), VALID);

    Command::cargo_bin("gcs-upload")
        .unwrap()
        .args(["validate", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid configuration"))
        .stdout(predicate::str::contains("Bucket: assets"))
        .stdout(predicate::str::contains("Static dir: public"));
}

#[test]
fn validate_rejects_missing_bucket_name() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        dir.path(),
        r#"
        [storage_options]
        access_key_id = "GOOG1EXAMPLE"
        secret_access_key = "secret"

        [upload_options]
        gzip = true
        "#,
    );

    Command::cargo_bin("gcs-upload")
        .unwrap()
        .args(["validate", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("upload_options.bucket_name"));
}

#[test]
fn validate_reports_missing_file() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("gcs-upload")
        .unwrap()
        .args(["validate", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn run_reports_enumeration_failure_as_build_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("dist");
    let config = write_config(
        dir.path(),
        &format!(
            r#"
            directory = "{}"

            [storage_options]
            endpoint = "http://127.0.0.1:9"
            access_key_id = "GOOG1EXAMPLE"
            secret_access_key = "secret"

            [upload_options]
            bucket_name = "assets"
            "#,
            missing.display().to_string().replace('\\', "/")
        ),
    );

    Command::cargo_bin("gcs-upload")
        .unwrap()
        .args(["run", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Build errors:"))
        .stdout(predicate::str::contains("GcsUploadPlugin: Failed to enumerate"));
}

#[test]
fn run_with_empty_directory_uploads_nothing() {
    let dir = TempDir::new().unwrap();
    let dist = dir.path().join("dist");
    fs::create_dir_all(&dist).unwrap();
    let config = write_config(
        dir.path(),
        r#"
        [storage_options]
        endpoint = "http://127.0.0.1:9"
        access_key_id = "GOOG1EXAMPLE"
        secret_access_key = "secret"

        [upload_options]
        bucket_name = "assets"
        "#,
    );

    Command::cargo_bin("gcs-upload")
        .unwrap()
        .args(["run", "--config"])
        .arg(&config)
        .arg("--output-path")
        .arg(&dist)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 file(s) uploaded"));
}
