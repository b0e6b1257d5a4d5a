//! CLI Tests
//!
//! Runs the `event-schema` binary against the descriptor fixtures.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn run(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_event-schema"))
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_derive_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = fixtures_path().join("descriptors/email_created.toml");
    let target = dir.path().join("email.json");

    let output = run(
        dir.path(),
        &["derive", descriptor.to_str().unwrap(), "-o", target.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(document["type"], "email.created");
    assert_eq!(document["properties"]["Email"]["dataType"], "Mail.EmailAddress");
    assert_eq!(document["properties"]["Email"]["properties"]["Address"]["required"], true);

    let stderr = String::from_utf8_lossy(&output.stderr);
    let fingerprint = stderr
        .lines()
        .find_map(|line| line.strip_prefix("🔒 "))
        .unwrap();
    assert_eq!(fingerprint.len(), 64);
}

#[test]
fn test_derive_to_stdout_uses_config_format() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("event-schemas.toml"),
        "[writer]\noutput_format = \"pretty\"\n",
    )
    .unwrap();
    let descriptor = fixtures_path().join("descriptors/person_created_v3.json");

    let pretty = run(dir.path(), &["derive", descriptor.to_str().unwrap()]);
    assert!(pretty.status.success());
    let pretty = String::from_utf8(pretty.stdout).unwrap();
    assert!(pretty.starts_with("{\n  \"type\": \"person.created\""));

    let compact = run(dir.path(), &["derive", descriptor.to_str().unwrap(), "--compact"]);
    assert!(compact.status.success());
    let compact = String::from_utf8(compact.stdout).unwrap();
    assert!(compact.starts_with(r#"{"type":"person.created""#));
}

#[test]
fn test_derive_rejects_plain_type() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = fixtures_path().join("descriptors/postal_address.json");

    let output = run(dir.path(), &["derive", descriptor.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not an event data type"));
}

#[test]
fn test_export_directory() {
    let dir = tempfile::tempdir().unwrap();
    let source = fixtures_path().join("descriptors");
    let target = dir.path().join("out");

    let output = run(
        dir.path(),
        &["export", source.to_str().unwrap(), "-o", target.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(target.join("person.created/3.0.json").is_file());
    assert!(target.join("email.created/1.0.json").is_file());

    let manifest = std::fs::read_to_string(target.join("checksums.sha256")).unwrap();
    let lines: Vec<_> = manifest.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let (checksum, file) = line.split_once("  ").unwrap();
        let content = std::fs::read_to_string(target.join(file)).unwrap();
        assert!(event_schemas::Checksum::from(checksum).verify(&content));
    }
}

#[test]
fn test_export_skips_event_types_that_leave_the_output() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("descriptors");
    std::fs::create_dir(&source).unwrap();
    std::fs::copy(
        fixtures_path().join("descriptors/email_created.toml"),
        source.join("email_created.toml"),
    )
    .unwrap();
    for (file, event_type) in [("escape.json", "../escape"), ("parent.json", "..")] {
        let descriptor = serde_json::json!({
            "name": "Evil.Created",
            "event": { "eventType": event_type, "dataSchema": "1.0" },
            "members": [{ "name": "Id", "type": "string" }]
        });
        std::fs::write(source.join(file), descriptor.to_string()).unwrap();
    }
    let target = dir.path().join("out");

    let output = run(
        dir.path(),
        &["export", source.to_str().unwrap(), "-o", target.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(target.join("email.created/1.0.json").is_file());
    assert!(!dir.path().join("escape").exists());
    assert!(!dir.path().join("1.0.json").exists());
    let manifest = std::fs::read_to_string(target.join("checksums.sha256")).unwrap();
    assert_eq!(manifest.lines().count(), 1);
}

#[test]
fn test_config_save() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("saved.toml");

    let output = run(dir.path(), &["config", "--save", target.to_str().unwrap()]);
    assert!(output.status.success());

    let saved = std::fs::read_to_string(&target).unwrap();
    assert!(saved.contains("[writer]"));
    assert!(saved.contains("[export]"));
}
