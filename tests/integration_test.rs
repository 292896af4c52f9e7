use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const ENV_VARS: [&str; 7] = [
    "SP_METADATA",
    "DATA_DIR",
    "SP_METADATA_LANG",
    "SSLLABS_SKIP",
    "SSLLABS_FORCE_NEW",
    "SSLLABS_API",
    "RUST_LOG",
];

/// Binary with a clean environment; `home` keeps a user rc file out of the run.
fn spmetacheck(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("spmetacheck").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home).arg("--no-color");
    cmd
}

fn read_report(data_dir: &Path) -> Value {
    let raw = fs::read_to_string(data_dir.join("sp-metadata-extra.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn assertions<'a>(report: &'a Value, check: &str) -> &'a Vec<Value> {
    report["sp"]["metadata_extra"][check]["assertions"]
        .as_array()
        .unwrap()
}

// ── Good fixture ──

#[test]
fn good_metadata_exits_zero() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "--data-dir"])
        .arg(tmp.path())
        .arg("tests/fixtures/good.xml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Summary:"))
        .stdout(predicate::str::contains("PASS"))
        .stdout(predicate::str::contains("SKIP"));
}

#[test]
fn good_metadata_report_has_every_check_but_tls() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "--data-dir"])
        .arg(tmp.path())
        .arg("tests/fixtures/good.xml")
        .assert()
        .success();

    let report = read_report(tmp.path());
    let checks = report["sp"]["metadata_extra"].as_object().unwrap();
    let mut ids: Vec<&str> = checks.keys().map(String::as_str).collect();
    ids.sort_unstable();
    assert_eq!(
        ids,
        [
            "attribute_name_format",
            "entity_id_validity",
            "organization_localization",
            "sso_descriptor_protocol",
            "sso_descriptor_signing",
        ]
    );
    for check in ids {
        assert!(assertions(&report, check).is_empty(), "{check}");
        assert!(report["sp"]["metadata_extra"][check]["description"].is_string());
    }
}

#[test]
fn report_is_indented_with_two_spaces() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "--data-dir"])
        .arg(tmp.path())
        .arg("tests/fixtures/good.xml")
        .assert()
        .success();

    let raw = fs::read_to_string(tmp.path().join("sp-metadata-extra.json")).unwrap();
    assert!(raw.starts_with("{\n  \"sp\": {\n    \"metadata_extra\""));
}

#[test]
fn latin1_metadata_is_decoded() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "--data-dir"])
        .arg(tmp.path())
        .arg("tests/fixtures/latin1.xml")
        .assert()
        .success();
    assert!(assertions(&read_report(tmp.path()), "organization_localization").is_empty());
}

#[test]
fn metadata_and_switches_from_environment() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .env("SP_METADATA", "tests/fixtures/good.xml")
        .env("SSLLABS_SKIP", "1")
        .env("DATA_DIR", tmp.path())
        .assert()
        .success();
    assert!(tmp.path().join("sp-metadata-extra.json").exists());
}

#[test]
fn other_language_fails_organization_check() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "--lang", "en", "--data-dir"])
        .arg(tmp.path())
        .arg("tests/fixtures/good.xml")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("an EN localised OrganizationName must be present"));

    let report = read_report(tmp.path());
    assert_eq!(assertions(&report, "organization_localization").len(), 3);
}

#[test]
fn rc_file_in_home_is_used() {
    let tmp = TempDir::new().unwrap();
    let data_dir = tmp.path().join("rc-data");
    fs::write(
        tmp.path().join(".spmetacheckrc"),
        format!("skip_tls = true\ndata_dir = {:?}\n", data_dir.display().to_string()),
    )
    .unwrap();

    spmetacheck(tmp.path())
        .arg("tests/fixtures/good.xml")
        .assert()
        .success();
    assert!(data_dir.join("sp-metadata-extra.json").exists());
}

// ── Insecure fixture ──

#[test]
fn insecure_metadata_exits_one() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "--data-dir"])
        .arg(tmp.path())
        .arg("tests/fixtures/insecure.xml")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("HTTPS"));
}

#[test]
fn insecure_metadata_report_lists_failures() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "--data-dir"])
        .arg(tmp.path())
        .arg("tests/fixtures/insecure.xml")
        .assert()
        .code(1);

    let report = read_report(tmp.path());
    let entity = assertions(&report, "entity_id_validity");
    assert_eq!(entity.len(), 1);
    assert_eq!(entity[0]["context"]["value"], "http://sp.example.org/metadata");

    assert_eq!(assertions(&report, "sso_descriptor_protocol").len(), 1);
    assert_eq!(assertions(&report, "sso_descriptor_signing").len(), 1);
    assert_eq!(assertions(&report, "organization_localization").len(), 3);

    let names = assertions(&report, "attribute_name_format");
    assert_eq!(names.len(), 1);
    assert_eq!(names[0]["message"], "NameFormat attribute of email must be valid");
}

// ── Structural problems ──

#[test]
fn missing_sso_descriptor_fails_only_dependent_checks() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "--data-dir"])
        .arg(tmp.path())
        .arg("tests/fixtures/no_sso_descriptor.xml")
        .assert()
        .code(1);

    let report = read_report(tmp.path());
    assert!(assertions(&report, "entity_id_validity").is_empty());
    assert!(assertions(&report, "organization_localization").is_empty());
    assert_eq!(
        assertions(&report, "sso_descriptor_protocol")[0]["message"],
        "no SPSSODescriptor element found"
    );
    assert_eq!(assertions(&report, "sso_descriptor_signing").len(), 1);
}

// ── Tool failures ──

#[test]
fn unset_metadata_exits_two() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "--data-dir"])
        .arg(tmp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("SP metadata location is not set"));
    assert!(!tmp.path().join("sp-metadata-extra.json").exists());
}

#[test]
fn nonexistent_metadata_exits_two() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "tests/fixtures/does-not-exist.xml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot open"));
}

#[test]
fn malformed_metadata_exits_two_without_report() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--skip-tls", "--data-dir"])
        .arg(tmp.path())
        .arg("tests/fixtures/malformed.xml")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse metadata"));
    assert!(!tmp.path().join("sp-metadata-extra.json").exists());
}

#[test]
fn unreachable_assessment_service_exits_two_without_report() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--api-url", "http://127.0.0.1:9/api/v2/", "--http-timeout", "5", "--data-dir"])
        .arg(tmp.path())
        .arg("tests/fixtures/good.xml")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("TLS assessment request failed"));
    assert!(!tmp.path().join("sp-metadata-extra.json").exists());
}

#[test]
fn invalid_api_url_exits_two() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["--api-url", "not a url", "tests/fixtures/good.xml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid assessment API URL"));
}

// ── Completions ──

#[test]
fn completions_bash() {
    let tmp = TempDir::new().unwrap();
    spmetacheck(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spmetacheck"));
}
