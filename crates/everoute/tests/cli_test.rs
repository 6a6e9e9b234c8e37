#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! once assert_cmd 2.1 is the floor

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const ENV_VARS: [&str; 4] = [
    "CLOUDTOWER_USER",
    "CLOUDTOWER_PASSWORD",
    "CLOUDTOWER_SERVER",
    "CLOUDTOWER_TOKEN",
];

fn everoute() -> Command {
    let mut cmd = Command::cargo_bin("everoute").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn service_config() -> serde_json::Value {
    serde_json::json!({
        "name": "er-1",
        "package_id": "pkg-1",
        "controller_configuration": {
            "cluster_id": "c-ctl",
            "subnet_mask": "255.255.255.0",
            "gateway": "10.0.0.1",
            "instance": [
                {"vlan_id": "vlan-1", "ip_addr": "10.0.0.11"},
                {"vlan_id": "vlan-1", "ip_addr": "10.0.0.12"},
                {"vlan_id": "vlan-1", "ip_addr": "10.0.0.13"}
            ]
        },
        "associated_cluster": [{"id": "c1", "vdses": [{"id": "v1"}]}]
    })
}

/// The help output lists every subcommand
#[test]
fn test_cli_help() {
    everoute()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Everoute"))
        .stdout(predicate::str::contains("kinds"))
        .stdout(predicate::str::contains("resource"))
        .stdout(predicate::str::contains("data-source"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_cli_version() {
    everoute()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("everoute"));
}

/// Provider flags are accepted on every subcommand
#[test]
fn test_resource_help_shows_provider_flags() {
    everoute()
        .args(["resource", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--operation"))
        .stdout(predicate::str::contains("--cloudtower-server"))
        .stdout(predicate::str::contains("--token"));
}

#[test]
fn test_kinds_lists_all_types() {
    everoute()
        .arg("kinds")
        .assert()
        .success()
        .stdout(predicate::str::contains("everoute_service"))
        .stdout(predicate::str::contains("everoute_global_security_policy"))
        .stdout(predicate::str::contains("everoute_package"));
}

/// Validation works offline, without any provider settings
#[test]
fn test_validate_accepts_valid_service() {
    let request = serde_json::json!({ "config": service_config() });
    everoute()
        .args(["validate", "everoute_service"])
        .write_stdin(request.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration is valid"));
}

#[test]
fn test_validate_reports_attribute_errors() {
    let mut config = service_config();
    config["controller_configuration"]["instance"] =
        serde_json::json!([{"vlan_id": "vlan-1", "ip_addr": "10.0.0.11"}]);
    config["controller_configuration"]["subnet_mask"] = serde_json::json!("255.0.255.0");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::json!({ "config": config })).unwrap();

    everoute()
        .args(["validate", "everoute_service", "--input"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("controller_configuration.instance"))
        .stderr(predicate::str::contains("controller_configuration.subnet_mask"));
}

#[test]
fn test_validate_data_source() {
    everoute()
        .args(["validate", "everoute_package", "--data-source"])
        .write_stdin(r#"{"config": {"version": "2.1.0", "architecture": "sparc"}}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("architecture"));
}

#[test]
fn test_validate_unknown_type() {
    everoute()
        .args(["validate", "everoute_router"])
        .write_stdin("{}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("everoute_router"));
}

/// Missing settings are reported as a failed response, before any remote call
#[test]
fn test_resource_without_settings() {
    let request = serde_json::json!({ "prior_state": service_config() });
    everoute()
        .args(["resource", "everoute_service", "--operation", "read"])
        .write_stdin(request.to_string())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid provider configuration"))
        .stdout(predicate::str::contains("cloudtower_server"));
}

/// Flags complete the request's provider block
#[test]
fn test_data_source_unreachable_server() {
    let request = serde_json::json!({
        "provider": { "token": "t" },
        "config": { "version": "2.1.0", "architecture": "X86_64" }
    });
    everoute()
        .args(["data-source", "everoute_package"])
        .args(["--cloudtower-server", "127.0.0.1:1"])
        .write_stdin(request.to_string())
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"state\": null"))
        .stdout(predicate::str::contains("Unable to read everoute package"));
}
