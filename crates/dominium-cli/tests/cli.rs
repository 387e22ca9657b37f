// SPDX-License-Identifier: Apache-2.0
//! Black-box coverage of the `dominium` binary over small fixtures
//! written to a temp directory (mirrors `warp-cli`'s own `assert_cmd` +
//! `predicates` + `tempfile` integration-test convention).

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn conflict_validate_reports_counts() {
    let dir = tempdir().expect("tempdir");
    let fixture = write_fixture(
        &dir,
        "conflict.fixture",
        "DOMINIUM_CONFLICT_FIXTURE_V1\nside0_id=alpha_side\nside0_region_id=1\nside0_readiness=0.5\n",
    );

    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["conflict", "validate", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("DOMINIUM_CONFLICT_VALIDATE_V1"))
        .stdout(predicate::str::contains("sides=1"));
}

#[test]
fn conflict_inspect_finds_a_side_by_symbolic_name() {
    let dir = tempdir().expect("tempdir");
    let fixture = write_fixture(
        &dir,
        "conflict.fixture",
        "DOMINIUM_CONFLICT_FIXTURE_V1\nside0_id=alpha_side\nside0_region_id=1\nside0_readiness=0.5\n",
    );

    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["conflict", "inspect", "--fixture"])
        .arg(&fixture)
        .args(["--kind", "side", "--id", "alpha_side"])
        .assert()
        .success()
        .stdout(predicate::str::contains("region_id=1"))
        .stdout(predicate::str::contains("readiness_q16=32768"));
}

#[test]
fn conflict_inspect_unknown_kind_is_a_usage_error() {
    let dir = tempdir().expect("tempdir");
    let fixture = write_fixture(
        &dir,
        "conflict.fixture",
        "DOMINIUM_CONFLICT_FIXTURE_V1\n",
    );

    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["conflict", "inspect", "--fixture"])
        .arg(&fixture)
        .args(["--kind", "not_a_kind", "--id", "1"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn conflict_fixture_with_unknown_key_exits_with_usage_error() {
    let dir = tempdir().expect("tempdir");
    let fixture = write_fixture(
        &dir,
        "conflict.fixture",
        "DOMINIUM_CONFLICT_FIXTURE_V1\nside0_bogus_field=1\n",
    );

    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["conflict", "validate", "--fixture"])
        .arg(&fixture)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown key"));
}

#[test]
fn conflict_resolve_runs_over_every_region() {
    let dir = tempdir().expect("tempdir");
    let fixture = write_fixture(
        &dir,
        "conflict.fixture",
        "DOMINIUM_CONFLICT_FIXTURE_V1\nside0_id=alpha_side\nside0_region_id=1\nside0_readiness=1.0\n",
    );

    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["conflict", "resolve", "--fixture"])
        .arg(&fixture)
        .args(["--region", "0", "--tick", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("region_id=1"))
        .stdout(predicate::str::contains("sides_seen=1"));
}

#[test]
fn conflict_collapse_rejects_region_zero() {
    let dir = tempdir().expect("tempdir");
    let fixture = write_fixture(&dir, "conflict.fixture", "DOMINIUM_CONFLICT_FIXTURE_V1\n");

    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["conflict", "collapse", "--fixture"])
        .arg(&fixture)
        .args(["--region", "0"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("cannot be collapsed"));
}

#[test]
fn conflict_collapse_a_real_region_succeeds() {
    let dir = tempdir().expect("tempdir");
    let fixture = write_fixture(
        &dir,
        "conflict.fixture",
        "DOMINIUM_CONFLICT_FIXTURE_V1\nside0_id=alpha_side\nside0_region_id=7\n",
    );

    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["conflict", "collapse", "--fixture"])
        .arg(&fixture)
        .args(["--region", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("collapsed=true"));
}

#[test]
fn economy_validate_reports_counts() {
    let dir = tempdir().expect("tempdir");
    let fixture = write_fixture(
        &dir,
        "economy.fixture",
        "DOMINIUM_ECONOMY_FIXTURE_V1\ncontainer0_id=grain_silo\ncontainer0_region_id=1\ncontainer0_capacity=100.5\n",
    );

    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["economy", "validate", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("containers=1"));
}

#[test]
fn economy_inspect_finds_a_market_by_symbolic_name() {
    let dir = tempdir().expect("tempdir");
    let fixture = write_fixture(
        &dir,
        "economy.fixture",
        "DOMINIUM_ECONOMY_FIXTURE_V1\nmarket0_id=grain_market\nmarket0_risk_modifier=0.75\n",
    );

    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["economy", "inspect", "--fixture"])
        .arg(&fixture)
        .args(["--kind", "market", "--id", "grain_market"])
        .assert()
        .success()
        .stdout(predicate::str::contains("risk_modifier_q16=49152"));
}

#[test]
fn conflict_fixture_with_incompatible_schema_version_exits_with_usage_error() {
    let dir = tempdir().expect("tempdir");
    let fixture = write_fixture(
        &dir,
        "conflict.fixture",
        "DOMINIUM_CONFLICT_FIXTURE_V1\nside0_id=alpha_side\nside0_schema_version=99\n",
    );

    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["conflict", "validate", "--fixture"])
        .arg(&fixture)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("schema_version"));
}

#[test]
fn missing_fixture_file_is_a_usage_error() {
    Command::cargo_bin("dominium")
        .expect("binary")
        .args(["conflict", "validate", "--fixture", "/no/such/fixture/exists"])
        .assert()
        .failure()
        .code(2);
}
