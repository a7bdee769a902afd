mod common;

use common::TestContext;
use predicates::prelude::*;
use std::fs;

#[test]
fn version_flag_prints_version() {
    let ctx = TestContext::new();
    ctx.cli()
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_without_setters_shows_locations_and_defaults() {
    let ctx = TestContext::new();

    ctx.cli()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Config file: {}", ctx.config_file().display())))
        .stdout(predicate::str::contains("Lineup IDs: (none)"))
        .stdout(predicate::str::contains("Country: USA"))
        .stdout(predicate::str::contains("Last refresh: Never"));

    assert!(!ctx.config_file().exists(), "showing config must not write it");
}

#[test]
fn config_setters_are_saved() {
    let ctx = TestContext::new();

    ctx.cli()
        .args(["config", "-l", "USA-OTA12345", "-z", "10001", "--espn", "TRUE", "-p", "8080"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set postal_code: 10001"))
        .stdout(predicate::str::contains("Set espn_plus_enabled: true"))
        .stdout(predicate::str::contains("Configuration saved."));

    let config = ctx.read_config();
    assert_eq!(config["lineup_ids"][0].as_str(), Some("USA-OTA12345"));
    assert_eq!(config["postal_code"].as_str(), Some("10001"));
    assert_eq!(config["espn_plus_enabled"].as_bool(), Some(true));
    assert_eq!(config["server_port"].as_integer(), Some(8080));

    ctx.cli()
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Lineup IDs: USA-OTA12345"))
        .stdout(predicate::str::contains("Server port: 8080"));
}

#[test]
fn config_show_does_not_discard_setters() {
    let ctx = TestContext::new();

    ctx.cli()
        .args(["config", "--show", "-p", "8080"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set server_port: 8080"));

    assert_eq!(ctx.read_config()["server_port"].as_integer(), Some(8080));
}

#[test]
fn config_rejects_bad_bool_and_invalid_values() {
    let ctx = TestContext::new();

    ctx.cli().args(["config", "--espn", "maybe"]).assert().failure();

    ctx.cli()
        .args(["config", "-i", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid value for 'refresh_interval_hours'"));
    assert!(!ctx.config_file().exists());
}

#[test]
fn malformed_config_file_blocks_setters() {
    let ctx = TestContext::new();
    ctx.write_config("lineup_ids = [unterminated");

    ctx.cli()
        .args(["config", "-c", "CAN"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config parse error"));
}

#[test]
fn download_with_nothing_configured_fails() {
    let ctx = TestContext::new();

    ctx.cli()
        .arg("download")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No lineup IDs configured and ESPN+ is disabled"));
}

#[test]
fn status_reports_missing_guide() {
    let ctx = TestContext::new();

    ctx.cli()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("EPG Files:"))
        .stdout(predicate::str::contains("(not found - run 'zap2xml-manager download' first)"))
        .stdout(predicate::str::contains("Last refresh: Never"))
        .stdout(predicate::str::contains(":9195/zap2xml.xml"))
        .stdout(predicate::str::contains("ESPN+: disabled"));
}

#[test]
fn status_lists_every_xml_file() {
    let ctx = TestContext::new();
    fs::create_dir_all(ctx.output_dir()).unwrap();
    fs::write(ctx.output_dir().join("zap2xml.xml"), "<tv></tv>").unwrap();
    fs::write(ctx.output_dir().join("espn.xml"), "<tv></tv>").unwrap();
    ctx.write_config(
        r#"auto_refresh_enabled = true
refresh_interval_hours = 12
last_refresh = "2020-01-01T00:00:00+00:00"
"#,
    );

    ctx.cli()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Size: 0.0 KB | Modified:"))
        .stdout(predicate::str::contains("All XML files in output directory:"))
        .stdout(predicate::str::contains("espn.xml (0.0 KB)"))
        .stdout(predicate::str::contains("Next refresh: due now"))
        .stdout(predicate::str::contains("Auto-refresh: enabled (every 12h)"));
}

#[cfg(unix)]
#[test]
fn install_copies_binary_and_links_it() {
    let ctx = TestContext::new();
    let prefix = ctx.root().join("opt");
    let bin_dir = ctx.root().join("bin");

    for _ in 0..2 {
        ctx.cli()
            .arg("install")
            .arg("--prefix")
            .arg(&prefix)
            .arg("--bin-dir")
            .arg(&bin_dir)
            .assert()
            .success()
            .stdout(predicate::str::contains("Installed zap2xml-manager"));
    }

    let target = prefix.join("bin").join("zap2xml-manager");
    assert!(target.is_file());
    assert_eq!(fs::read_link(bin_dir.join("zap2xml-manager")).unwrap(), target);
}

#[cfg(unix)]
#[test]
fn install_refuses_to_replace_regular_file() {
    let ctx = TestContext::new();
    let bin_dir = ctx.root().join("bin");
    fs::create_dir_all(&bin_dir).unwrap();
    fs::write(bin_dir.join("zap2xml-manager"), "not a link").unwrap();

    ctx.cli()
        .arg("install")
        .arg("--prefix")
        .arg(ctx.root().join("opt"))
        .arg("--bin-dir")
        .arg(&bin_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("use --force"));
}
