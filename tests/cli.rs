use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::tempdir;

const GATEHOUSE_ENV: &[&str] = &[
    "GATEHOUSE_CONFIG",
    "GATEHOUSE_PROFILE",
    "GATEHOUSE_HOST",
    "GATEHOUSE_PORT",
    "GATEHOUSE_USERNAME",
    "GATEHOUSE_PASSWORD",
    "GATEHOUSE_API_KEY",
    "GATEHOUSE_SITE",
    "GATEHOUSE_FORMAT",
    "GATEHOUSE_DEBUG",
    "GATEHOUSE_VERIFY_TLS",
];

fn gatehouse() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gatehouse"));
    for var in GATEHOUSE_ENV {
        cmd.env_remove(var);
    }
    cmd.stdin(Stdio::null());
    cmd
}

fn write_config(dir: &Path, host: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    let contents = format!(
        "active_profile: home\nprofiles:\n  home:\n    host: {host}\n    username: admin\n    password: secret\n    site: Lab\n  office:\n    host: office.example\n    api_key: k-1\n"
    );
    fs::write(&path, contents).expect("failed to write config");
    path
}

#[test]
fn version_prints_package_version() {
    let assert = gatehouse().arg("version").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn status_uses_custom_config_path() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = write_config(temp.path(), "unifi.lan");

    let assert = gatehouse()
        .arg("status")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("home"));
    assert!(stdout.contains("https://unifi.lan:443"));
    assert!(stdout.contains("session login as admin"));
    assert!(stdout.contains("Site: Lab"));
    assert!(stdout.contains("office"));

    Ok(())
}

#[test]
fn status_with_profile_flag_and_override() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = write_config(temp.path(), "unifi.lan");

    let assert = gatehouse()
        .args(["status", "--profile", "office", "--site", "Warehouse"])
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("via --profile flag"));
    assert!(stdout.contains("Auth: API key"));
    assert!(stdout.contains("Site: Warehouse"));

    Ok(())
}

#[test]
fn status_without_config_suggests_init() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let missing = temp.path().join("nope.yaml");

    let assert = gatehouse()
        .arg("status")
        .arg("--config")
        .arg(&missing)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("gatehouse init"));
    Ok(())
}

#[test]
fn get_unknown_metric_fails() {
    gatehouse()
        .args(["get", "bandwidth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown metric: bandwidth"));
}

#[test]
fn get_without_credentials_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let missing = temp.path().join("nope.yaml");

    let assert = gatehouse()
        .args(["get", "devices", "--host", "10.0.0.1"])
        .arg("--config")
        .arg(&missing)
        .assert()
        .failure();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(stderr.contains("Credentials not configured"));
    Ok(())
}

const SITES: &str = r#"{"meta":{"rc":"ok"},"data":[{"name":"default","desc":"Default"}]}"#;
const DEVICES: &str = r#"{"meta":{"rc":"ok"},"data":[
    {"mac":"aa:00","name":"Edge Gateway","type":"ugw","state":1},
    {"mac":"aa:01","name":"Core Switch","type":"usw","state":1,"uplink":{"uplink_mac":"aa:00","uplink_remote_port":1}}
]}"#;

fn login_args(server: &mockito::Server) -> Vec<String> {
    vec![
        "--host".to_string(),
        server.url(),
        "--username".to_string(),
        "admin".to_string(),
        "--password".to_string(),
        "secret".to_string(),
    ]
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn get_devices_logs_in_and_prints_json() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let login = server
        .mock("POST", "/api/login")
        .with_status(200)
        .with_header("set-cookie", "unifises=s1; Path=/")
        .with_body(r#"{"meta":{"rc":"ok"},"data":[]}"#)
        .expect(1)
        .create();
    let _sites = server
        .mock("GET", "/api/self/sites")
        .match_header("cookie", "unifises=s1")
        .with_status(200)
        .with_body(SITES)
        .create();
    let devices = server
        .mock("GET", "/api/s/default/stat/device")
        .with_status(200)
        .with_body(DEVICES)
        .expect(1)
        .create();

    let temp = tempdir()?;
    let assert = gatehouse()
        .args(["get", "devices", "--format", "json"])
        .args(login_args(&server))
        .arg("--config")
        .arg(temp.path().join("none.yaml"))
        .assert()
        .success();

    login.assert();
    devices.assert();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(parsed["data"]["metric"], "devices");
    assert_eq!(parsed["data"]["site"], "default");
    assert_eq!(parsed["data"]["data"][1]["name"], "Core Switch");

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn watch_shares_one_login_and_device_fetch() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let login = server
        .mock("POST", "/api/login")
        .with_status(200)
        .with_header("set-cookie", "unifises=s1; Path=/")
        .with_body(r#"{"meta":{"rc":"ok"}}"#)
        .expect(1)
        .create();
    let sites = server
        .mock("GET", "/api/self/sites")
        .with_status(200)
        .with_body(SITES)
        .expect(1)
        .create();
    let devices = server
        .mock("GET", "/api/s/default/stat/device")
        .with_status(200)
        .with_body(DEVICES)
        .expect(1)
        .create();

    let temp = tempdir()?;
    let assert = gatehouse()
        .args([
            "watch", "devices", "topology", "--interval", "1", "--rounds", "2",
        ])
        .args(login_args(&server))
        .arg("--config")
        .arg(temp.path().join("none.yaml"))
        .assert()
        .success();

    login.assert();
    sites.assert();
    devices.assert();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    // Two polls for each of the two metrics
    assert_eq!(stdout.matches("2 items @ default").count(), 4);

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn rate_limited_login_fails_connection_test() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let login = server
        .mock("POST", "/api/login")
        .with_status(429)
        .expect(1)
        .create();

    let temp = tempdir()?;
    let assert = gatehouse()
        .arg("test")
        .args(login_args(&server))
        .arg("--config")
        .arg(temp.path().join("none.yaml"))
        .assert()
        .failure();

    login.assert();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("rate limiting"));
    assert!(stdout.contains("~10 min"));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn watch_console_clears_caches() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _login = server
        .mock("POST", "/api/login")
        .with_status(200)
        .with_header("set-cookie", "unifises=s1")
        .create();

    let temp = tempdir()?;
    let mut cmd = gatehouse();
    cmd.args(["watch", "health", "--interval", "60"])
        .args(login_args(&server))
        .arg("--config")
        .arg(temp.path().join("none.yaml"));

    let assert = assert_cmd::Command::from_std(cmd)
        .write_stdin("clear\nquit\n")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("Cleared"));

    Ok(())
}
