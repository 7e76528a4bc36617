use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A scripts package whose entry points are shell scripts, run with `sh` as the runtime.
fn scripts_package(root: &Path, scripts: &[(&str, &str)]) -> std::path::PathBuf {
    let own = root.join("my-scripts");
    fs::create_dir_all(own.join("scripts")).unwrap();
    fs::write(own.join("package.json"), r#"{"name": "my-scripts"}"#).unwrap();
    for (name, body) in scripts {
        fs::write(own.join("scripts").join(format!("{}.js", name)), body).unwrap();
    }
    own
}

fn my_scripts(app: &Path, own: &Path) -> Command {
    let mut cmd = Command::cargo_bin("my-scripts").unwrap();
    cmd.current_dir(app)
        .env("MY_SCRIPTS_RUNTIME", "sh")
        .env("MY_SCRIPTS_OWN_PATH", own)
        .env_remove("NODE_ENV")
        .env_remove("PUBLIC_URL")
        .env_remove("BUILD_PATH");
    cmd
}

#[test]
fn test_unknown_script_prints_guidance() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(root.path(), &[]);

    my_scripts(root.path(), &own)
        .arg("serve")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown script \"serve\"."))
        .stdout(predicate::str::contains("Perhaps you need to update react-scripts?"));
}

#[cfg(unix)]
#[test]
fn test_child_exit_status_is_propagated() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(root.path(), &[("build", "exit 3\n")]);

    my_scripts(root.path(), &own).arg("build").assert().code(3);
}

#[cfg(unix)]
#[test]
fn test_script_arguments_are_forwarded() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(
        root.path(),
        &[("test", "[ \"$1\" = \"--watchAll=false\" ] && [ \"$2\" = \"start\" ] || exit 5\n")],
    );

    my_scripts(root.path(), &own)
        .args(["test", "--watchAll=false", "start"])
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn test_killed_child_exits_with_one() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(root.path(), &[("start", "kill -KILL $$\n")]);

    my_scripts(root.path(), &own)
        .arg("start")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("kill -9"));
}

#[cfg(unix)]
#[test]
fn test_signal_message_is_plain_text_when_colour_is_forced() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(root.path(), &[("start", "kill -KILL $$\n")]);

    my_scripts(root.path(), &own)
        .env("CLICOLOR_FORCE", "1")
        .arg("start")
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("The build failed"))
        .stdout(predicate::str::contains("\u{1b}[").not());
}

#[cfg(unix)]
#[test]
fn test_terminated_child_exits_with_one() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(root.path(), &[("start", "kill -TERM $$\n")]);

    my_scripts(root.path(), &own)
        .arg("start")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("killall"));
}

#[cfg(unix)]
#[test]
fn test_child_sees_mode_and_dotenv_values() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(
        root.path(),
        &[(
            "build",
            "[ \"$NODE_ENV\" = production ] && [ \"$BABEL_ENV\" = production ] && [ \"$FROM_DOTENV\" = yes ] || exit 9\n",
        )],
    );
    fs::write(root.path().join(".env.production"), "FROM_DOTENV=yes\n").unwrap();

    my_scripts(root.path(), &own).arg("build").assert().success();
}

#[cfg(unix)]
#[test]
fn test_dotenv_expansion_sees_other_files_and_forced_mode() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(
        root.path(),
        &[(
            "build",
            "[ \"$REACT_APP_URL\" = https://example.com/api ] && [ \"$REACT_APP_MODE\" = production ] || exit 9\n",
        )],
    );
    fs::write(root.path().join(".env.local"), "REACT_APP_HOST=example.com\n").unwrap();
    fs::write(
        root.path().join(".env"),
        "REACT_APP_URL=https://${REACT_APP_HOST}/api\nREACT_APP_MODE=${NODE_ENV}\n",
    )
    .unwrap();

    my_scripts(root.path(), &own)
        .env_remove("REACT_APP_HOST")
        .env_remove("REACT_APP_URL")
        .env_remove("REACT_APP_MODE")
        .arg("build")
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn test_non_utf8_variables_reach_the_child() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let root = TempDir::new().unwrap();
    let own = scripts_package(
        root.path(),
        &[("build", "[ -n \"$LATIN1_VAR\" ] && [ ${#LATIN1_VAR} -ge 4 ] || exit 9\n")],
    );

    my_scripts(root.path(), &own)
        .env("LATIN1_VAR", OsStr::from_bytes(b"caf\xe9"))
        .arg("build")
        .assert()
        .success();
}

#[test]
fn test_missing_script_file_fails() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(root.path(), &[]);

    my_scripts(root.path(), &own)
        .arg("eject")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot find script 'eject'"));
}

#[test]
fn test_dry_run_reports_launch_and_config() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(root.path(), &[("start", "exit 0\n")]);
    fs::write(root.path().join("package.json"), r#"{"homepage": "/docs"}"#).unwrap();
    fs::write(root.path().join(".env"), "REACT_APP_FLAG=on\n").unwrap();

    let output = my_scripts(root.path(), &own)
        .args(["--dry-run", "--inspect", "start", "--port", "4000"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let args = report["launch"]["args"].as_array().unwrap();
    assert_eq!(args[0], "--inspect");
    assert!(args[1].as_str().unwrap().ends_with("scripts/start.js"));
    assert_eq!(args[2], "--port");
    assert_eq!(args[3], "4000");

    let config = &report["config"];
    assert_eq!(config["layout"], "PublishedPackage");
    assert_eq!(config["paths"]["publicUrlOrPath"], "/docs/");
    assert_eq!(config["clientEnv"]["raw"]["NODE_ENV"], "development");
    assert_eq!(config["clientEnv"]["raw"]["REACT_APP_FLAG"], "on");
    assert_eq!(config["clientEnv"]["raw"]["PUBLIC_URL"], "/docs");
    assert_eq!(
        config["clientEnv"]["stringified"]["process.env"]["REACT_APP_FLAG"],
        "\"on\""
    );
}

#[test]
fn test_eject_dry_run_skips_configuration() {
    let root = TempDir::new().unwrap();
    let own = scripts_package(root.path(), &[("eject", "exit 0\n")]);

    let output = my_scripts(root.path(), &own)
        .args(["--dry-run", "eject"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["script"], "eject");
    assert!(report["config"].is_null());
}
