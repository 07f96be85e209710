#![cfg(unix)]
#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sdkhook(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sdkhook").unwrap();
    cmd.current_dir(dir.path())
        .env("SDKHOOK_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

/// A project with `.slack/hooks.json` set to `hooks_json`.
fn project(hooks_json: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".slack")).unwrap();
    std::fs::write(dir.path().join(".slack/hooks.json"), hooks_json).unwrap();
    dir
}

fn write_script(dir: &TempDir, name: &str, body: &str) {
    std::fs::write(dir.path().join(name), body).unwrap();
}

// ---------------------------------------------------------------------------
// sdkhook run (default protocol)
// ---------------------------------------------------------------------------

#[test]
fn run_prints_trimmed_stdout() {
    let dir = project(r#"{"hooks": {"get-manifest": "sh manifest.sh"}}"#);
    write_script(&dir, "manifest.sh", "printf '\\n  {\"name\":\"app\"}  \\n'\n");

    sdkhook(&dir)
        .args(["run", "get-manifest"])
        .assert()
        .success()
        .stdout("{\"name\":\"app\"}\n");
}

#[test]
fn run_passes_args_as_flags() {
    let dir = project(r#"{"hooks": {"build": "echo"}}"#);
    sdkhook(&dir)
        .args(["run", "build", "--arg", "source=local", "--arg", "app=A1"])
        .assert()
        .success()
        .stdout("--app=A1 --source=local\n");
}

#[test]
fn run_sets_env_on_top_of_inherited_environment() {
    let dir = project(r#"{"hooks": {"doctor": "sh env.sh"}}"#);
    write_script(&dir, "env.sh", "echo \"$SDKHOOK_TEST_VAR:$SDKHOOK_INHERITED\"\n");

    sdkhook(&dir)
        .env("SDKHOOK_INHERITED", "kept")
        .args(["run", "doctor", "--env", "SDKHOOK_TEST_VAR=set"])
        .assert()
        .success()
        .stdout("set:kept\n");
}

#[test]
fn run_start_prints_progress_then_response() {
    let dir = project(r#"{"hooks": {"start": "sh start.sh"}}"#);
    write_script(
        &dir,
        "start.sh",
        "echo booting\necho 'listening on 3000'\necho '{\"ok\":true}'\n",
    );

    sdkhook(&dir)
        .args(["run", "start"])
        .assert()
        .success()
        .stdout("booting\nlistening on 3000\n{\"ok\":true}\n");
}

#[test]
fn run_executes_in_project_root() {
    let dir = project(r#"{"hooks": {"get-trigger": "pwd"}}"#);
    let nested = dir.path().join("functions");
    std::fs::create_dir_all(&nested).unwrap();

    let out = Command::cargo_bin("sdkhook")
        .unwrap()
        .current_dir(&nested)
        .env_remove("SDKHOOK_ROOT")
        .args(["run", "get-trigger"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let printed = std::path::PathBuf::from(String::from_utf8(out.stdout).unwrap().trim());
    assert_eq!(
        printed.canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[test]
fn run_json_output() {
    let dir = project(r#"{"hooks": {"check-update": "echo none"}}"#);
    sdkhook(&dir)
        .args(["--json", "run", "check-update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hook\": \"check-update\""))
        .stdout(predicate::str::contains("\"protocol\": \"default\""))
        .stdout(predicate::str::contains("\"response\": \"none\""));
}

// ---------------------------------------------------------------------------
// sdkhook run (errors)
// ---------------------------------------------------------------------------

#[test]
fn run_unconfigured_hook_fails() {
    let dir = project(r#"{"hooks": {}}"#);
    sdkhook(&dir)
        .args(["run", "deploy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "The command for 'Deploy' was not found",
        ))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn run_unknown_hook_fails() {
    let dir = project("{}");
    sdkhook(&dir)
        .args(["run", "teleport"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown hook 'teleport'"));
}

#[test]
fn run_failing_hook_reports_exit_status() {
    let dir = project(r#"{"hooks": {"install-update": "sh fail.sh"}}"#);
    write_script(&dir, "fail.sh", "echo 'something broke' >&2\nexit 3\n");

    sdkhook(&dir)
        .args(["run", "install-update"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("something broke"))
        .stderr(predicate::str::contains(
            "Error running 'InstallUpdate' command: exit status 3",
        ));
}

#[test]
fn missing_hooks_file_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".slack")).unwrap();
    sdkhook(&dir)
        .args(["run", "start"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no hooks file found"));
}

// ---------------------------------------------------------------------------
// message-boundary protocol
// ---------------------------------------------------------------------------

const BOUNDARY_HOOK: &str = r#"for a in "$@"; do
  case "$a" in --boundary=*) b="${a#--boundary=}" ;; esac
done
echo "loading manifest"
printf '%s%s%s' "$b" '{"functions":[]}' "$b"
echo "done"
"#;

#[test]
fn message_boundary_run_returns_payload() {
    let dir = project(
        r#"{
            "hooks": {"get-manifest": "sh manifest.sh"},
            "config": {"protocol-version": ["message-boundaries", "default"]}
        }"#,
    );
    write_script(&dir, "manifest.sh", BOUNDARY_HOOK);

    sdkhook(&dir)
        .args(["run", "get-manifest"])
        .assert()
        .success()
        .stdout("{\"functions\":[]}\n")
        .stderr(predicate::str::contains("loading manifest"))
        .stderr(predicate::str::contains("done"));
}

#[test]
fn get_hooks_defaults_are_merged() {
    let dir = project(
        r#"{"hooks": {"get-hooks": "sh get_hooks.sh", "deploy": "echo custom-deploy"}}"#,
    );
    write_script(
        &dir,
        "get_hooks.sh",
        r#"echo '{"hooks":{"deploy":"echo sdk-deploy","get-manifest":"echo sdk-manifest"},"config":{"protocol-version":["message-boundaries"]}}'
"#,
    );

    sdkhook(&dir)
        .args(["run", "deploy"])
        .assert()
        .success()
        // The project's deploy script wins over the SDK default and, speaking
        // no boundaries, has all of its stdout treated as diagnostics.
        .stderr(predicate::str::contains("custom-deploy"))
        .stderr(predicate::str::contains("sdk-deploy").not());

    sdkhook(&dir)
        .args(["protocol"])
        .assert()
        .success()
        .stdout("message-boundaries\n");
}

// ---------------------------------------------------------------------------
// sdkhook hooks / protocol
// ---------------------------------------------------------------------------

#[test]
fn hooks_lists_availability() {
    let dir = project(r#"{"hooks": {"start": "deno run start.ts"}}"#);
    sdkhook(&dir)
        .arg("hooks")
        .assert()
        .success()
        .stdout(predicate::str::contains("HOOK"))
        .stdout(predicate::str::is_match(r"start\s+yes\s+deno run start.ts").unwrap())
        .stdout(predicate::str::is_match(r"deploy\s+no").unwrap());
}

#[test]
fn hooks_json_output() {
    let dir = project(r#"{"hooks": {"build": "npm run build"}}"#);
    let out = sdkhook(&dir).args(["hooks", "--json"]).output().unwrap();
    assert!(out.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let build = entries
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["key"] == "build")
        .unwrap();
    assert_eq!(build["name"], "BuildProject");
    assert_eq!(build["available"], true);
    assert_eq!(build["command"], "npm run build");
}

#[test]
fn protocol_defaults_without_versions() {
    let dir = project("{}");
    sdkhook(&dir)
        .arg("protocol")
        .assert()
        .success()
        .stdout("default\n");
}

#[test]
fn protocol_json_keeps_unknown_entries() {
    let dir = project(r#"{"config": {"protocol-version": ["v9", "message-boundaries"]}}"#);
    sdkhook(&dir)
        .args(["protocol", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"protocol\": \"message-boundaries\""))
        .stdout(predicate::str::contains("\"v9\""));
}
