//! CLI integration tests

use std::io::Write;
use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    run_cli_with_env(args, &[])
}

fn run_cli_with_env(args: &[&str], env: &[(&str, &str)]) -> Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "toolbox-cli", "--"])
        .args(args)
        .envs(env.iter().copied())
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Kubernetes Toolbox"), "Should show app name");
    assert!(
        stdout.contains("spread-by-zone"),
        "Should show spread-by-zone command"
    );
    assert!(
        stdout.contains("rbac-composer"),
        "Should show rbac-composer command"
    );
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = run_cli(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("k8s-toolbox"), "Should show binary name");
}

/// Test spread-by-zone help
#[test]
fn test_spread_by_zone_help() {
    let output = run_cli(&["spread-by-zone", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Spread help should succeed");
    assert!(stdout.contains("--output"), "Should show output option");
    assert!(
        stdout.contains("--disbalanced-only"),
        "Should show disbalanced-only option"
    );
    assert!(stdout.contains("short"), "Should show short alias");
    assert!(stdout.contains("--threshold"), "Should show threshold option");
    assert!(
        stdout.contains("--exclude-namespace"),
        "Should show exclude-namespace option"
    );
}

/// Test rbac-composer help
#[test]
fn test_rbac_composer_help() {
    let output = run_cli(&["rbac-composer", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "RBAC composer help should succeed");
    assert!(stdout.contains("api-resources.txt"), "Should show default input");
    assert!(stdout.contains("clusterrole.yaml"), "Should show default output");
    assert!(stdout.contains("no-secrets-access"), "Should show default name");
}

/// Test format option
#[test]
fn test_format_option() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("--kubeconfig"), "Should show kubeconfig option");
    assert!(stdout.contains("--context"), "Should show context option");
}

/// Test rbac-composer writes YAML to stdout
#[test]
fn test_rbac_composer_to_stdout() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    write!(
        input,
        "NAME          SHORTNAMES   APIVERSION   NAMESPACED   KIND\n\
         configmaps    cm           v1           true         ConfigMap\n\
         secrets                    v1           true         Secret\n\
         deployments   deploy       apps/v1      true         Deployment\n"
    )
    .unwrap();

    let path = input.path().to_string_lossy().to_string();
    let output = run_cli(&["rbac-composer", "--input", &path, "--output", "-"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "RBAC composer should succeed");
    assert!(stdout.contains("kind: ClusterRole"), "Should emit a ClusterRole");
    assert!(stdout.contains("configmaps"), "Should grant configmaps");
    assert!(stdout.contains("deployments"), "Should grant deployments");
    assert!(!stdout.contains("secrets"), "Should not grant secrets");
}

/// Test rbac-composer writes the output file
#[test]
fn test_rbac_composer_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("api-resources.txt");
    let target = dir.path().join("clusterrole.yaml");
    std::fs::write(&input, "services   svc   v1   true   Service\n").unwrap();

    let output = run_cli(&[
        "rbac-composer",
        "--input",
        input.to_str().unwrap(),
        "--output",
        target.to_str().unwrap(),
        "--name",
        "audit",
    ]);

    assert!(output.status.success(), "RBAC composer should succeed");
    let yaml = std::fs::read_to_string(&target).unwrap();
    assert!(yaml.contains("name: audit"), "Should use the given role name");
    assert!(yaml.contains("services"), "Should grant services");
}

/// Test rbac-composer ignores spread settings from the environment
#[test]
fn test_rbac_composer_ignores_spread_config() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("api-resources.txt");
    std::fs::write(&input, "services   svc   v1   true   Service\n").unwrap();

    let output = run_cli_with_env(
        &["rbac-composer", "--input", input.to_str().unwrap(), "--output", "-"],
        &[("TOOLBOX_DISBALANCE_THRESHOLD", "500")],
    );

    assert!(output.status.success(), "RBAC composer should not load spread config");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("services"), "Should grant services");
}

/// Test invalid threshold from the environment
#[test]
fn test_spread_rejects_threshold_from_env() {
    let output = run_cli_with_env(
        &["spread-by-zone"],
        &[("TOOLBOX_DISBALANCE_THRESHOLD", "500")],
    );

    assert!(!output.status.success(), "Invalid configured threshold should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("disbalance_threshold"),
        "Should name the bad setting"
    );
}

/// Test missing input file error handling
#[test]
fn test_rbac_composer_missing_input() {
    let output = run_cli(&[
        "rbac-composer",
        "--input",
        "/nonexistent/api-resources.txt",
        "--output",
        "-",
    ]);

    assert!(!output.status.success(), "Missing input should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("api-resources.txt"),
        "Should name the missing file"
    );
}

/// Test threshold validation
#[test]
fn test_invalid_threshold() {
    let output = run_cli(&["spread-by-zone", "--threshold", "250"]);

    assert!(!output.status.success(), "Out of range threshold should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("threshold"), "Should explain the threshold error");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = run_cli(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}
