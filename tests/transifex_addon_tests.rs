// Tests for the translation-sync addon

use regex::Regex;

use buildgen::addons::{Addon, Transifex};
use buildgen::{Shell, Statement, TransifexConfig};

fn transifex(yaml: &str) -> Transifex {
    let section: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    Transifex::from_section(&section).unwrap()
}

#[test]
fn test_merging_empty_section_reproduces_defaults() {
    let addon = transifex("{}");
    assert_eq!(addon.config(), &TransifexConfig::default());
    assert_eq!(addon.config().hostname, "https://www.transifex.com");
    assert!(addon.config().auto_push.enabled);
    assert_eq!(addon.config().auto_push.job, 1);
    assert_eq!(addon.config().auto_push.branches, ["master"]);
}

#[test]
fn test_before_setup_installs_client_and_extends_path() {
    let addon = transifex("{}");
    let mut sh = Shell::new();
    addon.before_setup(&mut sh).unwrap();
    let script = sh.to_script();

    assert!(script.contains("Installing the Transifex client"));
    assert!(script.contains("pip install --user 'transifex-client>=0.11'"));
    assert!(script.contains("\nexport PATH=$HOME/.local/bin:$PATH\n"));
}

#[test]
fn test_configure_writes_credentials_with_env_overrides() {
    let addon = transifex("username: alice\ntoken: sekrit");
    let mut sh = Shell::new();
    addon.configure(&mut sh).unwrap();
    let script = sh.to_script();

    assert!(script.contains("hostname = ${TX_HOSTNAME:-https://www.transifex.com}"));
    assert!(script.contains("username = ${TX_USERNAME:-alice}"));
    assert!(script.contains("password = ${TX_PASSWORD:-}"));
    assert!(script.contains("token = ${TX_TOKEN:-sekrit}"));
    assert!(script.contains("> $HOME/.transifexrc"));
    // The credentials command itself is not echoed to the log.
    assert!(!script.contains("echo '$ echo \"["));
}

#[test]
fn test_after_success_disabled_emits_nothing() {
    let addon = transifex("auto_push:\n  enabled: false");
    let mut sh = Shell::new();
    addon.after_success(&mut sh).unwrap();
    assert!(sh.statements().is_empty());
    assert!(!sh.to_script().contains("tx push"));
}

#[test]
fn test_after_success_guards_job_and_branch() {
    let addon = transifex("auto_push:\n  job: 2\n  branches: [master, develop]");
    let mut sh = Shell::new();
    addon.after_success(&mut sh).unwrap();

    let (job_condition, branch_condition, body) = match &sh.statements()[..] {
        [Statement::If { branches, .. }] => match &branches[0].body[..] {
            [Statement::If { branches: inner, .. }] => (
                branches[0].condition.clone(),
                inner[0].condition.clone(),
                inner[0].body.clone(),
            ),
            other => panic!("expected a nested branch guard, got {other:?}"),
        },
        other => panic!("expected a job guard conditional, got {other:?}"),
    };

    assert_eq!(job_condition, r"$CI_JOB_NUMBER =~ \.2$");
    assert_eq!(branch_condition, "$CI_BRANCH =~ ^(master|develop)$");
    assert!(body
        .iter()
        .any(|s| matches!(s, Statement::Cmd { command, .. } if command == "tx push --source --no-interactive")));
}

#[test]
fn test_job_guard_matches_only_the_leader_ordinal() {
    let addon = transifex("auto_push:\n  job: 2");
    let mut sh = Shell::new();
    addon.after_success(&mut sh).unwrap();

    let pattern = match &sh.statements()[0] {
        Statement::If { branches, .. } => branches[0]
            .condition
            .strip_prefix("$CI_JOB_NUMBER =~ ")
            .unwrap()
            .to_string(),
        other => panic!("expected a conditional, got {other:?}"),
    };

    let guard = Regex::new(&pattern).unwrap();
    assert!(guard.is_match("17.2"));
    assert!(guard.is_match("3.2"));
    assert!(!guard.is_match("17.22"));
    assert!(!guard.is_match("17.1"));
    assert!(!guard.is_match("172"));
}

#[test]
fn test_branch_guard_matches_whole_names_only() {
    let addon = transifex("auto_push:\n  branches: [master, release]");
    let mut sh = Shell::new();
    addon.after_success(&mut sh).unwrap();

    let pattern = match &sh.statements()[0] {
        Statement::If { branches, .. } => match &branches[0].body[0] {
            Statement::If { branches: inner, .. } => inner[0]
                .condition
                .strip_prefix("$CI_BRANCH =~ ")
                .unwrap()
                .to_string(),
            other => panic!("expected a nested conditional, got {other:?}"),
        },
        other => panic!("expected a conditional, got {other:?}"),
    };

    let guard = Regex::new(&pattern).unwrap();
    assert!(guard.is_match("master"));
    assert!(guard.is_match("release"));
    assert!(!guard.is_match("master2"));
    assert!(!guard.is_match("amaster"));
    assert!(!guard.is_match("rel"));
}

#[test]
fn test_rendered_push_guard_shape() {
    let addon = transifex("{}");
    let mut sh = Shell::new();
    addon.after_success(&mut sh).unwrap();
    let script = sh.to_script();

    assert!(script.contains(r"if [[ $CI_JOB_NUMBER =~ \.1$ ]]; then"));
    assert!(script.contains("if [[ $CI_BRANCH =~ ^(master)$ ]]; then"));
    assert!(script.contains("Pushing source strings to Transifex"));
    assert!(script.contains("tx push --source --no-interactive"));
}
