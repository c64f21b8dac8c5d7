use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn agora(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("agora").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("DATABASE_URL")
        .env_remove("BIND_ADDR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    agora(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("db-init"));
}

#[test]
fn db_init_without_url_fails_fast() {
    let home = TempDir::new().unwrap();
    agora(&home)
        .args(["db-init", "--interval-secs", "0"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn db_init_rejects_malformed_url() {
    let home = TempDir::new().unwrap();
    agora(&home)
        .args(["db-init", "--database-url", "not a url", "--interval-secs", "0"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn serve_rejects_invalid_bind_address() {
    let home = TempDir::new().unwrap();
    agora(&home)
        .args(["serve", "--bind", "not-an-addr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--bind"));
}
