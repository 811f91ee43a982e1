#![forbid(unsafe_code)]

use assert_cmd::Command;
use predicates::prelude::*;

fn small_codec(cmd: &mut Command) -> &mut Command {
    cmd.args(["--k", "8", "--block-size", "4", "--seed", "1", "--attempts", "24", "--trim"])
}

#[test]
fn help_shows_cliname() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("luby-cli")?;
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("luby-cli"))
        .stdout(predicate::str::contains("--block-size"));
    Ok(())
}

#[test]
fn message_flag_roundtrips() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("luby-cli")?;
    small_codec(&mut cmd).args(["--message", "fountain!"]);
    cmd.assert().success().stdout("fountain!");
    Ok(())
}

#[test]
fn stdin_roundtrips() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("luby-cli")?;
    small_codec(&mut cmd).write_stdin("from stdin");
    cmd.assert().success().stdout("from stdin");
    Ok(())
}

#[test]
fn config_file_is_honored() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("luby.toml");
    std::fs::write(&path, "k = 6\nblock_size = 2\nmaster_seed = 3\n")?;
    let mut cmd = Command::cargo_bin("luby-cli")?;
    cmd.arg("--config")
        .arg(&path)
        .args(["--attempts", "24", "--trim", "--message", "0123456789ab"]);
    cmd.assert().success().stdout("0123456789ab");
    Ok(())
}

#[test]
fn invalid_delta_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("luby-cli")?;
    cmd.args(["--delta", "2", "--message", "x"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("delta must lie in [0,1]"));
    Ok(())
}

#[test]
fn empty_message_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("luby-cli")?;
    cmd.args(["--k", "4", "--block-size", "4"]).write_stdin("");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("message is empty"));
    Ok(())
}
