#[test]
fn check_cpy_help() {
    let mut cmd = assert_cmd::Command::cargo_bin("cpy").unwrap();
    cmd.arg("--help").assert().success();
}

#[test]
fn check_cpy_version() {
    let mut cmd = assert_cmd::Command::cargo_bin("cpy").unwrap();
    cmd.arg("--version").assert().success();
}
