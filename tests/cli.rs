//! 命令行入口测试

use assert_cmd::Command;

#[test]
fn test_help_lists_core_options() {
    let output = Command::cargo_bin("markflow")
        .unwrap()
        .arg("--help")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    assert!(stdout.contains("markflow"));
    assert!(stdout.contains("--lang"));
    assert!(stdout.contains("--api-url"));
    assert!(stdout.contains("--concurrency"));
}

#[test]
fn test_missing_input_argument_fails() {
    Command::cargo_bin("markflow").unwrap().assert().failure();
}

#[test]
fn test_nonexistent_input_file_fails() {
    Command::cargo_bin("markflow")
        .unwrap()
        .arg("/no/such/file.md")
        .assert()
        .failure();
}
