use assert_cmd::Command;
use predicates::prelude::*;

fn trimcc() -> Command {
    Command::cargo_bin("trimcc").unwrap()
}

fn temp_file(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(name);
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn assembles_from_stdin_to_stdout() {
    let mut cmd = trimcc();
    cmd.arg("-p").write_stdin("MVI A, 42H");
    cmd.assert()
        .success()
        .stdout(predicate::eq(&[0x3E, 0x42][..]));
}

#[test]
fn assembles_a_source_file_to_binary() {
    let src = temp_file("trimcc_cli_src.tri");
    let out = temp_file("trimcc_cli_out.bin");
    std::fs::write(&src, "CALL 0C00H").unwrap();

    trimcc().arg("-o").arg(&out).arg(&src).assert().success();
    assert_eq!(std::fs::read(&out).unwrap(), vec![0xCD, 0x00, 0x0C]);

    std::fs::remove_file(&src).unwrap();
    std::fs::remove_file(&out).unwrap();
}

#[test]
fn org_option_sets_the_fill_base() {
    let mut cmd = trimcc();
    cmd.args(["-p", "-g", "1000"]).write_stdin("11 0x1002>00 22");
    cmd.assert()
        .success()
        .stdout(predicate::eq(&[0x11, 0x00, 0x22][..]));
}

#[test]
fn verbose_lists_the_bytes_and_variables() {
    let mut cmd = trimcc();
    cmd.arg("-v").write_stdin("loop: JMP !loop");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Triton Relocatable Machine Code Compiler"))
        .stdout(predicate::str::contains("C3 00 00"))
        .stdout(predicate::str::contains("loop"));
}

#[test]
fn undefined_variables_are_reported() {
    let mut cmd = trimcc();
    cmd.write_stdin("JMP !missing");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("undefined variables"));
}

#[test]
fn missing_source_file_fails() {
    trimcc()
        .arg("no_such_file.tri")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn missing_include_fails() {
    let mut cmd = trimcc();
    cmd.write_stdin("include no_such_include");
    cmd.assert().failure().code(1);
}

#[test]
fn bad_register_warns_but_succeeds() {
    let mut cmd = trimcc();
    cmd.arg("-p").write_stdin("MOV A, Q");
    cmd.assert()
        .success()
        .stdout(predicate::eq(&[0x78u8][..])) // Q reads as register 0 (B)
        .stderr(predicate::str::contains("invalid register"));
}
