use std::process::Command;

fn triquad() -> Command {
    Command::new(env!("CARGO_BIN_EXE_triquad"))
}

#[test]
fn help_lists_every_flag() {
    let output = triquad()
        .arg("--help")
        .output()
        .expect("failed to run triquad --help");
    assert!(output.status.success());

    let help = String::from_utf8_lossy(&output.stdout);
    for flag in ["--width", "--height", "--vertex", "--fragment", "--strict", "--title"] {
        assert!(help.contains(flag), "missing {flag} in:\n{help}");
    }
}

#[test]
fn zero_width_is_rejected_before_any_window_opens() {
    let output = triquad()
        .args(["--width", "0"])
        .output()
        .expect("failed to run triquad");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--width"));
}

#[test]
fn empty_locator_is_rejected() {
    let status = triquad()
        .args(["--fragment", ""])
        .status()
        .expect("failed to run triquad");
    assert!(!status.success());
}
