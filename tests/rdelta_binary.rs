//! Black-box tests of the `rdelta` binary.

use std::fs;

use assert_cmd::Command;

fn rdelta() -> Command {
    Command::cargo_bin("rdelta").expect("rdelta binary is built")
}

fn pseudo_random(len: usize) -> Vec<u8> {
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        })
        .collect()
}

#[test]
fn help_lists_usage() {
    let output = rdelta().arg("--help").output().expect("run rdelta");
    assert!(output.status.success(), "--help should succeed");
    assert!(output.stderr.is_empty(), "help output should not write to stderr");
    let stdout = String::from_utf8(output.stdout).expect("stdout is UTF-8");
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("explain-delta"));
}

#[test]
fn without_operands_shows_usage_and_fails() {
    let output = rdelta().output().expect("run rdelta");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("Usage:"));
}

#[test]
fn full_cycle_reconstructs_the_target() {
    let dir = tempfile::tempdir().expect("tempdir");
    let basis = dir.path().join("basis");
    let target = dir.path().join("target");
    let signature = dir.path().join("basis.sig");
    let delta = dir.path().join("target.delta");
    let output = dir.path().join("rebuilt");

    let original = pseudo_random(1_000_000);
    let mut edited = original.clone();
    edited[400_000..400_100].fill(0);
    edited.extend_from_slice(b"appended");
    fs::write(&basis, &original).expect("write basis");
    fs::write(&target, &edited).expect("write target");

    rdelta()
        .args(["signature", "--chunk-size", "4096"])
        .arg(&basis)
        .arg(&signature)
        .assert()
        .success();
    rdelta().arg("delta").arg(&signature).arg(&target).arg(&delta).assert().success();
    rdelta()
        .arg("patch")
        .arg(&basis)
        .arg(&delta)
        .arg(&output)
        .assert()
        .success();
    assert!(fs::read(&output).expect("rebuilt") == edited, "rebuilt file differs");

    let explained = rdelta().arg("explain-delta").arg(&delta).output().expect("explain");
    assert!(explained.status.success());
    let text = String::from_utf8(explained.stdout).expect("stdout is UTF-8");
    assert!(text.contains("copy"), "{text}");
    assert!(text.contains("data 4096 bytes"), "{text}");
    // The short final chunk no longer ends the stream, so the tail is literal.
    assert!(text.contains("data 584 bytes"), "{text}");
}

#[test]
fn verification_failure_exits_with_two() {
    let dir = tempfile::tempdir().expect("tempdir");
    let basis = dir.path().join("basis");
    let signature = dir.path().join("basis.sig");
    let delta = dir.path().join("basis.delta");
    let output = dir.path().join("rebuilt");

    let mut content = pseudo_random(64 * 1024);
    fs::write(&basis, &content).expect("write basis");
    rdelta().arg("signature").arg(&basis).arg(&signature).assert().success();
    rdelta().arg("delta").arg(&signature).arg(&basis).arg(&delta).assert().success();

    content[1000] ^= 0x55;
    fs::write(&basis, &content).expect("modify basis");
    rdelta()
        .arg("patch")
        .arg(&basis)
        .arg(&delta)
        .arg(&output)
        .assert()
        .code(2);
    assert!(!output.exists());
}

#[test]
fn invalid_chunk_size_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let basis = dir.path().join("basis");
    fs::write(&basis, b"tiny").expect("write basis");
    let output = rdelta()
        .args(["signature", "--chunk-size", "40000"])
        .arg(&basis)
        .output()
        .expect("run rdelta");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("chunk size 40000"), "{stderr}");
}
