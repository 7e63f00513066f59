// CLI entry point tests

use std::process::Command;

use image::{DynamicImage, Rgb, RgbImage};

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_webp_bridge"))
}

// ============================================================
// 1. No arguments shows usage and exits with failure
// ============================================================

#[test]
fn test_main_no_args_shows_usage() {
    let output = cargo_bin().output().expect("failed to execute binary");

    assert!(
        !output.status.success(),
        "should exit with failure when no args given"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Usage"),
        "stderr should contain 'Usage', got: {stderr}"
    );
}

// ============================================================
// 2. --help / --version / --codec-version
// ============================================================

#[test]
fn test_main_help_flag() {
    let output = cargo_bin()
        .arg("--help")
        .output()
        .expect("failed to execute binary");

    assert!(
        output.status.success(),
        "should exit with success for --help"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "got: {stderr}");
}

#[test]
fn test_main_version_flag() {
    let output = cargo_bin()
        .arg("--version")
        .output()
        .expect("failed to execute binary");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let version = env!("CARGO_PKG_VERSION");
    assert!(
        stderr.contains(version),
        "stderr should contain version '{version}', got: {stderr}"
    );
}

#[test]
fn test_main_codec_version_flag() {
    let output = cargo_bin()
        .arg("--codec-version")
        .output()
        .expect("failed to execute binary");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("libwebp encoder"), "got: {stderr}");
}

// ============================================================
// 3. Job files
// ============================================================

#[test]
fn test_main_nonexistent_job_file() {
    let output = cargo_bin()
        .arg("/nonexistent/path/jobs.yaml")
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR"), "got: {stderr}");
}

#[test]
fn test_main_runs_jobs_relative_to_job_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 4, Rgb([200, 100, 50])))
        .save(dir.path().join("input.png"))
        .expect("write fixture");

    std::fs::write(dir.path().join("settings.yaml"), "use_cache: false\n").expect("settings");
    std::fs::write(
        dir.path().join("jobs.yaml"),
        "jobs:\n  - input: input.png\n    output: out/input.webp\n    lossless: true\n",
    )
    .expect("jobs");

    let output = cargo_bin()
        .arg(dir.path().join("jobs.yaml"))
        .output()
        .expect("failed to execute binary");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {stderr}");
    assert!(stderr.contains("OK:"), "got: {stderr}");
    assert!(dir.path().join("out/input.webp").exists());
    assert!(!dir.path().join(".cache").exists(), "cache disabled in settings");
}

#[test]
fn test_main_reports_failed_job() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(
        dir.path().join("jobs.yaml"),
        "jobs:\n  - input: missing.png\n    output: missing.webp\n",
    )
    .expect("jobs");

    let output = cargo_bin()
        .arg(dir.path().join("jobs.yaml"))
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR:"), "got: {stderr}");
}
