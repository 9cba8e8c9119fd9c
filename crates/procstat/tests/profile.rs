//! End-to-end runs against real child processes.
#![cfg(unix)]

use std::fs;
use std::process::Command;

use procstat::{
    ExecutionReport, ExecutionRequest, ProfileError, SIGNALED_EXIT_CODE, StderrSink, StdoutSink,
    Termination, profile, render_text,
};

// =========================================================================
// Exit status
// =========================================================================

#[test]
fn reports_child_exit_code() {
    for code in [0, 1, 7, 255] {
        let script = format!("exit {code}");
        let request = ExecutionRequest::new("sh").args(["-c", script.as_str()]);
        let usage = profile(&request).unwrap();
        assert_eq!(usage.exit_code, code);
        assert_eq!(usage.termination, Termination::Exited(code));
    }
}

#[test]
fn false_reports_one_in_decimal_and_hex() {
    let usage = profile(&ExecutionRequest::new("false")).unwrap();
    let text = render_text(&ExecutionReport::from(&usage));
    assert!(text.contains("程序返回值：1 (0x1)\n"), "report was: {text}");
}

#[test]
fn signal_death_reports_sentinel() {
    let request = ExecutionRequest::new("sh").args(["-c", "kill -9 $$"]);
    let usage = profile(&request).unwrap();
    assert_eq!(usage.termination, Termination::Signaled(libc::SIGKILL));
    assert_eq!(usage.exit_code, SIGNALED_EXIT_CODE);

    let text = render_text(&ExecutionReport::from(&usage));
    assert!(text.contains("程序返回值：-1 (0xFFFFFFFF)\n"), "report was: {text}");
}

// =========================================================================
// Failure paths
// =========================================================================

#[test]
fn missing_program_is_a_spawn_error_every_time() {
    let request = ExecutionRequest::new("procstat-test-no-such-program");
    let first = profile(&request).unwrap_err();
    let second = profile(&request).unwrap_err();

    assert!(matches!(first, ProfileError::Spawn { .. }), "got {first:?}");
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.os_code(), Some(libc::ENOENT));
    assert_eq!(first.os_code(), second.os_code());
}

#[test]
fn missing_input_never_launches() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let output = dir.path().join("out.txt");
    let request = ExecutionRequest::redirected("touch", dir.path().join("absent.in"), &output)
        .arg(&marker);

    let err = profile(&request).unwrap_err();
    assert!(matches!(err, ProfileError::InputOpen { .. }), "got {err:?}");
    assert!(!marker.exists());
    assert!(!output.exists());
}

#[test]
fn unwritable_output_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    fs::write(&input, "data").unwrap();

    let request = ExecutionRequest::redirected("cat", &input, dir.path().join("nope/out.txt"));
    let err = profile(&request).unwrap_err();
    assert!(matches!(err, ProfileError::OutputOpen { .. }), "got {err:?}");
    assert_eq!(err.os_code(), Some(libc::ENOENT));
}

#[test]
fn spawn_failure_after_redirect_leaves_truncated_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "data").unwrap();
    fs::write(&output, "old").unwrap();

    let request = ExecutionRequest::redirected("procstat-test-no-such-program", &input, &output);
    let err = profile(&request).unwrap_err();
    assert!(matches!(err, ProfileError::Spawn { .. }), "got {err:?}");
    assert_eq!(fs::read(&output).unwrap(), b"");
}

// =========================================================================
// Redirect-IO
// =========================================================================

#[test]
fn redirect_round_trips_content() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    let content = "line one\nline two\n\u{4f60}\u{597d}\n";
    fs::write(&input, content).unwrap();

    let usage = profile(&ExecutionRequest::redirected("cat", &input, &output)).unwrap();
    assert_eq!(usage.exit_code, 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), content);
}

#[test]
fn redirect_ten_megabytes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("big.in");
    let output = dir.path().join("big.out");
    let data: Vec<u8> = (0..10 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    fs::write(&input, &data).unwrap();

    let usage = profile(&ExecutionRequest::redirected("cat", &input, &output)).unwrap();
    let report = ExecutionReport::from(&usage);

    assert_eq!(fs::metadata(&output).unwrap().len(), data.len() as u64);
    assert!(usage.peak_memory_kb > 0);
    assert!(usage.wall_time_us > 0);
    let (_, frac) = report.wall_time_ms.split_once('.').unwrap();
    assert_eq!(frac.len(), 3);
}

#[test]
fn stderr_shares_stdout_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "").unwrap();

    let request = ExecutionRequest::redirected("sh", &input, &output)
        .args(["-c", "echo out; echo err >&2; echo out2"]);
    profile(&request).unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "out\nerr\nout2\n");
}

#[test]
fn stderr_to_same_path_as_stdout_is_shared() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");

    let request = ExecutionRequest::new("sh")
        .args(["-c", "echo a; echo b >&2"])
        .stdout(StdoutSink::ToFile(output.clone()))
        .stderr(StderrSink::ToFile(output.clone()));
    profile(&request).unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "a\nb\n");
}

#[test]
fn stderr_to_differently_spelled_stdout_path_is_shared() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");

    let request = ExecutionRequest::new("sh")
        .args(["-c", "echo first; echo second >&2; echo third"])
        .stdout(StdoutSink::ToFile(output.clone()))
        .stderr(StderrSink::ToFile(dir.path().join(".").join("out.txt")));
    profile(&request).unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "first\nsecond\nthird\n"
    );
}

/// Set when this test binary is re-run as the parent of a profiled child.
const ROUTE_STDERR_ENV: &str = "PROCSTAT_TEST_ROUTE_STDERR";

#[test]
fn same_as_stdout_with_inherited_stdout_writes_parent_stdout() {
    if std::env::var_os(ROUTE_STDERR_ENV).is_some() {
        let request = ExecutionRequest::new("sh")
            .args(["-c", "echo routed-stderr >&2"])
            .stderr(StderrSink::SameAsStdout);
        profile(&request).unwrap();
        return;
    }

    let output = Command::new(std::env::current_exe().unwrap())
        .args([
            "--exact",
            "same_as_stdout_with_inherited_stdout_writes_parent_stdout",
            "--test-threads=1",
        ])
        .env(ROUTE_STDERR_ENV, "1")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("routed-stderr"), "stdout was: {stdout}");
    assert!(!stderr.contains("routed-stderr"), "stderr was: {stderr}");
}

#[test]
fn separate_stderr_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let err = dir.path().join("err.txt");

    let request = ExecutionRequest::new("sh")
        .args(["-c", "echo a; echo b >&2"])
        .stdout(StdoutSink::ToFile(out.clone()))
        .stderr(StderrSink::ToFile(err.clone()));
    profile(&request).unwrap();

    assert_eq!(fs::read_to_string(&out).unwrap(), "a\n");
    assert_eq!(fs::read_to_string(&err).unwrap(), "b\n");
}

#[test]
fn working_dir_applies_to_child() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("pwd.txt");

    let request = ExecutionRequest::new("pwd")
        .working_dir(dir.path())
        .stdout(StdoutSink::ToFile(output.clone()));
    profile(&request).unwrap();

    let reported = fs::read_to_string(&output).unwrap();
    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(
        std::path::Path::new(reported.trim()).canonicalize().unwrap(),
        expected
    );
}

// =========================================================================
// Measurement sanity
// =========================================================================

#[test]
fn wall_time_covers_cpu_time_for_single_threaded_child() {
    let request = ExecutionRequest::new("sh").args([
        "-c",
        "i=0; while [ $i -lt 100000 ]; do i=$((i+1)); done",
    ]);
    let usage = profile(&request).unwrap();

    assert!(usage.total_cpu_time_us() > 0);
    assert!(
        usage.wall_time_us >= usage.total_cpu_time_us(),
        "wall={} cpu={}",
        usage.wall_time_us,
        usage.total_cpu_time_us()
    );
}

#[test]
fn sleep_is_wall_time_not_cpu_time() {
    let usage = profile(&ExecutionRequest::new("sleep").arg("0.2")).unwrap();
    assert!(usage.wall_time_us >= 200_000, "wall={}", usage.wall_time_us);
    assert!(usage.total_cpu_time_us() < usage.wall_time_us);
}
