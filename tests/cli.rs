use std::process::{Command, Output};

fn ytaudio(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ytaudio"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run ytaudio")
}

#[test]
fn no_arguments_exit_one() {
    let out = ytaudio(&[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!out.stderr.is_empty());
}

#[test]
fn missing_output_path_exits_one() {
    let out = ytaudio(&["extract", "https://youtu.be/dQw4w9WgXcQ"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn help_and_version_exit_zero() {
    let out = ytaudio(&["--help"]);
    assert_eq!(out.status.code(), Some(0));
    let help = String::from_utf8_lossy(&out.stdout);
    for command in ["extract", "stream", "info", "tools"] {
        assert!(help.contains(command), "help does not mention {command}");
    }

    let out = ytaudio(&["--version"]);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn invalid_url_fails_with_error_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("song.mp3");
    let out = ytaudio(&["extract", "not a url", target.to_str().unwrap(), "5"]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Error: Invalid URL"), "stderr was: {stderr}");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Timeout set to: 5 seconds"));
    assert!(stdout.contains("✗ Extraction failed"));
    assert!(!target.exists());
}

#[test]
fn info_invalid_url_prints_no_json() {
    let out = ytaudio(&["info", "youtube.com/watch?v=dQw4w9WgXcQ"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Error:"));
}

#[cfg(unix)]
#[test]
fn sigint_cancels_running_extraction() {
    use std::io::{BufRead, BufReader, Read};
    use std::os::unix::fs::PermissionsExt;
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("yt-dlp");
    std::fs::write(
        &script,
        "#!/bin/sh\ncase \"$1\" in\n  --version) echo 2024.08.06; exit 0;;\n  --dump-json) exit 1;;\nesac\nsleep 30\n",
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let target = dir.path().join("song.mp3");
    let mut child = Command::new(env!("CARGO_BIN_EXE_ytaudio"))
        .args(["--ytdlp-path", script.to_str().unwrap()])
        .args(["extract", "--backend", "cli", "https://youtu.be/dQw4w9WgXcQ"])
        .arg(&target)
        .arg("60")
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run ytaudio");

    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let mut line = String::new();
    loop {
        line.clear();
        assert!(stdout.read_line(&mut line).unwrap() > 0, "stdout closed early");
        if line.starts_with("Downloading and extracting audio") {
            break;
        }
    }
    std::thread::sleep(Duration::from_millis(300));

    let clock = Instant::now();
    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();
    let status = child.wait().unwrap();

    assert!(clock.elapsed() < Duration::from_secs(10));
    assert_eq!(status.code(), Some(1));
    let mut stderr = String::new();
    child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();
    assert!(stderr.contains("Error: Operation cancelled"), "stderr was: {stderr}");
    assert!(!target.exists());
}
