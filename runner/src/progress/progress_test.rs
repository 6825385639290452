use super::*;
use tempfile::TempDir;

const LOG: &str = "\
Create time

Time = 0.001
deltaT = 1e-06
Sh = 0.12, T = 1500.4 K
Time = 0.002
deltaT = 2e-06
Sh = 0.15, T = 1623.8 K
";

#[test]
pub fn reads_end_time() {
    let dir = TempDir::new().unwrap();
    let control = dir.path().join("controlDict");
    fs::write(&control, "application chemFoam;\nendTime         0.07;\nwriteInterval 0.01;\n").unwrap();

    assert_eq!(read_end_time(&control).unwrap(), 0.07);

    fs::write(&control, "application chemFoam;\n").unwrap();
    assert!(matches!(
        read_end_time(&control),
        Err(ProgressError::MissingEndTime(_))
    ));

    fs::write(&control, "endTime later;\n").unwrap();
    assert!(matches!(
        read_end_time(&control),
        Err(ProgressError::InvalidEndTime { .. })
    ));
}

#[test]
pub fn parses_latest_values() {
    let lines: Vec<&str> = LOG.lines().collect();
    let progress = parse_progress(&lines);

    assert_eq!(progress.time, 0.002);
    assert_eq!(progress.delta_t, Some(2e-6));
    assert_eq!(progress.temperature, Some(1623.8));
    assert!(!progress.finished);
    assert_eq!(progress.percent(0.004), 50);

    let finished = parse_progress(&["Time = 0.004", "End"]);
    assert!(finished.finished);
    assert_eq!(finished.percent(0.004), 100);
    assert_eq!(parse_progress::<&str>(&[]), Progress::default());
}

#[test]
pub fn renders_bar() {
    let bar = render_bar(3, None, None);
    assert_eq!(bar, format!("[===>{}] 3 %", " ".repeat(97)));

    let bar = render_bar(100, Some(1623.8), Some(2e-6));
    assert!(bar.starts_with(&format!("[{}>] 100 %", "=".repeat(100))));
    assert!(bar.ends_with(" (T = 1623 K, dT = 2e-06 s)"));
}

#[test]
pub fn watches_until_end() {
    let dir = TempDir::new().unwrap();
    let control = dir.path().join("controlDict");
    let log = dir.path().join("output.log");
    fs::write(&control, "endTime 0.004;\n").unwrap();
    fs::write(&log, format!("{LOG}Time = 0.004\nEnd\n")).unwrap();

    let monitor = ProgressMonitor::new(log, &control, Duration::from_millis(1), 50).unwrap();
    let mut out = Vec::new();
    let progress = monitor.watch(&mut out).unwrap();

    assert!(progress.finished);
    let drawn = String::from_utf8(out).unwrap();
    assert!(drawn.starts_with("\r   [="));
    assert!(drawn.contains("] 100 % (T = 1623 K"));
}

#[test]
pub fn missing_log_has_no_progress() {
    let dir = TempDir::new().unwrap();
    let control = dir.path().join("controlDict");
    fs::write(&control, "endTime 1;\n").unwrap();

    let monitor =
        ProgressMonitor::new(dir.path().join("output.log"), &control, Duration::from_secs(1), 2)
            .unwrap();

    assert_eq!(monitor.poll().unwrap(), Progress::default());
}

#[test]
pub fn formats_time_step() {
    assert_eq!(scientific(2e-6), "2e-06");
    assert_eq!(scientific(3e-5), "3e-05");
    assert_eq!(scientific(250.0), "2e+02");
    assert_eq!(scientific(1.0), "1e+00");
}

#[test]
pub fn polls_log_with_invalid_bytes() {
    let dir = TempDir::new().unwrap();
    let control = dir.path().join("controlDict");
    let log = dir.path().join("output.log");
    fs::write(&control, "endTime 1;\n").unwrap();
    fs::write(&log, b"Time = 0.5\n\xff\xfe\nTime = 0.6\n").unwrap();

    let monitor = ProgressMonitor::new(log, &control, Duration::from_secs(1), 50).unwrap();

    assert_eq!(monitor.poll().unwrap().time, 0.6);
}

#[test]
pub fn tail_reads_end_of_large_log() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log");
    let mut content = "x".repeat(3 * TAIL_WINDOW as usize);
    content.push_str("\nTime = 0.1\nTime = 0.2\n");
    fs::write(&log, content).unwrap();

    assert_eq!(tail(&log, 2).unwrap(), vec!["Time = 0.1", "Time = 0.2"]);
    assert_eq!(tail(&log, 3).unwrap().len(), 3);
}

#[test]
pub fn tail_keeps_last_lines() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log");
    fs::write(&log, "a\nb\nc\n").unwrap();

    assert_eq!(tail(&log, 2).unwrap(), vec!["b", "c"]);
    assert_eq!(tail(&log, 10).unwrap(), vec!["a", "b", "c"]);
}
