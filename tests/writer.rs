use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;

use dict_harvest::domain::{FetchResult, Source};
use dict_harvest::shutdown::{StopReason, StopSignal};
use dict_harvest::writer::{ResultWriter, open_output};

fn result(source: Source, key: &str, fragments: &[&str]) -> FetchResult {
    FetchResult {
        source,
        key: key.to_string(),
        fragments: fragments.iter().map(|f| f.to_string()).collect(),
    }
}

fn output_in(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join("out-definitions.txt")).unwrap()
}

#[test]
fn buffered_results_survive_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    let path = output_in(&dir);
    let (tx, rx) = crossbeam_channel::unbounded();
    for key in ["cat", "dog", "wick"] {
        tx.send(result(Source::Cambridge, key, &["thing"])).unwrap();
    }

    let stop = StopSignal::new();
    stop.trigger(StopReason::Cancelled);
    let writer = ResultWriter::new(
        open_output(&path).unwrap(),
        rx,
        stop,
        Duration::from_millis(100),
    );
    let report = writer.run();

    // A producer is still alive, so the drain ends on the grace timer.
    assert!(report.drain_timed_out);
    assert_eq!(report.lines_written, 3);
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "Cam cat thing\nCam dog thing\nCam wick thing\n");
    drop(tx);
}

#[test]
fn late_result_within_grace_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = output_in(&dir);
    let (tx, rx) = crossbeam_channel::unbounded();
    let stop = StopSignal::new();
    let handle = ResultWriter::new(
        open_output(&path).unwrap(),
        rx,
        stop.clone(),
        Duration::from_secs(5),
    )
    .spawn()
    .unwrap();

    stop.trigger(StopReason::Completed);
    let started = Instant::now();
    thread::sleep(Duration::from_millis(100));
    tx.send(result(Source::Oxford, "light", &["glow"])).unwrap();
    drop(tx);

    let report = handle.join().unwrap();
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(!report.drain_timed_out);
    assert_eq!(report.lines_written, 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), "Oxf light glow\n");
}

#[test]
fn closes_when_producers_finish() {
    let dir = tempfile::tempdir().unwrap();
    let path = output_in(&dir);
    fs::write(&path, "Dic cat feline\n").unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    tx.send(result(Source::DictionaryCom, "dog", &["canine", "pet"]))
        .unwrap();
    drop(tx);

    let report = ResultWriter::new(
        open_output(&path).unwrap(),
        rx,
        StopSignal::new(),
        Duration::from_secs(5),
    )
    .run();

    assert_eq!(report.lines_written, 1);
    assert_eq!(report.write_errors, 0);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "Dic cat feline\nDic dog canine pet\n"
    );
}

#[test]
fn open_terminates_only_a_cut_last_line() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_in(&dir);

    fs::write(&output, "Cam cat felin").unwrap();
    drop(open_output(&output).unwrap());
    assert_eq!(fs::read_to_string(&output).unwrap(), "Cam cat felin\n");

    drop(open_output(&output).unwrap());
    assert_eq!(fs::read_to_string(&output).unwrap(), "Cam cat felin\n");

    fs::write(&output, "").unwrap();
    drop(open_output(&output).unwrap());
    assert_eq!(fs::read_to_string(&output).unwrap(), "");
}
