use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use dict_harvest::checkpoint::Checkpoint;
use dict_harvest::domain::Source;
use dict_harvest::error::HarvestError;

fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path).unwrap()
}

#[test]
fn missing_file_is_empty_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = Checkpoint::load(&utf8(dir.path().join("absent.txt"))).unwrap();
    assert_eq!(checkpoint.total(), 0);
    assert_eq!(checkpoint.skipped_lines(), 0);
}

#[test]
fn reads_completed_pairs_per_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = utf8(dir.path().join("words-definitions.txt"));
    fs::write(
        &path,
        "Cam cat feline animal\nDic dog canine pet\nCam dog canine\nCol wick\n",
    )
    .unwrap();

    let checkpoint = Checkpoint::load(&path).unwrap();
    assert!(checkpoint.contains(Source::Cambridge, "cat"));
    assert!(checkpoint.contains(Source::Cambridge, "dog"));
    assert!(checkpoint.contains(Source::DictionaryCom, "dog"));
    assert!(!checkpoint.contains(Source::DictionaryCom, "cat"));
    assert!(checkpoint.contains(Source::Collins, "wick"));
    assert_eq!(checkpoint.completed(Source::Cambridge), 2);
    assert_eq!(checkpoint.completed(Source::Oxford), 0);
    assert_eq!(checkpoint.total(), 4);
}

#[test]
fn malformed_lines_are_skipped() {
    let checkpoint = Checkpoint::parse("Cam\n\nXyz cat feline\nOxf light glow\n");
    assert_eq!(checkpoint.total(), 1);
    assert_eq!(checkpoint.skipped_lines(), 3);
    assert!(checkpoint.contains(Source::Oxford, "light"));
}

#[test]
fn unreadable_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Checkpoint::load(&utf8(dir.path().to_path_buf())).unwrap_err();
    assert_matches!(err, HarvestError::CheckpointRead { .. });
}

#[test]
fn line_cut_inside_a_character_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = utf8(dir.path().join("words-definitions.txt"));
    fs::write(&path, b"Cam cat feline\nCam caf\xC3\n").unwrap();

    let checkpoint = Checkpoint::load(&path).unwrap();
    assert!(checkpoint.contains(Source::Cambridge, "cat"));
    assert_eq!(checkpoint.total(), 1);
    assert_eq!(checkpoint.skipped_lines(), 1);
}
