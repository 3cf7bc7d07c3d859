//! Index file parsing tests.

use vobsrt::metadata::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use vobsrt::{IndexFile, Metadata};

const SAMPLE_INDEX: &str = "\
# VobSub index file, v7 (do not modify this line!)
#
size: 1920x1080
org: 0, 0
scale: 100%, 100%
alpha: 100%
palette: 000000, 828282, 828282, 828282, 828282, 828282, 828282, ffffff, 828282, bababa, 828282, 828282, 828282, 828282, 828282, 828282

# English
id: en, index: 0
timestamp: 00:00:01:000, filepos: 000000000
timestamp: 00:01:02:345, filepos: 00000a800
";

// ── Size declaration ───────────────────────────────────────────────

#[test]
fn parses_declared_size() {
    let metadata = Metadata::parse("size: 720x576\n");
    assert_eq!(metadata, Metadata { width: 720, height: 576 });
}

#[test]
fn size_tolerates_spacing_and_case() {
    let metadata = Metadata::parse("  SIZE :  640 x 360\n");
    assert_eq!(metadata.width, 640);
    assert_eq!(metadata.height, 360);
}

#[test]
fn missing_size_falls_back_to_default() {
    let metadata = Metadata::parse("org: 0, 0\n");
    assert_eq!(metadata.width, DEFAULT_WIDTH);
    assert_eq!(metadata.height, DEFAULT_HEIGHT);
    assert_eq!(Metadata::parse_declared("org: 0, 0\n"), None);
}

#[test]
fn zero_dimension_is_not_a_declaration() {
    assert_eq!(Metadata::parse_declared("size: 0x480"), None);
    assert_eq!(Metadata::parse("size: 0x480"), Metadata::default());
}

#[test]
fn metadata_display() {
    assert_eq!(Metadata::default().to_string(), "720x480");
}

// ── Full index ─────────────────────────────────────────────────────

#[test]
fn parses_full_index() {
    let index = IndexFile::parse(SAMPLE_INDEX);

    assert!(index.size_declared);
    assert_eq!(index.metadata.to_string(), "1920x1080");
    assert_eq!(index.palette.len(), 16);
    assert_eq!(index.palette[0], [0, 0, 0]);
    assert_eq!(index.palette[7], [0xff, 0xff, 0xff]);
    assert_eq!(index.palette[9], [0xba, 0xba, 0xba]);

    let track = index.track.expect("track should be parsed");
    assert_eq!(track.language, "en");
    assert_eq!(track.index, 0);

    assert_eq!(index.entries.len(), 2);
    assert_eq!(index.entries[0].timestamp_ms, 1000);
    assert_eq!(index.entries[0].filepos, 0);
    assert_eq!(index.entries[1].timestamp_ms, 62_345);
    assert_eq!(index.entries[1].filepos, 0xa800);
}

#[test]
fn comments_are_ignored() {
    let index = IndexFile::parse("# size: 100x100\nsize: 200x100\n# id: fr, index: 3\n");
    assert_eq!(index.metadata.width, 200);
    assert!(index.track.is_none());
}

#[test]
fn oversized_timestamp_entry_is_skipped() {
    let index = IndexFile::parse(
        "size: 720x480\n\
         timestamp: 9999999999999999999:00:00:000, filepos: 000000000\n\
         timestamp: 00:00:02:500, filepos: 000000800\n",
    );
    assert_eq!(index.metadata, Metadata { width: 720, height: 480 });
    assert_eq!(index.entries.len(), 1);
    assert_eq!(index.entries[0].timestamp_ms, 2_500);
    assert_eq!(index.entries[0].filepos, 0x800);
}

#[test]
fn undeclared_size_uses_default_canvas() {
    let index = IndexFile::parse("id: en, index: 0\n");
    assert!(!index.size_declared);
    assert_eq!(index.metadata.width, DEFAULT_WIDTH);
    assert_eq!(index.metadata.height, DEFAULT_HEIGHT);
}

#[test]
fn empty_index_parses_to_defaults() {
    let index = IndexFile::parse("");
    assert!(!index.size_declared);
    assert_eq!(index.metadata, Metadata::default());
    assert!(index.palette.is_empty());
    assert!(index.entries.is_empty());
}

#[test]
fn read_reports_missing_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("missing.idx");

    let result = IndexFile::read(&missing);
    match result {
        Err(vobsrt::VobsrtError::InputAccess { path, .. }) => assert_eq!(path, missing),
        other => panic!("Expected InputAccess, got {other:?}"),
    }
}

#[test]
fn read_tolerates_non_utf8_bytes() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("latin1.idx");
    let mut bytes = b"# Fran\xe7ais\n".to_vec();
    bytes.extend_from_slice(b"size: 720x576\n");
    std::fs::write(&path, bytes).expect("Failed to write index");

    let index = IndexFile::read(&path).expect("Failed to read index");
    assert_eq!(index.metadata.height, 576);
}
