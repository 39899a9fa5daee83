use std::fs;
use tabload::testing::{mock_load_file, mock_load_file_raw};
use tabload::{FileLineStream, LoadOptions, LoadSource, load_mutations, plan_segments};

fn options(parallel: usize) -> LoadOptions {
    LoadOptions {
        key_columns: vec!["host".to_string()],
        parallel,
        log_warnings: false,
        ..LoadOptions::default()
    }
}

#[test]
fn planning_divides_the_file_on_line_starts() -> anyhow::Result<()> {
    let file = mock_load_file(&["aaaa", "bbbb", "cccc", "dddd"])?;
    let mut stream = FileLineStream::open(file.path())?;
    let segments = plan_segments(&mut stream, 20, 2, 0)?;

    assert_eq!(segments.len(), 2);
    assert_eq!((segments[0].start, segments[0].end), (0, 15));
    assert_eq!((segments[1].start, segments[1].end), (15, 20));
    for segment in &segments {
        assert_eq!(segment.cursor, segment.start);
        assert!(!segment.retired);
    }
    Ok(())
}

#[test]
fn candidates_inside_a_line_snap_to_the_next_line() -> anyhow::Result<()> {
    // Offsets: 0, 2, 13, 16, end 20.
    let file = mock_load_file(&["a", "bbbbbbbbbb", "cc", "ddd"])?;
    let mut stream = FileLineStream::open(file.path())?;
    let segments = plan_segments(&mut stream, 20, 3, 0)?;

    let mut boundaries: Vec<u64> = segments.iter().map(|s| s.start).collect();
    boundaries.push(segments.last().unwrap().end);
    assert_eq!(boundaries, [0, 13, 16, 20]);
    Ok(())
}

#[test]
fn surplus_segments_of_a_tiny_file_are_born_retired() -> anyhow::Result<()> {
    let file = mock_load_file(&["ab"])?;
    let mut stream = FileLineStream::open(file.path())?;
    let segments = plan_segments(&mut stream, 3, 4, 0)?;

    assert_eq!(segments.len(), 4);
    assert!(!segments[0].retired);
    assert_eq!((segments[0].start, segments[0].end), (0, 3));
    for segment in &segments[1..] {
        assert_eq!(segment.start, segment.end);
        assert!(segment.retired);
    }
    Ok(())
}

#[test]
fn segmented_reading_yields_the_same_records_as_sequential() -> anyhow::Result<()> {
    let mut lines = vec!["host\tval".to_string()];
    for i in 0..10 {
        lines.push(format!("h{i}\t{i}"));
    }
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let file = mock_load_file(&refs)?;

    let (sequential, seq_report) = load_mutations(file.path(), &options(1))?;
    let (mut segmented, seg_report) = load_mutations(file.path(), &options(3))?;

    assert_eq!(sequential.len(), 10);
    let mut expected = sequential.clone();
    expected.sort();
    segmented.sort();
    assert_eq!(segmented, expected);

    assert_eq!(seg_report.lines_read, seq_report.lines_read);
    assert_eq!(seg_report.records_emitted, seq_report.records_emitted);
    assert_eq!(seg_report.bytes_consumed, seq_report.bytes_consumed);
    Ok(())
}

#[test]
fn drained_segments_cover_the_data_exactly() -> anyhow::Result<()> {
    let mut lines = vec!["host\tval".to_string()];
    for i in 0..8 {
        lines.push(format!("host{i:02}\t{i}"));
    }
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let file = mock_load_file(&refs)?;
    let header_len = "host\tval\n".len() as u64;
    let file_size = fs::metadata(file.path())?.len();

    let mut source = LoadSource::open(file.path(), &options(3))?;
    while source.next()?.is_some() {}

    let segments = source.segments();
    assert_eq!(segments[0].start, header_len);
    assert_eq!(segments.last().unwrap().end, file_size);
    let mut covered = 0;
    for segment in segments {
        assert!(segment.retired);
        assert_eq!(segment.cursor, segment.end);
        covered += segment.end - segment.start;
    }
    assert_eq!(covered, file_size - header_len);
    Ok(())
}

#[test]
fn header_only_files_load_nothing() -> anyhow::Result<()> {
    let file = mock_load_file(&["host\tval"])?;
    let (mutations, report) = load_mutations(file.path(), &options(1))?;

    assert!(mutations.is_empty());
    assert_eq!(report.lines_read, 0);
    assert_eq!(report.bytes_consumed, 0);
    Ok(())
}

#[test]
fn unterminated_final_lines_decode_without_overcounting() -> anyhow::Result<()> {
    let file = mock_load_file_raw(b"host\tcpu\nweb01\t42")?;
    let (mutations, report) = load_mutations(file.path(), &options(1))?;

    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].value.as_deref(), Some(b"42".as_slice()));
    assert_eq!(report.bytes_consumed, b"web01\t42".len() as u64);
    Ok(())
}
