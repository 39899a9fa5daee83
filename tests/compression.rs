#[cfg(feature = "compression-gzip")]
mod gzip_loads {
    use std::fs;
    use tabload::testing::{mock_gzip_load_file, mock_load_file};
    use tabload::{LoadOptions, LoadSource, is_gzip_path, load_mutations};

    fn options(parallel: usize) -> LoadOptions {
        LoadOptions {
            key_columns: vec!["host".to_string()],
            timestamp_column: Some("when".to_string()),
            parallel,
            log_warnings: false,
            ..LoadOptions::default()
        }
    }

    fn sample_lines() -> Vec<&'static str> {
        vec![
            "when\thost\tcpu\tmem",
            "2009-01-15 08:30:00\tweb01\t42\t512",
            "2009-01-15 08:30:01\tweb02\t43\t513",
            "2009-01-15 08:30:02\tweb03\t44\t514",
        ]
    }

    #[test]
    fn gzip_input_decodes_like_plain_input() -> anyhow::Result<()> {
        let plain = mock_load_file(&sample_lines())?;
        let zipped = mock_gzip_load_file(&sample_lines())?;

        let (plain_mutations, plain_report) = load_mutations(plain.path(), &options(1))?;
        let (gzip_mutations, gzip_report) = load_mutations(zipped.path(), &options(1))?;

        assert_eq!(gzip_mutations, plain_mutations);
        assert_eq!(gzip_report.lines_read, plain_report.lines_read);
        assert_eq!(gzip_report.records_emitted, plain_report.records_emitted);
        assert_eq!(gzip_report.lines_skipped, 0);
        Ok(())
    }

    #[test]
    fn compressed_byte_accounting_is_physical() -> anyhow::Result<()> {
        let zipped = mock_gzip_load_file(&sample_lines())?;
        let zipped_size = fs::metadata(zipped.path())?.len();

        let mut source = LoadSource::open(zipped.path(), &options(1))?;
        let mut last = 0;
        while source.next()?.is_some() {
            // Physical deltas never run backwards.
            let consumed = source.report().bytes_consumed;
            assert!(consumed >= last);
            last = consumed;
        }
        assert!(source.report().bytes_consumed <= zipped_size);
        Ok(())
    }

    #[test]
    fn compressed_segment_retires_at_end_of_stream() -> anyhow::Result<()> {
        let zipped = mock_gzip_load_file(&sample_lines())?;
        let zipped_size = fs::metadata(zipped.path())?.len();

        let mut source = LoadSource::open(zipped.path(), &options(1))?;
        assert_eq!(source.segments().len(), 1);
        while source.next()?.is_some() {}

        let segment = &source.segments()[0];
        assert!(segment.retired);
        assert_eq!(segment.end, zipped_size);
        assert_eq!(segment.cursor, segment.end);
        Ok(())
    }

    #[test]
    fn parallel_segments_are_refused_over_gzip() -> anyhow::Result<()> {
        let zipped = mock_gzip_load_file(&sample_lines())?;
        let err = LoadSource::open(zipped.path(), &options(3)).unwrap_err();
        assert!(
            err.to_string()
                .contains("parallel loading is not supported for compressed files")
        );
        Ok(())
    }

    #[test]
    fn gzip_detection_goes_by_extension() {
        assert!(is_gzip_path("metrics.tsv.gz".as_ref()));
        assert!(!is_gzip_path("metrics.tsv".as_ref()));
        assert!(!is_gzip_path("metrics.gz.tsv".as_ref()));
    }

    #[cfg(feature = "parallel-io")]
    #[test]
    fn parallel_loader_falls_back_to_sequential_on_gzip() -> anyhow::Result<()> {
        use tabload::load_mutations_par;

        let zipped = mock_gzip_load_file(&sample_lines())?;
        let (par, _) = load_mutations_par(zipped.path(), &options(1))?;
        let (seq, _) = load_mutations(zipped.path(), &options(1))?;
        assert_eq!(par, seq);
        Ok(())
    }
}
