#[cfg(feature = "parallel-io")]
mod parallel_loads {
    use tabload::testing::mock_load_file;
    use tabload::{LoadOptions, load_mutations, load_mutations_par};

    fn options(parallel: usize) -> LoadOptions {
        LoadOptions {
            key_columns: vec!["host".to_string()],
            timestamp_column: Some("when".to_string()),
            parallel,
            log_warnings: false,
            ..LoadOptions::default()
        }
    }

    fn fixture_lines(rows: usize) -> Vec<String> {
        let mut lines = vec!["when\thost\tcpu\tmem".to_string()];
        for i in 0..rows {
            lines.push(format!("2009-01-15 08:30:{:02}\thost{i:03}\t{i}\t{}", i % 60, i * 2));
        }
        lines
    }

    #[test]
    fn parallel_output_matches_sequential_order_exactly() -> anyhow::Result<()> {
        let lines = fixture_lines(30);
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let file = mock_load_file(&refs)?;

        let (sequential, _) = load_mutations(file.path(), &options(1))?;
        let (parallel, _) = load_mutations_par(file.path(), &options(4))?;

        // Workers hand chunks back in segment order, which is file order.
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 60);
        Ok(())
    }

    #[test]
    fn worker_reports_merge_into_file_totals() -> anyhow::Result<()> {
        let lines = fixture_lines(24);
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let file = mock_load_file(&refs)?;

        let (_, seq_report) = load_mutations(file.path(), &options(1))?;
        let (_, par_report) = load_mutations_par(file.path(), &options(3))?;

        assert_eq!(par_report.lines_read, 24);
        assert_eq!(par_report.records_emitted, seq_report.records_emitted);
        assert_eq!(par_report.lines_skipped, seq_report.lines_skipped);
        assert_eq!(par_report.bytes_consumed, seq_report.bytes_consumed);
        Ok(())
    }

    #[test]
    fn one_segment_degenerates_to_sequential() -> anyhow::Result<()> {
        let lines = fixture_lines(5);
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let file = mock_load_file(&refs)?;

        let (sequential, _) = load_mutations(file.path(), &options(1))?;
        let (parallel, _) = load_mutations_par(file.path(), &options(1))?;
        assert_eq!(parallel, sequential);
        Ok(())
    }

    #[test]
    fn skipped_lines_surface_in_merged_reports() -> anyhow::Result<()> {
        let mut lines = fixture_lines(12);
        lines.insert(4, "broken-timestamp\thostX\t1\t2".to_string());
        lines.insert(9, "broken-timestamp\thostY\t3\t4".to_string());
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let file = mock_load_file(&refs)?;

        let (mutations, report) = load_mutations_par(file.path(), &options(3))?;

        assert_eq!(report.lines_read, 14);
        assert_eq!(report.lines_skipped, 2);
        assert_eq!(report.skips.len(), 2);
        assert_eq!(mutations.len(), 24);
        Ok(())
    }
}
