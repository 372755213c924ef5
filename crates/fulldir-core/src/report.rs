//! Report rendering for a reconstructed directory tree
//!
//! The text report has one line per reachable entry, pre-order from the
//! root, indented with one tab per level:
//!
//! `<tabs><name> <<flags>> (<size>MB) Modified: <time>`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use crate::config::{ParseConfig, ReportFormat};
use crate::error::Result;
use crate::filetime::{filetime_to_datetime, format_filetime, validate_date_format};
use crate::record::DirectoryEntry;
use crate::tree::DirectoryTree;

/// Mebibyte figure in shortest round-trip form
///
/// Keeps a fractional part for whole numbers (`5.0`). Exponents carry a
/// sign and at least two digits (`8.7738037109375e-05`, `1e+16`).
pub fn format_size_mb(value: f64) -> String {
    let repr = format!("{:?}", value);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr,
    }
}

/// Write the report line for a single entry
pub fn write_entry_line<W: Write>(
    writer: &mut W,
    depth: usize,
    entry: &DirectoryEntry,
    date_format: &str,
) -> Result<()> {
    let modified = format_filetime(entry.modified_time, date_format)?;
    for _ in 0..depth {
        writer.write_all(b"\t")?;
    }
    writeln!(
        writer,
        "{} {} ({}MB) Modified: {}",
        entry.name,
        entry.flags,
        format_size_mb(entry.size_mb()),
        modified
    )?;
    Ok(())
}

/// Depth-first text dump, written as the tree is walked
pub fn render_text<W: Write>(
    tree: &DirectoryTree,
    writer: &mut W,
    config: &ParseConfig,
) -> Result<usize> {
    validate_date_format(&config.date_format)?;
    tree.require_root()?;

    let mut lines = 0;
    for (depth, entry) in tree.iter_depth_first() {
        write_entry_line(writer, depth, entry, &config.date_format)?;
        lines += 1;
    }
    Ok(lines)
}

fn write_json_node<W: Write>(writer: &mut W, entry: &DirectoryEntry) -> Result<()> {
    let modified = filetime_to_datetime(entry.modified_time)?;
    write!(writer, "{{\"id\":{},\"name\":", entry.id)?;
    serde_json::to_writer(&mut *writer, &entry.name)?;
    writer.write_all(b",\"flags\":")?;
    serde_json::to_writer(&mut *writer, &entry.flags.summary())?;
    write!(writer, ",\"size\":{},\"modified\":", entry.size)?;
    serde_json::to_writer(&mut *writer, &modified)?;
    Ok(())
}

/// Nested JSON document of the reachable tree
///
/// Streamed from the pre-order walk, so nesting depth costs heap only.
/// A node's `children` key is left out when it has none.
pub fn render_json<W: Write>(tree: &DirectoryTree, writer: &mut W) -> Result<usize> {
    tree.require_root()?;

    writer.write_all(b"{\"stats\":")?;
    serde_json::to_writer(&mut *writer, tree.stats())?;
    writer.write_all(b",\"root\":")?;

    let mut count = 0;
    let mut previous: Option<usize> = None;
    for (depth, entry) in tree.iter_depth_first() {
        match previous {
            None => {}
            Some(prev) if depth > prev => writer.write_all(b",\"children\":[")?,
            Some(prev) => {
                // Close the previous node plus every level walked back up
                writer.write_all(b"}")?;
                for _ in depth..prev {
                    writer.write_all(b"]}")?;
                }
                writer.write_all(b",")?;
            }
        }
        write_json_node(writer, entry)?;
        previous = Some(depth);
        count += 1;
    }

    if let Some(prev) = previous {
        writer.write_all(b"}")?;
        for _ in 0..prev {
            writer.write_all(b"]}")?;
        }
    }
    writer.write_all(b"}\n")?;
    Ok(count)
}

/// Render in the requested format, returning the number of entries written
pub fn render<W: Write>(
    tree: &DirectoryTree,
    writer: &mut W,
    config: &ParseConfig,
    format: ReportFormat,
) -> Result<usize> {
    match format {
        ReportFormat::Text => render_text(tree, writer, config),
        ReportFormat::Json => render_json(tree, writer),
    }
}

/// Render the report into a new file at `path`
pub fn render_to_file(
    tree: &DirectoryTree,
    path: &Path,
    config: &ParseConfig,
    format: ReportFormat,
) -> Result<usize> {
    // Check before creating the file so a failed run leaves nothing behind
    if format == ReportFormat::Text {
        validate_date_format(&config.date_format)?;
    }
    tree.require_root()?;

    tracing::info!("Dumping full records hierarchy to {}", path.display());
    let start = Instant::now();

    let mut writer = BufWriter::new(File::create(path)?);
    let written = render(tree, &mut writer, config, format)?;
    writer.flush()?;

    tracing::info!(
        "Done dumping {} entries as {} ({:.3}s)",
        written,
        format,
        start.elapsed().as_secs_f64()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::filetime::FILETIME_TICKS_PER_SECOND;
    use crate::record::RawRecord;

    fn tree_of(records: Vec<RawRecord>) -> DirectoryTree {
        let entries = records.into_iter().map(DirectoryEntry::from).collect();
        DirectoryTree::from_entries(entries, &ParseConfig::default()).unwrap()
    }

    fn render_string(tree: &DirectoryTree) -> String {
        let mut out = Vec::new();
        render_text(tree, &mut out, &ParseConfig::default()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_root_and_child_lines() {
        let tree = tree_of(vec![
            RawRecord::new("root", 5, 0),
            RawRecord::new("child.txt", 6, 5).with_size(2048),
        ]);
        let report = render_string(&tree);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "root <> (0.0MB) Modified: 01/01/01 - 12:00:00",
                "\tchild.txt <> (0.001953125MB) Modified: 01/01/01 - 12:00:00",
            ]
        );
    }

    #[test]
    fn test_flags_and_size() {
        let tree = tree_of(vec![
            RawRecord::new("C:", 5, 5).with_flags(0x19),
            RawRecord::new("pagefile.sys", 6, 5)
                .with_flags(0x98)
                .with_size(3 * 1024 * 1024),
        ]);
        let report = render_string(&tree);
        assert!(report.starts_with("C: <DHS> (0.0MB)"));
        assert!(report.contains("\tpagefile.sys <HSA> (3.0MB)"));
    }

    #[test]
    fn test_modified_time_column() {
        let tree = tree_of(vec![
            RawRecord::new("root", 5, 0).with_modified(90 * FILETIME_TICKS_PER_SECOND)
        ]);
        assert_eq!(
            render_string(&tree),
            "root <> (0.0MB) Modified: 01/01/01 - 12:01:30\n"
        );
    }

    #[test]
    fn test_orphan_not_rendered() {
        let tree = tree_of(vec![
            RawRecord::new("root", 5, 0),
            RawRecord::new("kept", 6, 5),
            RawRecord::new("orphan", 7, 999),
        ]);
        let report = render_string(&tree);
        assert!(report.contains("kept"));
        assert!(!report.contains("orphan"));
        assert_eq!(report.lines().count(), 2);
    }

    #[test]
    fn test_nested_indentation() {
        let tree = tree_of(vec![
            RawRecord::new("root", 5, 0),
            RawRecord::new("a", 6, 5).with_flags(0x01),
            RawRecord::new("b", 7, 6).with_flags(0x01),
            RawRecord::new("c", 8, 7),
        ]);
        let report = render_string(&tree);
        let prefixes: Vec<usize> = report
            .lines()
            .map(|l| l.chars().take_while(|&c| c == '\t').count())
            .collect();
        assert_eq!(prefixes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_missing_root_is_error() {
        let tree = tree_of(vec![RawRecord::new("lonely", 6, 5)]);
        let mut out = Vec::new();
        let err = render_text(&tree, &mut out, &ParseConfig::default()).unwrap_err();
        assert!(matches!(err, ParseError::MissingRoot { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_custom_date_format() {
        let tree = tree_of(vec![RawRecord::new("root", 5, 0)]);
        let config = ParseConfig::default().with_date_format("%Y-%m-%d %H:%M:%S");
        let mut out = Vec::new();
        render_text(&tree, &mut out, &config).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "root <> (0.0MB) Modified: 1601-01-01 12:00:00\n"
        );
    }

    #[test]
    fn test_json_report() {
        let tree = tree_of(vec![
            RawRecord::new("root", 5, 0).with_flags(0x01),
            RawRecord::new("docs", 6, 5).with_flags(0x01),
            RawRecord::new("a.txt", 7, 6).with_size(10),
            RawRecord::new("orphan", 8, 999),
        ]);
        let mut out = Vec::new();
        let count = render_json(&tree, &mut out).unwrap();
        assert_eq!(count, 3);

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["root"]["name"], "root");
        assert_eq!(value["root"]["flags"], "D");
        assert_eq!(value["root"]["children"][0]["name"], "docs");
        assert_eq!(value["root"]["children"][0]["children"][0]["size"], 10);
        assert_eq!(
            value["root"]["children"][0]["children"][0]["modified"],
            "1601-01-01T12:00:00"
        );
        assert_eq!(value["stats"]["orphans"], 1);
    }

    #[test]
    fn test_unknown_date_specifier_fails_before_output() {
        let tree = tree_of(vec![RawRecord::new("root", 5, 0)]);
        let config = ParseConfig::default().with_date_format("%Q");
        let mut out = Vec::new();
        let err = render_text(&tree, &mut out, &config).unwrap_err();
        assert!(matches!(err, ParseError::InvalidDateFormat(ref f) if f == "%Q"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_invalid_date_format_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let tree = tree_of(vec![RawRecord::new("root", 5, 0)]);
        let config = ParseConfig::default().with_date_format("%Q");

        let err = render_to_file(&tree, &path, &config, ReportFormat::Text).unwrap_err();
        assert!(matches!(err, ParseError::InvalidDateFormat(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_size_exponent_padding() {
        assert_eq!(format_size_mb(0.0), "0.0");
        assert_eq!(format_size_mb(5.0), "5.0");
        assert_eq!(format_size_mb(0.001953125), "0.001953125");
        assert_eq!(format_size_mb(92.0 / 1048576.0), "8.7738037109375e-05");
        assert_eq!(format_size_mb(1e16), "1e+16");
        assert_eq!(format_size_mb(1.5e-300), "1.5e-300");
    }

    fn chain(depth: u64) -> DirectoryTree {
        let mut records = vec![RawRecord::new("root", 5, 0).with_flags(0x01)];
        for id in 6..6 + depth {
            records.push(RawRecord::new("d", id, id - 1).with_flags(0x01));
        }
        tree_of(records)
    }

    #[test]
    fn test_deep_chain_json() {
        let depth = 20_000u64;
        let tree = chain(depth);
        let mut out = Vec::new();
        let count = render_json(&tree, &mut out).unwrap();
        assert_eq!(count as u64, depth + 1);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\"children\":[").count() as u64, depth);
        assert_eq!(text.matches("]}").count() as u64, depth);
        assert_eq!(text.matches('{').count(), text.matches('}').count());
        assert!(text.ends_with("]}}\n"));
    }

    #[test]
    fn test_deep_chain_text() {
        let tree = chain(5_000);
        let mut out = Vec::new();
        assert_eq!(render_text(&tree, &mut out, &ParseConfig::default()).unwrap(), 5_001);
        let text = String::from_utf8(out).unwrap();
        let last = text.lines().last().unwrap();
        assert_eq!(last.chars().take_while(|&c| c == '\t').count(), 5_000);
    }

    #[test]
    fn test_json_siblings_after_deep_branch() {
        let tree = tree_of(vec![
            RawRecord::new("root", 5, 0).with_flags(0x01),
            RawRecord::new("a", 6, 5).with_flags(0x01),
            RawRecord::new("b", 7, 6).with_flags(0x01),
            RawRecord::new("c", 8, 7),
            RawRecord::new("d", 9, 5),
        ]);
        let mut out = Vec::new();
        render_json(&tree, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let children = &value["root"]["children"];
        assert_eq!(children[0]["children"][0]["children"][0]["name"], "c");
        assert_eq!(children[1]["name"], "d");
        assert!(children[1].get("children").is_none());
        assert_eq!(children.as_array().unwrap().len(), 2);
    }
}
