/// Reader for LCOV `.info` dumps.
///
/// Only the records that carry line hits matter here:
///   SF:<path to source file>
///   DA:<line number>,<execution count>[,<checksum>]
///   end_of_record
///
/// Function, branch and summary records are skipped.
use std::io::BufRead;
use std::path::Path;

use super::{DumpFile, DumpParser, Format, LineHit};
use crate::error::Result;

pub struct LcovParser;

impl DumpParser for LcovParser {
    fn format(&self) -> Format {
        Format::Lcov
    }

    fn can_parse(&self, path: &Path, content: &[u8]) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_lowercase();
            if ext == "info" || ext == "lcov" {
                return true;
            }
        }

        let head = super::sniff_head(content);
        let has_sf = head.lines().any(|l| l.starts_with("SF:"));
        let has_da = head.lines().any(|l| l.starts_with("DA:"));
        has_sf && has_da
    }

    fn parse_streaming(
        &self,
        reader: &mut dyn BufRead,
        emit: &mut dyn FnMut(DumpFile) -> Result<()>,
    ) -> Result<()> {
        let mut current: Option<DumpFile> = None;

        let mut raw_line = String::new();
        loop {
            raw_line.clear();
            if reader.read_line(&mut raw_line)? == 0 {
                break;
            }

            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if line == "end_of_record" {
                if let Some(file) = current.take() {
                    emit(file)?;
                }
                continue;
            }

            let Some((tag, value)) = line.split_once(':') else {
                continue;
            };

            match tag {
                "SF" => {
                    // a new SF without end_of_record still closes the previous file
                    if let Some(file) = current.replace(DumpFile::new(value.to_string())) {
                        emit(file)?;
                    }
                }
                "DA" => {
                    if let (Some(file), Some(hit)) = (current.as_mut(), parse_da(value)) {
                        file.lines.push(hit);
                    }
                }
                _ => {}
            }
        }

        if let Some(file) = current.take() {
            emit(file)?;
        }
        Ok(())
    }
}

/// `<line>,<count>[,<checksum>]`. Negative counts mark non-instrumentable
/// lines and are dropped.
fn parse_da(value: &str) -> Option<LineHit> {
    let mut parts = value.splitn(3, ',');
    let line_number = parts.next()?.parse::<u32>().ok()?;
    let count = parts.next()?.parse::<i64>().ok()?;
    if count < 0 {
        return None;
    }
    Some(LineHit {
        line_number,
        hit_count: count as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse_with_format;

    #[test]
    fn test_parse_lcov() {
        let input = include_bytes!("../../tests/fixtures/sample.lcov");
        let files = parse_with_format(Format::Lcov, input).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "src/users.rs");
        assert_eq!(files[0].lines.len(), 4);
        assert_eq!(files[0].executed().collect::<Vec<_>>(), vec![1, 2, 4]);
        assert_eq!(files[1].path, "src/products.rs");
        assert_eq!(files[1].executed().count(), 0);
    }

    #[test]
    fn test_parse_lcov_no_end_of_record() {
        let input = b"SF:/src/a.rs\nDA:1,1\nDA:2,0\n";
        let files = parse_with_format(Format::Lcov, input).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].lines.len(), 2);
    }

    #[test]
    fn test_parse_lcov_negative_and_garbage_counts() {
        let input = b"SF:/src/a.rs\nDA:1,5\nDA:2,-1\nDA:x,1\nDA:4,3,abcdef\nend_of_record\n";
        let files = parse_with_format(Format::Lcov, input).unwrap();
        let lines: Vec<u32> = files[0].lines.iter().map(|l| l.line_number).collect();
        assert_eq!(lines, vec![1, 4]);
    }

    #[test]
    fn test_parse_lcov_ignores_other_records() {
        let input = b"TN:t\nSF:/src/a.rs\nFN:1,main\nFNDA:1,main\nBRDA:1,0,0,1\nDA:1,1\nLF:1\nLH:1\nend_of_record\n";
        let files = parse_with_format(Format::Lcov, input).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].lines.len(), 1);
    }

    #[test]
    fn test_parse_lcov_empty() {
        let files = parse_with_format(Format::Lcov, b"TN:test\n").unwrap();
        assert!(files.is_empty());
    }
}
