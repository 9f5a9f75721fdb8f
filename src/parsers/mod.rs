//! Readers for the line-coverage dumps that out-of-process tracers leave
//! behind. Every parser reduces its format to per-line hit counts.

pub mod gocover;
pub mod lcov;

use std::io::BufRead;
use std::path::Path;

use crate::error::{Result, TiaError};

/// Supported dump formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Lcov,
    Gocover,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Lcov => "lcov",
            Format::Gocover => "gocover",
        }
    }

    fn parser(&self) -> &'static dyn DumpParser {
        match self {
            Format::Lcov => &lcov::LcovParser,
            Format::Gocover => &gocover::GocoverParser,
        }
    }
}

impl std::str::FromStr for Format {
    type Err = TiaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lcov" => Ok(Format::Lcov),
            "gocover" | "go" => Ok(Format::Gocover),
            _ => Err(TiaError::Parse(format!(
                "Unknown format: '{}'. Supported: lcov, gocover",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single instrumentable line and how often it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineHit {
    pub line_number: u32,
    pub hit_count: u64,
}

/// All line hits a dump reports for one source file.
#[derive(Debug, Clone, Default)]
pub struct DumpFile {
    pub path: String,
    pub lines: Vec<LineHit>,
}

impl DumpFile {
    pub fn new(path: String) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Lines with a positive hit count.
    pub fn executed(&self) -> impl Iterator<Item = u32> + '_ {
        self.lines
            .iter()
            .filter(|l| l.hit_count > 0)
            .map(|l| l.line_number)
    }
}

/// Every dump parser implements this trait.
pub trait DumpParser {
    fn format(&self) -> Format;

    /// Whether this parser recognises the file, by name or by content.
    fn can_parse(&self, path: &Path, content: &[u8]) -> bool;

    /// Parse the dump, calling `emit` once per source file.
    fn parse_streaming(
        &self,
        reader: &mut dyn BufRead,
        emit: &mut dyn FnMut(DumpFile) -> Result<()>,
    ) -> Result<()>;
}

/// The first few KB of a dump, lossily decoded, for content sniffing.
pub(crate) fn sniff_head(content: &[u8]) -> std::borrow::Cow<'_, str> {
    let head_len = content.len().min(4096);
    String::from_utf8_lossy(&content[..head_len])
}

/// Parsers tried by [`detect_format`], in order.
const PARSERS: [&dyn DumpParser; 2] = [&lcov::LcovParser, &gocover::GocoverParser];

/// Detect the dump format from filename and content.
pub fn detect_format(path: &Path, content: &[u8]) -> Option<Format> {
    PARSERS
        .iter()
        .find(|p| p.can_parse(path, content))
        .map(|p| p.format())
}

/// Read a whole dump from disk, auto-detecting its format unless one is
/// given. Returns the format used and one entry per source file.
pub fn read_dump(path: &Path, format: Option<Format>) -> Result<(Format, Vec<DumpFile>)> {
    let content = std::fs::read(path)?;
    let format = match format {
        Some(f) => f,
        None => detect_format(path, &content).ok_or(TiaError::UnknownFormat)?,
    };
    let files = parse_with_format(format, &content)?;
    Ok((format, files))
}

pub fn parse_with_format(format: Format, content: &[u8]) -> Result<Vec<DumpFile>> {
    let mut files = Vec::new();
    format.parser().parse_streaming(&mut &*content, &mut |file| {
        files.push(file);
        Ok(())
    })?;
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_lcov_by_extension() {
        assert_eq!(detect_format(Path::new("cov.info"), b""), Some(Format::Lcov));
        assert_eq!(detect_format(Path::new("cov.lcov"), b""), Some(Format::Lcov));
    }

    #[test]
    fn test_detect_by_content() {
        let lcov = b"TN:\nSF:/src/lib.rs\nDA:1,5\nend_of_record\n";
        assert_eq!(detect_format(Path::new("dump.txt"), lcov), Some(Format::Lcov));

        let go = b"mode: set\nexample.com/m/main.go:3.1,4.2 1 1\n";
        assert_eq!(detect_format(Path::new("dump.out"), go), Some(Format::Gocover));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_format(Path::new("random.dat"), b"hello world"), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("LCOV".parse::<Format>().unwrap(), Format::Lcov);
        assert_eq!("go".parse::<Format>().unwrap(), Format::Gocover);
        assert!("cobertura".parse::<Format>().is_err());
    }

    #[test]
    fn test_read_dump_unknown_format_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.dat");
        std::fs::write(&path, b"not coverage").unwrap();
        assert!(matches!(read_dump(&path, None), Err(TiaError::UnknownFormat)));
    }
}
