/// Reader for Go cover profiles (`go test -coverprofile`, or
/// `go tool covdata textfmt` output from a `-cover` build).
///
/// Format:
///   mode: set|count|atomic
///   <file>:<startLine>.<startCol>,<endLine>.<endCol> <numStatements> <count>
///
/// Blocks are expanded to every line they span; a line touched by several
/// blocks keeps the highest count.
use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use std::path::Path;

use tracing::warn;

use super::{DumpFile, DumpParser, Format, LineHit};
use crate::error::Result;

/// Longest block expanded line by line. Anything wider is a corrupt dump.
pub const MAX_BLOCK_LINES: u32 = 100_000;

pub struct GocoverParser;

impl DumpParser for GocoverParser {
    fn format(&self) -> Format {
        Format::Gocover
    }

    fn can_parse(&self, path: &Path, content: &[u8]) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_lowercase();
            if ext == "coverprofile" || ext == "gocov" {
                return true;
            }
        }

        let head = super::sniff_head(content);
        if head.lines().next().is_some_and(|l| l.starts_with("mode: ")) {
            return true;
        }
        head.lines().any(looks_like_go_block)
    }

    fn parse_streaming(
        &self,
        reader: &mut dyn BufRead,
        emit: &mut dyn FnMut(DumpFile) -> Result<()>,
    ) -> Result<()> {
        // Blocks for one file may be spread across the profile, so collect
        // everything before emitting. Files keep first-seen order.
        let mut file_order: Vec<String> = Vec::new();
        let mut file_lines: HashMap<String, BTreeMap<u32, u64>> = HashMap::new();

        let mut raw_line = String::new();
        loop {
            raw_line.clear();
            if reader.read_line(&mut raw_line)? == 0 {
                break;
            }

            let line = raw_line.trim();
            if line.is_empty() || line.starts_with("mode:") {
                continue;
            }

            let Some((file, block)) = parse_block_line(line) else {
                continue;
            };
            if block.end_line < block.start_line
                || block.end_line - block.start_line >= MAX_BLOCK_LINES
            {
                warn!(block = line, "skipping implausible cover profile block");
                continue;
            }
            let lines = file_lines.entry(file.to_string()).or_insert_with(|| {
                file_order.push(file.to_string());
                BTreeMap::new()
            });
            for line_number in block.start_line..=block.end_line {
                let hits = lines.entry(line_number).or_insert(0);
                *hits = (*hits).max(block.count);
            }
        }

        for path in file_order {
            let Some(lines) = file_lines.remove(&path) else {
                continue;
            };
            let mut file = DumpFile::new(path);
            file.lines = lines
                .into_iter()
                .map(|(line_number, hit_count)| LineHit {
                    line_number,
                    hit_count,
                })
                .collect();
            emit(file)?;
        }
        Ok(())
    }
}

struct Block {
    start_line: u32,
    end_line: u32,
    count: u64,
}

/// e.g. `github.com/user/repo/file.go:10.1,20.5 3 1`
fn looks_like_go_block(line: &str) -> bool {
    let Some(colon_pos) = line.rfind(".go:") else {
        return false;
    };
    let after = &line[colon_pos + 4..];
    after.contains(',') && after.split_whitespace().count() >= 2
}

/// Split `<file>:<startLine>.<startCol>,<endLine>.<endCol> <numStmt> <count>`.
/// Anchoring on the last `.go:` keeps paths containing colons intact.
fn parse_block_line(line: &str) -> Option<(&str, Block)> {
    let colon_pos = line.rfind(".go:")? + 3;

    let file = &line[..colon_pos];
    let rest = &line[colon_pos + 1..];

    let (range, tail) = rest.split_once(' ')?;
    let (start, end) = range.split_once(',')?;

    let start_line: u32 = start.split_once('.')?.0.parse().ok()?;
    let end_line: u32 = end.split_once('.')?.0.parse().ok()?;

    let mut parts = tail.split_whitespace();
    let _num_stmt = parts.next()?;
    let count: u64 = parts.next()?.parse().ok()?;

    Some((
        file,
        Block {
            start_line,
            end_line,
            count,
        },
    ))
}
