//! Output formatting for search results

use crate::corpus::Document;
use crate::query::file_executor::MatchLocations;
use std::io::{self, Write};
use std::ops::Range;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// A line containing at least one match, with spans relative to the line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch<'a> {
    pub line_number: usize,
    pub line: &'a [u8],
    pub spans: Vec<Range<usize>>,
}

pub fn color_choice(color: bool) -> ColorChoice {
    if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Group match locations by line, merging overlapping spans
pub fn match_lines<'a>(content: &'a [u8], locations: &MatchLocations) -> Vec<LineMatch<'a>> {
    let mut ranges: Vec<Range<usize>> = locations.values().flatten().cloned().collect();
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut lines = Vec::new();
    let mut offset = 0;
    let mut next = 0;

    for (idx, raw_line) in content.split_inclusive(|&b| b == b'\n').enumerate() {
        let line_end = offset + raw_line.len();
        let line = trim_line_ending(raw_line);
        let mut spans: Vec<Range<usize>> = Vec::new();

        // Ranges are sorted, so skip those that ended before this line
        while next < ranges.len() && ranges[next].end <= offset {
            next += 1;
        }
        for range in ranges[next..].iter().take_while(|r| r.start < line_end) {
            let start = range.start.max(offset) - offset;
            let end = range.end.min(offset + line.len()).saturating_sub(offset);
            if end <= start {
                continue;
            }
            match spans.last_mut() {
                Some(last) if start <= last.end => last.end = last.end.max(end),
                _ => spans.push(start..end),
            }
        }

        if !spans.is_empty() {
            lines.push(LineMatch {
                line_number: idx + 1,
                line,
                spans,
            });
        }
        offset = line_end;
    }

    lines
}

fn trim_line_ending(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\n' | b'\r'] = line {
        line = rest;
    }
    line
}

/// Print matched document paths, one per line
pub fn print_documents(documents: &[&Document], color: bool) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));
    for doc in documents {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(stdout, "{}", doc.path)?;
        stdout.reset()?;
        writeln!(stdout)?;
    }
    Ok(())
}

/// Print healing notices to stderr
pub fn print_notices(notices: &[String], color: bool) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(color_choice(color));
    for notice in notices {
        stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        write!(stderr, "note:")?;
        stderr.reset()?;
        writeln!(stderr, " {notice}")?;
    }
    Ok(())
}

/// Print matching lines of one file with every match highlighted
pub fn write_file_matches<W: WriteColor>(
    out: &mut W,
    path: &str,
    content: &[u8],
    locations: &MatchLocations,
) -> io::Result<()> {
    for m in match_lines(content, locations) {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(out, "{path}")?;
        out.reset()?;
        write!(out, ":")?;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{}", m.line_number)?;
        out.reset()?;
        write!(out, ":")?;

        // Lines are written as raw bytes, like the content they came from
        let mut cursor = 0;
        for span in &m.spans {
            out.write_all(&m.line[cursor..span.start])?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            out.write_all(&m.line[span.clone()])?;
            out.reset()?;
            cursor = span.end;
        }
        out.write_all(&m.line[cursor..])?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn print_file_matches(
    path: &str,
    content: &[u8],
    locations: &MatchLocations,
    color: bool,
) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));
    write_file_matches(&mut stdout, path, content, locations)
}
