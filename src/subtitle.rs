use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{Error, Result};

static TIMESTAMP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2})[,.](\d{1,3})$").unwrap());

// Anything after the end timestamp (positional coordinates) is ignored.
static TIMING_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\s*(\d+):(\d{2}):(\d{2})[,.](\d{1,3})",
        r"\s*-->\s*",
        r"(\d+):(\d{2}):(\d{2})[,.](\d{1,3})"
    ))
    .unwrap()
});

/// One timed subtitle block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCue {
    pub index: usize,
    pub start: u64, // milliseconds
    pub end: u64,   // milliseconds
    pub content: String,
}

impl SubtitleCue {
    pub fn new(index: usize, start: u64, end: u64, content: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            content: content.into(),
        }
    }
}

impl fmt::Display for SubtitleCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(
            f,
            "{} --> {}",
            format_timestamp(self.start),
            format_timestamp(self.end)
        )?;
        writeln!(f, "{}", sanitize(&self.content))?;
        writeln!(f)
    }
}

pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Parses `HH:MM:SS,mmm` (or `.mmm`) into milliseconds.
pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
    let caps = TIMESTAMP_REGEX
        .captures(timestamp.trim())
        .ok_or_else(|| Error::InvalidTimestamp(timestamp.to_string()))?;
    timestamp_from_captures(&caps, 1)
        .ok_or_else(|| Error::InvalidTimestamp(timestamp.to_string()))
}

// Reads the four groups starting at `first` as hours, minutes, seconds and
// fraction. A short fraction is right-padded, so ",5" is 500ms.
fn timestamp_from_captures(caps: &Captures<'_>, first: usize) -> Option<u64> {
    let hours: u64 = caps.get(first)?.as_str().parse().ok()?;
    let minutes: u64 = caps.get(first + 1)?.as_str().parse().ok()?;
    let seconds: u64 = caps.get(first + 2)?.as_str().parse().ok()?;
    let fraction = caps.get(first + 3)?.as_str();
    let millis: u64 = format!("{:0<3}", fraction).parse().ok()?;

    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    hours
        .checked_mul(3_600_000)?
        .checked_add(minutes * 60_000 + seconds * 1_000 + millis)
}

/// Makes text safe to place in an SRT block: line endings are normalized,
/// control characters are dropped (tabs become spaces), blank lines are
/// removed and the whole text is trimmed.
pub fn sanitize(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let cleaned: String = normalized
        .chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();

    cleaned
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn compose(cues: &[SubtitleCue]) -> String {
    cues.iter().map(|cue| cue.to_string()).collect()
}

/// Parses SRT text into cues, keeping the indices found in the file.
pub fn parse(text: &str) -> Result<Vec<SubtitleCue>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines().enumerate().map(|(i, line)| (i + 1, line)).peekable();
    let mut cues = Vec::new();

    loop {
        // skip separators
        while lines.next_if(|(_, line)| line.trim().is_empty()).is_some() {}

        let Some((line_no, index_line)) = lines.next() else {
            break;
        };
        let index: usize = index_line.trim().parse().map_err(|_| Error::MalformedSrt {
            line: line_no,
            reason: format!("expected cue index, found {:?}", index_line),
        })?;

        let (line_no, timing_line) = lines.next().ok_or(Error::MalformedSrt {
            line: line_no + 1,
            reason: "missing timing line".to_string(),
        })?;
        let caps = TIMING_LINE_REGEX
            .captures(timing_line)
            .ok_or_else(|| Error::MalformedSrt {
                line: line_no,
                reason: format!("expected timing line, found {:?}", timing_line),
            })?;
        let (start, end) = timestamp_from_captures(&caps, 1)
            .zip(timestamp_from_captures(&caps, 5))
            .ok_or_else(|| Error::MalformedSrt {
                line: line_no,
                reason: format!("timestamp out of range in {:?}", timing_line),
            })?;

        let mut content = Vec::new();
        while let Some((_, line)) = lines.next_if(|(_, line)| !line.trim().is_empty()) {
            content.push(line);
        }

        cues.push(SubtitleCue::new(index, start, end, content.join("\n")));
    }

    debug!("Parsed {} subtitle cues", cues.len());
    Ok(cues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_formats_and_parses() {
        assert_eq!(format_timestamp(5_025_678), "01:23:45,678");
        assert_eq!(format_timestamp(0), "00:00:00,000");
        assert_eq!(format_timestamp(360_000_000), "100:00:00,000");

        assert_eq!(parse_timestamp("01:23:45,678").unwrap(), 5_025_678);
        assert_eq!(parse_timestamp("00:00:01.5").unwrap(), 1_500);
        assert!(parse_timestamp("00:61:00,000").is_err());
        assert!(parse_timestamp("nonsense").is_err());
    }

    #[test]
    fn oversized_hours_are_rejected() {
        assert_eq!(
            parse_timestamp("99999999999999:00:00,000").unwrap_err(),
            Error::InvalidTimestamp("99999999999999:00:00,000".to_string())
        );
        // hours beyond u64 do not parse at all
        assert!(parse_timestamp("99999999999999999999999:00:00,000").is_err());

        let text = "1\n99999999999999:00:00,000 --> 99999999999999:00:01,000\nx\n";
        assert!(matches!(parse(text).unwrap_err(), Error::MalformedSrt { line: 2, .. }));
    }

    #[test]
    fn sanitize_removes_blank_lines_and_controls() {
        assert_eq!(sanitize("\nhello\n\n\nworld\n"), "hello\nworld");
        assert_eq!(sanitize("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(sanitize("tab\there\u{0007}"), "tab here");
        assert_eq!(sanitize("  \n \t \n"), "");
        assert_eq!(sanitize("你好，世界"), "你好，世界");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "",
            " plain ",
            "\n\nlead",
            "x\n \ny",
            "a\r\n\r\nb",
            "\u{2028}\nmid\u{0085}dle\n\u{2028}",
            "1\n00:00:01,000 --> 00:00:02,000\n\nnext",
            "\t\ttabs\t",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn display_renders_block() {
        let cue = SubtitleCue::new(3, 61_234, 65_432, "Hello\n\nWorld");
        assert_eq!(
            cue.to_string(),
            "3\n00:01:01,234 --> 00:01:05,432\nHello\nWorld\n\n"
        );
    }

    #[test]
    fn parse_reads_what_compose_writes() {
        let cues = vec![
            SubtitleCue::new(1, 0, 1_000, "Hello world."),
            SubtitleCue::new(2, 1_200, 1_500, "two\nlines"),
        ];
        assert_eq!(parse(&compose(&cues)).unwrap(), cues);
    }

    #[test]
    fn parse_tolerates_bom_crlf_and_coordinates() {
        let text = concat!(
            "\u{feff}\r\n7\r\n00:00:01,000 --> 00:00:02,500 X1:10 X2:20\r\nfirst\r\n\r\n\r\n",
            "8\r\n00:00:03.000 --> 00:00:04.000\r\nsecond"
        );
        let cues = parse(text).unwrap();
        assert_eq!(
            cues,
            vec![
                SubtitleCue::new(7, 1_000, 2_500, "first"),
                SubtitleCue::new(8, 3_000, 4_000, "second"),
            ]
        );
    }

    #[test]
    fn parse_reports_line_of_bad_block() {
        let text =
            "1\n00:00:01,000 --> 00:00:02,000\nok\n\nabc\n00:00:03,000 --> 00:00:04,000\nx\n";
        assert_eq!(
            parse(text).unwrap_err(),
            Error::MalformedSrt {
                line: 5,
                reason: "expected cue index, found \"abc\"".to_string(),
            }
        );

        let missing = parse("1\n").unwrap_err();
        assert!(matches!(missing, Error::MalformedSrt { line: 2, .. }));

        let bad_timing = parse("1\nnot a timing line\n").unwrap_err();
        assert!(matches!(bad_timing, Error::MalformedSrt { line: 2, .. }));
    }

    #[test]
    fn parse_empty_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n").unwrap().is_empty());
    }
}
