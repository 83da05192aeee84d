use crate::segment::AlternativeTranscript;
use crate::subtitle::{self, SubtitleCue};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn save_srt(path: &Path, cues: &[SubtitleCue]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create subtitle file {:?}", path))?;
    file.write_all(subtitle::compose(cues).as_bytes())?;
    Ok(())
}

pub fn load_srt(path: &Path) -> Result<Vec<SubtitleCue>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read subtitle file {:?}", path))?;
    let cues = subtitle::parse(&content)
        .with_context(|| format!("Failed to parse subtitle file {:?}", path))?;
    Ok(cues)
}

/// One line per cue, ready to be translated line by line. Multi-line cue
/// text is joined with spaces.
pub fn save_txt(path: &Path, cues: &[SubtitleCue]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create text file {:?}", path))?;

    for cue in cues {
        let line = cue
            .content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(file, "{}", line)?;
    }

    Ok(())
}

pub fn load_txt(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read text file {:?}", path))?;
    Ok(content.lines().map(str::to_string).collect())
}

pub fn save_transcript(path: &Path, alternatives: &[&AlternativeTranscript]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create transcript {:?}", path))?;

    for alternative in alternatives {
        writeln!(file, "{}", alternative.full_text)?;
    }

    Ok(())
}

/// Words and timings of each segmented alternative.
pub fn save_transcript_json(path: &Path, alternatives: &[&AlternativeTranscript]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create transcript {:?}", path))?;
    serde_json::to_writer_pretty(file, alternatives)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::TimedWord;

    #[test]
    fn txt_lines_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en.txt");
        let cues = vec![
            SubtitleCue::new(1, 0, 1_000, "Hello world."),
            SubtitleCue::new(2, 1_200, 1_500, "Next"),
        ];

        save_txt(&path, &cues).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Hello world.\nNext\n");
        assert_eq!(load_txt(&path).unwrap(), vec!["Hello world.", "Next"]);
    }

    #[test]
    fn multi_line_cues_stay_on_one_txt_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en.txt");
        let cues = vec![
            SubtitleCue::new(1, 0, 1_000, "two\nlines"),
            SubtitleCue::new(2, 1_200, 1_500, " Next \r\n\n after "),
            SubtitleCue::new(3, 2_000, 2_400, "Last"),
        ];

        save_txt(&path, &cues).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "two lines\nNext after\nLast\n"
        );
        assert_eq!(load_txt(&path).unwrap().len(), cues.len());
    }

    #[test]
    fn transcript_json_lists_words_with_timings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en.transcript.json");
        let alternative = AlternativeTranscript {
            full_text: "Hello world.".to_string(),
            words: vec![
                TimedWord::new("Hello", 0, 500),
                TimedWord::new("world.", 500, 1_000),
            ],
        };

        save_transcript_json(&path, &[&alternative]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["full_text"], "Hello world.");
        assert_eq!(value[0]["words"][1]["text"], "world.");
        assert_eq!(value[0]["words"][1]["start"], 500);
        assert_eq!(value[0]["words"][1]["end"], 1_000);
    }

    #[test]
    fn load_txt_keeps_blank_lines_and_strips_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zh.txt");
        std::fs::write(&path, "你好\r\n\r\n再见\r\n").unwrap();

        assert_eq!(load_txt(&path).unwrap(), vec!["你好", "", "再见"]);
    }

    #[test]
    fn load_srt_names_the_file_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.srt");
        std::fs::write(&path, "one\n00:00:00,000 --> 00:00:01,000\nx\n").unwrap();

        let err = load_srt(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.srt"));
        assert!(format!("{:#}", err).contains("line 1"));
    }
}
