//! Splits recognized words into subtitle cues.
//!
//! Timing always comes from the word list. Punctuation hints come from two
//! places: the word text itself (latin `.` `!` `?` `,`) and the continuous
//! transcript the recognizer rendered alongside the words, which is where
//! full-width CJK marks show up since they are never attached to a word.

use log::{debug, trace};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::subtitle::{SubtitleCue, sanitize};

const SENTENCE_ENDS: [char; 3] = ['.', '!', '?'];
const FULL_WIDTH_BREAKS: [char; 4] = ['，', '。', '！', '？'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedWord {
    pub text: String,
    pub start: u64, // milliseconds
    pub end: u64,   // milliseconds
}

impl TimedWord {
    pub fn new(text: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// One candidate transcription of an audio segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlternativeTranscript {
    pub full_text: String,
    pub words: Vec<TimedWord>,
}

/// Running cue index shared by every `Segmenter::segment` call that feeds
/// the same output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueCounter {
    next: usize,
}

impl CueCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Index the next emitted cue will get.
    pub fn peek(&self) -> usize {
        self.next
    }

    fn advance(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }
}

impl Default for CueCounter {
    fn default() -> Self {
        Self::new()
    }
}

// Walks the continuous transcript in step with the word list, counting in
// chars so multi-byte punctuation is never split.
struct TranscriptCursor<'a> {
    rest: &'a str,
}

impl<'a> TranscriptCursor<'a> {
    fn new(full_text: &'a str) -> Self {
        Self {
            rest: full_text.trim(),
        }
    }

    fn take(&mut self, chars: usize) -> &'a str {
        let split = self
            .rest
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(split);
        self.rest = rest;
        taken
    }

    fn skip_one(&mut self) {
        self.take(1);
    }

    fn at_full_width_break(&self) -> bool {
        self.rest
            .chars()
            .next()
            .is_some_and(|c| FULL_WIDTH_BREAKS.contains(&c))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    max_chars: usize,
}

impl Segmenter {
    pub fn new(max_chars: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(Error::InvalidMaxChars(max_chars));
        }
        Ok(Self { max_chars })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Segments one alternative, numbering cues from `counter`.
    ///
    /// A cue ends on the first word that:
    /// - contains `.`, `!` or `?`;
    /// - is followed in the transcript by `，` `。` `！` or `？`;
    /// - brings the cue's word-text length to `max_chars` or more;
    /// - contains `,` and is not the first word of the cue.
    ///
    /// Separators are not counted towards `max_chars`. Words left over at
    /// the end form one last cue.
    pub fn segment(
        &self,
        alternative: &AlternativeTranscript,
        counter: &mut CueCounter,
    ) -> Vec<SubtitleCue> {
        let mut cues = Vec::new();
        let mut cursor = TranscriptCursor::new(&alternative.full_text);

        let mut content: Vec<&str> = Vec::new();
        let mut charcount = 0;
        let mut firstword = true;
        let mut start = 0;
        let mut end = 0;

        for word in &alternative.words {
            if firstword {
                start = word.start;
            }
            end = word.end;

            let word_len = word.text.chars().count();
            charcount += word_len;
            content.push(word.text.trim());

            let peeked = cursor.take(word_len);
            trace!("{} > {}", word.text.trim(), peeked);

            let full_width_next = cursor.at_full_width_break();
            let breaks = word.text.contains(&SENTENCE_ENDS[..])
                || full_width_next
                || charcount >= self.max_chars
                || (word.text.contains(',') && !firstword);

            if breaks {
                debug!(
                    "breaking at {:?} ({} chars), transcript continues {:?}",
                    word.text.trim(),
                    charcount,
                    cursor.rest
                );
                push_cue(&mut cues, counter, &content, start, end);

                // a punctuation break leaves the mark at the cursor
                if charcount < self.max_chars || full_width_next {
                    cursor.skip_one();
                }

                content.clear();
                charcount = 0;
                firstword = true;
            } else {
                firstword = false;
            }
        }

        if !content.is_empty() {
            push_cue(&mut cues, counter, &content, start, end);
        }

        cues
    }

    /// Segments several alternatives into one contiguously numbered list.
    pub fn segment_all<'a, I>(&self, alternatives: I) -> Vec<SubtitleCue>
    where
        I: IntoIterator<Item = &'a AlternativeTranscript>,
    {
        let mut counter = CueCounter::new();
        alternatives
            .into_iter()
            .flat_map(|alternative| self.segment(alternative, &mut counter))
            .collect()
    }
}

fn push_cue(
    cues: &mut Vec<SubtitleCue>,
    counter: &mut CueCounter,
    words: &[&str],
    start: u64,
    end: u64,
) {
    let joined = words
        .iter()
        .filter(|w| !w.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let content = sanitize(&joined);
    if content.is_empty() {
        debug!("dropping cue with no displayable text at {}ms", start);
        return;
    }
    cues.push(SubtitleCue::new(counter.advance(), start, end, content));
}
