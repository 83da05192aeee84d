use log::{info, warn};

use crate::subtitle::SubtitleCue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Line replaces the cue content.
    Replace,
    /// Line goes under the existing content.
    #[default]
    Append,
}

impl From<bool> for MergeMode {
    fn from(replace: bool) -> Self {
        if replace {
            MergeMode::Replace
        } else {
            MergeMode::Append
        }
    }
}

/// Pairs cue `i` with line `i`, keeping every cue's index and timing.
///
/// Unpaired cues or lines at the end are dropped.
pub fn merge<S: AsRef<str>>(
    cues: Vec<SubtitleCue>,
    lines: &[S],
    mode: MergeMode,
) -> Vec<SubtitleCue> {
    if cues.len() != lines.len() {
        warn!(
            "{} cues but {} lines, keeping the first {}",
            cues.len(),
            lines.len(),
            cues.len().min(lines.len())
        );
    }

    let merged: Vec<SubtitleCue> = cues
        .into_iter()
        .zip(lines)
        .map(|(cue, line)| {
            let line = line.as_ref();
            let content = match mode {
                MergeMode::Replace => {
                    if line.trim().is_empty() {
                        warn!("Cue {} replaced with an empty line", cue.index);
                    }
                    line.to_string()
                }
                MergeMode::Append => format!("{}\n{}", cue.content, line),
            };
            SubtitleCue { content, ..cue }
        })
        .collect();

    info!("Merged {} cues ({:?})", merged.len(), mode);
    merged
}
