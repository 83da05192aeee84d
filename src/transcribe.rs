//! Recognition backend seam.
//!
//! Segmentation only needs what a long-running recognize call returns. The
//! shipped backend reads a response that was saved from the service, in
//! its JSON rendering.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use serde::Deserialize;

use crate::error::Error;
use crate::segment::{AlternativeTranscript, TimedWord};

#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub storage_uri: String,
    pub language_code: String,
    pub sample_rate_hertz: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionResult {
    /// Most probable first.
    pub alternatives: Vec<AlternativeTranscript>,
    pub language_code: Option<String>,
}

impl RecognitionResult {
    pub fn best(&self) -> Option<&AlternativeTranscript> {
        self.alternatives.first()
    }
}

pub trait Recognizer {
    fn recognize(&self, request: &RecognitionRequest) -> Result<Vec<RecognitionResult>>;
}

/// Reads a saved recognize response from a local path or `file://` URI.
#[derive(Debug, Default, Clone, Copy)]
pub struct SavedResponse;

impl Recognizer for SavedResponse {
    fn recognize(&self, request: &RecognitionRequest) -> Result<Vec<RecognitionResult>> {
        if request.sample_rate_hertz == 0 {
            anyhow::bail!("sample rate must be positive");
        }

        let path = resolve_storage_uri(&request.storage_uri)?;
        info!(
            "Reading recognition response {:?} ({}, {} Hz)",
            path, request.language_code, request.sample_rate_hertz
        );

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read recognition response {:?}", path))?;
        let results = parse_response(&content)
            .with_context(|| format!("Failed to decode recognition response {:?}", path))?;

        for result in &results {
            if let Some(lang) = &result.language_code {
                if !lang.eq_ignore_ascii_case(&request.language_code) {
                    warn!(
                        "Result language {} differs from requested {}",
                        lang, request.language_code
                    );
                }
            }
        }

        Ok(results)
    }
}

pub fn resolve_storage_uri(uri: &str) -> Result<PathBuf> {
    if let Some(path) = uri.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    match uri.split_once("://") {
        Some(_) => Err(Error::UnsupportedUri(uri.to_string()).into()),
        None => Ok(Path::new(uri).to_path_buf()),
    }
}

#[derive(Debug, Deserialize)]
struct Operation {
    response: Option<Response>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
struct Response {
    #[serde(default)]
    results: Vec<WireResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResult {
    #[serde(default)]
    alternatives: Vec<WireAlternative>,
    language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    words: Vec<WireWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireWord {
    word: String,
    start_time: Option<WireDuration>,
    end_time: Option<WireDuration>,
}

// Largest offset in seconds whose millisecond count still fits in a u64.
const MAX_SECONDS: f64 = (u64::MAX / 1_000) as f64;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireDuration {
    Text(String),
    Seconds(f64),
}

impl WireDuration {
    fn to_millis(&self) -> crate::error::Result<u64> {
        match self {
            WireDuration::Text(text) => parse_duration(text),
            WireDuration::Seconds(secs)
                if secs.is_finite() && *secs >= 0.0 && *secs <= MAX_SECONDS =>
            {
                Ok((secs * 1000.0).round() as u64)
            }
            WireDuration::Seconds(secs) => Err(Error::InvalidDuration(secs.to_string())),
        }
    }
}

/// Parses a duration rendered as `"1.500s"` into milliseconds. Digits past
/// the millisecond are dropped.
pub fn parse_duration(text: &str) -> crate::error::Result<u64> {
    let invalid = || Error::InvalidDuration(text.to_string());

    let number = text.trim().strip_suffix('s').ok_or_else(invalid)?;
    let (secs, fraction) = number.split_once('.').unwrap_or((number, ""));
    if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let secs: u64 = secs.parse().map_err(|_| invalid())?;
    let millis: String = fraction.chars().chain("000".chars()).take(3).collect();
    let millis: u64 = millis.parse().map_err(|_| invalid())?;

    secs.checked_mul(1_000)
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(invalid)
}

/// Decodes either a bare response body or a finished operation envelope.
pub fn parse_response(content: &str) -> Result<Vec<RecognitionResult>> {
    let value: serde_json::Value = serde_json::from_str(content)?;

    let response = if value.get("results").is_some() {
        serde_json::from_value::<Response>(value)?
    } else {
        let operation: Operation = serde_json::from_value(value)?;
        if let Some(error) = operation.error {
            return Err(anyhow!("recognition failed: {}", error));
        }
        operation.response.unwrap_or_default()
    };

    response
        .results
        .into_iter()
        .map(|result| -> Result<RecognitionResult> {
            let alternatives = result
                .alternatives
                .into_iter()
                .map(to_alternative)
                .collect::<Result<Vec<_>>>()?;
            Ok(RecognitionResult {
                alternatives,
                language_code: result.language_code,
            })
        })
        .collect()
}

// Offsets equal to zero are left out of the rendering.
fn millis_or_zero(duration: Option<&WireDuration>) -> crate::error::Result<u64> {
    duration.map(WireDuration::to_millis).unwrap_or(Ok(0))
}

fn to_alternative(wire: WireAlternative) -> Result<AlternativeTranscript> {
    let words = wire
        .words
        .into_iter()
        .map(|w| -> Result<TimedWord> {
            let start = millis_or_zero(w.start_time.as_ref())?;
            let end = millis_or_zero(w.end_time.as_ref())?;
            if end < start {
                return Err(anyhow!(
                    "word {:?} ends at {}ms before it starts at {}ms",
                    w.word,
                    end,
                    start
                ));
            }
            Ok(TimedWord::new(w.word, start, end))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AlternativeTranscript {
        full_text: wire.transcript,
        words,
    })
}
