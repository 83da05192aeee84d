use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use std::path::PathBuf;

use speech2srt::config::{self, AppConfig};
use speech2srt::output;
use speech2srt::transcribe::{RecognitionRequest, Recognizer, SavedResponse};
use speech2srt::{CueCounter, MergeMode, Segmenter};

#[derive(Parser)]
#[command(name = "speech2srt")]
#[command(
    about = "Speech recognition to SRT subtitles, and subtitle text merging",
    long_about = None
)]
struct Cli {
    /// Configuration profile or file path
    #[arg(short, long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a recognition response into subtitles
    Transcribe {
        /// Saved recognition response: a path or file:// URI
        #[arg(long)]
        storage_uri: Option<String>,

        /// Language the audio was recognized in (default: en-US)
        #[arg(long)]
        language_code: Option<String>,

        /// Sample rate of the recognized audio (default: 16000)
        #[arg(long)]
        sample_rate_hertz: Option<u32>,

        /// Output basename for the .srt, .txt and transcript files (default: en)
        #[arg(long)]
        out_file: Option<String>,

        /// Word characters per cue before a forced break (default: 20)
        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Put new text lines on the timings of an existing subtitle file
    Merge {
        /// Subtitle file whose timings are kept
        #[arg(long)]
        source: PathBuf,

        /// Text file, one line per cue
        #[arg(long)]
        target: PathBuf,

        /// Output subtitle file (default: output.srt)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Replace cue text instead of appending below it
        #[arg(long)]
        replace: bool,
    },
}

fn load_config(profile: Option<&str>) -> anyhow::Result<AppConfig> {
    match profile {
        Some(p) => {
            let conf_path = config::resolve_profile_path(p)?;
            config::load_config_file(&conf_path).context("Failed to load profile")
        }
        None => config::load_app_config().context("Failed to load app config"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let app_config = load_config(cli.profile.as_deref())?;

    match cli.command {
        Commands::Transcribe {
            storage_uri,
            language_code,
            sample_rate_hertz,
            out_file,
            max_chars,
        } => {
            let conf = app_config.transcribe;
            let segmenter = Segmenter::new(max_chars.unwrap_or(conf.max_chars))
                .context("Invalid --max-chars")?;

            let request = RecognitionRequest {
                storage_uri: storage_uri
                    .or(conf.storage_uri)
                    .context("No --storage-uri given and none configured")?,
                language_code: language_code.unwrap_or(conf.language_code),
                sample_rate_hertz: sample_rate_hertz.unwrap_or(conf.sample_rate_hertz),
            };
            let out_file = out_file.unwrap_or(conf.out_file);

            println!("Transcribing {} ...", request.storage_uri);
            let results = SavedResponse
                .recognize(&request)
                .context("Recognition failed")?;

            let pb = ProgressBar::new(results.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}",
                    )?
                    .progress_chars("#>-"),
            );

            // first alternative is the most probable one
            let mut counter = CueCounter::new();
            let mut cues = Vec::new();
            let mut transcripts = Vec::new();
            for (i, result) in results.iter().enumerate() {
                match result.best() {
                    Some(best) => {
                        cues.extend(segmenter.segment(best, &mut counter));
                        transcripts.push(best);
                    }
                    None => warn!("Result {} has no alternatives", i),
                }
                pb.inc(1);
            }
            pb.finish_with_message("Segmentation complete");
            println!("Transcribing finished: {} cues", cues.len());

            let srt_path = PathBuf::from(format!("{}.srt", out_file));
            output::save_srt(&srt_path, &cues)?;
            println!("Writing {} subtitles to {:?}", request.language_code, srt_path);

            let txt_path = PathBuf::from(format!("{}.txt", out_file));
            output::save_txt(&txt_path, &cues)?;
            println!("Writing text to {:?}", txt_path);

            let transcript_path = PathBuf::from(format!("{}.transcript.txt", out_file));
            output::save_transcript(&transcript_path, &transcripts)?;
            println!("Saved transcript to {:?}", transcript_path);

            let json_path = PathBuf::from(format!("{}.transcript.json", out_file));
            output::save_transcript_json(&json_path, &transcripts)?;
            println!("Saved transcript JSON to {:?}", json_path);
        }
        Commands::Merge {
            source,
            target,
            output: output_arg,
            replace,
        } => {
            let conf = app_config.merge;
            let output_path = output_arg.unwrap_or(conf.output);
            let mode = MergeMode::from(replace || conf.replace);

            println!("Loading {:?}", source);
            let cues = output::load_srt(&source)?;
            println!("Loading {:?}", target);
            let lines = output::load_txt(&target)?;

            let merged = speech2srt::merge(cues, &lines, mode);
            output::save_srt(&output_path, &merged)?;
            println!("Saved {} merged cues to {:?}", merged.len(), output_path);
        }
    }

    Ok(())
}
