// SYNOID Rough Cut Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use synoid_roughcut::agent::assignment::match_scenes_to_videos;
use synoid_roughcut::agent::clip_features::MediaFeatureExtractor;
use synoid_roughcut::agent::production_tools::render_rough_cut;
use synoid_roughcut::agent::ranking::{MatchingStrategy, Preferences, RankingEngine};
use synoid_roughcut::agent::script_segmenter::segment;
use synoid_roughcut::agent::source_tools::collect_clip_paths;
use synoid_roughcut::agent::vision_tools::detect_image_emotion;
use synoid_roughcut::server;
use synoid_roughcut::state::{RoughCutState, RuntimeConfig};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synoid-roughcut")]
#[command(about = "SYNOID Script-to-Rough-Cut Assembler", long_about = None)]
struct Cli {
    /// Override ffmpeg binary (SYNOID_FFMPEG)
    #[arg(long, global = true)]
    ffmpeg: Option<String>,

    /// Override ffprobe binary (SYNOID_FFPROBE)
    #[arg(long, global = true)]
    ffprobe: Option<String>,

    /// Matching strategy JSON (defaults to ./matching_strategy.json)
    #[arg(long, global = true)]
    strategy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a script into scenes
    Segment {
        /// Script text file
        #[arg(short, long)]
        script: PathBuf,

        /// Print scenes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Match script scenes to clips and render a rough cut
    Match {
        /// Script text file
        #[arg(short, long)]
        script: PathBuf,

        /// Clip files or directories to scan
        #[arg(short, long, num_args = 1.., required = true)]
        clips: Vec<PathBuf>,

        /// Director mood: balanced, happy, serious
        #[arg(long, default_value = "balanced")]
        mood: String,

        /// Pacing: standard, fast, slow
        #[arg(long, default_value = "standard")]
        pacing: String,

        /// Live viewer emotion: neutral, happy, sad, angry
        #[arg(long)]
        user_emotion: Option<String>,

        /// Output video path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the assignment without rendering
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify the emotion of a still image
    Emotion {
        #[arg(short, long)]
        image: PathBuf,
    },

    /// Start the HTTP API
    Serve {
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = RuntimeConfig::from_env();
    if let Some(ffmpeg) = cli.ffmpeg {
        config.ffmpeg = ffmpeg;
    }
    if let Some(ffprobe) = cli.ffprobe {
        config.ffprobe = ffprobe;
    }
    let strategy = match &cli.strategy {
        Some(path) => MatchingStrategy::load_from(path),
        None => MatchingStrategy::load(),
    };

    match cli.command {
        Commands::Segment { script, json } => {
            let text = std::fs::read_to_string(&script)
                .with_context(|| format!("Reading script {:?}", script))?;
            let scenes = segment(&text);

            if json {
                println!("{}", serde_json::to_string_pretty(&scenes)?);
            } else {
                for (i, scene) in scenes.iter().enumerate() {
                    println!(
                        "{:>3}. {} ({} lines, ~{:.1}s)",
                        i + 1,
                        scene.header,
                        scene.content.len(),
                        scene.estimated_duration
                    );
                }
            }
        }

        Commands::Match {
            script,
            clips,
            mood,
            pacing,
            user_emotion,
            output,
            dry_run,
        } => {
            let text = std::fs::read_to_string(&script)
                .with_context(|| format!("Reading script {:?}", script))?;
            let scenes = segment(&text);
            let clip_ids = collect_clip_paths(&clips);

            if scenes.is_empty() {
                bail!("Script {:?} contains no scenes", script);
            }
            if clip_ids.is_empty() {
                bail!("No video clips found in {:?}", clips);
            }

            let prefs = Preferences::from_strs(Some(&mood), Some(&pacing), user_emotion.as_deref());
            info!("[RANK] {} scenes, {} clips, {:?}", scenes.len(), clip_ids.len(), prefs);

            let engine = RankingEngine::new(strategy);
            let extractor = MediaFeatureExtractor::from_config(&config);
            let result = tokio::task::spawn_blocking(move || {
                match_scenes_to_videos(&engine, &extractor, &scenes, &clip_ids, &prefs)
            })
            .await?;

            for (i, m) in result.matches.iter().enumerate() {
                println!(
                    "{:>3}. {:<40} -> {} [{:.1}s - {:.1}s] score {:.2}",
                    i + 1,
                    m.scene.header,
                    m.clip_id,
                    m.start,
                    m.end,
                    m.score
                );
            }
            println!("Confidence: {}%", result.confidence);

            if dry_run {
                return Ok(());
            }

            let output = output.unwrap_or_else(|| config.output_dir.join(server::OUTPUT_FILE_NAME));
            let summary = render_rough_cut(&config.ffmpeg, &config.ffprobe, &result.matches, &output).await?;
            if summary.skipped > 0 {
                warn!("[RENDER] {} scenes had no usable footage", summary.skipped);
            }
            println!("Rough cut written to {:?} ({:.2} MB)", summary.output_path, summary.size_mb);
        }

        Commands::Emotion { image } => {
            println!("{}", detect_image_emotion(&image));
        }

        Commands::Serve { port } => {
            let state = Arc::new(RoughCutState::new(config, strategy));
            server::start_server(port, state).await?;
        }
    }

    Ok(())
}
