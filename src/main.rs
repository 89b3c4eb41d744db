use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use niche_shorts::assembler::Assembler;
use niche_shorts::config::Config;
use niche_shorts::generator::Pipeline;
use niche_shorts::media::load_media_list;
use niche_shorts::script::{Script, VideoRequest, VideoType};
use niche_shorts::workdir::prune_work_dirs;
use niche_shorts::{init, platform, set_log_hook};

#[derive(Parser, Debug)]
#[command(name = "niche-shorts")]
#[command(about = "Generate, assemble and publish short narrated videos for a niche", long_about = None)]
struct Cli {
    /// Path to config.json
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline: script, media, voiceover, assembly, publish
    Create {
        /// Topic of the video
        #[arg(short, long)]
        niche: String,

        /// short (~60s) or long (5-6 min)
        #[arg(long, default_value = "short")]
        video_type: VideoType,

        /// Comma-separated keywords, also used as tags
        #[arg(short, long)]
        keywords: Option<String>,

        /// Extra guidance for the script writer
        #[arg(short, long)]
        instructions: Option<String>,

        /// Target channel id
        #[arg(long)]
        channel_id: Option<String>,

        /// Mirror progress lines into this file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Open the output folder when done
        #[arg(long)]
        reveal: bool,
    },

    /// Assemble a video from a saved script, media list and voiceover
    Assemble {
        /// Script JSON (title, description, script, scenes)
        #[arg(long)]
        script: PathBuf,

        /// Media list JSON ([{type, path, scene, duration}])
        #[arg(long)]
        media: PathBuf,

        /// Voiceover audio file
        #[arg(long)]
        audio: PathBuf,
    },

    /// Delete old run directories under the work root
    Clean {
        #[arg(long, default_value_t = 24)]
        older_than_hours: u64,
    },
}

fn install_log_file(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;
    let file = Mutex::new(file);
    let hook = Arc::new(Mutex::new(move |line: &str| {
        let mut guard = file.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(guard, "{}", line);
    }));
    set_log_hook(Some(hook));
    Ok(())
}

/// Offline commands run without credentials, so they skip validation and
/// fall back to defaults when no config file exists.
async fn load_config_lenient(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    Config::from_json(&content)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            niche,
            video_type,
            keywords,
            instructions,
            channel_id,
            log_file,
            reveal,
        } => {
            let cfg = Config::load(&cli.config).await?;
            init::ensure_directories(&cfg).await?;
            init::check_ffmpeg(&cfg).await;
            if let Some(path) = &log_file {
                install_log_file(path)?;
            }

            let request = VideoRequest {
                niche,
                video_type,
                keywords,
                additional_instructions: instructions,
                channel_id,
            };
            let pipeline = Pipeline::from_config(&cfg)?;
            let result = pipeline.run(&request).await;
            set_log_hook(None);

            let outcome = result?;
            println!("{}", outcome.published.url);
            if reveal {
                if let Err(err) = platform::reveal_folder(&cfg.output_dir) {
                    tracing::warn!("Failed to open {}: {}", cfg.output_dir.display(), err);
                }
            }
        }

        Commands::Assemble {
            script,
            media,
            audio,
        } => {
            let cfg = load_config_lenient(&cli.config).await?;
            init::ensure_directories(&cfg).await?;

            let text = tokio::fs::read_to_string(&script)
                .await
                .with_context(|| format!("Failed to read script: {}", script.display()))?;
            let script = Script::from_json(&text)?;
            let media = load_media_list(&media).await?;

            let artifacts = Assembler::from_config(&cfg)
                .assemble(&script.scenes, &media, &audio)
                .await?;
            println!("{}", artifacts.output_video_path.display());
        }

        Commands::Clean { older_than_hours } => {
            let cfg = load_config_lenient(&cli.config).await?;
            let removed =
                prune_work_dirs(&cfg.work_root, Duration::from_secs(older_than_hours * 3600))
                    .await?;
            for path in &removed {
                println!("removed {}", path.display());
            }
            tracing::info!("Removed {} old run directories", removed.len());
        }
    }

    Ok(())
}
