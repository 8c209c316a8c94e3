pub mod config;
pub mod models;
pub mod prompt;

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use core_vidtile::services::{
    files::{check_save_path, PathInfo},
    record::{EndReason, ExhaustedPolicy, Progress, SessionOptions},
    tiling::{grid_for, interpret_target_dimensions, CompositeOptions, SamplePlan, TilePlan},
    video::{FourCc, RecorderConfig, RecordingReport, VideoInfo},
};

use crate::core::service::{
    self,
    record::{RecordJob, RecordOutcome},
};
use config::{info::APP_NAME, settings::Settings};
use models::Video;
use prompt::{
    cli::{self as ask, confirm, file_list_select, folder_list_select, prompt_with_default},
    gui::{self, DialogConfig},
};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov", "mpg", "mpeg", "webm", "flv"];

/// Tile several videos into one grid video.
#[derive(Parser, Debug, Default)]
#[command(name = "vidtile", version)]
pub struct Cli {
    /// Videos to tile, in grid order.
    #[arg(long, num_args = 1..)]
    pub videos: Vec<PathBuf>,

    /// Offer the videos found in this folder. Given without a path, the
    /// folder is picked with a dialog.
    #[arg(long, num_args = 0..=1, conflicts_with = "videos")]
    pub dir: Option<Option<PathBuf>>,

    /// Output video. Without it (and with the save dialog dismissed) nothing
    /// is recorded.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output length in minutes.
    #[arg(long)]
    pub minutes: Option<f64>,

    /// Output frame rate.
    #[arg(long)]
    pub fps: Option<f64>,

    /// Number of grid columns.
    #[arg(long)]
    pub columns: Option<u32>,

    /// Output size, "WxH" or a single number for a square.
    #[arg(long)]
    pub size: Option<String>,

    /// Four-character codec tag, e.g. X264 or MJPG.
    #[arg(long)]
    pub codec: Option<FourCc>,

    #[arg(
        long,
        help = format!("What to do once a video runs out of frames: {}", ExhaustedPolicy::names())
    )]
    pub on_exhausted: Option<ExhaustedPolicy>,

    /// Draw lines between tiles.
    #[arg(long)]
    pub dividers: bool,

    /// Accept every default and overwrite without asking.
    #[arg(short, long)]
    pub yes: bool,

    /// Open the recording when done.
    #[arg(long)]
    pub open: bool,

    /// Console prompts only, no native dialogs.
    #[arg(long)]
    pub no_gui: bool,

    /// Settings file. Given without a path, a file dialog asks for it.
    #[arg(long, num_args = 0..=1)]
    pub config: Option<Option<PathBuf>>,

    /// More logging (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    fn gui(&self) -> bool {
        !self.no_gui
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;

    // Videos
    let paths = select_videos(&cli, &settings).await?;
    let infos = service::video::probe_all(paths.clone()).await?;
    for info in &infos {
        println!("{info}");
    }

    // Timing
    let minutes = match cli.minutes {
        Some(minutes) => minutes,
        None if cli.yes => bail!("--minutes is required with --yes"),
        None => prompt_with_default::<f64>("Enter output video length in minutes", None)?,
    };
    let fps = pick(cli.fps, settings.fps, cli.yes, "Enter the output framerate")?;
    if !(minutes > 0.0) || !(fps > 0.0) {
        bail!("runtime and frame rate must be positive (got {minutes} min at {fps} fps)");
    }
    let num_output_frames = output_frame_count(fps, minutes);

    // Layout
    let columns = pick(
        cli.columns,
        settings.columns,
        cli.yes,
        "Enter the number of columns for tiling",
    )?;
    let (rows, columns) = grid_for(infos.len(), columns);
    let plan = plan_output(&cli, &settings, &infos, rows, columns)?;
    tracing::info!(
        rows,
        columns,
        tile = %plan.tile,
        output = %plan.output,
        blank = plan.blank_cells(infos.len()),
        frames = num_output_frames,
        "tiling planned"
    );

    // Recording
    let output = select_output(&cli, &settings, &paths).await?;
    let recorder = RecorderConfig::new(output.clone().unwrap_or_default(), fps)
        .frame_size(plan.output)
        .codec(cli.codec.unwrap_or(settings.codec))
        .enabled(output.is_some());
    let options = SessionOptions {
        composite: CompositeOptions {
            filter: settings.filter,
            divider: if cli.dividers {
                Some(settings.divider)
            } else {
                settings.divider()
            },
        },
        on_exhausted: cli.on_exhausted.unwrap_or(settings.on_exhausted),
    };
    let job = RecordJob {
        samples: SamplePlan::new(infos.iter().map(|info| info.frame_count), num_output_frames),
        paths,
        plan,
        recorder,
        options,
    };

    let outcome = record(job).await?;
    println!(
        "{} of {} frames, {}",
        outcome.summary.composed, outcome.summary.requested, outcome.summary.reason
    );
    if let Some(report) = &outcome.report {
        println!("{report}");
    }

    if let (true, Some(path)) = (cli.open, output.as_ref()) {
        if outcome.summary.written > 0 {
            open::that(path).with_context(|| format!("couldn't open {}", path.display()))?;
        }
    }

    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    match &cli.config {
        None => Settings::load(None),
        Some(Some(path)) => Settings::load(Some(path)),
        Some(None) => {
            let dialog = DialogConfig::new("Select settings file").filter("settings", &["toml"]);
            let path = gui::gui_load(&dialog)?;
            Settings::load(Some(&path))
        }
    }
}

/// Value from the command line, else the default when `--yes`, else a prompt.
fn pick<T>(given: Option<T>, default: T, yes: bool, message: &str) -> Result<T>
where
    T: Clone + ToString + std::str::FromStr,
    T::Err: ToString,
{
    Ok(match given {
        Some(value) => value,
        None if yes => default,
        None => prompt_with_default(message, Some(default))?,
    })
}

fn output_frame_count(fps: f64, minutes: f64) -> usize {
    (1.0 + fps * minutes * 60.0).round() as usize
}

async fn select_videos(cli: &Cli, settings: &Settings) -> Result<Vec<PathBuf>> {
    if !cli.videos.is_empty() {
        return Ok(cli.videos.clone());
    }

    let dir = match (&cli.dir, cli.gui()) {
        (Some(Some(dir)), _) => dir.clone(),
        (Some(None), true) => {
            let dialog = DialogConfig::new("Select video folder")
                .search_dir(settings.search_dir.clone());
            gui::gui_folder_select(&dialog)?
        }
        (None, true) => {
            let dialog = DialogConfig::new("Select video files")
                .search_dir(settings.search_dir.clone())
                .filter("video", VIDEO_EXTENSIONS);
            return Ok(gui::gui_load_many(&dialog)?);
        }
        (_, false) => match &settings.search_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        },
    };

    let videos: Vec<Video> = service::video::search_videos(&dir)
        .await?
        .iter()
        .map(Video::from)
        .collect();
    if videos.is_empty() {
        bail!("no videos found in {}", dir.display());
    }

    let chosen: Vec<usize> = if cli.yes {
        videos
            .iter()
            .enumerate()
            .filter(|(_, video)| video.is_selected)
            .map(|(index, _)| index)
            .collect()
    } else {
        ask::multi_select("Select videos to tile", &videos)?
    };
    if chosen.is_empty() {
        bail!("no videos selected");
    }

    Ok(chosen.into_iter().map(|index| videos[index].path.clone()).collect())
}

fn plan_output(
    cli: &Cli,
    settings: &Settings,
    infos: &[VideoInfo],
    rows: u32,
    columns: u32,
) -> Result<TilePlan> {
    let dimensions: Vec<_> = infos.iter().map(VideoInfo::dimensions).collect();
    let default = TilePlan::plan(&dimensions, rows, columns, settings.max_output)?.output;

    let text = match &cli.size {
        Some(text) => text.clone(),
        None if cli.yes => default.to_string(),
        None => prompt_with_default("Enter output video size (w x h)", Some(default.to_string()))?,
    };
    let output = interpret_target_dimensions(&text, default);

    Ok(TilePlan::from_output(output, rows, columns)?)
}

/// Where to record, or `None` for a dry run.
async fn select_output(
    cli: &Cli,
    settings: &Settings,
    sources: &[PathBuf],
) -> Result<Option<PathBuf>> {
    let path = match &cli.output {
        Some(path) => Some(path.clone()),
        None if cli.yes => None,
        None if cli.gui() => {
            let search_dir = settings
                .search_dir
                .clone()
                .or_else(|| sources.first().and_then(|p| p.parent()).map(Path::to_owned));
            let dialog = DialogConfig::new("Save tiled video")
                .search_dir(search_dir)
                .file_name(settings.output_name.as_str())
                .filter("video", &["avi", "mp4", "mkv"]);
            gui::gui_save(&dialog)
        }
        None => {
            let base = match &settings.search_dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir()?,
            };
            let folder = folder_list_select(&base, "Select output folder:", None, true).await?;
            let file = file_list_select(
                &folder.full_path,
                "Select output file:",
                Some(settings.output_name.as_str()),
                true,
            )
            .await?;
            tracing::debug!(name = %file.name, created = file.created, "output file picked");
            Some(file.full_path)
        }
    };

    let Some(path) = path else {
        println!("No output selected, recording disabled");
        return Ok(None);
    };

    let gui = cli.gui();
    let yes = cli.yes;
    let keep = check_save_path(&path, |existing| {
        let name = PathInfo::of(existing).file_name;
        let message = format!("{name} already exists. Overwrite?");
        if yes {
            true
        } else if gui {
            gui::gui_confirm(APP_NAME, &message)
        } else {
            confirm(&message, false).unwrap_or(false)
        }
    })?;
    if !keep {
        bail!("not overwriting {}", path.display());
    }

    Ok(Some(path))
}

async fn record(job: RecordJob) -> Result<RecordOutcome> {
    let cancel = Arc::new(AtomicBool::new(false));
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, finishing the current frame");
                cancel.store(true, Ordering::Relaxed);
            }
        })
    };

    let bar = ProgressBar::new(job.samples.num_output_frames() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {eta} {msg}",
        )?
        .progress_chars("#>-"),
    );

    let started = {
        let bar = bar.clone();
        move |report: RecordingReport| bar.println(report.to_string())
    };
    let progress = {
        let bar = bar.clone();
        move |update: Progress| bar.set_position(update.frame as u64)
    };

    let outcome = service::record::record(job, cancel, started, progress).await;
    watcher.abort();

    match &outcome {
        Ok(outcome) if outcome.summary.reason == EndReason::Completed => {
            bar.finish_with_message("Done!")
        }
        Ok(outcome) => bar.abandon_with_message(outcome.summary.reason.to_string()),
        Err(err) => bar.abandon_with_message(format!("Error: {err}")),
    }

    outcome
}
