use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod video {
    use super::*;
    use core_vidtile::services::video::{Video, VideoInfo, VideoReader, VideoService};

    pub async fn search_videos<P>(dir: P) -> Result<Vec<Video>>
    where
        P: AsRef<Path>,
    {
        VideoService::search_videos(dir).await
    }

    /// Probe every path; the first one that can't be opened fails the lot.
    pub async fn probe_all(paths: Vec<PathBuf>) -> Result<Vec<VideoInfo>> {
        tokio::task::spawn_blocking(move || {
            paths
                .iter()
                .map(|path| {
                    VideoReader::probe(path)
                        .with_context(|| format!("couldn't open video {}", path.display()))
                })
                .collect()
        })
        .await?
    }
}

pub mod record {
    use super::*;
    use std::sync::{atomic::AtomicBool, Arc};

    use core_vidtile::services::{
        record::{Progress, SessionOptions, SessionSummary, TileSession},
        tiling::{SamplePlan, TilePlan},
        video::{RecorderConfig, RecordingReport, VideoReader, VideoRecorder},
    };

    pub struct RecordJob {
        pub paths: Vec<PathBuf>,
        pub plan: TilePlan,
        pub samples: SamplePlan,
        pub recorder: RecorderConfig,
        pub options: SessionOptions,
    }

    pub struct RecordOutcome {
        pub summary: SessionSummary,
        pub report: Option<RecordingReport>,
    }

    /// Open the sources and the recorder and run the tiling session on a
    /// blocking thread. `started` gets the start-of-recording banner.
    pub async fn record<F, G>(
        job: RecordJob,
        cancel: Arc<AtomicBool>,
        started: G,
        progress: F,
    ) -> Result<RecordOutcome>
    where
        F: FnMut(Progress) + Send + 'static,
        G: FnOnce(RecordingReport) + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let readers = job
                .paths
                .iter()
                .map(|path| {
                    VideoReader::open(path)
                        .with_context(|| format!("couldn't open video {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?;

            let recorder = VideoRecorder::new(job.recorder).context("couldn't set up recording")?;
            started(recorder.report_start());

            let mut session =
                TileSession::new(readers, recorder, job.plan, job.samples, job.options)?;
            let summary = session.run(&cancel, progress)?;

            Ok(RecordOutcome {
                summary,
                report: session.sink().report_end(),
            })
        })
        .await?
    }
}
