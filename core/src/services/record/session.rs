use std::{
    fmt,
    ops::ControlFlow,
    sync::atomic::{AtomicBool, Ordering},
};

use image::RgbImage;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::{
    cursor::SourceCursor,
    traits::{FrameSink, FrameSource},
};
use crate::{
    error::{SessionError, TilingError},
    services::tiling::{composite, CompositeOptions, SamplePlan, TilePlan},
};

/// What to put in a cell once its source has no frame for the target index.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustedPolicy {
    /// End the recording.
    Stop,
    #[default]
    Blank,
    /// Repeat the last decoded frame.
    Hold,
}

impl ExhaustedPolicy {
    /// Every policy name, comma separated.
    pub fn names() -> String {
        Self::iter()
            .map(|policy| policy.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    Idle,
    Recording,
    Closed,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SessionOptions {
    pub composite: CompositeOptions,
    pub on_exhausted: ExhaustedPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Output frames composed so far, starting at 1.
    pub frame: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Completed,
    Cancelled,
    SourceExhausted { source: usize },
    Closed,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Completed => write!(f, "completed"),
            EndReason::Cancelled => write!(f, "cancelled"),
            EndReason::SourceExhausted { source } => write!(f, "source {source} ran out of frames"),
            EndReason::Closed => write!(f, "closed early"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Composites handed to the sink.
    pub composed: usize,
    /// Composites the sink kept.
    pub written: usize,
    pub requested: usize,
    pub reason: EndReason,
}

/// Drives the sources through a sample plan into one tiled sink.
///
/// Starts `Idle`, becomes `Recording` with the first composite and ends
/// `Closed`. The sink is closed and the sources released on every way out,
/// drop included.
pub struct TileSession<S: FrameSource, K: FrameSink> {
    cursors: Vec<SourceCursor<S>>,
    sink: K,
    plan: TilePlan,
    samples: SamplePlan,
    options: SessionOptions,
    state: SessionState,
    next: usize,
    composed: usize,
    written: usize,
    reason: Option<EndReason>,
}

impl<S: FrameSource, K: FrameSink> TileSession<S, K> {
    pub fn new(
        sources: Vec<S>,
        sink: K,
        plan: TilePlan,
        samples: SamplePlan,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        if sources.is_empty() {
            return Err(TilingError::NoSources.into());
        }
        if samples.num_sources() != sources.len() {
            return Err(SessionError::PlanMismatch {
                expected: sources.len(),
                actual: samples.num_sources(),
            });
        }
        if sources.len() > plan.cells() {
            return Err(TilingError::TooManyFrames {
                frames: sources.len(),
                rows: plan.rows,
                columns: plan.columns,
            }
            .into());
        }

        Ok(Self {
            cursors: sources.into_iter().map(SourceCursor::new).collect(),
            sink,
            plan,
            samples,
            options,
            state: SessionState::Idle,
            next: 0,
            composed: 0,
            written: 0,
            reason: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn plan(&self) -> &TilePlan {
        &self.plan
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn total(&self) -> usize {
        self.samples.num_output_frames()
    }

    /// Compose and write the next output frame.
    ///
    /// Breaks with the reason once the session is over; the session is
    /// closed by then.
    pub fn step(&mut self) -> Result<ControlFlow<EndReason, Progress>, SessionError> {
        if self.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }

        let k = self.next;
        if k >= self.total() {
            return self.finish(EndReason::Completed).map(ControlFlow::Break);
        }

        let mut frames = Vec::with_capacity(self.cursors.len());
        let mut stopped = None;
        for (source, cursor) in self.cursors.iter_mut().enumerate() {
            let target = self.samples.target(source, k).unwrap_or_default();
            let frame = match cursor.frame_at(target)? {
                Some(frame) => Some(frame.clone()),
                None => match self.options.on_exhausted {
                    ExhaustedPolicy::Stop => {
                        stopped = Some(source);
                        break;
                    }
                    ExhaustedPolicy::Blank => None,
                    ExhaustedPolicy::Hold => cursor.held().cloned(),
                },
            };
            frames.push(frame);
        }

        if let Some(source) = stopped {
            let reason = EndReason::SourceExhausted { source };
            return self.finish(reason).map(ControlFlow::Break);
        }

        let tiled: RgbImage = composite(&frames, &self.plan, &self.options.composite)?;
        if self.sink.write(&tiled)? {
            self.written += 1;
        }
        self.composed += 1;
        self.next += 1;

        if self.state == SessionState::Idle {
            tracing::debug!(output = %self.plan.output, "recording");
            self.state = SessionState::Recording;
        }

        Ok(ControlFlow::Continue(Progress {
            frame: self.composed,
            total: self.total(),
        }))
    }

    /// Record every planned frame unless `cancel` is raised first.
    ///
    /// `cancel` is checked once per output frame.
    pub fn run<F>(
        &mut self,
        cancel: &AtomicBool,
        mut progress: F,
    ) -> Result<SessionSummary, SessionError>
    where
        F: FnMut(Progress),
    {
        let reason = loop {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!(frame = self.composed, "recording cancelled");
                break EndReason::Cancelled;
            }

            match self.step() {
                Ok(ControlFlow::Continue(update)) => progress(update),
                Ok(ControlFlow::Break(reason)) => break reason,
                Err(err) => {
                    if let Err(close_err) = self.close() {
                        tracing::error!("failed to close session: {close_err}");
                    }
                    return Err(err);
                }
            }
        };

        self.finish(reason)?;
        Ok(self.summary())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            composed: self.composed,
            written: self.written,
            requested: self.total(),
            reason: self.reason.unwrap_or(EndReason::Closed),
        }
    }

    /// Close the sink and release the sources. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), SessionError> {
        self.finish(EndReason::Closed).map(|_| ())
    }

    fn finish(&mut self, reason: EndReason) -> Result<EndReason, SessionError> {
        if self.state == SessionState::Closed {
            return Ok(self.reason.unwrap_or(reason));
        }

        self.state = SessionState::Closed;
        self.reason = Some(reason);
        for cursor in &mut self.cursors {
            cursor.release();
        }
        self.sink.close()?;

        tracing::info!(
            composed = self.composed,
            written = self.written,
            requested = self.total(),
            reason = %reason,
            "session closed"
        );
        Ok(reason)
    }
}

impl<S: FrameSource, K: FrameSink> Drop for TileSession<S, K> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::error!("failed to close session: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::VideoError,
        services::{
            tiling::{Dimensions, TilePlan},
            video::VideoInfo,
        },
    };
    use image::Rgb;
    use std::{
        cell::{Cell, RefCell},
        collections::VecDeque,
        rc::Rc,
    };

    /// Frames are solid grey with the frame index as the value.
    struct MemorySource {
        info: VideoInfo,
        frames: VecDeque<RgbImage>,
        released: Rc<Cell<bool>>,
        reads: usize,
        fail_on_read: Option<usize>,
    }

    impl MemorySource {
        fn new(frame_count: u64, released: Rc<Cell<bool>>) -> Self {
            let frames = (0..frame_count)
                .map(|i| RgbImage::from_pixel(8, 6, Rgb([i as u8; 3])))
                .collect();
            Self {
                info: VideoInfo {
                    width: 8,
                    height: 6,
                    frame_count,
                    frame_rate: 30.0,
                    source_name: format!("mem{frame_count}"),
                    path: "mem".into(),
                },
                frames,
                released,
                reads: 0,
                fail_on_read: None,
            }
        }

        /// Errors on the `n`th read, counting from 1.
        fn failing_on(mut self, n: usize) -> Self {
            self.fail_on_read = Some(n);
            self
        }
    }

    impl FrameSource for MemorySource {
        fn info(&self) -> &VideoInfo {
            &self.info
        }

        fn read(&mut self) -> Result<Option<RgbImage>, VideoError> {
            self.reads += 1;
            if self.fail_on_read == Some(self.reads) {
                return Err(VideoError::Closed(self.info.path.clone()));
            }
            Ok(self.frames.pop_front())
        }

        fn release(&mut self) {
            self.released.set(true);
        }
    }

    #[derive(Default, Clone)]
    struct MemorySink {
        frames: Rc<RefCell<Vec<RgbImage>>>,
        closes: Rc<Cell<u32>>,
    }

    impl FrameSink for MemorySink {
        fn write(&mut self, frame: &RgbImage) -> Result<bool, VideoError> {
            self.frames.borrow_mut().push(frame.clone());
            Ok(true)
        }

        fn close(&mut self) -> Result<(), VideoError> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    fn plan() -> TilePlan {
        TilePlan::from_output(Dimensions::new(16, 12), 2, 2).unwrap()
    }

    fn session(
        frame_counts: &[u64],
        plan_counts: &[u64],
        n: usize,
        policy: ExhaustedPolicy,
    ) -> (TileSession<MemorySource, MemorySink>, MemorySink, Rc<Cell<bool>>) {
        let released = Rc::new(Cell::new(false));
        let sources = frame_counts
            .iter()
            .map(|&count| MemorySource::new(count, released.clone()))
            .collect();
        let sink = MemorySink::default();
        let options = SessionOptions {
            on_exhausted: policy,
            ..Default::default()
        };
        let session = TileSession::new(
            sources,
            sink.clone(),
            plan(),
            SamplePlan::new(plan_counts.iter().copied(), n),
            options,
        )
        .unwrap();
        (session, sink, released)
    }

    fn cell(frame: &RgbImage, index: usize) -> u8 {
        let (x, y) = plan().cell_origin(index);
        frame.get_pixel(x + 2, y + 2)[0]
    }

    #[test]
    fn writes_every_planned_frame_with_exact_targets() {
        let (mut session, sink, released) =
            session(&[10, 3, 5], &[10, 3, 5], 5, ExhaustedPolicy::Blank);

        let mut updates = Vec::new();
        let summary = session
            .run(&AtomicBool::new(false), |p| updates.push(p.frame))
            .unwrap();

        assert_eq!(summary.reason, EndReason::Completed);
        assert_eq!(summary.written, 5);
        assert_eq!(summary.requested, 5);
        assert_eq!(updates, [1, 2, 3, 4, 5]);
        assert_eq!(sink.closes.get(), 1);
        assert!(released.get());

        let frames = sink.frames.borrow();
        assert_eq!(frames.len(), 5);
        for frame in frames.iter() {
            assert_eq!(frame.dimensions(), (16, 12));
            // fourth cell has no source
            assert_eq!(cell(frame, 3), 0);
        }

        let first: Vec<u8> = frames.iter().map(|f| cell(f, 0)).collect();
        assert_eq!(first, [0, 2, 5, 7, 9]);
        let second: Vec<u8> = frames.iter().map(|f| cell(f, 1)).collect();
        assert_eq!(second, [0, 1, 1, 2, 2]);
    }

    #[test]
    fn states_move_from_idle_to_closed() {
        let (mut session, sink, _) = session(&[4], &[4], 2, ExhaustedPolicy::Blank);
        assert_eq!(session.state(), SessionState::Idle);

        assert!(matches!(session.step().unwrap(), ControlFlow::Continue(_)));
        assert_eq!(session.state(), SessionState::Recording);
        assert!(matches!(session.step().unwrap(), ControlFlow::Continue(_)));
        assert_eq!(
            session.step().unwrap(),
            ControlFlow::Break(EndReason::Completed)
        );
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(sink.closes.get(), 1);

        assert!(matches!(session.step(), Err(SessionError::Closed)));
    }

    #[test]
    fn blank_policy_keeps_going() {
        // the plan believes in 10 frames, the source only has 4
        let (mut session, sink, _) = session(&[4], &[10], 4, ExhaustedPolicy::Blank);
        let summary = session.run(&AtomicBool::new(false), |_| {}).unwrap();

        assert_eq!(summary.reason, EndReason::Completed);
        let frames = sink.frames.borrow();
        let values: Vec<u8> = frames.iter().map(|f| cell(f, 0)).collect();
        assert_eq!(values, [0, 3, 0, 0]);
    }

    #[test]
    fn hold_policy_repeats_the_last_frame() {
        let (mut session, sink, _) = session(&[4], &[10], 4, ExhaustedPolicy::Hold);
        session.run(&AtomicBool::new(false), |_| {}).unwrap();

        let values: Vec<u8> = sink.frames.borrow().iter().map(|f| cell(f, 0)).collect();
        assert_eq!(values, [0, 3, 3, 3]);
    }

    #[test]
    fn hold_repeats_the_final_frame_when_the_source_ends_between_targets() {
        // targets are 0, 5, 9 and the source ends after frame 3
        let (mut session, sink, _) = session(&[4], &[10], 3, ExhaustedPolicy::Hold);
        session.run(&AtomicBool::new(false), |_| {}).unwrap();

        let values: Vec<u8> = sink.frames.borrow().iter().map(|f| cell(f, 0)).collect();
        assert_eq!(values, [0, 3, 3]);
    }

    #[test]
    fn read_errors_still_close_the_session() {
        let released = Rc::new(Cell::new(false));
        let sink = MemorySink::default();
        let mut session = TileSession::new(
            vec![MemorySource::new(10, released.clone()).failing_on(3)],
            sink.clone(),
            plan(),
            SamplePlan::new([10], 5),
            SessionOptions::default(),
        )
        .unwrap();

        let err = session.run(&AtomicBool::new(false), |_| {}).unwrap_err();

        assert!(matches!(err, SessionError::Video(VideoError::Closed(_))));
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.summary().reason, EndReason::Closed);
        assert_eq!(sink.closes.get(), 1);
        assert!(released.get());
    }

    #[test]
    fn stop_policy_closes_the_session() {
        let (mut session, sink, released) = session(&[4, 10], &[10, 10], 4, ExhaustedPolicy::Stop);
        let summary = session.run(&AtomicBool::new(false), |_| {}).unwrap();

        // targets are 0, 3, 6, 9 and the first source stops after 3
        assert_eq!(summary.reason, EndReason::SourceExhausted { source: 0 });
        assert_eq!(summary.written, 2);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(sink.closes.get(), 1);
        assert!(released.get());
    }

    #[test]
    fn cancellation_is_checked_per_frame() {
        let (mut session, sink, _) = session(&[10], &[10], 10, ExhaustedPolicy::Blank);
        let cancel = AtomicBool::new(false);

        let summary = session
            .run(&cancel, |p| {
                if p.frame == 3 {
                    cancel.store(true, Ordering::Relaxed);
                }
            })
            .unwrap();

        assert_eq!(summary.reason, EndReason::Cancelled);
        assert_eq!(summary.written, 3);
        assert_eq!(sink.frames.borrow().len(), 3);
        assert_eq!(sink.closes.get(), 1);
    }

    #[test]
    fn dropping_closes_the_sink() {
        let (mut session, sink, released) = session(&[10], &[10], 10, ExhaustedPolicy::Blank);
        session.step().unwrap();
        drop(session);

        assert_eq!(sink.closes.get(), 1);
        assert!(released.get());
    }

    #[test]
    fn plan_must_match_sources() {
        let released = Rc::new(Cell::new(false));
        let err = TileSession::new(
            vec![MemorySource::new(3, released.clone())],
            MemorySink::default(),
            plan(),
            SamplePlan::new([3, 3], 2),
            SessionOptions::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SessionError::PlanMismatch { expected: 1, actual: 2 }));

        let sources = (0..5).map(|_| MemorySource::new(3, released.clone())).collect();
        let err = TileSession::new(
            sources,
            MemorySink::default(),
            plan(),
            SamplePlan::new([3; 5], 2),
            SessionOptions::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SessionError::Tiling(TilingError::TooManyFrames { .. })));
    }

    #[test]
    fn policy_names_parse() {
        assert_eq!("hold".parse::<ExhaustedPolicy>().unwrap(), ExhaustedPolicy::Hold);
        assert_eq!("STOP".parse::<ExhaustedPolicy>().unwrap(), ExhaustedPolicy::Stop);
        assert_eq!(ExhaustedPolicy::default().to_string(), "blank");
        assert_eq!(ExhaustedPolicy::names(), "stop, blank, hold");
    }
}
