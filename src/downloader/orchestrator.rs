// Download orchestrator - simulated conversion session with a terminal transfer
//
// Idle -> Requested -> Running -> Finalizing -> Complete -> Idle
//                         \-> Aborted (finalize failed)
//
// One session at a time. The timer lives in a spawned task owned by a
// SessionHandle; dropping or cancelling the handle stops the timer.
// Only Requested/Running sessions can be cancelled. From Finalizing on the
// transfer may already be out, so the session is left to finish and record
// its history item.

use std::ops::RangeInclusive;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::config::{clamp_increment, ConcurrentRequestPolicy, OrchestratorConfig};
use super::errors::DownloadError;
use super::history::HistoryStore;
use super::models::{
    find_quality, DownloadProgress, HistoryItem, SessionState, ThumbnailVariant, VideoMetadata,
};
use super::traits::{DownloadEvent, ProgressEmitter, TransferHandler};
use super::utils;

/// Ordered log lines; the first one is shown as soon as a session starts
pub const LOG_SCRIPT: [&str; 11] = [
    "[system] Connecting to Python Backend...",
    "[python] Initializing yt-dlp v2024.03.15...",
    "[python] Fetching webpage: https://www.youtube.com/watch?v=...",
    "[python] Extracting video information...",
    "[python] Discovered formats: 137 (1080p), 140 (m4a), 251 (opus)",
    "[python] Selected format: bestvideo+bestaudio/best",
    "[ffmpeg] Merging video and audio streams...",
    "[ffmpeg] Correcting presentation timestamps...",
    "[process] Normalizing audio gain to -1.0dB...",
    "[io] Writing metadata to file system...",
    "[status] Handshake complete. Buffer ready.",
];

/// Progress counter and log stream of one session
#[derive(Debug, Clone)]
pub struct ProgressSession {
    format: String,
    progress: u8,
    logs: Vec<String>,
    /// Next unread LOG_SCRIPT index
    cursor: usize,
    increment: RangeInclusive<u8>,
    threshold: u8,
}

impl ProgressSession {
    /// Progress 0, logs reset to the handshake line
    pub fn start(format: &str, increment: RangeInclusive<u8>, threshold: u8) -> Self {
        Self {
            format: format.to_string(),
            progress: 0,
            logs: vec![LOG_SCRIPT[0].to_string()],
            cursor: 1,
            increment: clamp_increment(&increment),
            threshold: threshold.max(1),
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn is_done(&self) -> bool {
        self.progress >= 100
    }

    /// Advance one timer tick; true once progress is exactly 100
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> bool {
        if self.is_done() {
            return true;
        }

        let step = u16::from(rng.gen_range(self.increment.clone()));
        let previous = u16::from(self.progress);
        let next = (previous + step).min(100);

        let threshold = u16::from(self.threshold);
        let crossed = next / threshold - previous / threshold;
        for _ in 0..crossed {
            if self.cursor < LOG_SCRIPT.len() {
                self.logs.push(LOG_SCRIPT[self.cursor].to_string());
                self.cursor += 1;
            }
        }

        self.progress = next as u8;
        self.is_done()
    }

    pub fn snapshot(&self, state: SessionState) -> DownloadProgress {
        DownloadProgress {
            format: self.format.clone(),
            progress: self.progress,
            logs: self.logs.clone(),
            state,
        }
    }
}

/// Random 9-character base-36 session id
fn new_session_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn is_interruptible(state: SessionState) -> bool {
    matches!(state, SessionState::Requested | SessionState::Running)
}

/// Everything a running session needs, moved into its task
struct SessionContext {
    session_id: String,
    metadata: VideoMetadata,
    format: String,
    config: OrchestratorConfig,
    transfer: Arc<dyn TransferHandler>,
    history: Arc<dyn HistoryStore>,
    emitter: ProgressEmitter,
    shared: Arc<Mutex<DownloadProgress>>,
}

impl SessionContext {
    fn emit_state(&self, state: SessionState) {
        self.emitter.emit(DownloadEvent::StateChanged {
            session_id: self.session_id.clone(),
            state,
        });
    }

    /// Move `from` -> `to`; false if the session was cancelled meanwhile.
    /// Checked under the same lock `SessionHandle::stop` takes.
    fn advance(&self, from: SessionState, to: SessionState) -> bool {
        let mut shared = self.shared.lock();
        if shared.state != from {
            return false;
        }
        shared.state = to;
        self.emit_state(to);
        true
    }

    /// Publish a Running snapshot; false if the session was cancelled
    fn publish(&self, session: &ProgressSession) -> bool {
        let mut shared = self.shared.lock();
        if shared.state != SessionState::Running {
            return false;
        }
        *shared = session.snapshot(SessionState::Running);
        self.emitter.emit(DownloadEvent::Progress {
            session_id: self.session_id.clone(),
            progress: shared.clone(),
        });
        true
    }

    fn set_state(&self, state: SessionState) {
        self.shared.lock().state = state;
        self.emit_state(state);
    }
}

async fn run_session(ctx: SessionContext) -> Result<HistoryItem, DownloadError> {
    let mut rng = StdRng::from_entropy();
    let mut session = ProgressSession::start(
        &ctx.format,
        ctx.config.increment.clone(),
        ctx.config.log_threshold,
    );

    if !ctx.advance(SessionState::Requested, SessionState::Running) || !ctx.publish(&session) {
        return Err(DownloadError::Cancelled);
    }
    log::info!(
        "[Session {}] Running {} for {}",
        ctx.session_id,
        ctx.format,
        ctx.metadata.id
    );

    let period = ctx.config.tick_interval;
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        timer.tick().await;
        let done = session.tick(&mut rng);
        if !ctx.publish(&session) {
            return Err(DownloadError::Cancelled);
        }
        if done {
            break;
        }
    }
    drop(timer);

    if !ctx.advance(SessionState::Running, SessionState::Finalizing) {
        return Err(DownloadError::Cancelled);
    }
    log::info!("[Session {}] Finalizing", ctx.session_id);

    let outcome = match utils::retrieval_reference(
        &ctx.config.retrieval_base,
        &ctx.metadata.id,
        &ctx.format,
    ) {
        Ok(reference) => ctx.transfer.transfer(&reference).await,
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        let error = DownloadError::FinalizeFailure(e);
        log::error!("[Session {}] ✗ {}", ctx.session_id, error);
        ctx.set_state(SessionState::Aborted);
        ctx.emitter.emit(DownloadEvent::Aborted {
            session_id: ctx.session_id.clone(),
            message: error.to_string(),
        });
        return Err(error);
    }

    ctx.set_state(SessionState::Complete);
    tokio::time::sleep(ctx.config.settle_delay).await;

    let item = HistoryItem {
        id: ctx.session_id.clone(),
        timestamp: now_millis(),
        title: ctx.metadata.title.clone(),
        thumbnail: utils::thumbnail_url(&ctx.metadata.id, ThumbnailVariant::Mq),
        format: ctx.format.clone(),
    };
    if let Err(e) = ctx.history.append(item.clone()) {
        log::error!("[Session {}] Could not persist history: {}", ctx.session_id, e);
    }
    log::info!("[Session {}] ✓ Complete: {}", ctx.session_id, item.title);
    ctx.emitter.emit(DownloadEvent::Completed {
        session_id: ctx.session_id.clone(),
        item: item.clone(),
    });
    ctx.set_state(SessionState::Idle);

    Ok(item)
}

/// Owner of a running session; dropping it stops the timer
pub struct SessionHandle {
    session_id: String,
    task: Option<JoinHandle<Result<HistoryItem, DownloadError>>>,
    shared: Arc<Mutex<DownloadProgress>>,
    emitter: ProgressEmitter,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Latest snapshot
    pub fn progress(&self) -> DownloadProgress {
        self.shared.lock().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Still in Requested/Running, so cancelling would drop nothing
    pub fn is_interruptible(&self) -> bool {
        !self.is_finished() && is_interruptible(self.shared.lock().state)
    }

    /// Release the task: abort it while interruptible, otherwise let it
    /// finish on its own. True if it was aborted.
    fn stop(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            return false;
        };
        if task.is_finished() {
            return false;
        }
        let mut shared = self.shared.lock();
        if is_interruptible(shared.state) {
            shared.state = SessionState::Idle;
            task.abort();
            true
        } else {
            log::info!(
                "[Session {}] {:?}, finishing in the background",
                self.session_id,
                shared.state
            );
            false
        }
    }

    /// Stop the timer and discard the session. A session already past
    /// Running is detached instead.
    pub fn cancel(&mut self) {
        if self.stop() {
            log::info!("[Session {}] Cancelled", self.session_id);
            self.emitter.emit(DownloadEvent::Cancelled {
                session_id: self.session_id.clone(),
            });
        }
    }

    /// Wait for the session to end
    pub async fn wait(mut self) -> Result<HistoryItem, DownloadError> {
        let Some(task) = self.task.take() else {
            return Err(DownloadError::Cancelled);
        };
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(DownloadError::Cancelled),
            Err(e) => Err(DownloadError::FinalizeFailure(format!("session task failed: {}", e))),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct DownloadOrchestrator {
    config: OrchestratorConfig,
    transfer: Arc<dyn TransferHandler>,
    history: Arc<dyn HistoryStore>,
    emitter: ProgressEmitter,
    active: Option<SessionHandle>,
}

impl DownloadOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        transfer: Arc<dyn TransferHandler>,
        history: Arc<dyn HistoryStore>,
        emitter: ProgressEmitter,
    ) -> Self {
        Self {
            config,
            transfer,
            history,
            emitter,
            active: None,
        }
    }

    /// Idle unless a session is alive
    pub fn state(&self) -> SessionState {
        match &self.active {
            Some(handle) => handle.progress().state,
            None => SessionState::Idle,
        }
    }

    pub fn active(&self) -> Option<&SessionHandle> {
        self.active.as_ref()
    }

    /// Start a session for `format`. Needs resolved metadata; a format
    /// outside the offered catalogue is refused. The concurrent-request
    /// policy only applies while the current session is Requested/Running.
    pub fn request(
        &mut self,
        metadata: Option<&VideoMetadata>,
        format: &str,
    ) -> Result<&SessionHandle, DownloadError> {
        let metadata = metadata.ok_or(DownloadError::NoMetadata)?;
        let quality = find_quality(format)
            .ok_or_else(|| DownloadError::UnknownFormat(format.to_string()))?;
        let format = quality.label();

        if let Some(active) = self.active.as_mut() {
            if active.is_interruptible() {
                match self.config.concurrent_policy {
                    ConcurrentRequestPolicy::Reject => {
                        log::warn!(
                            "[Orchestrator] Rejecting {} while session {} runs",
                            format,
                            active.session_id()
                        );
                        return Err(DownloadError::SessionActive);
                    }
                    ConcurrentRequestPolicy::Restart => {
                        log::info!(
                            "[Orchestrator] Restarting: cancelling session {}",
                            active.session_id()
                        );
                        active.cancel();
                    }
                }
            }
        }

        let session_id = new_session_id();
        let shared = Arc::new(Mutex::new(DownloadProgress {
            format: format.clone(),
            progress: 0,
            logs: Vec::new(),
            state: SessionState::Requested,
        }));
        self.emitter.emit(DownloadEvent::StateChanged {
            session_id: session_id.clone(),
            state: SessionState::Requested,
        });

        let ctx = SessionContext {
            session_id: session_id.clone(),
            metadata: metadata.clone(),
            format,
            config: self.config.clone(),
            transfer: self.transfer.clone(),
            history: self.history.clone(),
            emitter: self.emitter.clone(),
            shared: shared.clone(),
        };
        let task = tokio::spawn(run_session(ctx));

        // Replacing the previous handle detaches it if it is still finalizing
        let handle: &SessionHandle = self.active.insert(SessionHandle {
            session_id,
            task: Some(task),
            shared,
            emitter: self.emitter.clone(),
        });
        Ok(handle)
    }

    /// Dismiss the progress view
    pub fn cancel(&mut self) {
        if let Some(mut handle) = self.active.take() {
            handle.cancel();
        }
    }

    /// Wait for the active session, if any
    pub async fn wait(&mut self) -> Option<Result<HistoryItem, DownloadError>> {
        let handle = self.active.take()?;
        Some(handle.wait().await)
    }
}
