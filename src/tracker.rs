//! Follows one asynchronous generation job from acceptance to a terminal state.

use crate::api::StudioApi;
use crate::db::now_ms;
use crate::lock;
use crate::models::{Hadith, JobPhase, JobSnapshot, VideoSource};
use crate::notify::ToastKind;
use crate::paths::AppPaths;
use crate::session::Session;
use crate::store::ClientStore;
use crate::view::StudioView;
use crate::{Result, StudioError};
use log::{debug, info, warn};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const STOP_CHECK_SLICE: Duration = Duration::from_millis(50);
const JOB_LOG_ROTATE_BYTES: u64 = 1024 * 1024;

const MSG_TRACKING_STARTED: &str = "بدء تتبع التقدم...";
const MSG_COMPLETED: &str = "تم إنشاء الفيديو بنجاح!";
const MSG_CANCELLED: &str = "تم إلغاء توليد الفيديو";
const MSG_CANCEL_REJECTED: &str = "فشل في إلغاء المهمة";
const MSG_CANCEL_FAILED: &str = "خطأ في إلغاء المهمة";
const MSG_UNKNOWN_FAILURE: &str = "خطأ غير معروف";

/// The tracked job. Its poll thread is identified by the `stop` flag it
/// was spawned with, not by the job id, which the server may reuse.
struct ActiveJob {
    job_id: String,
    hadith: Option<Hadith>,
    stop: Arc<AtomicBool>,
    /// Set once a terminal status has been claimed and its effects are being applied.
    settling: bool,
}

impl ActiveJob {
    fn is_run(&self, stop: &Arc<AtomicBool>) -> bool {
        Arc::ptr_eq(&self.stop, stop)
    }
}

struct TrackerShared {
    api: Arc<dyn StudioApi>,
    view: Arc<dyn StudioView>,
    store: Arc<ClientStore>,
    session: Arc<Session>,
    paths: AppPaths,
    interval: Duration,
    active: Mutex<Option<ActiveJob>>,
    idle: Condvar,
}

/// Single-slot poller for asynchronous generation jobs.
///
/// Starting a job replaces any job already being tracked. Each job gets its
/// own poll thread; the thread stops when the job reaches a terminal status,
/// when it is cancelled, or when it is replaced. The slot is released only
/// after the terminal status has been rendered and recorded, so
/// `is_tracking() == false` means the outcome is visible.
#[derive(Clone)]
pub struct JobTracker {
    shared: Arc<TrackerShared>,
}

impl JobTracker {
    pub fn new(
        api: Arc<dyn StudioApi>,
        view: Arc<dyn StudioView>,
        store: Arc<ClientStore>,
        session: Arc<Session>,
        interval: Duration,
    ) -> Self {
        let paths = store.paths().clone();
        Self {
            shared: Arc::new(TrackerShared {
                api,
                view,
                store,
                session,
                paths,
                interval,
                active: Mutex::new(None),
                idle: Condvar::new(),
            }),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.shared.interval
    }

    pub fn current_job_id(&self) -> Option<String> {
        lock(&self.shared.active).as_ref().map(|j| j.job_id.clone())
    }

    pub fn is_tracking(&self) -> bool {
        lock(&self.shared.active).is_some()
    }

    /// Blocks until no job is tracked. Returns false if `timeout` ran out first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut slot = lock(&self.shared.active);
        while slot.is_some() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            slot = match self.shared.idle.wait_timeout(slot, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    /// Begins polling `job_id`. The first status request is issued immediately.
    pub fn start(&self, job_id: &str) -> Result<()> {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(StudioError::Validation("معرف المهمة غير صالح".to_string()));
        }

        let stop = Arc::new(AtomicBool::new(false));
        {
            let mut slot = lock(&self.shared.active);
            if let Some(previous) = slot.take() {
                previous.stop.store(true, Ordering::SeqCst);
                info!("job {} replaced by {job_id}", previous.job_id);
                self.shared.log(
                    &previous.job_id,
                    "info",
                    "tracking_replaced",
                    serde_json::json!({ "by": job_id }),
                );
            }
            *slot = Some(ActiveJob {
                job_id: job_id.to_string(),
                hadith: self.shared.session.selected_hadith(),
                stop: stop.clone(),
                settling: false,
            });
        }

        self.shared.log(
            job_id,
            "info",
            "tracking_started",
            serde_json::json!({ "interval_ms": self.shared.interval.as_millis() as u64 }),
        );
        self.shared.view.update_progress(5, MSG_TRACKING_STARTED);
        self.shared.view.set_cancel_visible(true);

        let shared = self.shared.clone();
        let thread_job_id = job_id.to_string();
        let thread_stop = stop.clone();
        let spawned = thread::Builder::new()
            .name(format!("job-poll-{job_id}"))
            .spawn(move || poll_loop(shared, thread_job_id, thread_stop));
        if let Err(e) = spawned {
            stop.store(true, Ordering::SeqCst);
            self.shared.release(&stop);
            return Err(StudioError::Io(e));
        }
        Ok(())
    }

    /// Stops tracking and asks the backend to cancel the job.
    ///
    /// Returns `Ok(false)` when nothing was being tracked, or when the job
    /// already reached a terminal status. Tracking stops even when the
    /// backend refuses; the refusal is shown and returned.
    pub fn cancel(&self) -> Result<bool> {
        let job = {
            let mut slot = lock(&self.shared.active);
            if slot.as_ref().map_or(true, |j| j.settling) {
                return Ok(false);
            }
            slot.take()
        };
        self.shared.idle.notify_all();
        let Some(job) = job else {
            return Ok(false);
        };
        job.stop.store(true, Ordering::SeqCst);

        let result = self.shared.api.cancel_job(&job.job_id);
        self.shared.view.hide_progress();
        match result {
            Ok(()) => {
                self.shared.log(&job.job_id, "info", "cancelled_by_user", serde_json::Value::Null);
                self.shared.view.notify(ToastKind::Info, MSG_CANCELLED);
                Ok(true)
            }
            Err(e) => {
                warn!("cancel request for job {} failed: {e}", job.job_id);
                self.shared.log(
                    &job.job_id,
                    "error",
                    "cancel_failed",
                    serde_json::json!({ "error": e.to_string() }),
                );
                let message = match e {
                    StudioError::Server { .. } => MSG_CANCEL_REJECTED,
                    _ => MSG_CANCEL_FAILED,
                };
                self.shared.view.notify(ToastKind::Error, message);
                Err(e)
            }
        }
    }
}

impl TrackerShared {
    /// Empties the slot if it still belongs to the run identified by `stop`.
    fn release(&self, stop: &Arc<AtomicBool>) {
        {
            let mut slot = lock(&self.active);
            if slot.as_ref().is_some_and(|j| j.is_run(stop)) {
                *slot = None;
            }
        }
        self.idle.notify_all();
    }

    /// Returns true when polling should stop.
    fn apply(&self, job_id: &str, stop: &Arc<AtomicBool>, snapshot: &JobSnapshot) -> bool {
        let phase = snapshot.phase();
        let hadith = {
            let mut slot = lock(&self.active);
            let Some(job) = slot.as_mut().filter(|j| j.is_run(stop) && !j.settling) else {
                return true;
            };
            self.view
                .update_progress(snapshot.progress_percent(), &snapshot.display_message());
            if !phase.is_terminal() {
                return false;
            }
            job.settling = true;
            stop.store(true, Ordering::SeqCst);
            job.hadith.clone()
        };

        self.log(
            job_id,
            "info",
            "terminal_status",
            serde_json::json!({
                "status": snapshot.status,
                "progress": snapshot.progress,
                "message": snapshot.message,
                "result": snapshot.result,
            }),
        );

        match phase {
            JobPhase::Completed => self.complete(job_id, hadith, snapshot),
            JobPhase::Failed => {
                self.view.hide_progress();
                let reason = match snapshot.message.trim() {
                    "" => MSG_UNKNOWN_FAILURE,
                    m => m,
                };
                self.view.show_error(&format!("فشل التوليد: {reason}"));
            }
            JobPhase::Cancelled => {
                self.view.hide_progress();
                self.view.notify(ToastKind::Info, MSG_CANCELLED);
            }
            JobPhase::InProgress => {}
        }

        self.release(stop);
        true
    }

    fn complete(&self, job_id: &str, hadith: Option<Hadith>, snapshot: &JobSnapshot) {
        let video = snapshot
            .result
            .as_deref()
            .and_then(VideoSource::from_server_path);
        let Some(video) = video else {
            warn!("job {job_id} completed without a result path");
            self.view.hide_progress();
            return;
        };

        self.session.set_active_video(video.clone());
        let preview_url = self.api.preview_url(&video);
        self.view.show_preview(&video, &preview_url);
        self.view.hide_progress();
        self.view.notify(ToastKind::Success, MSG_COMPLETED);

        if let Some(hadith) = hadith {
            if let Err(e) = self.store.append_generation(&hadith, &video) {
                warn!("failed to record generation for job {job_id}: {e}");
            }
        }
    }

    fn log(&self, job_id: &str, level: &str, event: &str, data: serde_json::Value) {
        if let Err(e) = log_line(&self.paths, job_id, level, event, data) {
            debug!("job log write failed for {job_id}: {e}");
        }
    }
}

fn poll_loop(shared: Arc<TrackerShared>, job_id: String, stop: Arc<AtomicBool>) {
    let mut polls = 0_u64;
    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }

        polls += 1;
        let response = shared.api.job_status(&job_id);
        if stop.load(Ordering::SeqCst) {
            shared.log(&job_id, "debug", "late_response_ignored", serde_json::json!({ "poll": polls }));
            break;
        }

        match response {
            Ok(snapshot) => {
                shared.log(
                    &job_id,
                    "debug",
                    "poll",
                    serde_json::json!({
                        "poll": polls,
                        "status": snapshot.status,
                        "progress": snapshot.progress,
                    }),
                );
                if shared.apply(&job_id, &stop, &snapshot) {
                    break;
                }
            }
            Err(e) => {
                warn!("status poll {polls} for job {job_id} failed: {e}");
                shared.log(
                    &job_id,
                    "warn",
                    "poll_failed",
                    serde_json::json!({ "poll": polls, "error": e.to_string() }),
                );
            }
        }

        if !sleep_unless_stopped(&stop, shared.interval) {
            break;
        }
    }
    debug!("poll thread for job {job_id} exited after {polls} polls");
}

/// Sleeps for `total` in short slices. Returns false if `stop` was raised.
fn sleep_unless_stopped(stop: &AtomicBool, total: Duration) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let slice = remaining.min(STOP_CHECK_SLICE);
        thread::sleep(slice);
        remaining -= slice;
    }
    !stop.load(Ordering::SeqCst)
}

/// Appends one JSON line to the job's event log.
pub fn log_line(
    paths: &AppPaths,
    job_id: &str,
    level: &str,
    event: &str,
    data: serde_json::Value,
) -> Result<()> {
    let line = serde_json::json!({
        "ts_ms": now_ms(),
        "job_id": job_id,
        "level": level,
        "event": event,
        "data": data
    })
    .to_string();

    let path = paths.job_log_path(job_id);
    std::fs::create_dir_all(paths.job_logs_dir())?;
    rotate_job_log_if_needed(&path)?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?
        .write_all(format!("{line}\n").as_bytes())?;
    Ok(())
}

fn rotate_job_log_if_needed(path: &Path) -> Result<()> {
    let len = match std::fs::metadata(path) {
        Ok(m) => m.len(),
        Err(_) => return Ok(()),
    };
    if len < JOB_LOG_ROTATE_BYTES {
        return Ok(());
    }
    let mut backup = path.as_os_str().to_os_string();
    backup.push(".1");
    std::fs::rename(path, backup)?;
    Ok(())
}
