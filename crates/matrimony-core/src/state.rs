//! Local projection of a user's attachments plus the UI state around it.
//!
//! The remote record is the durable copy; [`AttachmentState`] is rebuilt from
//! it on every load and only mutated by upload lanes and removals. Transient
//! messages and finished progress bars carry a deadline; a sweeper task tied
//! to the [`StateHandle`] clears them when it passes and notifies subscribers.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::models::{AttachmentClass, UserAttachments};

/// How long an error stays on screen.
pub const ERROR_DISPLAY: Duration = Duration::from_secs(5);
/// How long a status message stays on screen.
pub const STATUS_DISPLAY: Duration = Duration::from_secs(3);
/// Delay between a lane going idle and its progress bar resetting to zero.
pub const PROGRESS_RESET_DELAY: Duration = Duration::from_secs(2);

/// Where the initial record load stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Loading,
    Ready,
    Failed,
}

/// Upload lane lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LanePhase {
    #[default]
    Idle,
    Validating,
    Uploading { completed: usize, total: usize },
    Persisting,
}

/// Per-class lane state rendered by the screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaneStatus {
    pub phase: LanePhase,
    /// 0..=100, published after each file finishes.
    pub progress: u8,
    pub current_file_name: String,
    /// A write for this class is in flight.
    pub saving: bool,
    /// Purely visual drag-hover flag.
    pub drag_over: bool,
    progress_reset_at: Option<Instant>,
}

impl LaneStatus {
    /// Uploading, validating, persisting, or saving a removal.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.phase != LanePhase::Idle || self.saving
    }

    pub(crate) fn finish(&mut self, now: Instant) {
        self.phase = LanePhase::Idle;
        self.progress_reset_at = Some(now + PROGRESS_RESET_DELAY);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TransientMessage {
    text: String,
    expires_at: Instant,
}

/// Everything the attachment screen renders.
#[derive(Clone, Debug, Default)]
pub struct AttachmentState {
    pub load: LoadStatus,
    pub attachments: UserAttachments,
    lanes: [LaneStatus; 2],
    errors: Vec<TransientMessage>,
    status: Option<TransientMessage>,
}

impl AttachmentState {
    #[must_use]
    pub fn biodata_image(&self) -> Option<&str> {
        self.attachments.biodata.as_deref()
    }

    #[must_use]
    pub fn user_images(&self) -> &[String] {
        &self.attachments.photos
    }

    #[must_use]
    pub const fn lane(&self, class: AttachmentClass) -> &LaneStatus {
        &self.lanes[class.index()]
    }

    pub(crate) fn lane_mut(&mut self, class: AttachmentClass) -> &mut LaneStatus {
        &mut self.lanes[class.index()]
    }

    /// Any class has a write in flight.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.lanes.iter().any(|lane| lane.saving)
    }

    /// Whether upload triggers and removal controls for `class` accept input.
    #[must_use]
    pub fn controls_enabled(&self, class: AttachmentClass) -> bool {
        self.load == LoadStatus::Ready && !self.lane(class).is_busy()
    }

    /// Errors currently on display, oldest first.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|message| message.text.as_str())
    }

    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.status.as_ref().map(|message| message.text.as_str())
    }

    pub(crate) fn push_error(&mut self, text: impl Into<String>, now: Instant) {
        self.errors.push(TransientMessage {
            text: text.into(),
            expires_at: now + ERROR_DISPLAY,
        });
    }

    pub(crate) fn push_errors<I>(&mut self, texts: I, now: Instant)
    where
        I: IntoIterator<Item = String>,
    {
        for text in texts {
            self.push_error(text, now);
        }
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>, now: Instant) {
        self.status = Some(TransientMessage {
            text: text.into(),
            expires_at: now + STATUS_DISPLAY,
        });
    }

    /// Earliest moment at which [`AttachmentState::expire`] has something to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        let messages = self
            .errors
            .iter()
            .chain(self.status.as_ref())
            .map(|message| message.expires_at);
        let progress = self
            .lanes
            .iter()
            .filter(|lane| lane.phase == LanePhase::Idle)
            .filter_map(|lane| lane.progress_reset_at);
        messages.chain(progress).min()
    }

    /// Drop expired messages and reset finished progress bars.
    ///
    /// Returns whether anything changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.errors.len();
        self.errors.retain(|message| message.expires_at > now);
        let mut changed = self.errors.len() != before;

        if self
            .status
            .as_ref()
            .is_some_and(|message| message.expires_at <= now)
        {
            self.status = None;
            changed = true;
        }

        for lane in &mut self.lanes {
            let due = lane.progress_reset_at.is_some_and(|at| at <= now);
            if due && lane.phase == LanePhase::Idle {
                lane.progress = 0;
                lane.current_file_name.clear();
                lane.progress_reset_at = None;
                changed = true;
            }
        }
        changed
    }
}

/// Shared, observable handle to the screen state.
///
/// Every mutation notifies subscribers, so a renderer can await changes
/// instead of polling. When created inside a tokio runtime the handle also
/// runs a sweeper that expires messages and progress bars on time; the
/// sweeper is aborted when the handle is dropped.
#[derive(Debug)]
pub struct StateHandle {
    tx: Arc<watch::Sender<AttachmentState>>,
    sweeper: Option<JoinHandle<()>>,
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new(AttachmentState::default())
    }
}

impl Drop for StateHandle {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

impl StateHandle {
    #[must_use]
    pub fn new(state: AttachmentState) -> Self {
        let (tx, rx) = watch::channel(state);
        let tx = Arc::new(tx);
        let sweeper = Handle::try_current()
            .ok()
            .map(|runtime| runtime.spawn(sweep(Arc::downgrade(&tx), rx)));
        Self { tx, sweeper }
    }

    /// Mutate the state and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut AttachmentState)) {
        self.tx.send_modify(f);
    }

    /// Read from the current state without notifying anyone.
    pub fn read<T>(&self, f: impl FnOnce(&AttachmentState) -> T) -> T {
        f(&self.tx.borrow())
    }

    /// Expire transient UI state, notifying subscribers only if something changed.
    pub fn expire(&self, now: Instant) {
        self.tx.send_if_modified(|state| state.expire(now));
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AttachmentState> {
        self.tx.subscribe()
    }

    /// Current state after expiring stale messages.
    #[must_use]
    pub fn snapshot(&self) -> AttachmentState {
        self.expire(Instant::now());
        self.tx.borrow().clone()
    }
}

/// Sleep until the next deadline, expire, repeat. Exits once the handle is gone.
async fn sweep(
    tx: Weak<watch::Sender<AttachmentState>>,
    mut rx: watch::Receiver<AttachmentState>,
) {
    loop {
        let deadline = rx.borrow_and_update().next_deadline();
        let Some(deadline) = deadline else {
            if rx.changed().await.is_err() {
                return;
            }
            continue;
        };

        tokio::select! {
            () = sleep_until(deadline) => {
                let Some(tx) = tx.upgrade() else {
                    return;
                };
                tx.send_if_modified(|state| state.expire(Instant::now()));
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}
