//! Attachment edit screen controller.
//!
//! Headless counterpart of the admin editing screen: two drop zones (one per
//! attachment class), a thumbnail grid with per-item removal, and the status
//! and error banners. Renderers feed gestures in and draw from
//! [`EditScreen::snapshot`] or [`EditScreen::subscribe`].

use tokio::sync::watch;
use tokio::time::Instant;

use crate::lane::{BatchOutcome, UploadLane};
use crate::loader::load_attachments;
use crate::models::{AttachmentClass, AttachmentValue, CandidateFile, UserId};
use crate::persist::AutoPersistWriter;
use crate::records::RecordStore;
use crate::reference::ReferenceValidator;
use crate::state::{AttachmentState, LoadStatus, StateHandle};
use crate::storage::BlobStore;
use crate::{Error, Result};

/// What happened to a removal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Removed locally and in the durable record.
    Removed,
    /// Controls for the class were disabled; nothing happened.
    Busy,
    /// Nothing to remove at that position.
    Missing,
    /// The write failed and the local value was restored.
    Failed,
}

/// Controller for one user's attachment screen.
#[derive(Debug)]
pub struct EditScreen<B, R> {
    blobs: B,
    writer: AutoPersistWriter<R>,
    validator: ReferenceValidator,
    state: StateHandle,
    lanes: [UploadLane; 2],
}

impl<B, R> EditScreen<B, R>
where
    B: BlobStore,
    R: RecordStore,
{
    /// Build the screen and run the record loader once.
    ///
    /// A missing record is returned as [`Error::NotFound`] so the caller can
    /// navigate away. Any other load failure leaves the screen in
    /// [`LoadStatus::Failed`] with an error on display.
    pub async fn mount(
        user_id: UserId,
        blobs: B,
        records: R,
        validator: ReferenceValidator,
    ) -> Result<Self> {
        let screen = Self {
            blobs,
            writer: AutoPersistWriter::new(records, user_id),
            validator,
            state: StateHandle::default(),
            lanes: AttachmentClass::ALL.map(UploadLane::new),
        };
        screen.load().await?;
        Ok(screen)
    }

    /// Re-run the record loader, discarding the local projection.
    ///
    /// Refused while any lane is busy, since an in-flight batch would write
    /// over whatever the reload brings in.
    pub async fn reload(&self) -> Result<()> {
        let busy = self.state.read(|state| {
            AttachmentClass::ALL
                .iter()
                .any(|class| state.lane(*class).is_busy())
        });
        if busy {
            return Err(Error::InvalidInput(
                "Cannot reload while an upload or save is in progress".to_string(),
            ));
        }
        self.load().await
    }

    async fn load(&self) -> Result<()> {
        let user_id = self.writer.user_id();
        self.state.update(|state| state.load = LoadStatus::Loading);

        match load_attachments(self.writer.store(), user_id, &self.validator).await {
            Ok(attachments) => {
                tracing::info!(
                    user_id = %user_id,
                    biodata = attachments.biodata.is_some(),
                    photos = attachments.photos.len(),
                    "Loaded attachments"
                );
                self.state.update(|state| {
                    state.attachments = attachments;
                    state.load = LoadStatus::Ready;
                });
                Ok(())
            }
            Err(Error::NotFound(id)) => {
                tracing::warn!(user_id = %id, "User record not found");
                self.state.update(|state| state.load = LoadStatus::Failed);
                Err(Error::NotFound(id))
            }
            Err(error) => {
                tracing::warn!(user_id = %user_id, "Failed to load user record: {error}");
                let now = Instant::now();
                self.state.update(|state| {
                    state.load = LoadStatus::Failed;
                    state.push_error("Failed to load user data.", now);
                });
                Ok(())
            }
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        self.writer.user_id()
    }

    #[must_use]
    pub const fn validator(&self) -> &ReferenceValidator {
        &self.validator
    }

    pub fn drag_enter(&self, class: AttachmentClass) {
        self.set_drag_over(class, true);
    }

    pub fn drag_leave(&self, class: AttachmentClass) {
        self.set_drag_over(class, false);
    }

    fn set_drag_over(&self, class: AttachmentClass, drag_over: bool) {
        self.state
            .update(|state| state.lane_mut(class).drag_over = drag_over);
    }

    /// Files dropped on the drop zone of `class`.
    pub async fn drop_files(
        &self,
        class: AttachmentClass,
        files: Vec<CandidateFile>,
    ) -> BatchOutcome {
        self.set_drag_over(class, false);
        self.lane(class)
            .run(files, &self.blobs, &self.writer, &self.state)
            .await
    }

    /// Files chosen through the picker of `class`.
    pub async fn pick_files(
        &self,
        class: AttachmentClass,
        files: Vec<CandidateFile>,
    ) -> BatchOutcome {
        self.lane(class)
            .run(files, &self.blobs, &self.writer, &self.state)
            .await
    }

    /// Remove the photo shown at `index` and persist the shorter list.
    pub async fn remove_photo(&self, index: usize) -> RemovalOutcome {
        let target = self.state.read(|state| {
            state
                .controls_enabled(AttachmentClass::Photos)
                .then(|| state.user_images().get(index).cloned())
        });
        let target = match target {
            None => return RemovalOutcome::Busy,
            Some(None) => return RemovalOutcome::Missing,
            Some(Some(target)) => target,
        };

        let result = self
            .writer
            .apply(&self.state, AttachmentClass::Photos, move |current| {
                let mut photos = match current {
                    AttachmentValue::Photos(photos) => photos.clone(),
                    AttachmentValue::Biodata(_) => Vec::new(),
                };
                if let Some(position) = photos.iter().position(|photo| *photo == target) {
                    photos.remove(position);
                }
                AttachmentValue::Photos(photos)
            })
            .await;
        removal_outcome(&result)
    }

    /// Clear the biodata image and persist the absence.
    pub async fn remove_biodata(&self) -> RemovalOutcome {
        let present = self.state.read(|state| {
            state
                .controls_enabled(AttachmentClass::Biodata)
                .then(|| state.biodata_image().is_some())
        });
        match present {
            None => return RemovalOutcome::Busy,
            Some(false) => return RemovalOutcome::Missing,
            Some(true) => {}
        }

        let result = self
            .writer
            .apply(&self.state, AttachmentClass::Biodata, |_| {
                AttachmentValue::Biodata(None)
            })
            .await;
        removal_outcome(&result)
    }

    #[must_use]
    pub fn controls_enabled(&self, class: AttachmentClass) -> bool {
        self.state.read(|state| state.controls_enabled(class))
    }

    /// Current state with expired messages and progress bars cleared.
    #[must_use]
    pub fn snapshot(&self) -> AttachmentState {
        self.state.snapshot()
    }

    /// Change feed for renderers.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AttachmentState> {
        self.state.subscribe()
    }

    const fn lane(&self, class: AttachmentClass) -> &UploadLane {
        &self.lanes[class.index()]
    }
}

const fn removal_outcome(result: &Result<AttachmentValue>) -> RemovalOutcome {
    match result {
        Ok(_) => RemovalOutcome::Removed,
        Err(_) => RemovalOutcome::Failed,
    }
}
