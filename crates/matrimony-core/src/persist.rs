//! Auto-persist writer: pushes a class value to the record as soon as it changes.
//!
//! Writes are serialized per attachment class through a single-slot queue, so
//! an upload finishing while a removal is being saved cannot interleave on the
//! same field. The whole read-current, apply, write sequence runs inside the
//! slot. A failed write rolls the local value back to what it was before, so
//! the screen never shows a reference the durable record does not have.

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::models::{AttachmentClass, AttachmentValue, RecordPatch, UserId};
use crate::records::RecordStore;
use crate::state::StateHandle;
use crate::{Error, Result};

/// Writes attachment values for one user record.
#[derive(Debug)]
pub struct AutoPersistWriter<R> {
    store: R,
    user_id: UserId,
    slots: [Mutex<()>; 2],
}

impl<R: RecordStore> AutoPersistWriter<R> {
    pub fn new(store: R, user_id: UserId) -> Self {
        Self {
            store,
            user_id,
            slots: [Mutex::new(()), Mutex::new(())],
        }
    }

    pub const fn store(&self) -> &R {
        &self.store
    }

    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Replace the value of one class and write it through.
    pub async fn persist(&self, state: &StateHandle, value: AttachmentValue) -> Result<()> {
        let class = value.class();
        self.apply(state, class, move |_| value).await.map(|_| ())
    }

    /// Derive a new value for `class` from the current one and write it through.
    ///
    /// `update` runs inside the class slot against the latest local value.
    /// Returns the value that was written.
    pub async fn apply<F>(
        &self,
        state: &StateHandle,
        class: AttachmentClass,
        update: F,
    ) -> Result<AttachmentValue>
    where
        F: FnOnce(&AttachmentValue) -> AttachmentValue,
    {
        let _slot = self.slots[class.index()].lock().await;

        let previous = state.read(|state| state.attachments.value(class));
        let next = update(&previous);
        if next.class() != class {
            return Err(Error::InvalidInput(format!(
                "Cannot write a {} value into the {class} field",
                next.class()
            )));
        }
        state.update(|state| {
            state.attachments.set(next.clone());
            state.lane_mut(class).saving = true;
        });

        let result = self
            .store
            .patch(&self.user_id, &RecordPatch::for_value(&next))
            .await;

        let now = Instant::now();
        match &result {
            Ok(()) => {
                tracing::info!(
                    user_id = %self.user_id,
                    class = %class,
                    count = next.len(),
                    "Persisted attachment field"
                );
                state.update(|state| {
                    state.lane_mut(class).saving = false;
                    state.set_status(format!("{} saved.", class.label()), now);
                });
            }
            Err(error) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    class = %class,
                    "Failed to persist attachment field, rolling back: {error}"
                );
                state.update(|state| {
                    state.attachments.set(previous);
                    state.lane_mut(class).saving = false;
                    state.push_error(format!("Failed to save {class}."), now);
                });
            }
        }

        result.map(|()| next)
    }
}
