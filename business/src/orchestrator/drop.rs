use imgdrop_input::all_files_are_images;
use imgdrop_storage::BlobStore;

use super::Orchestrator;
use crate::events::{Disposition, DropEvent};
use crate::gate::{self, GateOutcome};

impl<S: BlobStore> Orchestrator<S> {
    /// Editor drop: only transfers made of image files and nothing else.
    pub async fn on_drop(&self, event: DropEvent) -> Disposition {
        if event.redelivered
            || !event.carries_only_files()
            || !all_files_are_images(&event.files)
        {
            return Disposition::Ignored;
        }
        let Some(coordinator) = self.configured_coordinator() else {
            return Disposition::Consumed;
        };

        match gate::pass(&self.settings, self.host.upload_prompt.as_ref()).await {
            GateOutcome::Upload => {}
            GateOutcome::FallBackToDefault => {
                self.host.default_handler.handle_drop(event.redelivery()).await;
                return Disposition::Consumed;
            }
            GateOutcome::Abandon => return Disposition::Consumed,
        }

        event.buffer.replace_selection("\n");
        log::debug!(
            target: "imgdrop_business::orchestrator",
            "drop_upload files={}",
            event.files.len()
        );
        self.upload_batch(&coordinator, event.files, event.buffer.as_ref())
            .await;
        Disposition::Consumed
    }
}
