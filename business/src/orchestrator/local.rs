use imgdrop_input::HostFile;
use imgdrop_storage::BlobStore;

use super::Orchestrator;
use crate::buffer::{Position, TextBuffer};
use crate::coordinator::{UploadOutcome, UploadRequest};
use crate::events::{Disposition, LocalUploadEvent};
use crate::gate::{self, GateOutcome};
use crate::links::{Link, link_at};
use crate::messages;
use crate::references::OriginatingReference;
use crate::rewriter::{RewritePlan, apply_rewrite, propose_rewrite};
use crate::vault::{Vault, VaultError};

/// A link to an image stored in the vault, under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    /// Vault path of the image.
    pub resource: String,
    pub link: Link,
    pub start: Position,
    pub end: Position,
}

impl LocalImage {
    /// Finds the local image link at the cursor of `buffer`.
    pub fn under_cursor(
        buffer: &dyn TextBuffer,
        note_path: &str,
        vault: &dyn Vault,
    ) -> Option<Self> {
        let cursor = buffer.cursor();
        let line = buffer.line(cursor.line)?;
        let link = link_at(&line, cursor.ch)?;
        if link.is_remote() {
            return None;
        }

        let resource = vault.resolve_link(&link.target, note_path)?;
        let is_image = mime_guess::from_path(&resource)
            .first()
            .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
        if !is_image {
            return None;
        }

        Some(Self {
            resource,
            start: Position::new(cursor.line, link.start),
            end: Position::new(cursor.line, link.end),
            link,
        })
    }

    fn file_name(&self) -> &str {
        self.resource.rsplit('/').next().unwrap_or(&self.resource)
    }
}

async fn load_host_file(vault: &dyn Vault, image: &LocalImage) -> Result<HostFile, VaultError> {
    let bytes = vault.read_binary(&image.resource).await?;
    let stat = vault.stat(&image.resource).await?;
    let mime_type = mime_guess::from_path(&image.resource)
        .first()
        .map(|m| m.essence_str().to_owned())
        .unwrap_or_default();
    Ok(HostFile::new(image.file_name(), bytes, mime_type, stat.mtime))
}

impl<S: BlobStore> Orchestrator<S> {
    /// Whether the local-upload command applies at the cursor.
    pub fn can_upload_local(&self, event: &LocalUploadEvent) -> bool {
        LocalImage::under_cursor(event.buffer.as_ref(), &event.note_path, self.host.vault.as_ref())
            .is_some()
    }

    /// Uploads the local image under the cursor, comments out the original
    /// link and offers to rewrite the image's other references.
    pub async fn on_local_upload(&self, event: LocalUploadEvent) -> Disposition {
        let buffer = event.buffer.as_ref();
        let vault = self.host.vault.as_ref();
        let Some(image) = LocalImage::under_cursor(buffer, &event.note_path, vault) else {
            return Disposition::Ignored;
        };
        let Some(coordinator) = self.configured_coordinator() else {
            return Disposition::Consumed;
        };

        let outcome = gate::pass(&self.settings, self.host.upload_prompt.as_ref()).await;
        if outcome != GateOutcome::Upload {
            return Disposition::Consumed;
        }

        let file = match load_host_file(vault, &image).await {
            Ok(file) => file,
            Err(err) => {
                log::error!(
                    target: "imgdrop_business::orchestrator",
                    "local_read_failed resource={} error={err}",
                    image.resource
                );
                self.host.notifier.notice(messages::BATCH_UPLOAD_FAILED);
                return Disposition::Consumed;
            }
        };

        let request = UploadRequest::from_file(file);
        let Some(guard) = coordinator.claim(&request.identity) else {
            return Disposition::Consumed;
        };

        buffer.replace_range("\n", image.end, image.end);
        let below = Position::new(image.end.line + 1, 0);
        let outcome = coordinator
            .upload_claimed(guard, request, buffer, Some(below))
            .await;

        match outcome {
            UploadOutcome::Uploaded { url } => {
                let original = buffer.get_range(image.start, image.end);
                buffer.replace_range(&format!("<!--{original}-->"), image.start, image.end);

                let originating = OriginatingReference {
                    document_path: event.note_path.clone(),
                    start: image.start,
                };
                if let Some(plan) =
                    propose_rewrite(self.host.index.as_ref(), &image.resource, &url, &originating)
                {
                    self.offer_rewrite(plan).await;
                }
            }
            UploadOutcome::Failed(_) => {
                self.host.notifier.notice(messages::BATCH_UPLOAD_FAILED);
            }
            UploadOutcome::DedupSkipped => {}
        }
        Disposition::Consumed
    }

    async fn offer_rewrite(&self, plan: RewritePlan) {
        let stats = plan.stats();
        if !self
            .host
            .rewrite_prompt
            .confirm_rewrite(&plan.resource, stats)
            .await
        {
            return;
        }

        match apply_rewrite(self.host.vault.as_ref(), &plan.group, &plan.new_url).await {
            Ok(report) => {
                self.host
                    .notifier
                    .notice(&messages::rewrite_succeeded(report.links, report.documents.len()));
            }
            Err(err) => {
                log::error!(
                    target: "imgdrop_business::orchestrator",
                    "rewrite_failed resource={} error={err:?}",
                    plan.resource
                );
                self.host
                    .notifier
                    .error_dialog(messages::REWRITE_ERROR_TITLE, messages::REWRITE_ERROR_BODY);
            }
        }
    }
}
