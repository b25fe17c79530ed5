//! Confirmation gate in front of interactive uploads.

use async_trait::async_trait;

use crate::settings::SharedSettings;

/// What the user picked in the upload prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PromptResponse {
    /// `None` when the prompt was dismissed without a choice.
    pub should_upload: Option<bool>,
    pub always_upload: bool,
}

impl PromptResponse {
    pub const DISMISSED: Self = Self {
        should_upload: None,
        always_upload: false,
    };

    pub const UPLOAD: Self = Self {
        should_upload: Some(true),
        always_upload: false,
    };

    pub const ALWAYS_UPLOAD: Self = Self {
        should_upload: Some(true),
        always_upload: true,
    };

    pub const DECLINE: Self = Self {
        should_upload: Some(false),
        always_upload: false,
    };
}

/// The three-way upload dialog.
#[async_trait]
pub trait UploadPrompt: Send + Sync {
    async fn ask(&self) -> PromptResponse;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Prompt closed without a choice.
    Undecided,
    Proceed,
    ProceedAndRemember,
    Decline,
}

impl From<PromptResponse> for GateDecision {
    fn from(response: PromptResponse) -> Self {
        match response.should_upload {
            None => Self::Undecided,
            Some(false) => Self::Decline,
            Some(true) if response.always_upload => Self::ProceedAndRemember,
            Some(true) => Self::Proceed,
        }
    }
}

/// What the orchestrator does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Upload,
    /// Hand the event back to the host's default handling.
    FallBackToDefault,
    /// Do nothing at all.
    Abandon,
}

/// Runs the gate for one event.
pub async fn pass(settings: &SharedSettings, prompt: &dyn UploadPrompt) -> GateOutcome {
    if !settings.confirmation_required() {
        return GateOutcome::Upload;
    }

    let decision = GateDecision::from(prompt.ask().await);
    log::debug!(target: "imgdrop_business::gate", "decision={decision:?}");

    match decision {
        GateDecision::Proceed => GateOutcome::Upload,
        GateDecision::ProceedAndRemember => {
            if let Err(err) = settings.set_always_upload().await {
                log::error!(
                    target: "imgdrop_business::gate",
                    "persist_always_upload_failed error={err}"
                );
            }
            GateOutcome::Upload
        }
        GateDecision::Decline => GateOutcome::FallBackToDefault,
        GateDecision::Undecided => GateOutcome::Abandon,
    }
}
