use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::services::gateway::GenerationGateway;

use super::{download, Wizard, WizardError};

/// Drives a [`Wizard`] against a [`GenerationGateway`].
///
/// The lock is only held for synchronous transitions, never across the
/// network round trip, so user actions can keep mutating the wizard while a
/// generation is outstanding.
#[derive(Clone)]
pub struct Session {
    wizard: Arc<Mutex<Wizard>>,
    gateway: GenerationGateway,
}

impl Session {
    pub fn new(wizard: Wizard, gateway: GenerationGateway) -> Self {
        Self {
            wizard: Arc::new(Mutex::new(wizard)),
            gateway,
        }
    }

    /// Runs a synchronous transition or read against the wizard.
    pub fn with<R>(&self, f: impl FnOnce(&mut Wizard) -> R) -> R {
        f(&mut self.wizard.lock())
    }

    /// Issues one generation and applies its outcome.
    ///
    /// Returns `Ok(false)` when the wizard moved on while the request was in
    /// flight and the outcome was discarded.
    pub async fn generate(&self) -> Result<bool, WizardError> {
        let ticket = self.wizard.lock().generate()?;
        info!(request_id = ticket.id, clothing = %ticket.clothing.label(), "Generating try-on");

        let outcome = self.gateway.generate(&ticket.person, &ticket.clothing).await;
        if let Err(err) = &outcome {
            warn!(request_id = ticket.id, error = %err, "Generation failed");
        }

        Ok(self.wizard.lock().complete(ticket.id, outcome))
    }

    /// Saves the current result image into `dir`.
    pub async fn download(&self, dir: &Path) -> Result<PathBuf, WizardError> {
        let data_url = self
            .wizard
            .lock()
            .result_image()
            .map(str::to_string)
            .ok_or(WizardError::NoResult)?;
        download::save_result(&data_url, dir).await
    }
}
