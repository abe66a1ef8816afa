//! Step-by-step try-on flow.
//!
//! The wizard owns every piece of user-visible state. All transitions are
//! synchronous methods; the only asynchronous work (the generation itself)
//! happens outside, between [`Wizard::generate`] handing out a ticket and
//! [`Wizard::complete`] applying its result.

pub mod download;
pub mod session;

use std::sync::Arc;

use tracing::debug;

use crate::models::error::ClientError;
use crate::models::gallery::{Gallery, Gender, Outfit};
use crate::models::image::{ClothingSelection, ImageResource};
use crate::services::previews::{PreviewHandle, Previews};

pub use session::Session;

const FAILURE_PREFIX: &str = "Не удалось сгенерировать изображение.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Start,
    Gender,
    Clothing,
    Generating,
    Result,
    Error,
    CredentialHelp,
}

/// Product flavour: plain two-upload flow, or gender selection plus gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Minimal,
    Gallery,
}

/// A locally selected image together with its preview handle.
#[derive(Debug)]
pub struct SelectedImage {
    pub image: Arc<ImageResource>,
    preview: PreviewHandle,
}

impl SelectedImage {
    pub fn preview_url(&self) -> String {
        self.preview.url()
    }
}

#[derive(Debug)]
pub enum ClothingChoice {
    Uploaded(SelectedImage),
    Gallery(Outfit),
}

impl ClothingChoice {
    fn to_selection(&self) -> ClothingSelection {
        match self {
            ClothingChoice::Uploaded(selected) => ClothingSelection::Uploaded(selected.image.clone()),
            ClothingChoice::Gallery(outfit) => ClothingSelection::GalleryReference {
                url: outfit.url.clone(),
                name: outfit.name.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guidance {
    Generic,
    CredentialSetup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedError {
    pub message: String,
    pub guidance: Guidance,
}

#[derive(Debug)]
pub struct WizardState {
    pub step: Step,
    pub person: Option<SelectedImage>,
    pub gender: Option<Gender>,
    pub clothing: Option<ClothingChoice>,
    pub result_image: Option<String>,
    pub error: Option<DisplayedError>,
    pub in_flight: Option<u64>,
}

impl WizardState {
    fn empty() -> Self {
        Self {
            step: Step::Start,
            person: None,
            gender: None,
            clothing: None,
            result_image: None,
            error: None,
            in_flight: None,
        }
    }
}

/// Everything the gateway needs for one generation attempt.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub id: u64,
    pub person: Arc<ImageResource>,
    pub clothing: ClothingSelection,
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("{0}")]
    Validation(String),

    #[error("Генерация уже выполняется")]
    Busy,

    #[error("{action} is not available at step {step:?}")]
    InvalidTransition { step: Step, action: &'static str },

    #[error("Outfit is not in the gallery: {0}")]
    UnknownOutfit(String),

    #[error("There is no result to download")]
    NoResult,

    #[error(transparent)]
    Decode(#[from] ClientError),

    #[error("Failed to save result: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Wizard {
    variant: Variant,
    gallery: Gallery,
    previews: Previews,
    state: WizardState,
    next_request_id: u64,
}

impl Wizard {
    pub fn new(variant: Variant, gallery: Gallery) -> Self {
        Self {
            variant,
            gallery,
            previews: Previews::new(),
            state: WizardState::empty(),
            next_request_id: 1,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> Step {
        self.state.step
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn previews(&self) -> &Previews {
        &self.previews
    }

    pub fn result_image(&self) -> Option<&str> {
        self.state.result_image.as_deref()
    }

    /// Outfits offered for the currently selected gender.
    pub fn available_outfits(&self) -> &[Outfit] {
        match (self.variant, self.state.gender) {
            (Variant::Gallery, Some(gender)) => self.gallery.outfits(gender),
            _ => &[],
        }
    }

    /// Whether the generate trigger should be enabled.
    pub fn can_generate(&self) -> bool {
        self.accepts_generate() && self.state.person.is_some() && self.state.clothing.is_some()
    }

    fn accepts_generate(&self) -> bool {
        matches!(self.state.step, Step::Clothing | Step::Result)
    }

    fn step_after_person(&self) -> Step {
        match self.variant {
            Variant::Minimal => Step::Clothing,
            Variant::Gallery => Step::Gender,
        }
    }

    fn select(&self, image: ImageResource) -> SelectedImage {
        let preview = self.previews.register(&image.name);
        SelectedImage {
            image: Arc::new(image),
            preview,
        }
    }

    /// New person photo: everything downstream of it is reset.
    ///
    /// Allowed while generating; the outstanding request is forgotten and its
    /// completion will be ignored.
    pub fn select_person(&mut self, image: ImageResource) {
        if let Some(id) = self.state.in_flight {
            debug!(request_id = id, "Discarding in-flight generation after new person photo");
        }
        let selected = self.select(image);
        self.state.person = Some(selected);
        self.state.gender = None;
        self.state.clothing = None;
        self.state.result_image = None;
        self.state.error = None;
        self.state.in_flight = None;
        self.state.step = self.step_after_person();
    }

    pub fn select_gender(&mut self, gender: Gender) -> Result<(), WizardError> {
        let allowed = self.variant == Variant::Gallery
            && self.state.person.is_some()
            && matches!(self.state.step, Step::Gender | Step::Clothing);
        if !allowed {
            return Err(self.invalid("select_gender"));
        }
        if self.state.gender != Some(gender) && matches!(self.state.clothing, Some(ClothingChoice::Gallery(_))) {
            self.state.clothing = None;
        }
        self.state.gender = Some(gender);
        self.state.step = Step::Clothing;
        Ok(())
    }

    pub fn select_clothing_file(&mut self, image: ImageResource) -> Result<(), WizardError> {
        if !self.accepts_clothing() {
            return Err(self.invalid("select_clothing_file"));
        }
        let selected = self.select(image);
        self.state.clothing = Some(ClothingChoice::Uploaded(selected));
        self.state.result_image = None;
        self.state.error = None;
        self.state.step = Step::Clothing;
        Ok(())
    }

    pub fn select_gallery_outfit(&mut self, url: &str) -> Result<(), WizardError> {
        if self.variant != Variant::Gallery || !self.accepts_clothing() {
            return Err(self.invalid("select_gallery_outfit"));
        }
        let outfit = self
            .state
            .gender
            .and_then(|g| self.gallery.find_by_url(g, url))
            .cloned()
            .ok_or_else(|| WizardError::UnknownOutfit(url.to_string()))?;

        self.state.clothing = Some(ClothingChoice::Gallery(outfit));
        self.state.result_image = None;
        self.state.error = None;
        self.state.step = Step::Clothing;
        Ok(())
    }

    fn accepts_clothing(&self) -> bool {
        self.state.person.is_some() && matches!(self.state.step, Step::Clothing | Step::Result)
    }

    /// Starts a generation attempt.
    ///
    /// Missing inputs move the wizard to the error step and no ticket is
    /// issued, so the gateway is never called.
    pub fn generate(&mut self) -> Result<GenerationTicket, WizardError> {
        if self.state.step == Step::Generating {
            return Err(WizardError::Busy);
        }
        if !self.accepts_generate() {
            return Err(self.invalid("generate"));
        }

        let inputs = match (&self.state.person, &self.state.clothing) {
            (Some(person), Some(clothing)) => Some((person.image.clone(), clothing.to_selection())),
            _ => None,
        };
        let Some((person, clothing)) = inputs else {
            let message = self.validation_message().to_string();
            self.fail(DisplayedError {
                message: message.clone(),
                guidance: Guidance::Generic,
            });
            return Err(WizardError::Validation(message));
        };

        let id = self.next_request_id;
        self.next_request_id += 1;
        self.state.in_flight = Some(id);
        self.state.result_image = None;
        self.state.error = None;
        self.state.step = Step::Generating;

        debug!(request_id = id, clothing = %clothing.label(), "Generation started");
        Ok(GenerationTicket { id, person, clothing })
    }

    /// Applies the result of the generation identified by `request_id`.
    ///
    /// Returns `false` when the result is stale and was dropped.
    pub fn complete(&mut self, request_id: u64, outcome: Result<String, ClientError>) -> bool {
        if self.state.step != Step::Generating || self.state.in_flight != Some(request_id) {
            debug!(request_id, "Ignoring stale generation result");
            return false;
        }
        self.state.in_flight = None;

        match outcome {
            Ok(data_url) => {
                self.state.result_image = Some(data_url);
                self.state.error = None;
                self.state.step = Step::Result;
            }
            Err(err) => {
                let guidance = if err.is_missing_credential() {
                    Guidance::CredentialSetup
                } else {
                    Guidance::Generic
                };
                self.fail(DisplayedError {
                    message: format!("{} {}", FAILURE_PREFIX, err),
                    guidance,
                });
            }
        }
        true
    }

    fn fail(&mut self, error: DisplayedError) {
        self.state.step = match error.guidance {
            Guidance::Generic => Step::Error,
            Guidance::CredentialSetup => Step::CredentialHelp,
        };
        self.state.result_image = None;
        self.state.error = Some(error);
    }

    fn validation_message(&self) -> &'static str {
        match self.variant {
            Variant::Minimal => "Пожалуйста, загрузите ваше фото и фото одежды.",
            Variant::Gallery => "Пожалуйста, загрузите ваше фото и выберите одежду из галереи или загрузите её фото.",
        }
    }

    /// Clears everything, releasing previews, and returns to the start.
    pub fn start_over(&mut self) {
        self.state = WizardState::empty();
    }

    /// Leaves the error (or credential help) screen, clearing only the error.
    pub fn dismiss(&mut self) -> Result<(), WizardError> {
        if !matches!(self.state.step, Step::Error | Step::CredentialHelp) {
            return Err(self.invalid("dismiss"));
        }
        self.state.error = None;
        self.state.step = match (self.variant, self.state.person.is_some()) {
            (Variant::Minimal, true) => Step::Clothing,
            _ => Step::Start,
        };
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> WizardError {
        WizardError::InvalidTransition {
            step: self.state.step,
            action,
        }
    }
}
