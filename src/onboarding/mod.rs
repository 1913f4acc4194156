//! Onboarding — draft capture and the multi-step setup flow.

pub mod model;
pub mod state;

pub use model::{FocusMode, OnboardingData, OnboardingDraft};
pub use state::OnboardingStep;
