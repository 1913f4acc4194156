//! Onboarding step machine — tracks which setup screen the user is on.

use serde::{Deserialize, Serialize};

use super::model::OnboardingDraft;

/// The steps of the setup flow.
///
/// Progresses linearly: Task → Why → Duration → DistractionApps →
/// FocusMode → Ready. The draft counts as complete once Ready is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Task,
    Why,
    Duration,
    DistractionApps,
    FocusMode,
    Ready,
}

impl OnboardingStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (Task, Why)
                | (Why, Duration)
                | (Duration, DistractionApps)
                | (DistractionApps, FocusMode)
                | (FocusMode, Ready)
        )
    }

    /// Whether this step is terminal (setup is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Task => Some(Why),
            Why => Some(Duration),
            Duration => Some(DistractionApps),
            DistractionApps => Some(FocusMode),
            FocusMode => Some(Ready),
            Ready => None,
        }
    }

    /// Whether the draft satisfies this step's input rules.
    ///
    /// This is the advisory gate a front end uses to enable "continue";
    /// nothing downstream re-checks it.
    pub fn is_satisfied_by(&self, draft: &OnboardingDraft) -> bool {
        match self {
            Self::Task => draft
                .focus_task
                .as_ref()
                .is_some_and(|t| !t.trim().is_empty() && t.chars().count() <= 60),
            Self::Why => draft
                .focus_why
                .as_ref()
                .is_some_and(|w| !w.trim().is_empty() && w.chars().count() <= 140),
            Self::Duration => draft
                .focus_duration_minutes
                .is_some_and(|d| (5..=180).contains(&d)),
            // Zero selected apps is a valid answer.
            Self::DistractionApps => true,
            Self::FocusMode => draft.focus_mode.is_some(),
            Self::Ready => true,
        }
    }
}

impl Default for OnboardingStep {
    fn default() -> Self {
        Self::Task
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Task => "task",
            Self::Why => "why",
            Self::Duration => "duration",
            Self::DistractionApps => "distraction_apps",
            Self::FocusMode => "focus_mode",
            Self::Ready => "ready",
        };
        write!(f, "{s}")
    }
}
