use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::session::{Route, SessionContext};
use crate::types::{CreateRoadmapRequest, LEARNING_LEVELS};
use crate::views::Notice;
use crate::views::events::{Action, UiEvent};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Please enter a skill name")]
    EmptySkill,
    #[error("\"{0}\" is already in your list")]
    DuplicateSkill(String),
    #[error("Please select a career goal")]
    MissingCareerGoal,
    #[error("Please select a learning level")]
    MissingLearningLevel,
    #[error("Unknown career goal: {0}")]
    UnknownCareerGoal(String),
    #[error("Unknown learning level: {0}")]
    UnknownLearningLevel(String),
}

/// Form state of the intake view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntakeForm {
    pub career_goal: Option<String>,
    pub learning_level: Option<String>,
    known_skills: Vec<String>,
}

impl IntakeForm {
    pub fn known_skills(&self) -> &[String] {
        &self.known_skills
    }

    /// Append a skill. Names are trimmed and compared case-insensitively.
    pub fn add_skill(&mut self, name: &str) -> Result<(), IntakeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IntakeError::EmptySkill);
        }
        if self
            .known_skills
            .iter()
            .any(|s| s.to_lowercase() == name.to_lowercase())
        {
            return Err(IntakeError::DuplicateSkill(name.to_string()));
        }
        self.known_skills.push(name.to_string());
        Ok(())
    }

    pub fn remove_skill(&mut self, name: &str) -> bool {
        let before = self.known_skills.len();
        self.known_skills.retain(|s| s != name.trim());
        self.known_skills.len() != before
    }

    pub fn to_request(&self) -> Result<CreateRoadmapRequest, IntakeError> {
        let career_goal = self
            .career_goal
            .clone()
            .ok_or(IntakeError::MissingCareerGoal)?;
        let learning_level = self
            .learning_level
            .clone()
            .ok_or(IntakeError::MissingLearningLevel)?;
        Ok(CreateRoadmapRequest {
            career_goal,
            learning_level,
            existing_skills: self.known_skills.clone(),
        })
    }
}

pub struct SetupView {
    ctx: SessionContext,
    pub career_goals: Vec<String>,
    pub form: IntakeForm,
    pub submitting: bool,
    pub notice: Option<Notice>,
    redirect_delay: Duration,
}

impl SetupView {
    pub fn new(ctx: SessionContext, redirect_delay: Duration) -> Self {
        Self {
            ctx,
            career_goals: Vec::new(),
            form: IntakeForm::default(),
            submitting: false,
            notice: None,
            redirect_delay,
        }
    }

    pub fn learning_levels(&self) -> &'static [&'static str] {
        &LEARNING_LEVELS
    }

    /// Fetch the service-provided career goal list.
    pub async fn load(&mut self) -> bool {
        match self.ctx.client().get_career_goals().await {
            Ok(goals) => {
                self.career_goals = goals.career_goals;
                true
            }
            Err(e) => {
                self.notice = Some(Notice::from_error("Failed to load career goals", &e));
                false
            }
        }
    }

    pub fn select_career_goal(&mut self, goal: &str) -> Result<(), IntakeError> {
        let found = self
            .career_goals
            .iter()
            .find(|g| g.eq_ignore_ascii_case(goal.trim()))
            .ok_or_else(|| IntakeError::UnknownCareerGoal(goal.to_string()))?;
        self.form.career_goal = Some(found.clone());
        Ok(())
    }

    pub fn select_learning_level(&mut self, level: &str) -> Result<(), IntakeError> {
        let found = LEARNING_LEVELS
            .iter()
            .find(|l| l.eq_ignore_ascii_case(level.trim()))
            .ok_or_else(|| IntakeError::UnknownLearningLevel(level.to_string()))?;
        self.form.learning_level = Some(found.to_string());
        Ok(())
    }

    pub fn add_skill(&mut self, name: &str) -> bool {
        match self.form.add_skill(name) {
            Ok(()) => {
                self.notice = None;
                true
            }
            Err(e) => {
                self.notice = Some(Notice::error(e.to_string()));
                false
            }
        }
    }

    pub fn remove_skill(&mut self, name: &str) -> bool {
        self.form.remove_skill(name)
    }

    /// Create the roadmap and, after the redirect delay, route to the
    /// dashboard. On failure the form is left as it was.
    pub async fn submit(&mut self) -> Option<Route> {
        let request = match self.form.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.notice = Some(Notice::error(e.to_string()));
                return None;
            }
        };

        self.submitting = true;
        self.notice = Some(Notice::info("Creating your personalized roadmap..."));
        let result = self.ctx.client().create_roadmap(&request).await;
        self.submitting = false;

        match result {
            Ok(_) => {
                self.notice = Some(Notice::success("Roadmap created! Redirecting to dashboard..."));
                tokio::time::sleep(self.redirect_delay).await;
                Some(Route::Dashboard)
            }
            Err(e) => {
                self.notice = Some(Notice::from_error("Failed to create roadmap", &e));
                None
            }
        }
    }

    pub async fn dispatch(&mut self, event: UiEvent) -> Option<Route> {
        match (event.action(), event) {
            (Some(Action::AddKnownSkill), UiEvent::SkillAdded(name)) => {
                self.add_skill(&name);
                None
            }
            (Some(Action::RemoveKnownSkill), UiEvent::SkillRemoved(name)) => {
                self.remove_skill(&name);
                None
            }
            (Some(Action::SubmitIntake), UiEvent::SetupSubmitted) => self.submit().await,
            (Some(Action::Logout), UiEvent::LogoutClicked) => match self.ctx.logout() {
                Ok(route) => Some(route),
                Err(e) => {
                    self.notice = Some(Notice::from_error("Logout failed", &e));
                    None
                }
            },
            (action, _) => {
                debug!(?action, "Event not handled by the setup view");
                None
            }
        }
    }
}
