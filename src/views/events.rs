use crate::types::SkillStatus;
use crate::views::auth::{LoginForm, RegistrationForm};

/// What happened in the rendering layer, without payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    StatusControlClicked,
    RoadmapSelected,
    ReloadRequested,
    LogoutClicked,
    SkillAdded,
    SkillRemoved,
    SetupSubmitted,
    LoginSubmitted,
    RegisterSubmitted,
}

/// What a view does in response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    ChangeSkillStatus,
    SelectRoadmap,
    ReloadView,
    Logout,
    AddKnownSkill,
    RemoveKnownSkill,
    SubmitIntake,
    Login,
    Register,
}

crate::bind_events! {
    StatusControlClicked => ChangeSkillStatus,
    RoadmapSelected => SelectRoadmap,
    ReloadRequested => ReloadView,
    LogoutClicked => Logout,
    SkillAdded => AddKnownSkill,
    SkillRemoved => RemoveKnownSkill,
    SetupSubmitted => SubmitIntake,
    LoginSubmitted => Login,
    RegisterSubmitted => Register,
}

pub fn action_for(kind: EventKind) -> Option<Action> {
    BINDINGS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, action)| *action)
}

/// An event emitted by whatever renders the views.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    StatusControlClicked { status_id: i64, status: SkillStatus },
    RoadmapSelected(usize),
    ReloadRequested,
    LogoutClicked,
    SkillAdded(String),
    SkillRemoved(String),
    SetupSubmitted,
    LoginSubmitted(LoginForm),
    RegisterSubmitted(RegistrationForm),
}

impl UiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::StatusControlClicked { .. } => EventKind::StatusControlClicked,
            UiEvent::RoadmapSelected(_) => EventKind::RoadmapSelected,
            UiEvent::ReloadRequested => EventKind::ReloadRequested,
            UiEvent::LogoutClicked => EventKind::LogoutClicked,
            UiEvent::SkillAdded(_) => EventKind::SkillAdded,
            UiEvent::SkillRemoved(_) => EventKind::SkillRemoved,
            UiEvent::SetupSubmitted => EventKind::SetupSubmitted,
            UiEvent::LoginSubmitted(_) => EventKind::LoginSubmitted,
            UiEvent::RegisterSubmitted(_) => EventKind::RegisterSubmitted,
        }
    }

    pub fn action(&self) -> Option<Action> {
        action_for(self.kind())
    }
}
