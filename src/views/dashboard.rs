//! Dashboard view and the optimistic skill-status protocol.
//!
//! A status change runs in two phases:
//! 1. [`DashboardView::begin_status_change`] flips the single skill control to
//!    the requested status before the service has answered.
//! 2. [`DashboardView::finish_status_change`] reconciles with the service: on
//!    success the whole snapshot is refetched and every aggregate recomputed;
//!    on failure [`DashboardView::discard_optimistic_changes`] throws the local
//!    state away and reloads the view from scratch.
//!
//! Aggregates (counts, percentage, bar) are never derived from the optimistic
//! guess, only from a service snapshot.

use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ServiceResult;
use crate::session::{Route, SessionContext};
use crate::types::{Dashboard, ProgressStats, Roadmap, Skill, SkillStatus, User};
use crate::views::Notice;
use crate::views::events::{Action, UiEvent};

/// A skill as displayed, with its control state.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillCard {
    pub skill: Skill,
    /// Status shown on the control; may run ahead of the service.
    pub displayed_status: SkillStatus,
    pub pending: bool,
}

impl SkillCard {
    fn new(skill: Skill) -> Self {
        Self {
            displayed_status: skill.status,
            skill,
            pending: false,
        }
    }

    /// The "completed" visual marker.
    pub fn is_marked_completed(&self) -> bool {
        self.displayed_status == SkillStatus::Completed
    }
}

/// Populated dashboard content built from one service snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardModel {
    pub user: User,
    pub roadmaps: Vec<Roadmap>,
    pub active: usize,
    pub cards: Vec<SkillCard>,
    pub stats: ProgressStats,
}

impl DashboardModel {
    fn from_snapshot(dashboard: Dashboard, active: usize) -> Option<Self> {
        if dashboard.roadmaps.is_empty() {
            return None;
        }
        let active = active.min(dashboard.roadmaps.len() - 1);
        let roadmap = &dashboard.roadmaps[active];
        let cards = roadmap.skills.iter().cloned().map(SkillCard::new).collect();
        let stats = roadmap.stats();
        Some(Self {
            user: dashboard.user,
            roadmaps: dashboard.roadmaps,
            active,
            cards,
            stats,
        })
    }

    pub fn roadmap(&self) -> &Roadmap {
        &self.roadmaps[self.active]
    }

    fn card_mut(&mut self, status_id: i64) -> Option<&mut SkillCard> {
        self.cards.iter_mut().find(|c| c.skill.status_id == status_id)
    }
}

/// Exactly one of these at any time.
#[derive(Clone, Debug, PartialEq)]
pub enum DashboardState {
    Loading,
    /// The user has no roadmaps yet.
    Empty { user: User },
    Populated(DashboardModel),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusChangeRejected {
    #[error("Dashboard is not loaded")]
    NotLoaded,
    #[error("No skill with status id {0} on this roadmap")]
    UnknownStatusId(i64),
    #[error("An update for this skill is already in progress")]
    AlreadyPending,
}

/// Handle for an optimistic change awaiting reconciliation.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingStatusChange {
    pub status_id: i64,
    pub previous: SkillStatus,
    pub requested: SkillStatus,
}

#[derive(Debug, PartialEq)]
pub enum StatusChangeOutcome {
    /// Service confirmed; view holds a fresh snapshot.
    Confirmed,
    /// Service confirmed but the snapshot could not be refetched. The control
    /// shows the saved status; aggregates are from the previous snapshot.
    SavedNotRefreshed { route: Option<Route> },
    /// Rejected locally before any network call.
    Rejected(StatusChangeRejected),
    /// Service or network failed; local changes were discarded and the view
    /// reloaded.
    Discarded { route: Option<Route> },
}

impl StatusChangeOutcome {
    /// Where the view should navigate next, if anywhere.
    pub fn route(&self) -> Option<Route> {
        match self {
            StatusChangeOutcome::SavedNotRefreshed { route }
            | StatusChangeOutcome::Discarded { route } => *route,
            _ => None,
        }
    }
}

pub struct DashboardView {
    ctx: SessionContext,
    pub state: DashboardState,
    pub notice: Option<Notice>,
    in_flight: HashSet<i64>,
    active: usize,
}

impl DashboardView {
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            state: DashboardState::Loading,
            notice: None,
            in_flight: HashSet::new(),
            active: 0,
        }
    }

    pub fn model(&self) -> Option<&DashboardModel> {
        match &self.state {
            DashboardState::Populated(model) => Some(model),
            _ => None,
        }
    }

    /// Initial load. Returns a route when the session turned out to be
    /// invalid; any other failure leaves the view in `Loading` with an error
    /// notice.
    pub async fn load(&mut self) -> Option<Route> {
        match self.try_load().await {
            Ok(route) => route,
            Err(e) => {
                self.notice = Some(Notice::from_error("Failed to load dashboard", &e));
                None
            }
        }
    }

    /// Like [`load`](Self::load) but hands non-401 failures back to the
    /// caller instead of turning them into a notice.
    pub async fn try_load(&mut self) -> ServiceResult<Option<Route>> {
        self.state = DashboardState::Loading;
        match self.ctx.client().get_dashboard().await {
            Ok(dashboard) => {
                self.apply_snapshot(dashboard);
                Ok(None)
            }
            Err(e) if e.is_unauthorized() => Ok(Some(self.expire_session())),
            Err(e) => Err(e),
        }
    }

    fn expire_session(&mut self) -> Route {
        warn!("Session rejected by the service, logging out");
        if let Err(e) = self.ctx.logout() {
            warn!(error = %e, "Failed to clear session");
        }
        self.notice = Some(Notice::error("Your session has expired. Please log in again."));
        Route::Entry
    }

    fn apply_snapshot(&mut self, dashboard: Dashboard) {
        if dashboard.roadmaps.is_empty() {
            self.state = DashboardState::Empty {
                user: dashboard.user,
            };
            return;
        }
        if let Some(model) = DashboardModel::from_snapshot(dashboard, self.active) {
            self.active = model.active;
            self.state = DashboardState::Populated(model);
        }
    }

    /// Refetch the snapshot and recompute all aggregates from it.
    pub async fn refresh(&mut self) -> ServiceResult<()> {
        let dashboard = self.ctx.client().get_dashboard().await?;
        self.apply_snapshot(dashboard);
        Ok(())
    }

    pub fn select_roadmap(&mut self, index: usize) -> bool {
        let DashboardState::Populated(model) = &self.state else {
            return false;
        };
        if index >= model.roadmaps.len() {
            return false;
        }
        let snapshot = Dashboard {
            user: model.user.clone(),
            roadmaps: model.roadmaps.clone(),
        };
        self.active = index;
        self.apply_snapshot(snapshot);
        true
    }

    /// Phase one: show the requested status on the control immediately.
    pub fn begin_status_change(
        &mut self,
        status_id: i64,
        requested: SkillStatus,
    ) -> Result<PendingStatusChange, StatusChangeRejected> {
        let DashboardState::Populated(model) = &mut self.state else {
            return Err(StatusChangeRejected::NotLoaded);
        };
        if self.in_flight.contains(&status_id) {
            return Err(StatusChangeRejected::AlreadyPending);
        }
        let card = model
            .card_mut(status_id)
            .ok_or(StatusChangeRejected::UnknownStatusId(status_id))?;

        let previous = card.displayed_status;
        card.displayed_status = requested;
        card.pending = true;
        self.in_flight.insert(status_id);
        debug!(status_id, from = %previous, to = %requested, "Optimistic status change");

        Ok(PendingStatusChange {
            status_id,
            previous,
            requested,
        })
    }

    /// Phase two: reconcile with the service's answer.
    pub async fn finish_status_change(
        &mut self,
        pending: PendingStatusChange,
        result: ServiceResult<()>,
    ) -> StatusChangeOutcome {
        self.in_flight.remove(&pending.status_id);

        if let Err(e) = result {
            warn!(status_id = pending.status_id, error = %e, "Status update failed");
            // A reload that finds the session expired replaces this notice.
            self.notice = Some(Notice::from_error("Failed to update skill status", &e));
            let route = self.discard_optimistic_changes().await;
            return StatusChangeOutcome::Discarded { route };
        }

        info!(status_id = pending.status_id, status = %pending.requested, "Skill status updated");
        match self.refresh().await {
            Ok(()) => StatusChangeOutcome::Confirmed,
            Err(e) if e.is_unauthorized() => StatusChangeOutcome::SavedNotRefreshed {
                route: Some(self.expire_session()),
            },
            Err(e) => {
                warn!(status_id = pending.status_id, error = %e, "Refresh after status update failed");
                self.settle_card(&pending);
                self.notice = Some(Notice::from_error("Status saved, but refreshing failed", &e));
                StatusChangeOutcome::SavedNotRefreshed { route: None }
            }
        }
    }

    /// Record a service-confirmed status on its card without a new snapshot.
    fn settle_card(&mut self, pending: &PendingStatusChange) {
        if let DashboardState::Populated(model) = &mut self.state {
            if let Some(card) = model.card_mut(pending.status_id) {
                card.skill.status = pending.requested;
                card.displayed_status = pending.requested;
                card.pending = false;
            }
        }
    }

    /// Full protocol for one status-control click.
    pub async fn change_status(
        &mut self,
        status_id: i64,
        requested: SkillStatus,
    ) -> StatusChangeOutcome {
        let pending = match self.begin_status_change(status_id, requested) {
            Ok(pending) => pending,
            Err(rejected) => {
                self.notice = Some(Notice::error(rejected.to_string()));
                return StatusChangeOutcome::Rejected(rejected);
            }
        };

        let result = self
            .ctx
            .client()
            .update_skill_status(status_id, requested)
            .await
            .map(|_| ());
        self.finish_status_change(pending, result).await
    }

    /// Recovery action: forget every optimistic mutation and restart the view
    /// from the service's state.
    pub async fn discard_optimistic_changes(&mut self) -> Option<Route> {
        self.in_flight.clear();
        self.load().await
    }

    pub async fn dispatch(&mut self, event: UiEvent) -> Option<Route> {
        match (event.action(), event) {
            (Some(Action::ChangeSkillStatus), UiEvent::StatusControlClicked { status_id, status }) => {
                self.change_status(status_id, status).await.route()
            }
            (Some(Action::SelectRoadmap), UiEvent::RoadmapSelected(index)) => {
                if !self.select_roadmap(index) {
                    self.notice = Some(Notice::error(format!("No roadmap #{}", index + 1)));
                }
                None
            }
            (Some(Action::ReloadView), UiEvent::ReloadRequested) => self.load().await,
            (Some(Action::Logout), UiEvent::LogoutClicked) => match self.ctx.logout() {
                Ok(route) => Some(route),
                Err(e) => {
                    self.notice = Some(Notice::from_error("Logout failed", &e));
                    None
                }
            },
            (action, _) => {
                debug!(?action, "Event not handled by the dashboard view");
                None
            }
        }
    }
}
