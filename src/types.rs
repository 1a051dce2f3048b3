use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Learning levels accepted by the roadmap service.
pub const LEARNING_LEVELS: [&str; 2] = ["Beginner", "Intermediate"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Persisted credential state. Both fields are absent when logged out.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl SkillStatus {
    pub const ALL: [SkillStatus; 3] = [
        SkillStatus::NotStarted,
        SkillStatus::InProgress,
        SkillStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillStatus::NotStarted => "NOT_STARTED",
            SkillStatus::InProgress => "IN_PROGRESS",
            SkillStatus::Completed => "COMPLETED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkillStatus::NotStarted => "Not started",
            SkillStatus::InProgress => "In progress",
            SkillStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for SkillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "NOT_STARTED" | "TODO" => Ok(SkillStatus::NotStarted),
            "IN_PROGRESS" | "STARTED" => Ok(SkillStatus::InProgress),
            "COMPLETED" | "DONE" => Ok(SkillStatus::Completed),
            _ => Err(format!(
                "Unknown skill status: {s} (expected NOT_STARTED, IN_PROGRESS or COMPLETED)"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub skill_name: String,
    pub learning_stage: String,
    #[serde(default)]
    pub order_index: Option<i64>,
    pub status: SkillStatus,
    /// Key for status mutations; never the skill id.
    pub status_id: i64,
    #[serde(default)]
    pub why_important: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    #[serde(default)]
    pub id: Option<i64>,
    pub career_goal: String,
    pub learning_level: String,
    #[serde(default)]
    pub existing_skills: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub progress_percentage: f64,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

impl Roadmap {
    pub fn stats(&self) -> ProgressStats {
        ProgressStats::from_skills(&self.skills)
    }
}

/// Response of `GET /dashboard`. Aggregate counts sent by the service are
/// ignored; they are always recomputed from `roadmaps`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub user: User,
    #[serde(default)]
    pub roadmaps: Vec<Roadmap>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CareerGoals {
    pub career_goals: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateRoadmapRequest {
    pub career_goal: String,
    pub learning_level: String,
    pub existing_skills: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillStatusUpdate {
    pub status: SkillStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillStatusRecord {
    pub id: i64,
    pub skill_id: i64,
    pub status: SkillStatus,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Counts derived locally from a skill sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub remaining: usize,
    pub percentage: f64,
}

impl ProgressStats {
    pub fn from_skills(skills: &[Skill]) -> Self {
        let total = skills.len();
        let completed = skills
            .iter()
            .filter(|s| s.status == SkillStatus::Completed)
            .count();
        let in_progress = skills
            .iter()
            .filter(|s| s.status == SkillStatus::InProgress)
            .count();
        let percentage = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64 * 10_000.0).round() / 100.0
        };
        Self {
            total,
            completed,
            in_progress,
            remaining: total - completed - in_progress,
            percentage,
        }
    }

    /// Number of filled cells in a progress bar `width` cells wide.
    pub fn bar_cells(&self, width: usize) -> usize {
        let filled = (self.percentage.clamp(0.0, 100.0) / 100.0 * width as f64).round();
        (filled as usize).min(width)
    }
}
