use colored::{ColoredString, Colorize};
use std::fmt::Write;

use crate::types::{ProgressStats, Roadmap, SkillStatus, User};
use crate::views::dashboard::{DashboardModel, DashboardState, SkillCard};
use crate::views::{Notice, NoticeKind};

const BAR_WIDTH: usize = 30;

pub fn notice(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Info => format!("{} {}", "i".blue().bold(), notice.message),
        NoticeKind::Success => format!("{} {}", "✓".green().bold(), notice.message.green()),
        NoticeKind::Error => format!("{} {}", "✗".red().bold(), notice.message.red()),
    }
}

fn status_badge(status: SkillStatus) -> ColoredString {
    let text = format!("[{}]", status.label());
    match status {
        SkillStatus::NotStarted => text.dimmed(),
        SkillStatus::InProgress => text.yellow(),
        SkillStatus::Completed => text.green().bold(),
    }
}

pub fn progress_bar(stats: &ProgressStats) -> String {
    let filled = stats.bar_cells(BAR_WIDTH);
    format!(
        "[{}{}] {:.2}%",
        "█".repeat(filled).green(),
        "░".repeat(BAR_WIDTH - filled).dimmed(),
        stats.percentage
    )
}

pub fn stats_line(stats: &ProgressStats) -> String {
    format!(
        "Completed: {}  In progress: {}  Remaining: {}  Total: {}",
        stats.completed.to_string().green(),
        stats.in_progress.to_string().yellow(),
        stats.remaining,
        stats.total
    )
}

fn skill_line(card: &SkillCard) -> String {
    let marker = if card.is_marked_completed() { "✔" } else { "•" };
    let name = if card.is_marked_completed() {
        card.skill.skill_name.strikethrough().to_string()
    } else {
        card.skill.skill_name.bold().to_string()
    };
    let mut line = format!(
        "  {} {} {} (status id {})",
        marker,
        name,
        status_badge(card.displayed_status),
        card.skill.status_id
    );
    if let Some(hours) = card.skill.estimated_hours {
        let _ = write!(line, " · {}h", hours);
    }
    if card.pending {
        let _ = write!(line, " {}", "saving...".italic());
    }
    if let Some(why) = card.skill.why_important.as_deref().filter(|w| !w.is_empty()) {
        let _ = write!(line, "\n      {}", why.dimmed());
    }
    line
}

/// Skills grouped by learning stage, in roadmap order.
pub fn timeline(cards: &[SkillCard]) -> String {
    if cards.is_empty() {
        return "This roadmap has no skills yet.".dimmed().to_string();
    }
    let mut out = String::new();
    let mut current_stage: Option<&str> = None;
    for card in cards {
        if current_stage != Some(card.skill.learning_stage.as_str()) {
            current_stage = Some(card.skill.learning_stage.as_str());
            let _ = writeln!(out, "{}", card.skill.learning_stage.cyan().bold());
        }
        let _ = writeln!(out, "{}", skill_line(card));
    }
    out.trim_end().to_string()
}

fn header(user: &User) -> String {
    format!("Welcome back, {}!", user.username.bold())
}

fn model(model: &DashboardModel) -> String {
    let roadmap = model.roadmap();
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(&model.user));
    if model.roadmaps.len() > 1 {
        let _ = writeln!(
            out,
            "Roadmap {} of {}",
            model.active + 1,
            model.roadmaps.len()
        );
    }
    let _ = writeln!(
        out,
        "{} · {}",
        roadmap.career_goal.bold(),
        roadmap.learning_level
    );
    let _ = writeln!(out, "{}", progress_bar(&model.stats));
    let _ = writeln!(out, "{}", stats_line(&model.stats));
    let _ = writeln!(out);
    out.push_str(&timeline(&model.cards));
    out
}

pub fn dashboard(state: &DashboardState, notice: Option<&Notice>) -> String {
    let mut out = match state {
        DashboardState::Loading => "Loading your roadmap...".dimmed().to_string(),
        DashboardState::Empty { user } => format!(
            "{}\nYou don't have a roadmap yet. Run `roadmap setup` to create one.",
            header(user)
        ),
        DashboardState::Populated(m) => model(m),
    };
    if let Some(n) = notice {
        out = format!("{}\n\n{}", self::notice(n), out);
    }
    out
}

pub fn roadmap_list(roadmaps: &[Roadmap]) -> String {
    if roadmaps.is_empty() {
        return "No roadmaps yet.".to_string();
    }
    roadmaps
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let stats = r.stats();
            format!(
                "{}. {} ({}) - {}/{} skills completed, {:.2}%",
                i + 1,
                r.career_goal.bold(),
                r.learning_level,
                stats.completed,
                stats.total,
                stats.percentage
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn user(user: &User) -> String {
    match &user.email {
        Some(email) => format!("{} <{}> (id {})", user.username.bold(), email, user.id),
        None => format!("{} (id {})", user.username.bold(), user.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures;

    fn card(status: SkillStatus, stage: &str, name: &str) -> SkillCard {
        let skill = fixtures::skill(1, name, stage, status);
        SkillCard {
            displayed_status: skill.status,
            skill,
            pending: false,
        }
    }

    #[test]
    fn empty_skill_list_renders_a_notice() {
        colored::control::set_override(false);
        assert_eq!(timeline(&[]), "This roadmap has no skills yet.");
    }

    #[test]
    fn timeline_groups_by_stage() {
        colored::control::set_override(false);
        let cards = vec![
            card(SkillStatus::Completed, "Beginner", "HTML Basics"),
            card(SkillStatus::NotStarted, "Beginner", "CSS Fundamentals"),
            card(SkillStatus::InProgress, "Intermediate", "REST APIs"),
        ];
        let text = timeline(&cards);
        assert_eq!(text.matches("Beginner").count(), 1);
        assert!(text.contains("✔ HTML Basics [Completed]"));
        assert!(text.contains("• REST APIs [In progress] (status id 101) · 10h"));
    }

    #[test]
    fn empty_state_points_to_setup() {
        colored::control::set_override(false);
        let text = dashboard(
            &DashboardState::Empty {
                user: fixtures::user(),
            },
            None,
        );
        assert!(text.contains("roadmap setup"));
    }

    #[test]
    fn progress_bar_shows_percentage() {
        colored::control::set_override(false);
        let roadmap = fixtures::roadmap(vec![
            fixtures::skill(1, "a", "Beginner", SkillStatus::Completed),
            fixtures::skill(2, "b", "Beginner", SkillStatus::NotStarted),
        ]);
        let bar = progress_bar(&roadmap.stats());
        assert!(bar.ends_with("50.00%"));
        assert_eq!(bar.matches('█').count(), BAR_WIDTH / 2);
    }
}
