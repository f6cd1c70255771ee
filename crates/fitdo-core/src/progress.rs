use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::todo::TodoList;

pub const BADGE_MILESTONES: &[(u32, &str)] = &[
    (7, "🥉 1 Week"),
    (14, "🥈 2 Weeks"),
    (21, "🥇 3 Weeks"),
    (30, "🏆 Month Warrior"),
    (75, "👑 75 Hard Completed"),
    (150, "👑 75 Hard 2 Completed"),
    (225, "👑 75 Hard 3 Completed"),
    (300, "👑 75 Hard 4 Completed"),
    (375, "👑 75 Hard 5 Completed"),
];

/// Persisted under the `fitStats` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(default)]
    pub streak: u32,

    #[serde(default)]
    pub last_completed_date: Option<NaiveDate>,

    #[serde(default)]
    pub badges: Vec<String>,
}

impl UserStats {
    pub fn has_badge(&self, label: &str) -> bool {
        self.badges.iter().any(|badge| badge == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeKind {
    Milestone,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardedBadge {
    pub label: String,
    pub kind: BadgeKind,
}

impl AwardedBadge {
    pub fn notice(&self) -> String {
        match self.kind {
            BadgeKind::Milestone => {
                format!("🎉 Congratulations! You earned the \"{}\" badge!", self.label)
            }
            BadgeKind::Weekly => {
                format!("Wow! Another week crushed! Added badge: {}", self.label)
            }
        }
    }
}

/// What changed on the first all-done evaluation of a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub streak: u32,
    pub continued: bool,
    pub badge: Option<AwardedBadge>,
}

pub fn milestone_badge(streak: u32) -> Option<&'static str> {
    BADGE_MILESTONES
        .iter()
        .find(|(days, _)| *days == streak)
        .map(|(_, label)| *label)
}

pub fn weekly_badge_label(streak: u32) -> String {
    format!("🔥 {streak} Days")
}

/// Runs after every toggle. Only the first all-done evaluation per
/// calendar day moves the streak; later calls return `None`.
///
/// Unmarking tasks after the day was counted never rolls the streak back,
/// and a skipped day only shows up as a reset at the next completion.
pub fn evaluate(
    mut stats: UserStats,
    todos: &TodoList,
    today: NaiveDate,
) -> (UserStats, Option<StreakUpdate>) {
    if !todos.all_done() || stats.last_completed_date == Some(today) {
        return (stats, None);
    }

    let continued = match (stats.last_completed_date, today.pred_opt()) {
        (Some(last), Some(yesterday)) => last == yesterday,
        _ => false,
    };
    stats.streak = if continued {
        stats.streak.saturating_add(1)
    } else {
        1
    };
    stats.last_completed_date = Some(today);

    let badge = award_badge(&mut stats);
    let update = StreakUpdate {
        streak: stats.streak,
        continued,
        badge,
    };
    (stats, Some(update))
}

/// Awards at most one badge. An exact milestone takes precedence; the
/// weekly fallback only applies when the streak is not a milestone key.
fn award_badge(stats: &mut UserStats) -> Option<AwardedBadge> {
    let streak = stats.streak;

    let (label, kind) = if let Some(label) = milestone_badge(streak) {
        (label.to_string(), BadgeKind::Milestone)
    } else if streak > 0 && streak % 7 == 0 {
        (weekly_badge_label(streak), BadgeKind::Weekly)
    } else {
        return None;
    };

    if stats.has_badge(&label) {
        return None;
    }
    stats.badges.push(label.clone());
    Some(AwardedBadge { label, kind })
}
