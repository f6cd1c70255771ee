use chrono::NaiveDate;

use crate::progress::{self, StreakUpdate, UserStats};
use crate::todo::TodoList;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub todos: TodoList,
    pub stats: UserStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub toggled: usize,
    pub streak: Option<StreakUpdate>,
}

impl AppState {
    pub fn new(todos: TodoList, stats: UserStats) -> Self {
        Self { todos, stats }
    }

    /// Toggles each referenced id in order, evaluating progress after every
    /// toggle. At most one streak update can come out of a single day.
    pub fn toggle(self, ids: &[u64], today: NaiveDate) -> (Self, ToggleOutcome) {
        let Self {
            mut todos,
            mut stats,
        } = self;
        let mut toggled = 0;
        let mut streak = None;

        for id in ids {
            let (next, changed) = todos.toggle(*id);
            todos = next;
            if changed {
                toggled += 1;
            }

            let (next_stats, update) = progress::evaluate(stats, &todos, today);
            stats = next_stats;
            if update.is_some() {
                streak = update;
            }
        }

        (Self { todos, stats }, ToggleOutcome { toggled, streak })
    }
}
