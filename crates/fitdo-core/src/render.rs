use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr as _;

use crate::config::Config;
use crate::datetime::format_header;
use crate::progress::{AwardedBadge, StreakUpdate, UserStats};
use crate::todo::TodoList;

pub const EMPTY_LIST_PLACEHOLDER: &str = "No tasks today. Time to grind! 💪";

/// Draws state snapshots to stdout. Holds no state of its own beyond
/// whether color is allowed.
#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);
        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn print_header(&self, today: NaiveDate) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.paint(&format_header(today), "1"))?;
        Ok(())
    }

    #[tracing::instrument(skip(self, todos), fields(count = todos.len()))]
    pub fn print_todo_list(&self, todos: &TodoList) -> anyhow::Result<()> {
        self.write_todo_list(io::stdout().lock(), todos)
    }

    pub fn print_stats(&self, stats: &UserStats) -> anyhow::Result<()> {
        self.write_stats(io::stdout().lock(), stats)
    }

    pub fn print_celebration(&self, update: &StreakUpdate) -> anyhow::Result<()> {
        self.write_celebration(io::stdout().lock(), update)
    }

    pub fn print_badge_notice(&self, badge: &AwardedBadge) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.paint(&badge.notice(), "1;35"))?;
        Ok(())
    }

    pub fn write_todo_list<W: Write>(&self, mut out: W, todos: &TodoList) -> anyhow::Result<()> {
        if todos.is_empty() {
            writeln!(out, "{}", self.paint(EMPTY_LIST_PLACEHOLDER, "2"))?;
            return Ok(());
        }

        let rows: Vec<[String; 4]> = todos
            .iter()
            .enumerate()
            .map(|(idx, todo)| {
                let mark = if todo.completed { "✓" } else { "" };
                let text = if todo.completed {
                    self.paint(&todo.text, "2;9")
                } else {
                    todo.text.clone()
                };
                [
                    self.paint(&(idx + 1).to_string(), "33"),
                    todo.id.to_string(),
                    self.paint(mark, "32"),
                    text,
                ]
            })
            .collect();

        write_table(&mut out, &rows)?;
        Ok(())
    }

    pub fn write_stats<W: Write>(&self, mut out: W, stats: &UserStats) -> anyhow::Result<()> {
        writeln!(
            out,
            "Streak: {}",
            self.paint(&format!("{} days", stats.streak), "1;33")
        )?;
        if let Some(last) = stats.last_completed_date {
            writeln!(out, "Last completed: {}", last.format("%Y-%m-%d"))?;
        }

        writeln!(out, "Badges:")?;
        if stats.badges.is_empty() {
            writeln!(out, "  No badges yet.")?;
        }
        for badge in &stats.badges {
            writeln!(out, "  {badge}")?;
        }
        Ok(())
    }

    pub fn write_celebration<W: Write>(
        &self,
        mut out: W,
        update: &StreakUpdate,
    ) -> anyhow::Result<()> {
        let banner = format!("🎯 All tasks done! Streak: {} days", update.streak);
        writeln!(out, "{}", self.paint(&banner, "1;33;5"))?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

const COLUMNS: [&str; 4] = ["#", "ID", "Done", "Task"];

fn write_table<W: Write>(mut writer: W, rows: &[[String; 4]]) -> anyhow::Result<()> {
    let mut widths = COLUMNS.map(|header| header.width());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_width(cell));
        }
    }

    write_row(&mut writer, &COLUMNS.map(str::to_string), &widths)?;
    writeln!(writer, "{}", widths.map(|width| "-".repeat(width)).join(" "))?;
    for row in rows {
        write_row(&mut writer, row, &widths)?;
    }
    Ok(())
}

fn write_row<W: Write>(
    writer: &mut W,
    cells: &[String; 4],
    widths: &[usize; 4],
) -> anyhow::Result<()> {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push(' ');
        }
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(visible_width(cell))));
    }
    writeln!(writer, "{}", line.trim_end())?;
    Ok(())
}

/// Terminal width of a cell, skipping the SGR sequences `paint` wraps it in.
fn visible_width(cell: &str) -> usize {
    let mut plain = String::with_capacity(cell.len());
    let mut rest = cell;
    while let Some(start) = rest.find('\x1b') {
        plain.push_str(&rest[..start]);
        rest = match rest[start..].find('m') {
            Some(end) => &rest[start + end + 1..],
            None => "",
        };
    }
    plain.push_str(rest);
    plain.width()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{EMPTY_LIST_PLACEHOLDER, Renderer, visible_width};
    use crate::progress::{StreakUpdate, UserStats};
    use crate::todo::{Todo, TodoList};

    fn render_list(todos: &TodoList) -> String {
        let mut buf = Vec::new();
        Renderer::plain()
            .write_todo_list(&mut buf, todos)
            .expect("render list");
        String::from_utf8(buf).expect("utf8 output")
    }

    #[test]
    fn empty_list_shows_placeholder() {
        let output = render_list(&TodoList::default());
        assert_eq!(output, format!("{EMPTY_LIST_PLACEHOLDER}\n"));
    }

    #[test]
    fn list_keeps_insertion_order_and_marks() {
        let mut done = Todo::new(20, "Burpees".to_string());
        done.completed = true;
        let todos = TodoList::from_items(vec![Todo::new(10, "Jog".to_string()), done]);

        let output = render_list(&todos);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "# ID Done Task");
        assert_eq!(lines[1], "- -- ---- -------");
        assert_eq!(lines[2], "1 10      Jog");
        assert_eq!(lines[3], "2 20 ✓    Burpees");
    }

    #[test]
    fn stats_list_badges_in_order() {
        let stats = UserStats {
            streak: 14,
            last_completed_date: NaiveDate::from_ymd_opt(2026, 10, 18),
            badges: vec!["🥉 1 Week".to_string(), "🥈 2 Weeks".to_string()],
        };
        let mut buf = Vec::new();
        Renderer::plain()
            .write_stats(&mut buf, &stats)
            .expect("render stats");
        let output = String::from_utf8(buf).expect("utf8 output");
        assert_eq!(
            output,
            "Streak: 14 days\nLast completed: 2026-10-18\nBadges:\n  🥉 1 Week\n  🥈 2 Weeks\n"
        );
    }

    #[test]
    fn stats_without_badges() {
        let mut buf = Vec::new();
        Renderer::plain()
            .write_stats(&mut buf, &UserStats::default())
            .expect("render stats");
        let output = String::from_utf8(buf).expect("utf8 output");
        assert_eq!(output, "Streak: 0 days\nBadges:\n  No badges yet.\n");
    }

    #[test]
    fn celebration_mentions_streak() {
        let update = StreakUpdate {
            streak: 3,
            continued: true,
            badge: None,
        };
        let mut buf = Vec::new();
        Renderer::plain()
            .write_celebration(&mut buf, &update)
            .expect("render celebration");
        let output = String::from_utf8(buf).expect("utf8 output");
        assert!(output.contains("Streak: 3 days"));
    }

    #[test]
    fn width_ignores_escape_sequences() {
        assert_eq!(visible_width("\x1b[2;9mdone\x1b[0m"), 4);
        assert_eq!(visible_width("✓"), 1);
        assert_eq!(visible_width("💪"), 2);
    }
}
