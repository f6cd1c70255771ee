use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use crate::cli::Invocation;
use crate::config::Config;
use crate::datastore::{DataStore, Storage};
use crate::datetime::{resolve_timezone, today_in};
use crate::render::Renderer;
use crate::todo::TodoList;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "toggle", "delete", "list", "stats", "help", "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv))]
pub fn dispatch<S: Storage>(
    store: &mut DataStore<S>,
    cfg: &Config,
    renderer: &Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    dispatch_at(store, cfg, renderer, inv, Utc::now())
}

/// Same as [`dispatch`] with an explicit clock.
#[instrument(skip(store, cfg, renderer, inv, now))]
pub fn dispatch_at<S: Storage>(
    store: &mut DataStore<S>,
    cfg: &Config,
    renderer: &Renderer,
    inv: Invocation,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let tz = resolve_timezone(cfg.get("timezone").as_deref())?;
    let today = today_in(&tz, now);
    let command = inv.command.as_str();

    debug!(
        command,
        args = ?inv.command_args,
        %today,
        "dispatching command"
    );

    match command {
        "add" => cmd_add(store, renderer, &inv.command_args, now),
        "toggle" => cmd_toggle(store, renderer, &inv.command_args, today),
        "delete" => cmd_delete(store, renderer, &inv.command_args),
        "list" => cmd_list(store, renderer, today),
        "stats" => cmd_stats(store, renderer),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(store, renderer, args, now))]
fn cmd_add<S: Storage>(
    store: &mut DataStore<S>,
    renderer: &Renderer,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command add");

    let text = args.join(" ");
    let todos = store.load_todos()?;
    let next_id = todos.next_id(now);
    let (todos, created) = todos.add(&text, next_id);

    let Some(id) = created else {
        debug!("blank task text ignored");
        println!("Nothing to add.");
        return Ok(());
    };

    store.save_todos(&todos)?;
    debug!(count = todos.len(), "task added");
    println!("Created task {id}.");
    renderer.print_todo_list(&todos)
}

#[instrument(skip(store, renderer, args, today))]
fn cmd_toggle<S: Storage>(
    store: &mut DataStore<S>,
    renderer: &Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command toggle");

    let state = store.load_state()?;
    let ids = resolve_refs(&state.todos, args)?;
    let (state, outcome) = state.toggle(&ids, today);

    if outcome.toggled > 0 {
        store.save_todos(&state.todos)?;
    }
    println!("Toggled {} task(s).", outcome.toggled);
    renderer.print_todo_list(&state.todos)?;

    let Some(update) = outcome.streak else {
        return Ok(());
    };

    info!(
        streak = update.streak,
        continued = update.continued,
        badge = ?update.badge.as_ref().map(|b| b.label.as_str()),
        "daily goal reached"
    );
    store.save_stats(&state.stats)?;
    renderer.print_celebration(&update)?;
    if let Some(badge) = &update.badge {
        renderer.print_badge_notice(badge)?;
    }
    renderer.print_stats(&state.stats)
}

#[instrument(skip(store, renderer, args))]
fn cmd_delete<S: Storage>(
    store: &mut DataStore<S>,
    renderer: &Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command delete");

    let mut todos = store.load_todos()?;
    let ids = resolve_refs(&todos, args)?;

    let mut deleted = 0_u64;
    for id in ids {
        let (next, changed) = todos.delete(id);
        todos = next;
        if changed {
            deleted += 1;
        }
    }

    if deleted > 0 {
        store.save_todos(&todos)?;
    }
    println!("Deleted {deleted} task(s).");
    renderer.print_todo_list(&todos)
}

#[instrument(skip(store, renderer, today))]
fn cmd_list<S: Storage>(
    store: &DataStore<S>,
    renderer: &Renderer,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let todos = store.load_todos()?;
    renderer.print_header(today)?;
    renderer.print_todo_list(&todos)
}

#[instrument(skip(store, renderer))]
fn cmd_stats<S: Storage>(store: &DataStore<S>, renderer: &Renderer) -> anyhow::Result<()> {
    let stats = store.load_stats()?;
    renderer.print_stats(&stats)
}

fn cmd_help() -> anyhow::Result<()> {
    println!("Commands:");
    println!("  add <text...>      add a task");
    println!("  toggle <ref>...    mark tasks done / not done");
    println!("  delete <ref>...    remove tasks");
    println!("  list               show today's tasks (default)");
    println!("  stats              show streak and badges");
    println!("  version            print the version");
    println!();
    println!("A <ref> is a task id or its position in the list.");
    Ok(())
}

/// Resolves every ref up front so positions refer to the list as shown,
/// not as it looks halfway through a batch. Unknown refs are dropped.
pub fn resolve_refs(todos: &TodoList, args: &[String]) -> anyhow::Result<Vec<u64>> {
    if args.is_empty() {
        return Err(anyhow!("expected at least one task id or position"));
    }

    let mut ids = Vec::with_capacity(args.len());
    for arg in args {
        let reference: u64 = arg
            .trim()
            .trim_start_matches('#')
            .parse()
            .map_err(|_| anyhow!("not a task id or position: {arg}"))?;

        match todos.resolve_ref(reference) {
            Some(id) if !ids.contains(&id) => ids.push(id),
            Some(id) => debug!(id, "duplicate task reference skipped"),
            None => warn!(reference, "no task matches reference"),
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::{expand_command_abbrev, known_command_names, resolve_refs};
    use crate::todo::{Todo, TodoList};

    #[test]
    fn abbreviation_must_be_unique() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("d", &known), Some("delete"));
        assert_eq!(expand_command_abbrev("li", &known), Some("list"));
        assert_eq!(expand_command_abbrev("stats", &known), Some("stats"));
        assert_eq!(expand_command_abbrev("zz", &known), None);
    }

    #[test]
    fn refs_resolve_against_current_list() {
        let todos = TodoList::from_items(vec![
            Todo::new(1_760_000_000_000, "Row".to_string()),
            Todo::new(1_760_000_000_500, "Bike".to_string()),
        ]);
        let args = vec![
            "2".to_string(),
            "#1".to_string(),
            "1760000000500".to_string(),
            "9".to_string(),
        ];
        let ids = resolve_refs(&todos, &args).expect("resolve refs");
        assert_eq!(ids, vec![1_760_000_000_500, 1_760_000_000_000]);
    }

    #[test]
    fn refs_reject_garbage() {
        let todos = TodoList::default();
        assert!(resolve_refs(&todos, &["abc".to_string()]).is_err());
        assert!(resolve_refs(&todos, &[]).is_err());
    }
}
