//! gitview entrypoint: CLI parsing, startup, and the single-threaded
//! cooperative event loop (§5). Per-view-kind behavior lives in `core-git`;
//! this binary only owns the terminal, the keypress-to-request pipeline,
//! and the bookkeeping (`reference`/`argv_template`/`prev` propagation)
//! involved in switching between views.

mod cli;
mod prompt;
mod startup;
mod views;

use anyhow::{Context, Result};
use core_git::argv::{ArgToken, ArgvContext};
use core_input::{TermEvent, poll_event};
use core_keymap::{KeySpec, Request, RunRequest};
use core_options::{CommitOrder, IgnoreSpace, LineInfoTable, Options, ShowAuthor, ShowDate};
use core_process::{Delimiter, ProcessHandle, Spawn, run_foreground};
use core_screen::title::TitleInfo;
use core_screen::writer::Writer;
use core_screen::{CellFlags, Frame};
use core_terminal::{CrosstermBackend, TerminalBackend};
use core_view::{Direction, Outcome, ViewKind, ViewRegistry, ViewState};
use std::io::{BufRead, IsTerminal, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// Bottom-row real estate: one combined title/status/prompt line.
const BOTTOM_ROWS: u16 = 1;

struct App {
    registry: ViewRegistry,
    options: Options,
    backend: CrosstermBackend,
    facts: core_git::RepoFacts,
    width: u16,
    height: u16,
    message: Option<String>,
    quit: bool,
}

impl App {
    fn status_row(&self) -> u16 {
        self.height.saturating_sub(1)
    }

    fn current_dir(&self) -> Option<PathBuf> {
        self.registry.views.get(&self.registry.current).and_then(|v| v.dir.clone())
    }
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let stdin_is_pipe = !std::io::stdin().is_terminal();
    let cli = cli::parse(&argv, stdin_is_pipe)?;

    let startup = startup::run()?;
    info!(target: "runtime.startup", head = startup.facts.head.as_deref(), git_dir = %startup.facts.git_dir.display(), "repo_facts");

    let (width, height) = crossterm::terminal::size().context("reading terminal size")?;
    startup::export_screen_size(width, height);

    let initial = initial_kind(cli.mode);
    let mut backend = CrosstermBackend::new();
    backend.enter().context("entering terminal")?;
    backend.set_title("gitview").ok();

    let worktree_restore = startup.worktree_restore.clone();
    let mut app = App {
        registry: views::build_registry(
            width,
            height.saturating_sub(BOTTOM_ROWS),
            initial,
            startup.facts.git_dir.clone(),
            &startup.options.keymaps,
        ),
        facts: startup.facts.clone(),
        options: startup.options,
        backend,
        width,
        height,
        message: None,
        quit: false,
    };

    let result = run_app(&mut app, &cli);

    app.backend.leave().ok();
    startup::restore_worktree(worktree_restore.as_ref());
    if let Err(err) = &result {
        error!(target: "runtime", ?err, "fatal");
    }
    result
}

fn initial_kind(mode: cli::Mode) -> ViewKind {
    match mode {
        cli::Mode::Main => ViewKind::Main,
        cli::Mode::Log => ViewKind::Log,
        cli::Mode::Show => ViewKind::Diff,
        cli::Mode::Blame => ViewKind::Blame,
        cli::Mode::Status => ViewKind::Status,
        cli::Mode::Stash => ViewKind::Stash,
        cli::Mode::Pager => ViewKind::Pager,
    }
}

fn run_app(app: &mut App, cli: &cli::Cli) -> Result<()> {
    open_initial_view(app, cli)?;

    loop {
        app.registry.poll_pipes(&app.options);

        let any_loading = app.registry.views.values().any(|v| v.is_loading());
        let timeout = if any_loading { Duration::from_millis(0) } else { Duration::from_millis(200) };
        let event = poll_event(timeout).context("polling terminal input")?;

        match event {
            None => continue,
            Some(TermEvent::CtrlC) => break,
            Some(TermEvent::Resize(w, h)) => {
                resize(app, w, h);
            }
            Some(TermEvent::Key { token, mods }) => {
                app.message = None;
                let key = KeySpec { token, mods };
                handle_key(app, key)?;
            }
        }

        redraw(app)?;
        if app.quit {
            break;
        }
    }
    Ok(())
}

fn resize(app: &mut App, width: u16, height: u16) {
    app.width = width;
    app.height = height;
    app.registry.screen_width = width;
    app.registry.screen_height = height.saturating_sub(BOTTOM_ROWS);
    if app.registry.order.len() > 1 {
        app.registry.maximize();
    } else {
        app.registry.layout = core_view::Layout::single(width, height.saturating_sub(BOTTOM_ROWS));
    }
    for kind in app.registry.order.clone() {
        let region = if app.registry.order.first() == Some(&kind) {
            *app.registry.layout.primary()
        } else {
            app.registry.layout.secondary().copied().unwrap_or(*app.registry.layout.primary())
        };
        if let Some(view) = app.registry.views.get_mut(&kind) {
            view.width = region.width;
            view.height = region.height;
        }
    }
    startup::export_screen_size(width, height);
}

/// Resolve one keypress: run requests win over static bindings (§4.B), and
/// a handful of requests (`Prompt`, `Options`) are modal enough that they
/// never reach [`ViewRegistry::dispatch`] at all.
fn handle_key(app: &mut App, key: KeySpec) -> Result<()> {
    let keymap = app.registry.current.keymap_name();
    if let Some(rr) = app.options.keymaps.run_request(keymap, &key).cloned() {
        let outcome = execute_run_request(app, &rr)?;
        return act_on_outcome(app, outcome);
    }

    let Some(req) = app.options.keymaps.lookup(keymap, &key) else {
        return Ok(());
    };

    if req == Request::Prompt {
        return run_colon_prompt(app);
    }
    if req == Request::Options {
        return show_options_menu(app);
    }
    if let Some((effect, name)) = apply_toggle(&mut app.options, req) {
        app.message = Some(format!("{name} toggled"));
        if matches!(effect, ToggleEffect::Reload) {
            return switch_view(app, app.registry.current, None);
        }
        return Ok(());
    }
    if req == Request::Search || req == Request::SearchBack {
        let forward = req == Request::Search;
        let prompt_text = if forward { "/" } else { "?" };
        let Some(pattern) = prompt::prompt_input(prompt_text, app.status_row(), app.width)? else {
            return Ok(());
        };
        if pattern.is_empty() {
            return Ok(());
        }
        let direction = if forward { Direction::Forward } else { Direction::Backward };
        match app.registry.start_search(app.registry.current, &pattern, app.options.ignore_case, direction) {
            Ok(outcome) => return act_on_outcome(app, outcome),
            Err(err) => {
                app.message = Some(format!("bad pattern: {err}"));
                return Ok(());
            }
        }
    }

    let outcome = app.registry.dispatch(req, &mut app.options);
    act_on_outcome(app, outcome)
}

fn act_on_outcome(app: &mut App, outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Handled | Outcome::Ignored => Ok(()),
        Outcome::Quit => {
            app.quit = true;
            Ok(())
        }
        Outcome::Message(text) => {
            app.message = Some(text);
            Ok(())
        }
        Outcome::OpenView(kind) => switch_view(app, kind, None),
        Outcome::RunExternal => Ok(()),
    }
}

/// Switch from the current view to `target`, propagating the `reference`/
/// `argv_template` the source view's `request`/`select` stashed on itself
/// (§4.E) and recording the back-chain for `Back`. `override_argv` bypasses
/// the handler's own `open_argv` (used for `!` run requests opened in the
/// pager, which has none of its own).
fn switch_view(app: &mut App, target: ViewKind, override_argv: Option<(String, Vec<String>)>) -> Result<()> {
    let source = app.registry.current;
    let (src_reference, src_argv_template) = app
        .registry
        .views
        .get(&source)
        .map(|v| (v.reference.clone(), v.argv_template.clone()))
        .unwrap_or((None, Vec::new()));

    if let Some(handler) = app.registry.handlers.get_mut(&target) {
        if let Some(view) = app.registry.views.get_mut(&target) {
            handler.done(view);
        }
    }

    let region = *app.registry.layout.primary();
    {
        let view = app.registry.view_mut(target);
        view.reset();
        if let Some(old_pipe) = view.pipe.take() {
            old_pipe.kill();
        }
        view.state = ViewState::Unloaded;
        view.reference = src_reference;
        if !src_argv_template.is_empty() {
            view.argv_template = src_argv_template;
        }
        if target != source {
            view.prev = Some(source);
        }
        view.width = region.width;
        view.height = region.height;
    }
    app.registry.order = vec![target];
    app.registry.current = target;

    open_pipe(app, target, override_argv)
}

/// Spawn (or synthesize) the producing subprocess for `kind` and attach it
/// to the view, or mark the view loaded immediately when there is nothing
/// to run (`help`, manually-fed `pager`).
fn open_pipe(app: &mut App, kind: ViewKind, override_argv: Option<(String, Vec<String>)>) -> Result<()> {
    let (program, args) = match override_argv {
        Some(pa) => pa,
        None => {
            let Some(handler) = app.registry.handlers.get_mut(&kind) else {
                return Ok(());
            };
            let Some(view) = app.registry.views.get(&kind) else { return Ok(()) };
            handler.open_argv(view, &app.options)
        }
    };

    let view = app.registry.view_mut(kind);
    if program == "true" && args.is_empty() {
        view.state = ViewState::Loaded;
        return Ok(());
    }

    let delimiter = app.registry.handlers.get(&kind).map(|h| h.delimiter()).unwrap_or(Delimiter::Newline);
    let mut spawn = Spawn::new(program, args).delimiter(delimiter);
    if let Some(dir) = view.dir.clone() {
        spawn = spawn.cwd(dir);
    }
    for (k, v) in view.env.clone() {
        spawn = spawn.env(k, v);
    }
    match ProcessHandle::spawn(spawn) {
        Ok(handle) => {
            view.pipe = Some(handle);
            view.state = ViewState::Loading;
            view.loading_since = Some(Instant::now());
        }
        Err(err) => {
            warn!(target: "process", ?err, "failed to spawn view pipe");
            view.state = ViewState::Loaded;
            app.message = Some(format!("spawn failed: {err}"));
        }
    }
    Ok(())
}

/// Open the first view per the CLI's mode/revs/paths, special-casing the
/// two modes that never drive a subprocess through `open_argv`: `status`
/// (no reference, no file filter) handles itself through the normal path,
/// but `tig < stream` pager mode slurps this process's own stdin directly.
fn open_initial_view(app: &mut App, cli: &cli::Cli) -> Result<()> {
    let kind = app.registry.current;
    let region = *app.registry.layout.primary();
    {
        let view = app.registry.view_mut(kind);
        view.width = region.width;
        view.height = region.height;
    }

    if cli.mode == cli::Mode::Pager {
        return open_stdin_pager(app);
    }

    {
        let view = app.registry.view_mut(kind);
        let revs = cli.argv.revs.first().cloned();
        match kind {
            ViewKind::Main | ViewKind::Log => {
                view.reference = revs;
                view.argv_template = cli.argv.file_args.clone();
            }
            ViewKind::Diff => {
                view.reference = Some(revs.unwrap_or_else(|| "HEAD".to_string()));
                if let Some(file) = cli.argv.file_args.first().cloned() {
                    view.argv_template = vec![String::new(), file];
                }
            }
            ViewKind::Blame => {
                view.reference = revs;
                view.argv_template = vec![cli.argv.file_args.first().cloned().unwrap_or_default()];
            }
            _ => {}
        }
        if let Some(n) = cli.argv.jump_line {
            view.restore_position(Some(n));
        }
    }
    open_pipe(app, kind, None)
}

fn open_stdin_pager(app: &mut App) -> Result<()> {
    let kind = ViewKind::Pager;
    let stdin = std::io::stdin();
    let lines: Vec<String> = stdin.lock().lines().collect::<std::io::Result<_>>().context("reading piped stdin")?;
    let Some(handler) = app.registry.handlers.get_mut(&kind) else { return Ok(()) };
    let view = app.registry.view_mut(kind);
    for line in &lines {
        handler.read(view, &app.options, Some(line.as_bytes()));
    }
    handler.read(view, &app.options, None);
    view.state = ViewState::Loaded;
    view.restore_position(None);
    Ok(())
}

/// `:` command: §4.L's modal line editor followed by dispatch on the
/// parsed [`prompt::ColonCommand`], none of which round-trips through
/// [`core_keymap::Request`] (there is no payload-carrying variant for "jump
/// to line 42").
fn run_colon_prompt(app: &mut App) -> Result<()> {
    let Some(line) = prompt::prompt_input(":", app.status_row(), app.width)? else {
        return Ok(());
    };
    if line.trim().is_empty() {
        return Ok(());
    }
    run_colon_command(app, &prompt::parse_colon_command(&line))
}

fn run_colon_command(app: &mut App, cmd: &prompt::ColonCommand) -> Result<()> {
    match cmd {
        prompt::ColonCommand::JumpLine(n) => {
            if let Some(view) = app.registry.views.get_mut(&app.registry.current) {
                if *n > 0 && *n - 1 < view.lines.len() {
                    view.pos.lineno = *n - 1;
                    view.pos.offset = view.pos.lineno.saturating_sub(view.height as usize / 2);
                } else {
                    app.message = Some("line out of range".to_string());
                }
            }
            Ok(())
        }
        prompt::ColonCommand::JumpCommit(id) => {
            match app.registry.start_search(app.registry.current, id, false, Direction::Forward) {
                Ok(outcome) => act_on_outcome(app, outcome),
                Err(err) => {
                    app.message = Some(format!("bad pattern: {err}"));
                    Ok(())
                }
            }
        }
        prompt::ColonCommand::Key(spec) => {
            let keymap = app.registry.current.keymap_name();
            if let Some(req) = app.options.keymaps.lookup(keymap, spec) {
                let outcome = app.registry.dispatch(req, &mut app.options);
                act_on_outcome(app, outcome)
            } else {
                Ok(())
            }
        }
        prompt::ColonCommand::Shell(command) => {
            switch_view(app, ViewKind::Pager, Some(("sh".to_string(), vec!["-c".to_string(), command.clone()])))
        }
        prompt::ColonCommand::Statement(stmt) => {
            if let Err(err) = core_options::apply_line(&mut app.options, stmt) {
                app.message = Some(err);
            }
            Ok(())
        }
    }
}

#[derive(Clone, Copy)]
enum ToggleEffect {
    Redraw,
    Reload,
}

/// Flip one of the eight toggles backed by an actual `Options` field.
/// `ToggleSortField`/`ToggleSortOrder` have no backing state anywhere in
/// this crate yet and fall through to the generic dispatcher (a no-op).
fn apply_toggle(opt: &mut Options, req: Request) -> Option<(ToggleEffect, &'static str)> {
    Some(match req {
        Request::ToggleLineNumbers => {
            opt.show_line_numbers = !opt.show_line_numbers;
            (ToggleEffect::Redraw, "line numbers")
        }
        Request::ToggleDate => {
            opt.show_date = if opt.show_date == ShowDate::No { ShowDate::Default } else { ShowDate::No };
            (ToggleEffect::Redraw, "date")
        }
        Request::ToggleAuthor => {
            opt.show_author = if opt.show_author == ShowAuthor::No { ShowAuthor::Full } else { ShowAuthor::No };
            (ToggleEffect::Redraw, "author")
        }
        Request::ToggleRevGraph => {
            opt.show_rev_graph = !opt.show_rev_graph;
            (ToggleEffect::Redraw, "revision graph")
        }
        Request::ToggleRefs => {
            opt.show_refs = !opt.show_refs;
            (ToggleEffect::Redraw, "refs")
        }
        Request::ToggleChanges => {
            opt.show_changes = !opt.show_changes;
            (ToggleEffect::Redraw, "changes")
        }
        Request::ToggleFileFilter => {
            opt.file_filter = !opt.file_filter;
            (ToggleEffect::Reload, "file filter")
        }
        Request::ToggleIgnoreSpace => {
            opt.ignore_space = match opt.ignore_space {
                IgnoreSpace::No => IgnoreSpace::All,
                IgnoreSpace::All => IgnoreSpace::Some,
                IgnoreSpace::Some => IgnoreSpace::AtEol,
                IgnoreSpace::AtEol => IgnoreSpace::No,
            };
            (ToggleEffect::Reload, "ignore space")
        }
        Request::ToggleCommitOrder => {
            opt.commit_order = match opt.commit_order {
                CommitOrder::Default => CommitOrder::Topo,
                CommitOrder::Topo => CommitOrder::Date,
                CommitOrder::Date => CommitOrder::Reverse,
                CommitOrder::Reverse => CommitOrder::Default,
            };
            (ToggleEffect::Reload, "commit order")
        }
        _ => return None,
    })
}

fn show_options_menu(app: &mut App) -> Result<()> {
    let items = [
        (Request::ToggleLineNumbers, Some('n'), "line numbers"),
        (Request::ToggleDate, Some('d'), "date"),
        (Request::ToggleAuthor, Some('a'), "author"),
        (Request::ToggleRevGraph, Some('g'), "revision graph"),
        (Request::ToggleRefs, Some('r'), "refs"),
        (Request::ToggleChanges, Some('c'), "changes"),
        (Request::ToggleFileFilter, Some('f'), "file filter"),
        (Request::ToggleIgnoreSpace, Some('s'), "ignore space"),
        (Request::ToggleCommitOrder, Some('o'), "commit order"),
    ];
    let menu_items: Vec<prompt::MenuItem> =
        items.iter().map(|(_, hotkey, text)| prompt::MenuItem { hotkey: *hotkey, text: (*text).to_string() }).collect();
    let Some(idx) = prompt::prompt_menu("options", &menu_items, 0, app.status_row(), app.width)? else {
        return Ok(());
    };
    let (req, _, name) = items[idx];
    if let Some((effect, _)) = apply_toggle(&mut app.options, req) {
        app.message = Some(format!("{name} toggled"));
        if matches!(effect, ToggleEffect::Reload) {
            return switch_view(app, app.registry.current, None);
        }
    }
    Ok(())
}

/// Build the substitution context run requests expand their argv template
/// against, from whatever the current view has stashed on itself.
fn run_request_context(app: &App) -> ArgvContext {
    let view = app.registry.views.get(&app.registry.current);
    ArgvContext {
        directory: app.current_dir().map(|p| p.display().to_string()),
        reference: view.and_then(|v| v.reference.clone()),
        head: app.facts.head.clone(),
        ..Default::default()
    }
}

fn execute_run_request(app: &mut App, rr: &RunRequest) -> Result<Outcome> {
    if rr.flags.confirm {
        let preview = rr.argv_template.join(" ");
        if !prompt::prompt_yesno(&format!("Run '{preview}'?"), app.status_row(), app.width)? {
            return Ok(Outcome::Handled);
        }
    }

    if rr.flags.internal {
        let stmt = rr.argv_template.join(" ");
        run_colon_command(app, &prompt::parse_colon_command(&stmt))?;
    } else {
        let ctx = run_request_context(app);
        let template: Vec<ArgToken> = rr.argv_template.iter().map(|w| ArgToken::parse(w)).collect();
        let (program, args) = core_git::argv::expand(&template, &ctx, &app.options);
        if rr.flags.background {
            spawn_background(app, &program, &args)?;
        } else {
            run_foreground_command(app, &program, &args)?;
        }
    }

    if rr.flags.exit {
        return Ok(Outcome::Quit);
    }
    Ok(Outcome::Handled)
}

fn spawn_background(app: &mut App, program: &str, args: &[String]) -> Result<()> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    if let Some(dir) = app.current_dir() {
        cmd.current_dir(dir);
    }
    match cmd.spawn() {
        Ok(_) => debug!(target: "process", program, "background run request spawned"),
        Err(err) => app.message = Some(format!("failed to run {program}: {err}")),
    }
    Ok(())
}

fn run_foreground_command(app: &mut App, program: &str, args: &[String]) -> Result<()> {
    app.backend.leave().context("leaving terminal for foreground command")?;
    let dir = app.current_dir();
    let status = run_foreground(program, args, dir.as_ref());
    app.backend.enter().context("re-entering terminal after foreground command")?;
    match status {
        Ok(status) if !status.success() => {
            app.message = Some(format!("{program} exited with {status}"));
        }
        Err(err) => {
            app.message = Some(format!("failed to run {program}: {err}"));
        }
        Ok(_) => {}
    }
    switch_view(app, app.registry.current, None)
}

fn redraw(app: &mut App) -> Result<()> {
    let mut writer = Writer::new();
    let order = app.registry.order.clone();
    for (i, kind) in order.iter().enumerate() {
        let region = if i == 0 {
            *app.registry.layout.primary()
        } else {
            app.registry.layout.secondary().copied().unwrap_or(*app.registry.layout.primary())
        };
        let mut frame = Frame::new(region.width, region.height);
        draw_view(app, *kind, &mut frame, region.height);
        blit_frame(&mut writer, &frame, &app.options.lines, region.x, region.y);
    }
    draw_bottom_bar(app, &mut writer);
    writer.flush().context("flushing frame to terminal")
}

fn draw_view(app: &mut App, kind: ViewKind, frame: &mut Frame, height: u16) {
    let Some(handler) = app.registry.handlers.get_mut(&kind) else { return };
    let Some(view) = app.registry.views.get_mut(&kind) else { return };
    let offset = view.pos.offset;
    let cursor_lineno = view.pos.lineno;
    for row in 0..height {
        let line_index = offset + row as usize;
        if line_index >= view.lines.len() {
            break;
        }
        handler.draw(view, frame, &app.options, line_index, row);
        if kind == app.registry.current && line_index == cursor_lineno {
            frame.apply_flags_span(0, row, frame.width, CellFlags::REVERSE);
        }
    }
}

/// Queue one already-rendered pane at `(x_offset, y_offset)` on the real
/// screen. `Writer::queue_frame` only knows how to paint at the origin, so
/// a split's second pane walks the same row-leader iteration by hand.
fn blit_frame(writer: &mut Writer, frame: &Frame, lines: &LineInfoTable, x_offset: u16, y_offset: u16) {
    for y in 0..frame.height {
        writer.move_to(x_offset, y_offset + y);
        writer.clear_line();
        for (cluster, _, flags, line_type, x) in frame.row_leaders(y) {
            let info = line_type.map(|lt| lines.color_of(lt)).unwrap_or_default();
            let reverse = flags.contains(CellFlags::REVERSE) || info.attr.contains(core_options::Attr::REVERSE);
            writer.move_to(x_offset + x, y_offset + y);
            writer.set_style(
                color_to_ct(info.fg),
                color_to_ct(info.bg),
                info.attr.contains(core_options::Attr::BOLD),
                info.attr.contains(core_options::Attr::UNDERLINE),
                reverse,
            );
            writer.print(cluster);
            writer.reset_style();
        }
    }
}

fn color_to_ct(c: core_options::Color) -> Option<crossterm::style::Color> {
    use core_options::Color::*;
    use crossterm::style::Color as Ct;
    match c {
        Default => None,
        Black => Some(Ct::Black),
        Red => Some(Ct::DarkRed),
        Green => Some(Ct::DarkGreen),
        Yellow => Some(Ct::DarkYellow),
        Blue => Some(Ct::DarkBlue),
        Magenta => Some(Ct::DarkMagenta),
        Cyan => Some(Ct::DarkCyan),
        White => Some(Ct::Grey),
        Indexed(n) => Some(Ct::AnsiValue(n)),
    }
}

fn draw_bottom_bar(app: &App, writer: &mut Writer) {
    let row = app.status_row();
    writer.move_to(0, row);
    writer.clear_line();
    let text = match &app.message {
        Some(msg) => msg.clone(),
        None => {
            let view = app.registry.views.get(&app.registry.current);
            let title = TitleInfo {
                view_name: app.registry.current.title(),
                reference: view.and_then(|v| v.reference.as_deref()),
                kind: "line",
                lineno: view.map(|v| v.pos.lineno).unwrap_or(0),
                lines: view.map(|v| v.line_count()).unwrap_or(0),
                loading_secs: view.and_then(|v| v.loading_secs()),
            };
            title.render()
        }
    };
    let truncated: String = text.chars().take(app.width as usize).collect();
    writer.print(truncated);
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("gitview.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(log_dir, "gitview.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).with_writer(nb_writer).try_init() {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let mut out = std::io::stdout();
            let _ = crossterm::execute!(out, crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show);
            let _ = crossterm::terminal::disable_raw_mode();
            let _ = out.flush();
            error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_kind_maps_every_cli_mode() {
        assert_eq!(initial_kind(cli::Mode::Main), ViewKind::Main);
        assert_eq!(initial_kind(cli::Mode::Log), ViewKind::Log);
        assert_eq!(initial_kind(cli::Mode::Show), ViewKind::Diff);
        assert_eq!(initial_kind(cli::Mode::Blame), ViewKind::Blame);
        assert_eq!(initial_kind(cli::Mode::Status), ViewKind::Status);
        assert_eq!(initial_kind(cli::Mode::Stash), ViewKind::Stash);
        assert_eq!(initial_kind(cli::Mode::Pager), ViewKind::Pager);
    }

    #[test]
    fn toggle_line_numbers_flips_and_requests_redraw() {
        let mut opt = Options::default();
        let before = opt.show_line_numbers;
        let (effect, name) = apply_toggle(&mut opt, Request::ToggleLineNumbers).unwrap();
        assert_eq!(opt.show_line_numbers, !before);
        assert_eq!(name, "line numbers");
        assert!(matches!(effect, ToggleEffect::Redraw));
    }

    #[test]
    fn toggle_ignore_space_cycles_and_requests_reload() {
        let mut opt = Options::default();
        opt.ignore_space = IgnoreSpace::No;
        let (effect, _) = apply_toggle(&mut opt, Request::ToggleIgnoreSpace).unwrap();
        assert_eq!(opt.ignore_space, IgnoreSpace::All);
        assert!(matches!(effect, ToggleEffect::Reload));
    }

    #[test]
    fn sort_toggles_are_not_backed_by_any_option_yet() {
        let mut opt = Options::default();
        assert!(apply_toggle(&mut opt, Request::ToggleSortField).is_none());
        assert!(apply_toggle(&mut opt, Request::ToggleSortOrder).is_none());
    }
}
