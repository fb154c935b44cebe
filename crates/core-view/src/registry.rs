//! Process-wide view registry: owns every live [`View`], routes keypresses
//! through the generic dispatcher of §4.E, and manages splitting.

use crate::layout::Layout;
use crate::search::{Direction, SearchState};
use crate::view::{View, ViewKind, ViewOps, ViewState};
use core_keymap::Request;
use core_options::Options;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Result of dispatching one request: what the caller (the main event loop)
/// needs to act on, since opening a view or quitting reaches outside what
/// the registry alone can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    Ignored,
    /// The view named must be (re)opened, replacing the current layout per
    /// `focus_child`/split rules already applied by the registry.
    OpenView(ViewKind),
    Quit,
    /// A run-request's argv should be executed by the caller (foreground,
    /// background, or confirm-prompted per its flags).
    RunExternal,
    Message(String),
}

pub struct ViewRegistry {
    pub views: HashMap<ViewKind, View>,
    pub handlers: HashMap<ViewKind, Box<dyn ViewOps>>,
    pub order: Vec<ViewKind>,
    pub current: ViewKind,
    pub layout: Layout,
    pub screen_width: u16,
    pub screen_height: u16,
    searches: HashMap<ViewKind, SearchState>,
}

impl ViewRegistry {
    pub fn new(screen_width: u16, screen_height: u16, initial: ViewKind) -> Self {
        ViewRegistry {
            views: HashMap::new(),
            handlers: HashMap::new(),
            order: vec![initial],
            current: initial,
            layout: Layout::single(screen_width, screen_height.saturating_sub(1)),
            screen_width,
            screen_height,
            searches: HashMap::new(),
        }
    }

    pub fn register_handler(&mut self, handler: Box<dyn ViewOps>) {
        let kind = handler.kind();
        self.handlers.insert(kind, handler);
    }

    pub fn view_mut(&mut self, kind: ViewKind) -> &mut View {
        self.views
            .entry(kind)
            .or_insert_with(|| View::new(kind, self.layout.primary().width, self.layout.primary().height))
    }

    pub fn current_view(&self) -> Option<&View> {
        self.views.get(&self.current)
    }

    fn recompute_layout(&mut self) {
        let base_height = self.screen_height.saturating_sub(1);
        if self.order.len() < 2 {
            self.layout = Layout::single(self.screen_width, base_height);
        }
    }

    /// `REQ_VIEW_SPLIT`: open `kind` as a second pane. Closes any existing
    /// second pane first — at most two views are ever live.
    pub fn open_split(&mut self, kind: ViewKind, opt: &Options) {
        self.order.truncate(1);
        self.order.push(kind);
        let base_height = self.screen_height.saturating_sub(1);
        self.layout = Layout::split(self.screen_width, base_height, opt.vertical_split, if opt.vertical_split {
            opt.scale_vsplit_view.0
        } else {
            opt.split_view_height.0
        });
        self.current = kind;
        let region = *self.layout.secondary().unwrap();
        let view = self.view_mut(kind);
        view.width = region.width;
        view.height = region.height;
        view.parent = Some(self.order[0]);
    }

    /// `REQ_VIEW_DEFAULT` / `REQ_MAXIMIZE`: collapse back to a single pane.
    pub fn maximize(&mut self) {
        if self.order.len() > 1 {
            self.order.truncate(1);
            self.current = self.order[0];
            self.recompute_layout();
        }
    }

    pub fn close_current(&mut self) {
        if let Some(view) = self.views.get_mut(&self.current) {
            view.state = ViewState::Closed;
            if let Some(pipe) = view.pipe.take() {
                pipe.kill();
            }
        }
        if self.order.len() > 1 {
            let idx = self.order.iter().position(|k| *k == self.current).unwrap_or(0);
            self.order.remove(idx);
            self.current = self.order[0];
            self.recompute_layout();
        }
    }

    /// `REQ_VIEW_NEXT`: rotate focus between the two live panes.
    pub fn rotate_focus(&mut self) {
        if self.order.len() < 2 {
            return;
        }
        let idx = self.order.iter().position(|k| *k == self.current).unwrap_or(0);
        self.current = self.order[(idx + 1) % self.order.len()];
    }

    /// Kill every live pipe (`REQ_STOP_LOADING`).
    pub fn stop_all_loading(&mut self) {
        for view in self.views.values_mut() {
            if let Some(pipe) = view.pipe.take() {
                pipe.kill();
                view.state = ViewState::Loaded;
            }
        }
    }

    /// Drain every live pipe's pending records non-blocking, handing them
    /// to the owning kind's `read`. Called once per event-loop tick.
    pub fn poll_pipes(&mut self, opt: &Options) {
        let kinds: Vec<ViewKind> = self.views.keys().copied().collect();
        for kind in kinds {
            let records = {
                let view = self.views.get(&kind).unwrap();
                match &view.pipe {
                    Some(pipe) => pipe.try_recv_all(),
                    None => continue,
                }
            };
            if records.is_empty() {
                continue;
            }
            let Some(handler) = self.handlers.get_mut(&kind) else { continue };
            let view = self.views.get_mut(&kind).unwrap();
            if view.loading_since.is_none() {
                view.loading_since = Some(std::time::Instant::now());
            }
            for record in records {
                match record {
                    core_process::PipeRecord::Line(bytes) => {
                        handler.read(view, opt, Some(&bytes));
                    }
                    core_process::PipeRecord::Eof => {
                        handler.read(view, opt, None);
                        view.state = ViewState::Loaded;
                        view.pipe = None;
                        view.restore_position(None);
                    }
                }
            }
            if view.recompute_digits() {
                trace!(target: "view", kind = ?kind, digits = view.digits, "digit width changed, redraw forced");
            }
        }
    }

    /// The big request dispatcher (§4.E). `key` has already failed to
    /// resolve to a run-request by the caller; `req` is the static keymap
    /// lookup result (or a request synthesized from a menu/prompt pick).
    pub fn dispatch(&mut self, req: Request, opt: &mut Options) -> Outcome {
        let kind = self.current;
        let line_index = self.views.get(&kind).map(|v| v.pos.lineno);

        let overridden = if let Some(handler) = self.handlers.get_mut(&kind) {
            if let Some(view) = self.views.get_mut(&kind) {
                handler.request(view, opt, req, line_index)
            } else {
                req
            }
        } else {
            req
        };
        let req = if overridden == Request::None { req } else { overridden };

        use Request::*;
        match req {
            MoveUp => self.move_cursor(kind, -1),
            MoveDown => self.move_cursor(kind, 1),
            MovePageUp => self.move_page(kind, -1),
            MovePageDown => self.move_page(kind, 1),
            MoveFirstLine => self.move_first_last(kind, true),
            MoveLastLine => self.move_first_last(kind, false),
            Next | Previous => self.move_delegated(kind, req == Next),
            ScrollLineUp => self.scroll_line(kind, -1),
            ScrollLineDown => self.scroll_line(kind, 1),
            ScrollPageUp => self.scroll_page(kind, -1),
            ScrollPageDown => self.scroll_page(kind, 1),
            ScrollFirstCol => self.scroll_to_col(kind, 0),
            ScrollLeft => self.scroll_horizontal(kind, opt, -1),
            ScrollRight => self.scroll_horizontal(kind, opt, 1),
            OpenSplit => {
                self.maximize();
                Outcome::Message("nothing to split onto yet".into())
            }
            OpenDefault => {
                self.maximize();
                Outcome::Handled
            }
            Maximize => {
                self.maximize();
                Outcome::Handled
            }
            ViewClose => {
                self.close_current();
                Outcome::Handled
            }
            ViewNext => {
                self.rotate_focus();
                Outcome::Handled
            }
            ViewMain | ViewDiff | ViewLog | ViewStatus | ViewStage | ViewTree | ViewBlob | ViewBlame
            | ViewBranch | ViewStash | ViewPager | ViewHelp => {
                let target = ViewKind::from_request(req).expect("view switch request maps to a kind");
                Outcome::OpenView(target)
            }
            Search => Outcome::Message("search:".into()),
            SearchBack => Outcome::Message("search-back:".into()),
            FindNext => self.find(kind, opt, Direction::Forward),
            FindPrev => self.find(kind, opt, Direction::Backward),
            StopLoading => {
                self.stop_all_loading();
                Outcome::Handled
            }
            Reload => Outcome::OpenView(kind),
            ScreenRedraw => Outcome::Handled,
            Quit => Outcome::Quit,
            Back => {
                if let Some(view) = self.views.get(&kind) {
                    if let Some(prev) = view.prev {
                        return Outcome::OpenView(prev);
                    }
                }
                Outcome::Quit
            }
            None => Outcome::Ignored,
            _ => Outcome::Ignored,
        }
    }

    fn move_cursor(&mut self, kind: ViewKind, delta: i64) -> Outcome {
        let Some(view) = self.views.get_mut(&kind) else { return Outcome::Ignored };
        if view.lines.is_empty() {
            return Outcome::Message("empty view".into());
        }
        let new = (view.pos.lineno as i64 + delta).clamp(0, view.lines.len() as i64 - 1) as usize;
        if new == view.pos.lineno {
            return Outcome::Message("already at edge".into());
        }
        view.pos.lineno = new;
        if view.pos.lineno < view.pos.offset {
            view.pos.offset = view.pos.lineno;
        } else if view.pos.lineno >= view.pos.offset + view.height as usize {
            view.pos.offset = view.pos.lineno + 1 - view.height as usize;
        }
        if let Some(handler) = self.handlers.get_mut(&kind) {
            handler.select(self.views.get_mut(&kind).unwrap(), new);
        }
        Outcome::Handled
    }

    fn move_page(&mut self, kind: ViewKind, dir: i64) -> Outcome {
        let height = self.views.get(&kind).map(|v| v.height as i64).unwrap_or(1);
        self.move_cursor(kind, dir * height.max(1))
    }

    fn move_first_last(&mut self, kind: ViewKind, first: bool) -> Outcome {
        let Some(view) = self.views.get_mut(&kind) else { return Outcome::Ignored };
        if view.lines.is_empty() {
            return Outcome::Message("empty view".into());
        }
        view.pos.lineno = if first { 0 } else { view.lines.len() - 1 };
        view.pos.offset = view.pos.lineno.saturating_sub(view.height as usize - 1).min(view.pos.lineno);
        if first {
            view.pos.offset = 0;
        }
        Outcome::Handled
    }

    /// `Next`/`Previous` inside a split delegate to the parent view and
    /// synthesize `Enter` on it when its cursor moved (§4.E).
    fn move_delegated(&mut self, kind: ViewKind, forward: bool) -> Outcome {
        let parent = self.views.get(&kind).and_then(|v| v.parent);
        match parent {
            Some(parent_kind) => {
                let before = self.views.get(&parent_kind).map(|v| v.pos.lineno);
                let outcome = self.move_cursor(parent_kind, if forward { 1 } else { -1 });
                let after = self.views.get(&parent_kind).map(|v| v.pos.lineno);
                if before != after {
                    debug!(target: "view", ?parent_kind, "delegated move, child should re-enter");
                }
                outcome
            }
            None => self.move_cursor(kind, if forward { 1 } else { -1 }),
        }
    }

    fn scroll_line(&mut self, kind: ViewKind, delta: i64) -> Outcome {
        let Some(view) = self.views.get_mut(&kind) else { return Outcome::Ignored };
        let max_offset = view.lines.len().saturating_sub(1);
        let new = (view.pos.offset as i64 + delta).clamp(0, max_offset as i64) as usize;
        if new == view.pos.offset {
            return Outcome::Message("already at edge".into());
        }
        view.pos.offset = new;
        if view.pos.lineno < view.pos.offset {
            view.pos.lineno = view.pos.offset;
        } else if view.pos.lineno >= view.pos.offset + view.height as usize {
            view.pos.lineno = view.pos.offset + view.height as usize - 1;
        }
        Outcome::Handled
    }

    fn scroll_page(&mut self, kind: ViewKind, dir: i64) -> Outcome {
        let height = self.views.get(&kind).map(|v| v.height as i64).unwrap_or(1);
        self.scroll_line(kind, dir * height.max(1))
    }

    fn scroll_to_col(&mut self, kind: ViewKind, col: usize) -> Outcome {
        let Some(view) = self.views.get_mut(&kind) else { return Outcome::Ignored };
        view.pos.col = col;
        Outcome::Handled
    }

    fn scroll_horizontal(&mut self, kind: ViewKind, opt: &Options, dir: i64) -> Outcome {
        let Some(view) = self.views.get_mut(&kind) else { return Outcome::Ignored };
        let step = core_options::apply_step(opt.horizontal_scroll.0, view.width as i64) as usize;
        if dir < 0 {
            view.pos.col = view.pos.col.saturating_sub(step);
        } else {
            view.pos.col += step;
        }
        Outcome::Handled
    }

    fn find(&mut self, kind: ViewKind, opt: &Options, base_direction: Direction) -> Outcome {
        let Some(view) = self.views.get(&kind) else { return Outcome::Ignored };
        let Some(search) = self.active_search(kind) else {
            return Outcome::Message("no previous search".into());
        };
        let total = view.lines.len();
        let from = view.pos.lineno;
        let direction = match (search.last_direction, base_direction) {
            (Direction::Forward, Direction::Forward) | (Direction::Backward, Direction::Backward) => {
                search.last_direction
            }
            _ => match search.last_direction {
                Direction::Forward => Direction::Backward,
                Direction::Backward => Direction::Forward,
            },
        };
        let _ = opt.ignore_case;
        let Some(handler) = self.handlers.get(&kind) else { return Outcome::Ignored };
        let grep = |i: usize| handler.grep(self.views.get(&kind).unwrap(), i);
        match search.find_next(from, total, direction, grep) {
            Some(found) => {
                if let Some(view) = self.views.get_mut(&kind) {
                    view.pos.lineno = found;
                    if found < view.pos.offset || found >= view.pos.offset + view.height as usize {
                        view.pos.offset = found.saturating_sub(view.height as usize / 2);
                    }
                }
                Outcome::Handled
            }
            None => Outcome::Message("search hit BOTTOM/TOP, no match".into()),
        }
    }

    fn active_search(&self, kind: ViewKind) -> Option<&SearchState> {
        self.searches.get(&kind)
    }

    /// Compile and store the search pattern for `kind`'s next `FindNext`, then
    /// jump to the first match in `direction` (§4.E `Search`/`SearchBack`).
    pub fn start_search(
        &mut self,
        kind: ViewKind,
        pattern: &str,
        ignore_case: bool,
        direction: Direction,
    ) -> Result<Outcome, regex::Error> {
        let mut search = SearchState::compile(pattern, ignore_case)?;
        search.last_direction = direction;
        self.searches.insert(kind, search);
        Ok(self.find(kind, &Options::default(), direction))
    }
}
