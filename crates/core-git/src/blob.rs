//! Blob view (§4.H): streams `cat-file blob` into a plain pager. Editor
//! open spools the already-buffered content rather than re-fetching it.

use crate::argv::{ArgToken, ArgvContext};
use core_keymap::Request;
use core_options::Options;
use core_screen::Frame;
use core_view::{View, ViewKind, ViewOps};

pub struct BlobOps {
    name: String,
    content: Vec<u8>,
}

impl BlobOps {
    pub fn new() -> Self {
        BlobOps { name: String::new(), content: Vec::new() }
    }
}

impl ViewOps for BlobOps {
    fn kind(&self) -> ViewKind {
        ViewKind::Blob
    }

    fn open_argv(&mut self, view: &View, opt: &Options) -> (String, Vec<String>) {
        self.content.clear();
        self.name = view.argv_template.first().cloned().unwrap_or_default();
        let blob = view.argv_template.get(1).cloned().or_else(|| view.reference.clone());
        let ctx = ArgvContext { blob, ..Default::default() };
        let template = ArgToken::template(&["git", "cat-file", "blob", "%(blob)"]);
        crate::argv::expand(&template, &ctx, opt)
    }

    fn read(&mut self, view: &mut View, opt: &Options, raw: Option<&[u8]>) {
        let Some(raw) = raw else { return };
        self.content.extend_from_slice(raw);
        let text = String::from_utf8_lossy(raw).to_string();
        let lineno = view.line_count() + 1;
        for line in crate::pager::lines_for_raw(&opt.lines, lineno, &text, view.width, opt.wrap_lines) {
            view.lines.push(line);
        }
    }

    fn draw(&mut self, view: &mut View, frame: &mut Frame, opt: &Options, line_index: usize, row: u16) -> bool {
        let Some(line) = view.lines.get(line_index).cloned() else { return true };
        crate::pager::draw_text_row(frame, opt, view, &line, row)
    }

    fn request(&mut self, view: &mut View, opt: &Options, req: Request, _line_index: Option<usize>) -> Request {
        match req {
            Request::Edit => {
                if let Ok(path) = crate::editor::spool_blob(&self.name, &self.content) {
                    let (program, args) = crate::editor::build_editor_argv(opt, &path, 0);
                    let _ = core_process::run_foreground(&program, &args, view.dir.as_ref());
                    let _ = std::fs::remove_file(&path);
                }
                Request::None
            }
            _ => Request::None,
        }
    }

    fn grep(&self, view: &View, line_index: usize) -> bool {
        view.lines.get(line_index).is_some()
    }

    fn select(&mut self, _view: &mut View, _line_index: usize) {}

    fn done(&mut self, _view: &mut View) {
        self.content.clear();
    }
}
