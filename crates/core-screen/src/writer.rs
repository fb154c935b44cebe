//! Terminal writer: translates a `Frame` plus the line-color table into a
//! batch of crossterm commands, flushed once per repaint.
//!
//! Scope is intentionally narrow (row-major `MoveTo` + `Print`, no partial
//! diffing) since every view here is a read-only pager over subprocess
//! output rather than an editable buffer; there is no cursor to preserve
//! between repaints, so a full redraw per frame is cheap enough.

use crate::{CellFlags, Frame};
use anyhow::Result;
use core_options::{Attr as LineAttr, Color as LineColor, LineInfoTable};
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color as CtColor, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{Write, stdout};

fn to_ct_color(c: LineColor) -> Option<CtColor> {
    match c {
        LineColor::Default => None,
        LineColor::Black => Some(CtColor::Black),
        LineColor::Red => Some(CtColor::DarkRed),
        LineColor::Green => Some(CtColor::DarkGreen),
        LineColor::Yellow => Some(CtColor::DarkYellow),
        LineColor::Blue => Some(CtColor::DarkBlue),
        LineColor::Magenta => Some(CtColor::DarkMagenta),
        LineColor::Cyan => Some(CtColor::DarkCyan),
        LineColor::White => Some(CtColor::Grey),
        LineColor::Indexed(n) => Some(CtColor::AnsiValue(n)),
    }
}

#[derive(Debug)]
pub enum Command {
    MoveTo(u16, u16),
    ClearLine,
    SetStyle { fg: Option<CtColor>, bg: Option<CtColor>, bold: bool, underline: bool, reverse: bool },
    ResetStyle,
    Print(String),
}

#[derive(Default)]
pub struct Writer {
    cmds: Vec<Command>,
}

impl Writer {
    pub fn new() -> Self {
        Self { cmds: Vec::new() }
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cmds.push(Command::MoveTo(x, y));
    }

    pub fn clear_line(&mut self) {
        self.cmds.push(Command::ClearLine);
    }

    pub fn set_style(&mut self, fg: Option<CtColor>, bg: Option<CtColor>, bold: bool, underline: bool, reverse: bool) {
        self.cmds.push(Command::SetStyle { fg, bg, bold, underline, reverse });
    }

    pub fn reset_style(&mut self) {
        self.cmds.push(Command::ResetStyle);
    }

    pub fn print<S: Into<String>>(&mut self, s: S) {
        let s: String = s.into();
        if !s.is_empty() {
            self.cmds.push(Command::Print(s));
        }
    }

    /// Queue an entire frame: one `MoveTo` + `ClearLine` per row, then each
    /// row's leader clusters with color spans switched as the line-type
    /// underneath them changes.
    pub fn queue_frame(&mut self, frame: &Frame, lines: &LineInfoTable) {
        for y in 0..frame.height {
            self.move_to(0, y);
            self.clear_line();
            let mut current_style: Option<(LineColor, LineColor, LineAttr, bool)> = None;
            for (cluster, _, flags, line_type, _) in frame.row_leaders(y) {
                let info = line_type.map(|lt| lines.color_of(lt)).unwrap_or_default();
                let reverse = flags.contains(CellFlags::REVERSE);
                let key = (info.fg, info.bg, info.attr, reverse);
                if current_style != Some(key) {
                    self.set_style(
                        to_ct_color(info.fg),
                        to_ct_color(info.bg),
                        info.attr.contains(LineAttr::BOLD),
                        info.attr.contains(LineAttr::UNDERLINE),
                        reverse || info.attr.contains(LineAttr::REVERSE),
                    );
                    current_style = Some(key);
                }
                self.print(cluster);
            }
            self.reset_style();
        }
    }

    pub fn flush(self) -> Result<()> {
        let mut out = stdout();
        for c in self.cmds {
            match c {
                Command::MoveTo(x, y) => {
                    queue!(out, MoveTo(x, y))?;
                }
                Command::ClearLine => {
                    queue!(out, Clear(ClearType::CurrentLine))?;
                }
                Command::SetStyle { fg, bg, bold, underline, reverse } => {
                    if let Some(fg) = fg {
                        queue!(out, SetForegroundColor(fg))?;
                    }
                    if let Some(bg) = bg {
                        queue!(out, SetBackgroundColor(bg))?;
                    }
                    if bold {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    if underline {
                        queue!(out, SetAttribute(Attribute::Underlined))?;
                    }
                    if reverse {
                        queue!(out, SetAttribute(Attribute::Reverse))?;
                    }
                }
                Command::ResetStyle => {
                    queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
                }
                Command::Print(s) => {
                    queue!(out, Print(s))?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cell;

    #[test]
    fn queue_frame_emits_one_move_and_clear_per_row() {
        let mut frame = Frame::new(5, 2);
        frame.cells[0] = Cell::leader("x", 1, CellFlags::empty(), None);
        let lines = LineInfoTable::new();
        let mut writer = Writer::new();
        writer.queue_frame(&frame, &lines);
        let moves = writer.cmds.iter().filter(|c| matches!(c, Command::MoveTo(_, _))).count();
        assert_eq!(moves, 2);
    }
}
