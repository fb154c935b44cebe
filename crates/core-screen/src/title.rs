//! Title-bar composition: `[name] ref - <type> <lineno> of <N> (<pct>%)`,
//! with an elapsed `loading Ns` suffix while a view's pipe is still open.

#[derive(Debug, Clone)]
pub struct TitleInfo<'a> {
    pub view_name: &'a str,
    pub reference: Option<&'a str>,
    pub kind: &'a str,
    pub lineno: usize,
    pub lines: usize,
    pub loading_secs: Option<u64>,
}

impl<'a> TitleInfo<'a> {
    fn percent(&self) -> u32 {
        if self.lines == 0 {
            return 100;
        }
        (((self.lineno + 1) as u64 * 100) / self.lines as u64) as u32
    }

    pub fn render(&self) -> String {
        let mut out = format!("[{}]", self.view_name);
        if let Some(reference) = self.reference {
            if !reference.is_empty() {
                out.push(' ');
                out.push_str(reference);
            }
        }
        out.push_str(&format!(
            " - {} {} of {} ({}%)",
            self.kind,
            self.lineno + 1,
            self.lines,
            self.percent()
        ));
        if let Some(secs) = self.loading_secs {
            out.push_str(&format!(" loading {secs}s"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_basic_title() {
        let title = TitleInfo {
            view_name: "main",
            reference: Some("master"),
            kind: "commit",
            lineno: 4,
            lines: 100,
            loading_secs: None,
        };
        assert_eq!(title.render(), "[main] master - commit 5 of 100 (5%)");
    }

    #[test]
    fn renders_loading_suffix_while_pipe_open() {
        let title = TitleInfo {
            view_name: "log",
            reference: None,
            kind: "commit",
            lineno: 0,
            lines: 0,
            loading_secs: Some(3),
        };
        assert_eq!(title.render(), "[log] - commit 1 of 0 (100%) loading 3s");
    }
}
