//! Multi-stage subprocess chaining (§5.1 "Subprocess byte-stream runner").
//!
//! A view's `pipe` field holds exactly one [`core_process::ProcessHandle`],
//! so a handler that needs more than one git invocation to fill one view
//! (status's staged/unstaged/untracked streams, blame's file-then-history
//! phases) chains them through a single `sh -c` script, with a sentinel
//! record marking each boundary. `read` tells a sentinel apart from real
//! output by exact string match, the same technique the original blame
//! phase split already used.

/// POSIX single-quote a word for embedding in a shell script: close the
/// quote, emit an escaped quote, reopen it.
pub fn quote(word: &str) -> String {
    let mut out = String::with_capacity(word.len() + 2);
    out.push('\'');
    for ch in word.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

fn quoted_command(program: &str, args: &[String]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().map(|a| quote(a)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a `sh -c` argv that runs each `(program, args)` stage in sequence,
/// printing `sentinel` as its own complete record between stages -- the
/// terminator matches `delimiter` so the boundary reads as one record
/// regardless of which byte the pipe splits on. Stages whose own output
/// happens to contain `sentinel` verbatim would be misread as a boundary;
/// in practice git metadata lines never do.
pub fn chain(stages: &[(String, Vec<String>)], sentinel: &str, delimiter: core_process::Delimiter) -> (String, Vec<String>) {
    let terminator = match delimiter {
        core_process::Delimiter::Nul => "\\0",
        core_process::Delimiter::Newline => "\\n",
    };
    let boundary = format!("printf '%s{terminator}' {}", quote(sentinel));
    let script = stages
        .iter()
        .map(|(program, args)| quoted_command(program, args))
        .collect::<Vec<_>>()
        .join(&format!("; {boundary}; "));
    ("sh".to_string(), vec!["-c".to_string(), script])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_embedded_single_quote() {
        assert_eq!(quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn chain_joins_stages_with_sentinel_boundary() {
        let stages = vec![
            ("git".to_string(), vec!["diff-index".to_string(), "--cached".to_string()]),
            ("git".to_string(), vec!["diff-files".to_string()]),
        ];
        let (program, args) = chain(&stages, "BOUNDARY", core_process::Delimiter::Nul);
        assert_eq!(program, "sh");
        assert_eq!(args[0], "-c");
        assert!(args[1].contains("git diff-index --cached"));
        assert!(args[1].contains("printf '%s\\0' 'BOUNDARY'"));
        assert!(args[1].contains("git diff-files"));
    }
}
