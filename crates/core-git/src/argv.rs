//! Command template substitution (§4.E `begin_update`, §9 "sentinel-argv
//! substitution"). The original distinguishes a handful of argv slots by the
//! pointer identity of sentinel strings; here each template word is parsed
//! once into a typed [`ArgToken`], so there is nothing to compare by
//! identity -- the compiler already tells `DiffContextFlag` apart from a
//! literal that happens to read the same.

use core_options::{CommitOrder, IgnoreSpace, Options};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgToken {
    Literal(String),
    Directory,
    File,
    Ref,
    Head,
    Commit,
    Blob,
    Branch,
    Stash,
    Prompt,
    FileArgs,
    DiffArgs,
    BlameArgs,
    RevArgs,
    EncodingFlag,
    DiffContextFlag,
    IgnoreSpaceFlag,
    CommitOrderFlag,
}

impl ArgToken {
    pub fn parse(word: &str) -> ArgToken {
        match word {
            "%(directory)" => ArgToken::Directory,
            "%(file)" => ArgToken::File,
            "%(ref)" => ArgToken::Ref,
            "%(head)" => ArgToken::Head,
            "%(commit)" => ArgToken::Commit,
            "%(blob)" => ArgToken::Blob,
            "%(branch)" => ArgToken::Branch,
            "%(stash)" => ArgToken::Stash,
            "%(prompt)" => ArgToken::Prompt,
            "%(fileargs)" => ArgToken::FileArgs,
            "%(diffargs)" => ArgToken::DiffArgs,
            "%(blameargs)" => ArgToken::BlameArgs,
            "%(revargs)" => ArgToken::RevArgs,
            "arg_encoding" => ArgToken::EncodingFlag,
            "arg_diff_context" => ArgToken::DiffContextFlag,
            "arg_ignore_space" => ArgToken::IgnoreSpaceFlag,
            "arg_commit_order" => ArgToken::CommitOrderFlag,
            other => ArgToken::Literal(other.to_string()),
        }
    }

    pub fn template(words: &[&str]) -> Vec<ArgToken> {
        words.iter().map(|w| ArgToken::parse(w)).collect()
    }
}

/// Values available for substitution while building one view's argv. Not
/// every view fills every field; an unset placeholder expands to nothing.
#[derive(Debug, Clone, Default)]
pub struct ArgvContext {
    pub directory: Option<String>,
    pub file: Option<String>,
    pub reference: Option<String>,
    pub head: Option<String>,
    pub commit: Option<String>,
    pub blob: Option<String>,
    pub branch: Option<String>,
    pub stash: Option<String>,
    pub prompt: Option<String>,
    pub file_args: Vec<String>,
    pub rev_args: Vec<String>,
}

/// Expand `template` into a final argv, folding in option-derived flags for
/// the sentinel slots (§9). `template[0]` is expected to be the program name.
pub fn expand(template: &[ArgToken], ctx: &ArgvContext, opt: &Options) -> (String, Vec<String>) {
    let mut out = Vec::new();
    for tok in template {
        match tok {
            ArgToken::Literal(s) => out.push(s.clone()),
            ArgToken::Directory => out.extend(ctx.directory.clone()),
            ArgToken::File => out.extend(ctx.file.clone()),
            ArgToken::Ref => out.extend(ctx.reference.clone()),
            ArgToken::Head => out.extend(ctx.head.clone()),
            ArgToken::Commit => out.extend(ctx.commit.clone()),
            ArgToken::Blob => out.extend(ctx.blob.clone()),
            ArgToken::Branch => out.extend(ctx.branch.clone()),
            ArgToken::Stash => out.extend(ctx.stash.clone()),
            ArgToken::Prompt => out.extend(ctx.prompt.clone()),
            ArgToken::FileArgs => out.extend(ctx.file_args.iter().cloned()),
            ArgToken::RevArgs => out.extend(ctx.rev_args.iter().cloned()),
            ArgToken::DiffArgs => out.extend(opt.diff_options.iter().cloned()),
            ArgToken::BlameArgs => out.extend(opt.blame_options.iter().cloned()),
            ArgToken::EncodingFlag => {
                // Encoding conversion itself is an oracle out of scope (§1);
                // only the flag that requests it from git is ours to emit.
            }
            ArgToken::DiffContextFlag => out.push(format!("-U{}", opt.diff_context)),
            ArgToken::IgnoreSpaceFlag => {
                if let Some(flag) = ignore_space_flag(opt.ignore_space) {
                    out.push(flag.to_string());
                }
            }
            ArgToken::CommitOrderFlag => {
                if let Some(flag) = commit_order_flag(opt.commit_order) {
                    out.push(flag.to_string());
                }
            }
        }
    }
    let program = out.first().cloned().unwrap_or_else(|| "git".to_string());
    let args = if out.is_empty() { out } else { out.split_off(1) };
    (program, args)
}

fn ignore_space_flag(mode: IgnoreSpace) -> Option<&'static str> {
    match mode {
        IgnoreSpace::No => None,
        IgnoreSpace::All => Some("--ignore-all-space"),
        IgnoreSpace::Some => Some("--ignore-space-change"),
        IgnoreSpace::AtEol => Some("--ignore-space-at-eol"),
    }
}

fn commit_order_flag(order: CommitOrder) -> Option<&'static str> {
    match order {
        CommitOrder::Default => None,
        CommitOrder::Topo => Some("--topo-order"),
        CommitOrder::Date => Some("--date-order"),
        CommitOrder::Reverse => Some("--reverse"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_placeholders_and_program() {
        let template = ArgToken::template(&["git", "log", "%(revargs)", "--", "%(fileargs)"]);
        let ctx = ArgvContext {
            rev_args: vec!["main".into()],
            file_args: vec!["src/".into()],
            ..Default::default()
        };
        let (program, args) = expand(&template, &ctx, &Options::default());
        assert_eq!(program, "git");
        assert_eq!(args, vec!["log", "main", "--", "src/"]);
    }

    #[test]
    fn diff_context_flag_reads_option() {
        let template = ArgToken::template(&["git", "diff", "arg_diff_context"]);
        let mut opt = Options::default();
        opt.diff_context = 5;
        let (_, args) = expand(&template, &ArgvContext::default(), &opt);
        assert_eq!(args, vec!["diff", "-U5"]);
    }
}
