//! Quote-aware whitespace tokenizer for config-language lines.

use crate::error::OptionError;

/// Split a line into whitespace-separated tokens, honoring `'`/`"` quoting.
/// A `#` outside quotes starts a comment that runs to end of line.
///
/// Quotes are stripped from the token they delimit; an unterminated quote
/// is reported as [`OptionError::UnmatchedQuote`].
pub fn tokenize(line: &str) -> Result<Vec<String>, OptionError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '#' => break,
            '\'' | '"' => {
                quote = Some(c);
                in_token = true;
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(OptionError::UnmatchedQuote);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Shell-like tokenization for `argv` options (`blame-options`, `diff-options`,
/// run-request command templates): identical quoting rules, but whitespace
/// inside quotes is preserved rather than treated as a separator (already the
/// case above) and an empty line yields an empty vector rather than an error.
pub fn tokenize_argv(line: &str) -> Result<Vec<String>, OptionError> {
    tokenize(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokenize("set tab-size = 8").unwrap(), vec!["set", "tab-size", "=", "8"]);
    }

    #[test]
    fn honors_double_quotes_with_embedded_space() {
        assert_eq!(
            tokenize("bind main g !git commit -m \"a message\"").unwrap(),
            vec!["bind", "main", "g", "!git", "commit", "-m", "a message"]
        );
    }

    #[test]
    fn honors_single_quotes() {
        assert_eq!(tokenize("color 'stat-head' green default").unwrap(), vec![
            "color",
            "stat-head",
            "green",
            "default"
        ]);
    }

    #[test]
    fn strips_trailing_comment() {
        assert_eq!(tokenize("set tab-size = 8 # a comment").unwrap(), vec!["set", "tab-size", "=", "8"]);
    }

    #[test]
    fn unmatched_quote_is_an_error() {
        assert_eq!(tokenize("set editor = \"vim").unwrap_err(), OptionError::UnmatchedQuote);
    }

    #[test]
    fn empty_line_yields_no_tokens() {
        assert!(tokenize("   ").unwrap().is_empty());
    }
}
