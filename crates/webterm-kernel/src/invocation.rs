//! Input representation for a single console run.

use thiserror::Error;

/// Error splitting a raw input line into tokens.
#[derive(Debug, Error)]
#[error("could not tokenize input line: {0}")]
pub struct InputError(#[from] shell_words::ParseError);

/// The command line for one run: argv-style tokens, the first naming the
/// command to execute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    tokens: Vec<String>,
}

impl Invocation {
    /// Builds an invocation from pre-split tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits a raw input line using shell quoting rules.
    ///
    /// This is what a web terminal feeds the kernel: the line the user typed,
    /// verbatim.
    pub fn parse(line: &str) -> Result<Self, InputError> {
        Ok(Self {
            tokens: shell_words::split(line)?,
        })
    }

    /// The command name (first token), if any.
    pub fn command(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// All tokens, command name included.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// True when the line carried no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_whitespace() {
        let invocation = Invocation::parse("greet --name Ada").unwrap();
        assert_eq!(invocation.tokens(), ["greet", "--name", "Ada"]);
        assert_eq!(invocation.command(), Some("greet"));
    }

    #[test]
    fn test_parse_respects_quoting() {
        let invocation = Invocation::parse(r#"greet --name "Ada Lovelace""#).unwrap();
        assert_eq!(invocation.tokens(), ["greet", "--name", "Ada Lovelace"]);
    }

    #[test]
    fn test_parse_unbalanced_quote_is_an_error() {
        let err = Invocation::parse(r#"greet "unterminated"#).unwrap_err();
        assert!(err.to_string().contains("could not tokenize"));
    }

    #[test]
    fn test_empty_line() {
        let invocation = Invocation::parse("   ").unwrap();
        assert!(invocation.is_empty());
        assert!(invocation.command().is_none());
    }

    #[test]
    fn test_new_from_tokens() {
        let invocation = Invocation::new(["list"]);
        assert_eq!(invocation.command(), Some("list"));
        assert!(!invocation.is_empty());
    }
}
