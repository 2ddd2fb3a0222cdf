//! Positional cursor over the raw argument list.
//!
//! The [`TokenStream`] is what the parsing engine walks. Besides plain
//! forward iteration it supports splicing tokens in ahead of the cursor, which
//! is how environment-derived flag values are made to look as if the user
//! typed them right after the command they belong to.

/// A single token together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
    origin: Option<usize>,
}

impl Token {
    /// The token text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Index of this token in the caller's argument vector.
    ///
    /// `None` for tokens spliced in with [`TokenStream::insert_at`].
    pub fn origin(&self) -> Option<usize> {
        self.origin
    }
}

/// Cursor over a mutable list of tokens.
///
/// The cursor starts *before* the first token; call [`advance`](Self::advance)
/// to move onto it.
///
/// # Example
///
/// ```
/// use flagwright::TokenStream;
///
/// let mut stream = TokenStream::new(["user", "create"]);
/// assert!(stream.advance());
/// assert_eq!(stream.current(), Some("user"));
///
/// stream.insert_at(1, ["--verbose", "true"]);
/// assert!(stream.advance());
/// assert_eq!(stream.current(), Some("--verbose"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    cursor: Option<usize>,
}

impl TokenStream {
    /// Create a stream over the given arguments.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = args
            .into_iter()
            .enumerate()
            .map(|(i, text)| Token {
                text: text.into(),
                origin: Some(i),
            })
            .collect();

        Self {
            tokens,
            cursor: None,
        }
    }

    /// Move the cursor forward. Returns `false` once the stream is exhausted.
    pub fn advance(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.cursor = Some(next.min(self.tokens.len()));
        next < self.tokens.len()
    }

    /// The token under the cursor.
    pub fn current(&self) -> Option<&str> {
        self.cursor
            .and_then(|c| self.tokens.get(c))
            .map(|t| t.text.as_str())
    }

    /// The cursor index, or `None` before the first [`advance`](Self::advance).
    pub fn current_position(&self) -> Option<usize> {
        self.cursor
    }

    /// The token after the cursor, without moving.
    pub fn peek(&self) -> Option<&str> {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.tokens.get(next).map(|t| t.text.as_str())
    }

    /// Splice tokens into the stream at `pos`.
    ///
    /// Positions at or before the cursor are moved to just after it, so
    /// tokens that were already consumed never shift. Returns the index the
    /// first inserted token landed on.
    pub fn insert_at<I, S>(&mut self, pos: usize, tokens: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let floor = self.cursor.map_or(0, |c| c + 1);
        let at = pos.max(floor).min(self.tokens.len());

        let spliced = tokens.into_iter().map(|text| Token {
            text: text.into(),
            origin: None,
        });
        self.tokens.splice(at..at, spliced);
        at
    }

    /// Splice tokens in immediately after the cursor.
    pub fn insert_after_cursor<I, S>(&mut self, tokens: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let at = self.cursor.map_or(0, |c| c + 1);
        self.insert_at(at, tokens)
    }

    /// The token at an absolute index.
    pub fn get(&self, pos: usize) -> Option<&Token> {
        self.tokens.get(pos)
    }

    /// Origin index of the token at `pos` in the caller's argument vector.
    pub fn origin(&self, pos: usize) -> Option<usize> {
        self.tokens.get(pos).and_then(|t| t.origin)
    }

    /// Number of tokens not yet reached by the cursor.
    pub fn remaining(&self) -> usize {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.tokens.len().saturating_sub(next)
    }

    /// Total number of tokens, including spliced ones.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the stream holds no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
