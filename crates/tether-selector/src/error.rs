/// Selector parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// Selector (or one member of a selector list) is empty.
    #[error("Empty selector at position {position}")]
    Empty {
        /// Byte offset where a selector was expected.
        position: usize,
    },
    /// Input ended in the middle of a construct.
    #[error("Unexpected end of selector")]
    UnexpectedEnd,
    /// Character that cannot appear at this point.
    #[error("Unexpected character {found:?} at position {position}")]
    UnexpectedChar {
        /// Offending character.
        found: char,
        /// Byte offset of the character.
        position: usize,
    },
    /// Quoted value without its closing quote.
    #[error("Unterminated string starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },
    /// Valid CSS that this parser does not evaluate (pseudo-classes, namespaces).
    #[error("Unsupported selector syntax {syntax:?} at position {position}")]
    Unsupported {
        /// The unsupported token.
        syntax: String,
        /// Byte offset of the token.
        position: usize,
    },
}
