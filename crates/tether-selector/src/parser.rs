//! Selector list parser.
//!
//! Grammar (a practical subset of CSS Selectors Level 4):
//!
//! ```text
//! list      := complex ( ',' complex )*
//! complex   := compound ( combinator compound )*
//! compound  := ( tag | '*' )? ( '#' ident | '.' ident | attribute )*
//! attribute := '[' ident ( op value flag? )? ']'
//! flag      := 'i' | 's' (either case)
//! ```

use crate::error::SelectorError;
use crate::selector::{
    AttributeMatcher, AttributeOp, AttributeSelector, Combinator, ComplexSelector,
    CompoundSelector, SelectorList,
};

/// Parse a selector list.
///
/// # Errors
///
/// Returns [`SelectorError`] for empty members, stray characters, unterminated
/// strings and unsupported syntax such as pseudo-classes.
///
/// # Example
///
/// ```
/// use tether_selector::{parse, Combinator};
///
/// let list = parse("ul.menu > li[data-id]").unwrap();
/// let complex = &list.selectors[0];
/// assert_eq!(complex.combinators, vec![Combinator::Child]);
/// assert_eq!(complex.subject().tag.as_deref(), Some("li"));
///
/// assert!(parse("a:hover").is_err());
/// ```
pub fn parse(input: &str) -> Result<SelectorList, SelectorError> {
    Parser::new(input).parse_list()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace, returning whether any was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::UnexpectedChar {
                found,
                position: self.pos,
            },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_list(&mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = Vec::new();

        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();

            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                }
                Some(_) => return Err(self.unexpected()),
            }
        }

        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let Some(first) = self.parse_compound()? else {
            return Err(self.empty_or_unexpected());
        };

        let mut compounds = vec![first];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();

            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };

            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_whitespace();
            }

            let Some(compound) = self.parse_compound()? else {
                return Err(self.unexpected());
            };
            combinators.push(combinator);
            compounds.push(compound);
        }

        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn empty_or_unexpected(&self) -> SelectorError {
        match self.peek() {
            None | Some(',') => SelectorError::Empty { position: self.pos },
            Some(_) => self.unexpected(),
        }
    }

    /// Parse a compound selector, returning `None` when nothing was consumed.
    fn parse_compound(&mut self) -> Result<Option<CompoundSelector>, SelectorError> {
        let start = self.pos;
        let mut compound = CompoundSelector::default();

        if self.peek() == Some('*') {
            self.bump();
        } else if let Some(tag) = self.parse_ident() {
            compound.tag = Some(tag.to_ascii_lowercase());
        }

        // Namespace prefixes (`svg|rect`, `*|a`).
        if self.pos > start && self.peek() == Some('|') {
            self.bump();
            return Err(self.unsupported_from(start));
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.parse_ident().ok_or_else(|| self.unexpected())?);
                }
                Some('.') => {
                    self.bump();
                    let class = self.parse_ident().ok_or_else(|| self.unexpected())?;
                    compound.classes.push(class);
                }
                Some('[') => {
                    self.bump();
                    let attribute = self.parse_attribute()?;
                    compound.attributes.push(attribute);
                }
                Some(':') => {
                    let token_start = self.pos;
                    self.bump();
                    if self.peek() == Some(':') {
                        self.bump();
                    }
                    self.parse_ident();
                    return Err(self.unsupported_from(token_start));
                }
                _ => break,
            }
        }

        Ok((self.pos > start).then_some(compound))
    }

    fn unsupported_from(&self, start: usize) -> SelectorError {
        SelectorError::Unsupported {
            syntax: self.input[start..self.pos].to_owned(),
            position: start,
        }
    }

    /// Identifier with CSS-style backslash escapes.
    fn parse_ident(&mut self) -> Option<String> {
        let mut ident = String::new();

        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                ident.push(self.bump()?);
            } else if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                self.bump();
                ident.push(c);
            } else {
                break;
            }
        }

        (!ident.is_empty()).then_some(ident)
    }

    /// Attribute predicate after the opening `[`.
    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        self.skip_whitespace();
        let name_start = self.pos;
        let name = self.parse_ident().ok_or_else(|| self.unexpected())?;
        if self.peek() == Some('|') && !self.input[self.pos..].starts_with("|=") {
            self.bump();
            return Err(self.unsupported_from(name_start));
        }
        self.skip_whitespace();

        if self.peek() == Some(']') {
            self.bump();
            return Ok(AttributeSelector {
                name,
                matcher: None,
            });
        }

        let op = self.parse_operator()?;
        self.skip_whitespace();
        let value = self.parse_value()?;
        let had_whitespace = self.skip_whitespace();

        let mut case_insensitive = false;
        if had_whitespace && let Some(flag) = self.peek().filter(char::is_ascii_alphabetic) {
            case_insensitive = match flag {
                'i' | 'I' => true,
                's' | 'S' => false,
                _ => return Err(self.unexpected()),
            };
            self.bump();
            self.skip_whitespace();
        }

        self.expect(']')?;

        Ok(AttributeSelector {
            name,
            matcher: Some(AttributeMatcher {
                op,
                value,
                case_insensitive,
            }),
        })
    }

    fn parse_operator(&mut self) -> Result<AttributeOp, SelectorError> {
        let op = match self.peek() {
            Some('=') => {
                self.bump();
                return Ok(AttributeOp::Equals);
            }
            Some('~') => AttributeOp::Includes,
            Some('|') => AttributeOp::DashMatch,
            Some('^') => AttributeOp::Prefix,
            Some('$') => AttributeOp::Suffix,
            Some('*') => AttributeOp::Substring,
            _ => return Err(self.unexpected()),
        };
        self.bump();
        self.expect('=')?;
        Ok(op)
    }

    fn parse_value(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let start = self.pos;
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some('\\') => {
                            let escaped = self
                                .bump()
                                .ok_or(SelectorError::UnterminatedString { position: start })?;
                            value.push(escaped);
                        }
                        Some(c) if c == quote => return Ok(value),
                        Some(c) => value.push(c),
                        None => return Err(SelectorError::UnterminatedString { position: start }),
                    }
                }
            }
            _ => self.parse_ident().ok_or_else(|| self.unexpected()),
        }
    }
}
