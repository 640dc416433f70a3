//! Parsed selector types.

/// Comma-separated list of complex selectors. Matches when any member matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    /// Alternatives in source order.
    pub selectors: Vec<ComplexSelector>,
}

/// Compound selectors joined by combinators, e.g. `nav > ul li.active`.
///
/// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`, so
/// there is always exactly one fewer combinator than compound. The last
/// compound is the subject: the element the selector matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// Compound selectors, left to right.
    pub compounds: Vec<CompoundSelector>,
    /// Combinators between consecutive compounds.
    pub combinators: Vec<Combinator>,
}

impl ComplexSelector {
    /// The rightmost compound, i.e. the element being matched.
    #[must_use]
    pub fn subject(&self) -> &CompoundSelector {
        // Parser never produces a complex selector without compounds.
        &self.compounds[self.compounds.len() - 1]
    }
}

/// Relationship between two compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any ancestor.
    Descendant,
    /// `>`: direct parent.
    Child,
    /// `+`: immediately preceding element sibling.
    NextSibling,
    /// `~`: any preceding element sibling.
    SubsequentSibling,
}

/// Simple selectors that must all hold for one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    /// Tag name (lowercased). `None` for `*` or when omitted.
    pub tag: Option<String>,
    /// `#id`.
    pub id: Option<String>,
    /// `.class` names.
    pub classes: Vec<String>,
    /// Attribute predicates.
    pub attributes: Vec<AttributeSelector>,
}

impl CompoundSelector {
    /// Whether the tag constraint accepts `tag_name` (ASCII case-insensitive).
    #[must_use]
    pub fn matches_tag(&self, tag_name: &str) -> bool {
        self.tag
            .as_deref()
            .is_none_or(|tag| tag.eq_ignore_ascii_case(tag_name))
    }
}

/// `[name]` or `[name <op> value <flag>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Attribute name.
    pub name: String,
    /// Value constraint; `None` means presence only.
    pub matcher: Option<AttributeMatcher>,
}

/// Value constraint of an attribute predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMatcher {
    /// Comparison operator.
    pub op: AttributeOp,
    /// Expected value, unquoted.
    pub value: String,
    /// Set by the trailing `i` flag.
    pub case_insensitive: bool,
}

/// Attribute comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// `=`
    Equals,
    /// `~=`: whitespace-separated word list contains the value.
    Includes,
    /// `|=`: equals the value or starts with `value-`.
    DashMatch,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
}

impl AttributeSelector {
    /// Evaluate the predicate against an element's attribute value.
    ///
    /// `actual` is `None` when the element lacks the attribute.
    ///
    /// # Example
    ///
    /// ```
    /// use tether_selector::parse;
    ///
    /// let list = parse("[lang|=en]").unwrap();
    /// let attr = &list.selectors[0].subject().attributes[0];
    /// assert!(attr.matches_value(Some("en-US")));
    /// assert!(!attr.matches_value(Some("english")));
    /// assert!(!attr.matches_value(None));
    /// ```
    #[must_use]
    pub fn matches_value(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let Some(matcher) = &self.matcher else {
            return true;
        };

        let (actual, expected) = if matcher.case_insensitive {
            (actual.to_ascii_lowercase(), matcher.value.to_ascii_lowercase())
        } else {
            (actual.to_owned(), matcher.value.clone())
        };

        match matcher.op {
            AttributeOp::Equals => actual == expected,
            AttributeOp::Includes => {
                !expected.is_empty()
                    && !expected.contains(char::is_whitespace)
                    && actual.split_whitespace().any(|word| word == expected)
            }
            AttributeOp::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(&expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            // Empty values never match for the substring family.
            AttributeOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttributeOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttributeOp::Substring => !expected.is_empty() && actual.contains(&expected),
        }
    }
}
