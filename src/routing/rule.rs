//! Rule text parsing.
//!
//! # Grammar
//! ```text
//! rule      := when "=>" then
//! when      := "" | "true" | clause ("&" clause)*
//! then      := "" | "false" | clause ("&" clause)*
//! clause    := key ("=" | "!=") value ("," value)*
//! value     := literal | literal "*" | "*" literal | "$" key
//! ```
//!
//! # Design Decisions
//! - Parsing is pure: placeholders stay unresolved until match time
//! - Clauses on the same key accumulate into one `Clause`
//! - `consumer.` / `provider.` key prefixes are accepted and stripped
//! - A blank when side means "always", a blank then side is kept as
//!   `Condition::Empty` so it stays distinguishable from `false`

use std::fmt;
use std::str::FromStr;

use crate::routing::error::MalformedRuleError;

const SEPARATOR: &str = "=>";
const KEY_PREFIXES: [&str; 2] = ["consumer.", "provider."];

/// Compiled form of a single match value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Exact, case-sensitive comparison.
    Literal(String),
    /// A lone `*`: any non-empty subject.
    Any,
    /// One `*` with the text around it.
    Wildcard { prefix: String, suffix: String },
    /// `$key`, resolved against the request at match time.
    Placeholder(String),
}

/// One value on the right of `=` or `!=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchValue {
    raw: String,
    pattern: Pattern,
}

impl MatchValue {
    pub fn parse(raw: &str) -> Result<Self, MalformedRuleError> {
        let raw = raw.trim();
        let pattern = match raw.strip_prefix('$') {
            Some(key) if !key.is_empty() => Pattern::Placeholder(key.to_string()),
            _ => match raw.matches('*').count() {
                0 => Pattern::Literal(raw.to_string()),
                1 if raw == "*" => Pattern::Any,
                1 => {
                    let (prefix, suffix) = raw.split_once('*').unwrap_or((raw, ""));
                    Pattern::Wildcard {
                        prefix: prefix.to_string(),
                        suffix: suffix.to_string(),
                    }
                }
                _ => {
                    return Err(MalformedRuleError::MultipleWildcards {
                        value: raw.to_string(),
                    })
                }
            },
        };
        Ok(Self {
            raw: raw.to_string(),
            pattern,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }
}

/// Values combined with OR semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueGroup {
    values: Vec<MatchValue>,
}

impl ValueGroup {
    /// Add a value unless an identical one is already present.
    pub fn insert(&mut self, value: MatchValue) {
        if !self.values.iter().any(|v| v.raw == value.raw) {
            self.values.push(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchValue> {
        self.values.iter()
    }
}

impl fmt::Display for ValueGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", value.raw)?;
        }
        Ok(())
    }
}

/// Included and excluded values for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    key: String,
    included: ValueGroup,
    excluded: ValueGroup,
}

impl Clause {
    fn new(key: String) -> Self {
        Self {
            key,
            included: ValueGroup::default(),
            excluded: ValueGroup::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Values from `=` clauses.
    pub fn included(&self) -> &ValueGroup {
        &self.included
    }

    /// Values from `!=` clauses.
    pub fn excluded(&self) -> &ValueGroup {
        &self.excluded
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.included.is_empty(), self.excluded.is_empty()) {
            (false, true) => write!(f, "{} = {}", self.key, self.included),
            (true, false) => write!(f, "{} != {}", self.key, self.excluded),
            _ => write!(
                f,
                "{} = {} & {} != {}",
                self.key, self.included, self.key, self.excluded
            ),
        }
    }
}

/// One side of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Literal `true`, or a blank when side.
    True,
    /// Literal `false`.
    False,
    /// Blank then side.
    Empty,
    /// AND of clauses, in first-appearance order of their keys.
    Clauses(Vec<Clause>),
}

impl Condition {
    /// Parse the left-hand side of a rule. Blank means always.
    pub fn parse_when(text: &str) -> Result<Self, MalformedRuleError> {
        Self::parse_side(text, Condition::True)
    }

    /// Parse the right-hand side of a rule. Blank is kept as `Empty`.
    pub fn parse_then(text: &str) -> Result<Self, MalformedRuleError> {
        Self::parse_side(text, Condition::Empty)
    }

    fn parse_side(text: &str, blank: Condition) -> Result<Self, MalformedRuleError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(blank);
        }
        if text.eq_ignore_ascii_case("true") {
            return Ok(Condition::True);
        }
        if text.eq_ignore_ascii_case("false") {
            return Ok(Condition::False);
        }

        let mut clauses: Vec<Clause> = Vec::new();
        for raw in text.split('&') {
            let raw = raw.trim();
            let (key, values, excluded) = split_clause(raw)?;

            let index = match clauses.iter().position(|c| c.key == key) {
                Some(index) => index,
                None => {
                    clauses.push(Clause::new(key));
                    clauses.len() - 1
                }
            };
            let clause = &mut clauses[index];
            let group = if excluded {
                &mut clause.excluded
            } else {
                &mut clause.included
            };
            for value in values.split(',') {
                group.insert(MatchValue::parse(value)?);
            }
        }
        Ok(Condition::Clauses(clauses))
    }

    pub fn clauses(&self) -> &[Clause] {
        match self {
            Condition::Clauses(clauses) => clauses,
            _ => &[],
        }
    }
}

/// Split `key op values` at the first `=`, treating a preceding `!` as `!=`.
fn split_clause(raw: &str) -> Result<(String, &str, bool), MalformedRuleError> {
    let eq = raw.find('=').ok_or_else(|| MalformedRuleError::MissingOperator {
        clause: raw.to_string(),
    })?;
    let (key, excluded) = match raw[..eq].strip_suffix('!') {
        Some(key) => (key, true),
        None => (&raw[..eq], false),
    };

    let mut key = key.trim();
    for prefix in KEY_PREFIXES {
        if let Some(stripped) = key.strip_prefix(prefix) {
            key = stripped;
            break;
        }
    }
    if key.is_empty() {
        return Err(MalformedRuleError::EmptyKey {
            clause: raw.to_string(),
        });
    }
    Ok((key.to_string(), &raw[eq + 1..], excluded))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::True => write!(f, "true"),
            Condition::False => write!(f, "false"),
            Condition::Empty => Ok(()),
            Condition::Clauses(clauses) => {
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{}", clause)?;
                }
                Ok(())
            }
        }
    }
}

/// A parsed `when => then` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    when: Condition,
    then: Condition,
}

impl Rule {
    pub fn parse(text: &str) -> Result<Self, MalformedRuleError> {
        let (when, then) =
            text.split_once(SEPARATOR)
                .ok_or_else(|| MalformedRuleError::MissingSeparator {
                    rule: text.to_string(),
                })?;
        Ok(Self {
            when: Condition::parse_when(when)?,
            then: Condition::parse_then(then)?,
        })
    }

    pub fn when(&self) -> &Condition {
        &self.when
    }

    pub fn then(&self) -> &Condition {
        &self.then
    }
}

impl FromStr for Rule {
    type Err = MalformedRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.when, self.then)
    }
}
