//! Visibility expressions and the caller-side authorization context.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A visibility expression over authorization tokens, gating read access to
/// a property or element.
///
/// The expression is held verbatim: equality and ordering are lexicographic
/// over the raw string, so two semantically equivalent but differently
/// formatted expressions are distinct identities. Token matching never
/// parses the boolean structure; see [`Visibility::has_authorization`].
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Visibility(String);

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

impl Visibility {
    /// Wraps a raw visibility expression.
    pub fn new(expression: impl Into<String>) -> Self {
        Visibility(expression.into())
    }

    /// The empty visibility: readable without any authorization.
    pub fn empty() -> Self {
        Visibility(String::new())
    }

    /// The raw expression string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the expression is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// AND-combines expressions into `(a)&(b)&...`, skipping empty inputs
    /// and preserving input order. A single surviving input yields `(a)`
    /// with no trailing operator; no surviving inputs yield the empty
    /// visibility.
    pub fn and<I, S>(expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = String::new();
        for expression in expressions {
            let expression = expression.as_ref();
            if expression.is_empty() {
                continue;
            }
            if !result.is_empty() {
                result.push('&');
            }
            result.push('(');
            result.push_str(expression);
            result.push(')');
        }
        Visibility(result)
    }

    /// True if `authorization` appears verbatim among the expression's token
    /// fragments.
    ///
    /// The expression is split on every character outside
    /// `[A-Za-z0-9_.-]`, so boolean operators and parentheses act as
    /// delimiters rather than logic. Matching is pure membership over the
    /// fragments and is safe to call concurrently.
    pub fn has_authorization(&self, authorization: &str) -> bool {
        self.0
            .split(|c| !is_token_char(c))
            .any(|fragment| fragment == authorization)
    }

    /// All token fragments of the expression, in order of appearance.
    pub fn authorizations(&self) -> Vec<&str> {
        self.0
            .split(|c| !is_token_char(c))
            .filter(|fragment| !fragment.is_empty())
            .collect()
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Visibility {
    fn from(expression: &str) -> Self {
        Visibility::new(expression)
    }
}

impl From<String> for Visibility {
    fn from(expression: String) -> Self {
        Visibility(expression)
    }
}

/// The set of authorization tokens a caller presents when reading.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorizations(BTreeSet<String>);

impl Authorizations {
    /// Builds an authorization set from the given tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Authorizations(tokens.into_iter().map(Into::into).collect())
    }

    /// True if `token` is among the presented tokens.
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// The presented tokens, in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// True if `visibility` is empty or names at least one of the presented
    /// tokens. This is token membership, not boolean evaluation.
    pub fn can_read(&self, visibility: &Visibility) -> bool {
        visibility.is_empty() || self.0.iter().any(|token| visibility.has_authorization(token))
    }
}

/// Opaque caller context threaded through every read and write.
///
/// The core never inspects this beyond handing it to collaborators and
/// matching its tokens against visibility expressions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    name: String,
    authorizations: Authorizations,
}

impl User {
    /// Creates a user context with the given name and tokens.
    pub fn new(name: impl Into<String>, authorizations: Authorizations) -> Self {
        User {
            name: name.into(),
            authorizations,
        }
    }

    /// The user's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tokens this user presents.
    pub fn authorizations(&self) -> &Authorizations {
        &self.authorizations
    }
}
