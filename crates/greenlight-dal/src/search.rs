//! Title search against the `movies_fts` FTS5 index.
//!
//! Free text is never passed to FTS5 as an expression. It is split into word
//! tokens (same separators as the `unicode61` tokenizer), each token is quoted
//! and all tokens are required to match.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleMatch {
    /// No search requested, every row passes.
    Any,
    /// FTS5 match expression, all tokens must be present.
    Expression(String),
    /// Search text without any searchable token, no row can match.
    Nothing,
}

impl TitleMatch {
    pub fn new(search: Option<&str>) -> Self {
        let text = match search {
            None | Some("") => return TitleMatch::Any,
            Some(text) => text,
        };

        let terms = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|term| !term.is_empty())
            .map(|term| format!("\"{}\"", term.to_lowercase()))
            .collect::<Vec<_>>();

        if terms.is_empty() {
            TitleMatch::Nothing
        } else {
            TitleMatch::Expression(terms.join(" AND "))
        }
    }

    pub fn expression(&self) -> Option<&str> {
        match self {
            TitleMatch::Expression(expr) => Some(expr.as_str()),
            _ => None,
        }
    }
}
