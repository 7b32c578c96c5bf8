//! # Filters
//!
//! Documents are selected by field equality. A filter is data, never text
//! spliced into a query, so titles containing quotes or path syntax select
//! exactly the documents whose field holds that value.
//!
//! The [`Display`](std::fmt::Display) form mirrors the path expressions the
//! store understood historically, e.g. `.#(title="Pancakes")#`, and is only
//! used for logging.
use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq { field: String, value: Value },
}

impl Filter {
    pub fn all() -> Self {
        Filter::All
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => document.get(field) == Some(value),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, ".#"),
            Filter::Eq {
                field,
                value: Value::String(s),
            } => write!(f, ".#({field}=\"{}\")#", escape(s)),
            Filter::Eq { field, value } => write!(f, ".#({field}={value})#"),
        }
    }
}

fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}
