//! Values handed back to callers once a command has run.

/// A command reply.
///
/// Mirrors the reply kinds of the emulated protocol without committing to
/// any wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    Status(String),
    Integer(i64),
    Bulk(String),
    Array(Vec<Reply>),
    /// A per-command failure inside an EXEC reply.
    Error(String),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    pub fn bulk(value: impl Into<String>) -> Self {
        Reply::Bulk(value.into())
    }

    pub fn from_bool(value: bool) -> Self {
        Reply::Integer(value as i64)
    }

    pub fn from_len(len: usize) -> Self {
        Reply::Integer(len as i64)
    }

    pub fn from_optional(value: Option<String>) -> Self {
        match value {
            Some(value) => Reply::Bulk(value),
            None => Reply::Nil,
        }
    }

    pub fn from_strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Reply::Array(values.into_iter().map(|v| Reply::Bulk(v.into())).collect())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text carried by a bulk or status reply.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Bulk(s) | Reply::Status(s) => Some(s),
            _ => None,
        }
    }

    /// Flattens an array of bulk replies into strings, skipping nils.
    pub fn into_strings(self) -> Vec<String> {
        match self {
            Reply::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Reply::Bulk(s) | Reply::Status(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Reply::Bulk(s) | Reply::Status(s) => vec![s],
            _ => Vec::new(),
        }
    }
}

/// Formats a score or float the way the server prints doubles.
pub fn format_float(value: f64) -> String {
    if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{}", value)
    }
}
