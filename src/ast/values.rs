use serde::{Deserialize, Serialize};

/// A typed literal, produced once per raw token fragment and immutable
/// thereafter. JSON arrays and objects collapse to `Str`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// NULL / none
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String (the terminal fallback)
    Str(String),
}

impl Literal {
    /// Coerce a raw token fragment into a typed literal.
    ///
    /// Rules are ordered and total: quoted text, JSON-style decode, integer,
    /// decimal, boolean words, null words, and finally the original string
    /// unchanged. Never fails.
    pub fn coerce(raw: &str) -> Self {
        let raw = raw.trim();

        if raw.len() >= 2 {
            let bytes = raw.as_bytes();
            let quoted = (bytes[0] == b'\'' && bytes[raw.len() - 1] == b'\'')
                || (bytes[0] == b'"' && bytes[raw.len() - 1] == b'"');
            if quoted {
                return Literal::Str(raw[1..raw.len() - 1].to_string());
            }
        }

        if let Ok(v) = serde_json::from_str::<serde_json::Value>(raw) {
            match v {
                serde_json::Value::Null => return Literal::Null,
                serde_json::Value::Bool(b) => return Literal::Bool(b),
                serde_json::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        return Literal::Int(i);
                    }
                    if let Some(f) = n.as_f64() {
                        return Literal::Float(f);
                    }
                }
                serde_json::Value::String(s) => return Literal::Str(s),
                // Collections flatten back to their raw spelling.
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Literal::Str(raw.to_string());
                }
            }
        }

        if let Ok(i) = raw.parse::<i64>() {
            return Literal::Int(i);
        }
        if raw.chars().any(|c| c.is_ascii_digit()) {
            if let Ok(f) = raw.parse::<f64>() {
                return Literal::Float(f);
            }
        }

        match raw.to_ascii_lowercase().as_str() {
            "true" => Literal::Bool(true),
            "false" => Literal::Bool(false),
            "none" | "null" => Literal::Null,
            _ => Literal::Str(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Loose boolean reading, used for boolean-column comparisons.
    pub fn coerce_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            Literal::Int(0) => Some(false),
            Literal::Int(1) => Some(true),
            Literal::Str(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Numeric reading, used by the in-process evaluator for ordering
    /// comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Int(i) => Some(*i as f64),
            Literal::Float(f) => Some(*f),
            Literal::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Plain text rendering with no quoting.
    pub fn to_text(&self) -> String {
        match self {
            Literal::Null => String::new(),
            Literal::Bool(b) => b.to_string(),
            Literal::Int(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::Str(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Int(n as i64)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int(n)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Float(n)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Str(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Str(s)
    }
}
