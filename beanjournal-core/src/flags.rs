use std::fmt;

/// Transaction or posting flag.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Flag {
    Okay,
    Warning,
    Other(String),
}

impl Default for Flag {
    fn default() -> Self {
        Flag::Okay
    }
}

impl From<&str> for Flag {
    fn from(s: &str) -> Self {
        match s {
            "*" | "txn" => Flag::Okay,
            "!" => Flag::Warning,
            _ => Flag::Other(s.to_string()),
        }
    }
}

impl From<String> for Flag {
    fn from(s: String) -> Self {
        Flag::from(s.as_str())
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Okay => f.write_str("*"),
            Flag::Warning => f.write_str("!"),
            Flag::Other(s) => f.write_str(s),
        }
    }
}
