use alloc::string::String;
use alloc::vec::Vec;

/// Formatting directive kinds that take an optional opaque style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatKind {
    Number,
    Date,
    Time,
    List,
    Duration,
    RelativeTime,
    DisplayName,
}

impl FormatKind {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "list" => Some(Self::List),
            "duration" => Some(Self::Duration),
            "relativeTime" => Some(Self::RelativeTime),
            "displayName" => Some(Self::DisplayName),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::List => "list",
            Self::Duration => "duration",
            Self::RelativeTime => "relativeTime",
            Self::DisplayName => "displayName",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralKind {
    Cardinal,
    Ordinal,
}

/// Selector-keyed sub-messages. Insertion order is preserved for
/// diagnostics; lookup is by key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Options {
    entries: Vec<(String, Vec<Node>)>,
}

impl Options {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an option. The parser checks uniqueness before calling.
    pub fn push(&mut self, selector: String, body: Vec<Node>) {
        self.entries.push((selector, body));
    }

    pub fn get(&self, selector: &str) -> Option<&[Node]> {
        self.entries
            .iter()
            .find(|(key, _)| key == selector)
            .map(|(_, body)| body.as_slice())
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == selector)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Node])> {
        self.entries
            .iter()
            .map(|(key, body)| (key.as_str(), body.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One node of a parsed ICU message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Literal(String),
    Argument(String),
    Format {
        kind: FormatKind,
        name: String,
        style: Option<String>,
    },
    Plural {
        name: String,
        offset: i64,
        kind: PluralKind,
        options: Options,
    },
    Select {
        name: String,
        options: Options,
    },
    Pound,
    Tag {
        name: String,
        children: Vec<Node>,
    },
}
