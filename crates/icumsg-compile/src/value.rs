use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Callable bound to a tag name. Receives the rendered children and
/// returns the parts to splice into the output.
pub type TagHandler = Rc<dyn Fn(Vec<Part>) -> Vec<Part>>;

/// A value bound to a message argument.
#[derive(Clone)]
pub enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
    Markup(TagHandler),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Num(value) => Some(*value),
            Self::Str(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn markup(handler: impl Fn(Vec<Part>) -> Vec<Part> + 'static) -> Self {
        Self::Markup(Rc::new(handler))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(text) => f.debug_tuple("Str").field(text).finish(),
            Self::Num(value) => f.debug_tuple("Num").field(value).finish(),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Markup(_) => f.write_str("Markup(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Num(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Num(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Argument bindings for one format call.
#[derive(Debug, Clone, Default)]
pub struct Values {
    entries: BTreeMap<String, Value>,
}

impl Values {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One element of a rendered sequence.
#[derive(Debug, Clone)]
pub enum Part {
    Text(String),
    Opaque(Value),
}

/// Result of formatting a compiled message. Sequences appear only when
/// the message contains tags; everything else renders to plain text.
#[derive(Debug, Clone)]
pub enum Rendered {
    Text(String),
    Parts(Vec<Part>),
}

impl Rendered {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Parts(_) => None,
        }
    }

    /// Joins every textual part, dropping opaque markup values.
    pub fn to_text_lossy(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        Part::Text(text) => out.push_str(text),
                        Part::Opaque(Value::Str(text)) => out.push_str(text),
                        Part::Opaque(_) => {}
                    }
                }
                out
            }
        }
    }
}

/// Builds a [`Values`] map from `"name" => value` pairs.
#[macro_export]
macro_rules! values {
    () => { $crate::Values::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Values::new();
        $(map.insert($name, $value);)+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::{Part, Rendered, Value};

    #[test]
    fn coerces_numbers_from_strings() {
        assert_eq!(Value::from("12").as_number(), Some(12.0));
        assert_eq!(Value::from(" 2.5 ").as_number(), Some(2.5));
        assert_eq!(Value::from("twelve").as_number(), None);
        assert_eq!(Value::from(3).as_number(), Some(3.0));
        assert_eq!(Value::from(true).as_number(), None);
    }

    #[test]
    fn values_macro_builds_bindings() {
        let values = values!("name" => "Nova", "count" => 2);
        assert!(matches!(values.get("count"), Some(Value::Num(_))));
        assert!(values.get("missing").is_none());
        assert!(values!().is_empty());
    }

    #[test]
    fn lossy_text_drops_markup_parts() {
        let rendered = Rendered::Parts(vec![
            Part::Text("a".to_string()),
            Part::Opaque(Value::markup(|children| children)),
            Part::Opaque(Value::Str("b".to_string())),
        ]);
        assert_eq!(rendered.to_text_lossy(), "ab");
        assert_eq!(rendered.text(), None);
    }
}
