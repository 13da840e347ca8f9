use std::collections::BTreeMap;
use std::rc::Rc;

use icumsg_core::FormatKind;

use crate::value::Value;

/// Renders one value under a fixed `(kind, style)` configuration.
pub trait ValueFormatter {
    fn format(&self, value: &Value) -> String;
}

/// Injected locale-formatting service. Implementations may build
/// expensive locale-aware formatters; the compiler caches them per
/// compile context, so `formatter` is called once per distinct
/// `(kind, style)` pair.
pub trait FormatService {
    fn formatter(
        &self,
        locale: &str,
        kind: FormatKind,
        style: Option<&str>,
    ) -> Rc<dyn ValueFormatter>;
}

/// Plain fallback service: values render through their string form
/// with no locale awareness.
pub struct DefaultService;

impl FormatService for DefaultService {
    fn formatter(
        &self,
        _locale: &str,
        _kind: FormatKind,
        _style: Option<&str>,
    ) -> Rc<dyn ValueFormatter> {
        Rc::new(PlainFormatter)
    }
}

struct PlainFormatter;

impl ValueFormatter for PlainFormatter {
    fn format(&self, value: &Value) -> String {
        plain(value)
    }
}

/// String form of a value. Type mismatches pass through here rather
/// than erroring.
pub(crate) fn plain(value: &Value) -> String {
    match value {
        Value::Str(text) => text.clone(),
        Value::Num(value) => plain_number(*value),
        Value::Bool(value) => value.to_string(),
        Value::Markup(_) => String::new(),
    }
}

pub(crate) fn plain_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Formatter instances for one compile context, keyed by the resolved
/// `(kind, style)` pair. Never shared across locales or contexts.
pub struct FormatterCache {
    locale: String,
    service: Rc<dyn FormatService>,
    custom_styles: BTreeMap<String, String>,
    entries: BTreeMap<(FormatKind, Option<String>), Rc<dyn ValueFormatter>>,
}

impl FormatterCache {
    pub fn new(
        locale: impl Into<String>,
        service: Rc<dyn FormatService>,
        custom_styles: BTreeMap<String, String>,
    ) -> Self {
        Self {
            locale: locale.into(),
            service,
            custom_styles,
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&mut self, kind: FormatKind, style: Option<&str>) -> Rc<dyn ValueFormatter> {
        let style = style.map(|style| {
            self.custom_styles
                .get(style)
                .map(String::as_str)
                .unwrap_or(style)
                .to_string()
        });
        if let Some(formatter) = self.entries.get(&(kind, style.clone())) {
            return formatter.clone();
        }
        let formatter = self
            .service
            .formatter(&self.locale, kind, style.as_deref());
        self.entries.insert((kind, style), formatter.clone());
        formatter
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    use icumsg_core::FormatKind;

    use super::{DefaultService, FormatService, FormatterCache, ValueFormatter, plain, plain_number};
    use crate::value::Value;

    struct CountingService {
        calls: Rc<Cell<usize>>,
    }

    impl FormatService for CountingService {
        fn formatter(
            &self,
            _locale: &str,
            _kind: FormatKind,
            _style: Option<&str>,
        ) -> Rc<dyn ValueFormatter> {
            self.calls.set(self.calls.get() + 1);
            DefaultService.formatter("en", FormatKind::Number, None)
        }
    }

    #[test]
    fn plain_renders_integers_without_fraction() {
        assert_eq!(plain_number(3.0), "3");
        assert_eq!(plain_number(3.5), "3.5");
        assert_eq!(plain(&Value::Str("x".to_string())), "x");
        assert_eq!(plain(&Value::Bool(true)), "true");
    }

    #[test]
    fn cache_builds_each_configuration_once() {
        let calls = Rc::new(Cell::new(0));
        let service = Rc::new(CountingService {
            calls: calls.clone(),
        });
        let mut cache = FormatterCache::new("en", service, BTreeMap::new());
        cache.get(FormatKind::Number, None);
        cache.get(FormatKind::Number, None);
        cache.get(FormatKind::Number, Some("percent"));
        cache.get(FormatKind::Date, None);
        assert_eq!(calls.get(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn custom_styles_resolve_before_the_cache() {
        let calls = Rc::new(Cell::new(0));
        let service = Rc::new(CountingService {
            calls: calls.clone(),
        });
        let mut styles = BTreeMap::new();
        styles.insert("money".to_string(), "::currency/EUR".to_string());
        let mut cache = FormatterCache::new("en", service, styles);
        cache.get(FormatKind::Number, Some("money"));
        cache.get(FormatKind::Number, Some("::currency/EUR"));
        assert_eq!(calls.get(), 1);
    }
}
