use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use icumsg_core::{Node, PluralCategory, parse, parse_plural_form, rules_for};

use crate::error::CompileError;
use crate::format::{FormatService, FormatterCache, ValueFormatter, plain};
use crate::value::{Part, Rendered, Value, Values};

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub locale: String,
    /// Strict mode surfaces the first syntax error; otherwise a parse
    /// failure compiles to a constant message yielding the source text.
    pub strict: bool,
    /// Style aliases resolved before the formatter cache.
    pub custom_styles: BTreeMap<String, String>,
}

impl CompileOptions {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            strict: false,
            custom_styles: BTreeMap::new(),
        }
    }
}

/// A message compiled for one locale. Formatting is pure: identical
/// values always produce identical output.
pub struct CompiledMessage {
    body: Body,
    has_tags: bool,
}

impl fmt::Debug for CompiledMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match &self.body {
            Body::Nodes(_) => "Nodes(..)",
            Body::Constant(_) => "Constant(..)",
            Body::Forms { .. } => "Forms(..)",
        };
        f.debug_struct("CompiledMessage")
            .field("body", &body)
            .field("has_tags", &self.has_tags)
            .finish()
    }
}

enum Body {
    Nodes(Vec<CNode>),
    /// Pass-through for unparseable sources in non-strict mode.
    Constant(String),
    /// Gettext plural arrays: one compiled sub-message per form,
    /// chosen by the locale's selector index.
    Forms {
        name: String,
        select: fn(f64) -> usize,
        forms: Vec<Vec<CNode>>,
        number: Rc<dyn ValueFormatter>,
    },
}

enum CNode {
    Text(String),
    Arg(String),
    Fmt {
        name: String,
        formatter: Rc<dyn ValueFormatter>,
    },
    Plural {
        name: String,
        offset: i64,
        select: fn(f64) -> usize,
        categories: &'static [PluralCategory],
        options: Vec<(Selector, Vec<CNode>)>,
        number: Rc<dyn ValueFormatter>,
    },
    Select {
        name: String,
        options: Vec<(String, Vec<CNode>)>,
    },
    Pound,
    Tag {
        name: String,
        children: Vec<CNode>,
    },
}

enum Selector {
    Exact(i64),
    Category(String),
}

/// Explicit `#` context threaded through recursive rendering.
struct PluralContext<'a> {
    value: f64,
    offset: i64,
    number: &'a Rc<dyn ValueFormatter>,
}

pub fn compile(
    source: &str,
    options: &CompileOptions,
    service: Rc<dyn FormatService>,
) -> Result<CompiledMessage, CompileError> {
    match parse(source) {
        Ok(nodes) => compile_nodes(&nodes, options, service),
        Err(err) if options.strict => Err(err.into()),
        Err(_) => Ok(CompiledMessage {
            body: Body::Constant(source.to_string()),
            has_tags: false,
        }),
    }
}

/// Compiles a pre-parsed AST.
pub fn compile_nodes(
    nodes: &[Node],
    options: &CompileOptions,
    service: Rc<dyn FormatService>,
) -> Result<CompiledMessage, CompileError> {
    let mut compiler = Compiler::new(options, service);
    let compiled = compiler.compile_nodes(nodes);
    Ok(CompiledMessage {
        has_tags: contains_tag(nodes),
        body: Body::Nodes(compiled),
    })
}

/// Compiles a Gettext plural array. Every form is an independent ICU
/// message; the locale selector picks the form index at call time,
/// clamped to the last form.
pub fn compile_plural_forms(
    name: &str,
    forms: &[String],
    options: &CompileOptions,
    service: Rc<dyn FormatService>,
) -> Result<CompiledMessage, CompileError> {
    let mut compiler = Compiler::new(options, service);
    let mut compiled = Vec::with_capacity(forms.len());
    let mut has_tags = false;
    for form in forms {
        match parse_plural_form(form) {
            Ok(nodes) => {
                has_tags = has_tags || contains_tag(&nodes);
                compiled.push(compiler.compile_nodes(&nodes));
            }
            Err(err) if options.strict => return Err(err.into()),
            Err(_) => compiled.push(vec![CNode::Text(form.clone())]),
        }
    }
    let number = compiler.cache.get(icumsg_core::FormatKind::Number, None);
    Ok(CompiledMessage {
        body: Body::Forms {
            name: name.to_string(),
            select: rules_for(&options.locale).select,
            forms: compiled,
            number,
        },
        has_tags,
    })
}

struct Compiler {
    cache: FormatterCache,
    locale: String,
}

impl Compiler {
    fn new(options: &CompileOptions, service: Rc<dyn FormatService>) -> Self {
        Self {
            cache: FormatterCache::new(
                options.locale.clone(),
                service,
                options.custom_styles.clone(),
            ),
            locale: options.locale.clone(),
        }
    }

    fn compile_nodes(&mut self, nodes: &[Node]) -> Vec<CNode> {
        nodes.iter().map(|node| self.compile_node(node)).collect()
    }

    fn compile_node(&mut self, node: &Node) -> CNode {
        match node {
            Node::Literal(text) => CNode::Text(text.clone()),
            Node::Argument(name) => CNode::Arg(name.clone()),
            Node::Format { kind, name, style } => CNode::Fmt {
                name: name.clone(),
                formatter: self.cache.get(*kind, style.as_deref()),
            },
            Node::Plural {
                name,
                offset,
                kind: _,
                options,
            } => {
                let rules = rules_for(&self.locale);
                let compiled = options
                    .iter()
                    .map(|(selector, body)| {
                        let selector = match selector.strip_prefix('=') {
                            Some(exact) => Selector::Exact(exact.parse().unwrap_or(i64::MIN)),
                            None => Selector::Category(selector.to_string()),
                        };
                        (selector, self.compile_nodes(body))
                    })
                    .collect();
                CNode::Plural {
                    name: name.clone(),
                    offset: *offset,
                    select: rules.select,
                    categories: rules.categories,
                    options: compiled,
                    number: self.cache.get(icumsg_core::FormatKind::Number, None),
                }
            }
            Node::Select { name, options } => CNode::Select {
                name: name.clone(),
                options: options
                    .iter()
                    .map(|(selector, body)| (selector.to_string(), self.compile_nodes(body)))
                    .collect(),
            },
            Node::Pound => CNode::Pound,
            Node::Tag { name, children } => CNode::Tag {
                name: name.clone(),
                children: self.compile_nodes(children),
            },
        }
    }
}

impl CompiledMessage {
    pub fn format(&self, values: &Values) -> Rendered {
        match &self.body {
            Body::Constant(text) => Rendered::Text(text.clone()),
            Body::Nodes(nodes) => {
                let mut out = Output::new(self.has_tags);
                render_nodes(nodes, values, None, &mut out);
                out.finish()
            }
            Body::Forms {
                name,
                select,
                forms,
                number,
            } => {
                let mut out = Output::new(self.has_tags);
                let Some(value) = values.get(name) else {
                    out.placeholder(name);
                    return out.finish();
                };
                let Some(raw) = value.as_number() else {
                    out.owned(plain(value));
                    return out.finish();
                };
                if forms.is_empty() {
                    out.placeholder(name);
                    return out.finish();
                }
                let index = select(raw).min(forms.len() - 1);
                let context = PluralContext {
                    value: raw,
                    offset: 0,
                    number,
                };
                render_nodes(&forms[index], values, Some(&context), &mut out);
                out.finish()
            }
        }
    }
}

fn render_nodes(nodes: &[CNode], values: &Values, plural: Option<&PluralContext>, out: &mut Output) {
    for node in nodes {
        match node {
            CNode::Text(text) => out.text(text),
            CNode::Arg(name) => match values.get(name) {
                Some(value) => out.owned(plain(value)),
                None => out.placeholder(name),
            },
            CNode::Fmt { name, formatter } => match values.get(name) {
                Some(value) => out.owned(formatter.format(value)),
                None => out.placeholder(name),
            },
            CNode::Pound => match plural {
                Some(context) => {
                    let shown = context.value - context.offset as f64;
                    out.owned(context.number.format(&Value::Num(shown)));
                }
                None => out.text("#"),
            },
            CNode::Plural {
                name,
                offset,
                select,
                categories,
                options,
                number,
            } => {
                let Some(value) = values.get(name) else {
                    out.placeholder(name);
                    continue;
                };
                let Some(raw) = value.as_number() else {
                    out.owned(plain(value));
                    continue;
                };
                // Exact matches see the raw value; categories see the
                // offset-adjusted one.
                let exact = options.iter().find(|(selector, _)| {
                    matches!(selector, Selector::Exact(exact) if *exact as f64 == raw)
                });
                let chosen = exact.or_else(|| {
                    let index = select(raw - *offset as f64);
                    let category = categories[index.min(categories.len() - 1)].as_str();
                    options.iter().find(|(selector, _)| {
                        matches!(selector, Selector::Category(name) if name == category)
                    })
                });
                let chosen = chosen.or_else(|| {
                    options.iter().find(|(selector, _)| {
                        matches!(selector, Selector::Category(name) if name == "other")
                    })
                });
                match chosen {
                    Some((_, body)) => {
                        let context = PluralContext {
                            value: raw,
                            offset: *offset,
                            number,
                        };
                        render_nodes(body, values, Some(&context), out);
                    }
                    None => out.placeholder(name),
                }
            }
            CNode::Select { name, options } => {
                let Some(value) = values.get(name) else {
                    out.placeholder(name);
                    continue;
                };
                let key = plain(value);
                let chosen = options
                    .iter()
                    .find(|(selector, _)| *selector == key)
                    .or_else(|| options.iter().find(|(selector, _)| selector == "other"));
                match chosen {
                    Some((_, body)) => render_nodes(body, values, plural, out),
                    None => out.placeholder(name),
                }
            }
            CNode::Tag { name, children } => {
                let mut inner = Output::new(true);
                render_nodes(children, values, plural, &mut inner);
                let parts = match inner.finish() {
                    Rendered::Parts(parts) => parts,
                    Rendered::Text(text) => vec![Part::Text(text)],
                };
                match values.get(name) {
                    Some(Value::Markup(handler)) => out.parts(handler(parts)),
                    _ => out.parts(parts),
                }
            }
        }
    }
}

/// Accumulates output, staying a plain string unless the message
/// carries tags.
struct Output {
    sequence: bool,
    buffer: String,
    parts: Vec<Part>,
}

impl Output {
    fn new(sequence: bool) -> Self {
        Self {
            sequence,
            buffer: String::new(),
            parts: Vec::new(),
        }
    }

    fn text(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn owned(&mut self, text: String) {
        self.buffer.push_str(&text);
    }

    fn placeholder(&mut self, name: &str) {
        self.buffer.push('{');
        self.buffer.push_str(name);
        self.buffer.push('}');
    }

    fn parts(&mut self, parts: Vec<Part>) {
        for part in parts {
            match part {
                Part::Text(text) => self.buffer.push_str(&text),
                Part::Opaque(value) => {
                    self.flush();
                    self.parts.push(Part::Opaque(value));
                }
            }
        }
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.parts.push(Part::Text(std::mem::take(&mut self.buffer)));
        }
    }

    fn finish(mut self) -> Rendered {
        if self.sequence {
            self.flush();
            Rendered::Parts(self.parts)
        } else {
            Rendered::Text(self.buffer)
        }
    }
}

pub(crate) fn contains_tag(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Tag { .. } => true,
        Node::Plural { options, .. } | Node::Select { options, .. } => {
            options.iter().any(|(_, body)| contains_tag(body))
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{CompileOptions, compile, compile_plural_forms};
    use crate::format::DefaultService;
    use crate::value::{Part, Rendered, Value};
    use crate::values;

    fn compile_en(source: &str) -> super::CompiledMessage {
        compile(source, &CompileOptions::new("en"), Rc::new(DefaultService)).expect("compile")
    }

    #[test]
    fn formats_plain_interpolation() {
        let message = compile_en("Hello {name}!");
        let out = message.format(&values!("name" => "Nova"));
        assert_eq!(out.text(), Some("Hello Nova!"));
    }

    #[test]
    fn missing_values_render_as_placeholders() {
        let message = compile_en("Hello {name}!");
        let out = message.format(&values!());
        assert_eq!(out.text(), Some("Hello {name}!"));
    }

    #[test]
    fn plural_pound_counts_items() {
        let message = compile_en("{count, plural, one {# item} other {# items}}");
        assert_eq!(message.format(&values!("count" => 1)).text(), Some("1 item"));
        assert_eq!(message.format(&values!("count" => 5)).text(), Some("5 items"));
        assert_eq!(message.format(&values!("count" => 0)).text(), Some("0 items"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let message = compile_en("{count, plural, one {# item} other {# items}}");
        let first = message.format(&values!("count" => 5)).to_text_lossy();
        for _ in 0..10 {
            assert_eq!(message.format(&values!("count" => 5)).to_text_lossy(), first);
        }
    }

    #[test]
    fn offset_applies_to_categories_not_exact_matches() {
        let message = compile_en(
            "{n, plural, offset:1 =1 {just you} one {you and # other} other {you and # others}}",
        );
        assert_eq!(message.format(&values!("n" => 1)).text(), Some("just you"));
        assert_eq!(
            message.format(&values!("n" => 2)).text(),
            Some("you and 1 other")
        );
        assert_eq!(
            message.format(&values!("n" => 4)).text(),
            Some("you and 3 others")
        );
    }

    #[test]
    fn plural_selection_follows_the_locale() {
        let options = CompileOptions::new("pl");
        let message = compile(
            "{n, plural, one {plik} few {pliki} many {plików} other {pliki}}",
            &options,
            Rc::new(DefaultService),
        )
        .expect("compile");
        assert_eq!(message.format(&values!("n" => 1)).text(), Some("plik"));
        assert_eq!(message.format(&values!("n" => 3)).text(), Some("pliki"));
        assert_eq!(message.format(&values!("n" => 5)).text(), Some("plików"));
    }

    #[test]
    fn select_falls_back_to_other() {
        let message =
            compile_en("{g, select, male {he} female {she} other {they}}");
        assert_eq!(message.format(&values!("g" => "female")).text(), Some("she"));
        assert_eq!(message.format(&values!("g" => "x")).text(), Some("they"));
    }

    #[test]
    fn mismatched_plural_value_passes_through() {
        let message = compile_en("{count, plural, one {# item} other {# items}}");
        let out = message.format(&values!("count" => "several"));
        assert_eq!(out.text(), Some("several"));
    }

    #[test]
    fn pound_outside_plural_is_literal() {
        let message = compile_en("issue #{id}");
        assert_eq!(
            message.format(&values!("id" => 7)).text(),
            Some("issue #7")
        );
    }

    #[test]
    fn strict_mode_surfaces_syntax_errors() {
        let mut options = CompileOptions::new("en");
        options.strict = true;
        let err = compile("{broken", &options, Rc::new(DefaultService)).expect_err("strict");
        assert!(err.to_string().contains("offset"));
    }

    #[test]
    fn non_strict_mode_passes_source_through() {
        let message = compile_en("{broken");
        assert_eq!(message.format(&values!("x" => 1)).text(), Some("{broken"));
    }

    #[test]
    fn tags_invoke_bound_handlers() {
        let message = compile_en("click <link>here</link> now");
        let mut values = crate::Values::new();
        values.insert(
            "link",
            Value::markup(|children| {
                let mut parts = vec![Part::Text("<a>".to_string())];
                parts.extend(children);
                parts.push(Part::Text("</a>".to_string()));
                parts
            }),
        );
        let out = message.format(&values);
        assert_eq!(out.to_text_lossy(), "click <a>here</a> now");
        assert!(matches!(out, Rendered::Parts(_)));
    }

    #[test]
    fn unbound_tags_pass_children_through() {
        let message = compile_en("a <b>bold</b> c");
        assert_eq!(message.format(&values!()).to_text_lossy(), "a bold c");
    }

    #[test]
    fn gettext_forms_select_by_index() {
        let forms = vec![
            "{count} plik".to_string(),
            "# pliki".to_string(),
            "# plików".to_string(),
            "# pliki".to_string(),
        ];
        let message = compile_plural_forms(
            "count",
            &forms,
            &CompileOptions::new("pl"),
            Rc::new(DefaultService),
        )
        .expect("compile");
        assert_eq!(message.format(&values!("count" => 1)).text(), Some("1 plik"));
        assert_eq!(message.format(&values!("count" => 4)).text(), Some("4 pliki"));
        assert_eq!(
            message.format(&values!("count" => 100)).text(),
            Some("100 plików")
        );
        assert_eq!(
            message.format(&values!("count" => 21)).text(),
            Some("21 pliki")
        );
    }

    #[test]
    fn empty_form_arrays_render_placeholders() {
        let message = compile_plural_forms(
            "count",
            &[],
            &CompileOptions::new("en"),
            Rc::new(DefaultService),
        )
        .expect("compile");
        assert_eq!(message.format(&values!("count" => 2)).text(), Some("{count}"));
    }

    #[test]
    fn gettext_forms_handle_missing_and_mismatched_values() {
        let forms = vec!["# item".to_string(), "# items".to_string()];
        let message = compile_plural_forms(
            "count",
            &forms,
            &CompileOptions::new("en"),
            Rc::new(DefaultService),
        )
        .expect("compile");
        assert_eq!(message.format(&values!()).text(), Some("{count}"));
        assert_eq!(
            message.format(&values!("count" => "several")).text(),
            Some("several")
        );
    }

    #[test]
    fn compiled_messages_carry_a_debug_shape() {
        let message = compile_en("{n, plural, one {#} other {#}}");
        let debug = format!("{message:?}");
        assert!(debug.contains("CompiledMessage"));
        assert!(debug.contains("Nodes(..)"));
    }
}
