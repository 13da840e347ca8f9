use icumsg_core::{FormatKind, Node, PluralRules, parse, parse_plural_form, rules_for};

use crate::catalog::{CatalogEntry, Translation, entry_key};
use crate::compile::contains_tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    Esm,
    Cjs,
}

#[derive(Debug, Clone)]
pub struct CodegenOptions {
    pub locale: String,
    pub use_hashed_key: bool,
    pub export_name: String,
    pub format: ModuleFormat,
    /// Emit each message's source id as a comment above its entry.
    pub include_source_comments: bool,
    /// Module the generated code resolves its formatter factory from.
    pub runtime_module: String,
}

impl CodegenOptions {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            use_hashed_key: true,
            export_name: "messages".to_string(),
            format: ModuleFormat::Esm,
            include_source_comments: false,
            runtime_module: "@icumsg/runtime".to_string(),
        }
    }
}

/// Generates one JavaScript module for a catalog: an optional shared
/// plural selector, one declaration per distinct formatter
/// configuration, and a key to formatter-function mapping.
/// Unparseable translations degrade to constant strings, mirroring the
/// interpretive compiler's non-strict mode.
pub fn generate_catalog(entries: &[CatalogEntry], options: &CodegenOptions) -> String {
    let mut emitter = Emitter::new(rules_for(&options.locale));
    let mut lines: Vec<String> = Vec::new();
    for entry in entries {
        let Some(translation) = &entry.translation else {
            continue;
        };
        let expr = match translation {
            Translation::Single(text) => match parse(text) {
                Ok(nodes) => emitter.emit_message(&nodes, contains_tag(&nodes)),
                Err(_) => js_string(text),
            },
            Translation::Forms(forms) => {
                let parsed: Vec<Vec<Node>> = forms
                    .iter()
                    .map(|form| {
                        parse_plural_form(form)
                            .unwrap_or_else(|_| vec![Node::Literal(form.clone())])
                    })
                    .collect();
                let var = crate::convert::plural_var(entry.plural_source_id.as_deref());
                let seq = parsed.iter().any(|nodes| contains_tag(nodes));
                emitter.emit_forms(&var, &parsed, seq)
            }
        };
        if options.include_source_comments {
            lines.push(format!("  /* {} */", escape_block_comment(&entry.id)));
        }
        let key = entry_key(entry, options.use_hashed_key);
        lines.push(format!("  {}: v => {},", js_string(&key), expr));
    }

    let mut out = String::new();
    out.push_str("// @generated by icumsg\n");
    out.push_str(&format!("// locale: {}\n", options.locale));
    if !emitter.formatters.is_empty() {
        match options.format {
            ModuleFormat::Esm => {
                out.push_str(&format!("import _r from {};\n", js_string(&options.runtime_module)));
            }
            ModuleFormat::Cjs => {
                out.push_str(&format!(
                    "const _r = require({});\n",
                    js_string(&options.runtime_module)
                ));
            }
        }
    }
    if emitter.uses_selector {
        out.push_str(&format!(
            "const _p = n => Number({});\n",
            selector_source(emitter.rules)
        ));
    }
    for (index, (kind, style)) in emitter.formatters.iter().enumerate() {
        let style = match style {
            Some(style) => js_string(style),
            None => "undefined".to_string(),
        };
        out.push_str(&format!(
            "const _f{index} = _r.formatter({}, {}, {style});\n",
            js_string(&options.locale),
            js_string(kind.as_str()),
        ));
    }
    match options.format {
        ModuleFormat::Esm => {
            out.push_str(&format!("export const {} = {{\n", options.export_name));
            out.push_str(&lines.join("\n"));
            out.push_str("\n};\n");
        }
        ModuleFormat::Cjs => {
            out.push_str(&format!("const {} = {{\n", options.export_name));
            out.push_str(&lines.join("\n"));
            out.push_str("\n};\n");
            out.push_str(&format!(
                "module.exports = {{ {} }};\n",
                options.export_name
            ));
        }
    }
    out
}

/// The `plural=` part of the legacy rule, already valid JavaScript.
fn selector_source(rules: &'static PluralRules) -> String {
    let expr = rules
        .expression
        .split_once("plural=")
        .map(|(_, rest)| rest)
        .unwrap_or(rules.expression);
    expr.trim().trim_end_matches(';').to_string()
}

struct PluralRef {
    access: String,
    offset: i64,
}

struct Emitter {
    rules: &'static PluralRules,
    formatters: Vec<(FormatKind, Option<String>)>,
    uses_selector: bool,
}

impl Emitter {
    fn new(rules: &'static PluralRules) -> Self {
        Self {
            rules,
            formatters: Vec::new(),
            uses_selector: false,
        }
    }

    fn emit_message(&mut self, nodes: &[Node], seq: bool) -> String {
        self.emit_nodes(nodes, seq, None)
    }

    /// Gettext plural arrays: every form compiles independently, then a
    /// single selector-index ladder picks one; the last form doubles as
    /// the tail so short arrays clamp.
    fn emit_forms(&mut self, var: &str, forms: &[Vec<Node>], seq: bool) -> String {
        let access = value_access(var);
        let context = PluralRef {
            access: access.clone(),
            offset: 0,
        };
        let emitted: Vec<String> = forms
            .iter()
            .map(|nodes| self.emit_nodes(nodes, seq, Some(&context)))
            .collect();
        if emitted.is_empty() {
            return "\"\"".to_string();
        }
        if emitted.len() == 1 {
            return emitted.into_iter().next().unwrap_or_else(|| "\"\"".to_string());
        }
        let selector = self.selector_var();
        let mut out = String::from("(");
        for (index, form) in emitted.iter().enumerate() {
            if index + 1 == emitted.len() {
                out.push_str(form);
            } else {
                out.push_str(&format!("{selector}({access}) === {index} ? {form} : "));
            }
        }
        out.push(')');
        out
    }

    fn emit_nodes(&mut self, nodes: &[Node], seq: bool, plural: Option<&PluralRef>) -> String {
        let pieces: Vec<String> = nodes
            .iter()
            .map(|node| self.emit_node(node, seq, plural))
            .collect();
        if pieces.is_empty() {
            return if seq { "[]".to_string() } else { "\"\"".to_string() };
        }
        if seq {
            // Branch and tag expressions evaluate to arrays; spread
            // them so the emitted sequence stays flat, matching the
            // interpretive renderer.
            let items: Vec<String> = nodes
                .iter()
                .zip(pieces)
                .map(|(node, piece)| {
                    if matches!(
                        node,
                        Node::Select { .. } | Node::Plural { .. } | Node::Tag { .. }
                    ) {
                        format!("...{piece}")
                    } else {
                        piece
                    }
                })
                .collect();
            return format!("[{}]", items.join(", "));
        }
        if pieces.len() == 1 {
            return pieces.into_iter().next().unwrap_or_else(|| "\"\"".to_string());
        }
        // Lead string concatenation with a string so `+` never means
        // numeric addition.
        let mut out = String::new();
        if !pieces[0].starts_with('"') {
            out.push_str("\"\" + ");
        }
        out.push_str(&pieces.join(" + "));
        out
    }

    fn emit_node(&mut self, node: &Node, seq: bool, plural: Option<&PluralRef>) -> String {
        match node {
            Node::Literal(text) => js_string(text),
            Node::Argument(name) => {
                let access = value_access(name);
                format!("({access} ?? {})", placeholder(name))
            }
            Node::Format { kind, name, style } => {
                let access = value_access(name);
                let formatter = self.formatter_var(*kind, style.as_deref());
                format!(
                    "({access} == null ? {} : {formatter}({access}))",
                    placeholder(name)
                )
            }
            Node::Pound => match plural {
                Some(context) => {
                    let formatter = self.formatter_var(FormatKind::Number, None);
                    format!("{formatter}({})", offset_access(context))
                }
                None => "\"#\"".to_string(),
            },
            Node::Select { name, options } => {
                let access = value_access(name);
                let mut out = String::from("(");
                for (selector, body) in options.iter() {
                    if selector == "other" {
                        continue;
                    }
                    let body = self.emit_nodes(body, seq, plural);
                    out.push_str(&format!("{access} === {} ? {body} : ", js_string(selector)));
                }
                let tail = match options.get("other") {
                    Some(body) => self.emit_nodes(body, seq, plural),
                    None if seq => format!("[{}]", placeholder(name)),
                    None => placeholder(name),
                };
                out.push_str(&tail);
                out.push(')');
                out
            }
            Node::Plural {
                name,
                offset,
                kind: _,
                options,
            } => {
                let access = value_access(name);
                let context = PluralRef {
                    access: access.clone(),
                    offset: *offset,
                };
                let mut out = String::from("(");
                // Exact matches check the raw value first.
                for (selector, body) in options.iter() {
                    if let Some(exact) = selector.strip_prefix('=') {
                        let body = self.emit_nodes(body, seq, Some(&context));
                        out.push_str(&format!("{access} === {exact} ? {body} : "));
                    }
                }
                // Then a category-index ladder in variant order.
                let adjusted = offset_access(&context);
                let categories = self.rules.categories;
                for (index, category) in categories.iter().enumerate() {
                    if category.as_str() == "other" {
                        continue;
                    }
                    let Some(body) = options.get(category.as_str()) else {
                        continue;
                    };
                    let body = self.emit_nodes(body, seq, Some(&context));
                    let selector = self.selector_var();
                    out.push_str(&format!("{selector}({adjusted}) === {index} ? {body} : "));
                }
                let tail = match options.get("other") {
                    Some(body) => self.emit_nodes(body, seq, Some(&context)),
                    None if seq => format!("[{}]", placeholder(name)),
                    None => placeholder(name),
                };
                out.push_str(&tail);
                out.push(')');
                out
            }
            Node::Tag { name, children } => {
                let access = value_access(name);
                let children = self.emit_nodes(children, true, plural);
                format!("(typeof {access} === \"function\" ? {access}({children}) : {children})")
            }
        }
    }

    fn formatter_var(&mut self, kind: FormatKind, style: Option<&str>) -> String {
        let style = style.map(str::to_string);
        let index = match self
            .formatters
            .iter()
            .position(|entry| entry.0 == kind && entry.1 == style)
        {
            Some(index) => index,
            None => {
                self.formatters.push((kind, style));
                self.formatters.len() - 1
            }
        };
        format!("_f{index}")
    }

    fn selector_var(&mut self) -> &'static str {
        self.uses_selector = true;
        "_p"
    }
}

fn offset_access(context: &PluralRef) -> String {
    if context.offset == 0 {
        context.access.clone()
    } else {
        format!("({} - {})", context.access, context.offset)
    }
}

fn placeholder(name: &str) -> String {
    js_string(&format!("{{{name}}}"))
}

/// `v.name` when the name is a safe identifier, indexed access
/// otherwise.
pub fn value_access(name: &str) -> String {
    if is_js_identifier(name) {
        format!("v.{name}")
    } else {
        format!("v[{}]", js_string(name))
    }
}

const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

pub fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$') {
        return false;
    }
    !RESERVED_WORDS.contains(&name)
}

pub fn escape_js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            ch if (ch as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", ch as u32));
            }
            ch => out.push(ch),
        }
    }
    out
}

fn js_string(text: &str) -> String {
    format!("\"{}\"", escape_js_string(text))
}

/// Comment bodies may not close the surrounding block comment.
pub fn escape_block_comment(text: &str) -> String {
    text.replace("*/", "*\\/")
}
