use icumsg_core::{Node, match_expression, parse, rules_for};

use crate::catalog::{CatalogEntry, Translation};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Rewrite literal `#` into `{var}` so translator tools that do
    /// not understand ICU pound substitution still show the variable.
    pub expand_pound: bool,
}

/// The plural variable of a Gettext source message: the first argument
/// referenced by the msgid, `count` when none is found.
pub(crate) fn plural_var(source: Option<&str>) -> String {
    let Some(source) = source else {
        return "count".to_string();
    };
    let Ok(nodes) = parse(source) else {
        return "count".to_string();
    };
    first_argument(&nodes).unwrap_or_else(|| "count".to_string())
}

fn first_argument(nodes: &[Node]) -> Option<String> {
    for node in nodes {
        match node {
            Node::Argument(name) | Node::Format { name, .. } => return Some(name.clone()),
            Node::Plural { name, .. } | Node::Select { name, .. } => return Some(name.clone()),
            Node::Tag { children, .. } => {
                if let Some(name) = first_argument(children) {
                    return Some(name);
                }
            }
            _ => {}
        }
    }
    None
}

/// Converts a Gettext plural entry into ICU plural syntax.
///
/// Requires a plural source id and at least two translated forms;
/// anything else is a conversion miss (`None`). Translation-array
/// indices map to plural categories by running each category's first
/// sample through the originating `Plural-Forms` expression when it is
/// a recognized rule, else through the locale's own selector. Indices
/// clamp to the last available form.
pub fn gettext_to_icu(
    entry: &CatalogEntry,
    locale: &str,
    plural_forms: Option<&str>,
    options: &ConvertOptions,
) -> Option<String> {
    entry.plural_source_id.as_ref()?;
    let forms = match &entry.translation {
        Some(Translation::Forms(forms)) if forms.len() >= 2 => forms,
        _ => return None,
    };
    let var = plural_var(entry.plural_source_id.as_deref());
    let rules = rules_for(locale);
    let matched = plural_forms.and_then(match_expression);

    let mut body = String::new();
    for (index, category) in rules.categories.iter().enumerate() {
        let sample = rules.samples[index][0] as f64;
        let form_index = match matched {
            Some(select) => select(sample),
            None => (rules.select)(sample),
        }
        .min(forms.len() - 1);
        let mut text = forms[form_index].clone();
        if options.expand_pound {
            text = text.replace('#', &format!("{{{var}}}"));
        }
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(category.as_str());
        body.push_str(" {");
        body.push_str(&text);
        body.push('}');
    }
    Some(format!("{{{var}, plural, {body}}}"))
}

/// Recovers approximate `msgid`/`msgid_plural` source strings from an
/// ICU plural message: the first and last case bodies, extracted with
/// brace balancing since bodies may nest arguments. Interior
/// categories are discarded, so this is lossy for locales with more
/// than two categories. Non-plural or single-case input is a miss.
pub fn icu_to_gettext_source(message: &str) -> Option<(String, String)> {
    let chars: Vec<char> = message.chars().collect();
    let mut pos = 0usize;
    skip_ws(&chars, &mut pos);
    if chars.get(pos) != Some(&'{') {
        return None;
    }
    pos += 1;
    skip_ws(&chars, &mut pos);
    read_until(&chars, &mut pos, |ch| ch == ',' || ch == '}');
    skip_ws(&chars, &mut pos);
    if chars.get(pos) != Some(&',') {
        return None;
    }
    pos += 1;
    skip_ws(&chars, &mut pos);
    let keyword = read_until(&chars, &mut pos, |ch| ch == ',' || ch.is_whitespace());
    if keyword != "plural" && keyword != "selectordinal" {
        return None;
    }
    skip_ws(&chars, &mut pos);
    if chars.get(pos) != Some(&',') {
        return None;
    }
    pos += 1;

    let mut bodies = Vec::new();
    loop {
        skip_ws(&chars, &mut pos);
        match chars.get(pos) {
            None | Some('}') => break,
            _ => {}
        }
        let token = read_until(&chars, &mut pos, |ch| ch.is_whitespace() || ch == '{');
        if token.is_empty() {
            return None;
        }
        if token.starts_with("offset:") {
            continue;
        }
        skip_ws(&chars, &mut pos);
        if chars.get(pos) != Some(&'{') {
            return None;
        }
        pos += 1;
        bodies.push(read_balanced_body(&chars, &mut pos)?);
    }
    if bodies.len() < 2 {
        return None;
    }
    let first = bodies.first()?.clone();
    let last = bodies.last()?.clone();
    Some((first, last))
}

fn skip_ws(chars: &[char], pos: &mut usize) {
    while chars.get(*pos).is_some_and(|ch| ch.is_whitespace()) {
        *pos += 1;
    }
}

fn read_until(chars: &[char], pos: &mut usize, stop: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(&ch) = chars.get(*pos) {
        if stop(ch) || ch == '{' || ch == '}' {
            break;
        }
        out.push(ch);
        *pos += 1;
    }
    out
}

/// Consumes up to the matching close brace, honoring nested braces and
/// apostrophe quoting. The open brace is already consumed; the close
/// brace is consumed but not returned.
fn read_balanced_body(chars: &[char], pos: &mut usize) -> Option<String> {
    let mut body = String::new();
    let mut depth = 0usize;
    while let Some(&ch) = chars.get(*pos) {
        match ch {
            '\'' => {
                body.push(ch);
                *pos += 1;
                while let Some(&ch) = chars.get(*pos) {
                    body.push(ch);
                    *pos += 1;
                    if ch == '\'' {
                        break;
                    }
                }
            }
            '{' => {
                depth += 1;
                body.push(ch);
                *pos += 1;
            }
            '}' if depth == 0 => {
                *pos += 1;
                return Some(body);
            }
            '}' => {
                depth -= 1;
                body.push(ch);
                *pos += 1;
            }
            _ => {
                body.push(ch);
                *pos += 1;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{ConvertOptions, gettext_to_icu, icu_to_gettext_source, plural_var};
    use crate::catalog::{CatalogEntry, Translation};

    fn plural_entry(source: &str, forms: &[&str]) -> CatalogEntry {
        CatalogEntry {
            id: source.to_string(),
            plural_source_id: Some(source.to_string()),
            translation: Some(Translation::Forms(
                forms.iter().map(|form| form.to_string()).collect(),
            )),
            context: None,
        }
    }

    #[test]
    fn converts_polish_plural_arrays() {
        let entry = plural_entry("{count} files", &["plik", "pliki", "plików", "pliki"]);
        let icu = gettext_to_icu(&entry, "pl", None, &ConvertOptions::default()).expect("convert");
        assert_eq!(
            icu,
            "{count, plural, one {plik} few {pliki} many {plików} other {pliki}}"
        );
    }

    #[test]
    fn converts_through_a_recognized_expression() {
        let entry = plural_entry("{n} items", &["item", "items"]);
        let icu = gettext_to_icu(
            &entry,
            "en",
            Some("nplurals=2; plural=(n != 1);"),
            &ConvertOptions::default(),
        )
        .expect("convert");
        assert_eq!(icu, "{n, plural, one {item} other {items}}");
    }

    #[test]
    fn clamps_indices_to_available_forms() {
        // A two-form array for a four-category locale reuses the last
        // form for the uncovered categories.
        let entry = plural_entry("{count} files", &["file", "files"]);
        let icu = gettext_to_icu(&entry, "ru", None, &ConvertOptions::default()).expect("convert");
        assert_eq!(
            icu,
            "{count, plural, one {file} few {files} many {files} other {files}}"
        );
    }

    #[test]
    fn expands_pound_when_requested() {
        let entry = plural_entry("{count} files", &["# file", "# files"]);
        let options = ConvertOptions { expand_pound: true };
        let icu = gettext_to_icu(&entry, "en", None, &options).expect("convert");
        assert_eq!(icu, "{count, plural, one {{count} file} other {{count} files}}");
    }

    #[test]
    fn misses_on_non_plural_entries() {
        let single = CatalogEntry {
            id: "Hello".to_string(),
            plural_source_id: None,
            translation: Some(Translation::Single("Bonjour".to_string())),
            context: None,
        };
        assert!(gettext_to_icu(&single, "fr", None, &ConvertOptions::default()).is_none());
        let short = plural_entry("{n} items", &["items"]);
        assert!(gettext_to_icu(&short, "en", None, &ConvertOptions::default()).is_none());
    }

    #[test]
    fn extracts_first_and_last_case_bodies() {
        let (id, plural_id) =
            icu_to_gettext_source("{count, plural, one {# file} other {# files}}")
                .expect("extract");
        assert_eq!(id, "# file");
        assert_eq!(plural_id, "# files");
    }

    #[test]
    fn extraction_balances_nested_braces() {
        let message = "{n, plural, one {{name} has one} many {lots} other {{name} has {n}}}";
        let (id, plural_id) = icu_to_gettext_source(message).expect("extract");
        assert_eq!(id, "{name} has one");
        assert_eq!(plural_id, "{name} has {n}");
    }

    #[test]
    fn extraction_skips_offsets_and_honors_quoting() {
        let message = "{n, plural, offset:1 one {a '}' b} other {c}}";
        let (id, plural_id) = icu_to_gettext_source(message).expect("extract");
        assert_eq!(id, "a '}' b");
        assert_eq!(plural_id, "c");
    }

    #[test]
    fn extraction_rejects_non_plural_input() {
        assert!(icu_to_gettext_source("Hello {name}").is_none());
        assert!(icu_to_gettext_source("{g, select, other {x}}").is_none());
        assert!(icu_to_gettext_source("{n, plural, other {x}}").is_none());
    }

    #[test]
    fn plural_var_prefers_the_first_argument() {
        assert_eq!(plural_var(Some("{count} files")), "count");
        assert_eq!(plural_var(Some("{total, number} rows")), "total");
        assert_eq!(plural_var(Some("files")), "count");
        assert_eq!(plural_var(None), "count");
    }
}
