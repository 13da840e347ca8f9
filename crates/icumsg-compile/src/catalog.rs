use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::compile::{CompileOptions, CompiledMessage, compile, compile_plural_forms};
use crate::convert::plural_var;
use crate::error::CompileError;
use crate::format::FormatService;
use crate::key::message_key;
use crate::value::{Rendered, Values};

/// One extracted message as produced by the catalog loader. Consumed
/// once per compile pass, never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural_source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<Translation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Translation {
    Single(String),
    /// Gettext plural forms in language order.
    Forms(Vec<String>),
}

pub fn entries_from_json(json: &str) -> Result<Vec<CatalogEntry>, CompileError> {
    Ok(serde_json::from_str(json)?)
}

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub locale: String,
    pub use_hashed_key: bool,
    pub strict: bool,
}

impl CatalogOptions {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            use_hashed_key: true,
            strict: false,
        }
    }
}

/// The key an entry compiles under: content hash of context + id, or
/// the raw id.
pub fn entry_key(entry: &CatalogEntry, use_hashed_key: bool) -> String {
    if use_hashed_key {
        message_key(&entry.id, entry.context.as_deref())
    } else {
        entry.id.clone()
    }
}

/// A whole catalog compiled for one locale. Messages compile once and
/// stay cached for the catalog's lifetime.
pub struct CompiledCatalog {
    locale: String,
    messages: BTreeMap<String, CompiledMessage>,
}

impl CompiledCatalog {
    pub fn get(&self, key: &str) -> Option<&CompiledMessage> {
        self.messages.get(key)
    }

    pub fn format(&self, key: &str, values: &Values) -> Option<Rendered> {
        self.messages.get(key).map(|message| message.format(values))
    }

    pub fn has(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

/// Compiles every translated entry. Untranslated entries are skipped
/// (extraction-only workflow); array translations take the Gettext
/// plural specialization. Later duplicates of a key win.
pub fn compile_catalog(
    entries: &[CatalogEntry],
    options: &CatalogOptions,
    service: Rc<dyn FormatService>,
) -> Result<CompiledCatalog, CompileError> {
    let compile_options = CompileOptions {
        locale: options.locale.clone(),
        strict: options.strict,
        custom_styles: BTreeMap::new(),
    };
    let mut messages = BTreeMap::new();
    for entry in entries {
        let Some(translation) = &entry.translation else {
            continue;
        };
        let message = match translation {
            Translation::Single(text) => compile(text, &compile_options, service.clone())?,
            Translation::Forms(forms) => {
                let var = plural_var(entry.plural_source_id.as_deref());
                compile_plural_forms(&var, forms, &compile_options, service.clone())?
            }
        };
        messages.insert(entry_key(entry, options.use_hashed_key), message);
    }
    Ok(CompiledCatalog {
        locale: options.locale.clone(),
        messages,
    })
}
