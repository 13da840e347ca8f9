#![forbid(unsafe_code)]

mod catalog;
mod codegen;
mod compile;
mod convert;
mod error;
mod format;
mod key;
mod value;

pub use crate::catalog::{
    CatalogEntry, CatalogOptions, CompiledCatalog, Translation, compile_catalog, entries_from_json,
    entry_key,
};
pub use crate::codegen::{
    CodegenOptions, ModuleFormat, escape_block_comment, escape_js_string, generate_catalog,
    is_js_identifier, value_access,
};
pub use crate::compile::{
    CompileOptions, CompiledMessage, compile, compile_nodes, compile_plural_forms,
};
pub use crate::convert::{ConvertOptions, gettext_to_icu, icu_to_gettext_source};
pub use crate::error::CompileError;
pub use crate::format::{DefaultService, FormatService, FormatterCache, ValueFormatter};
pub use crate::key::message_key;
pub use crate::value::{Part, Rendered, TagHandler, Value, Values};
