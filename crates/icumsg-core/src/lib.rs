#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod ast;
mod parser;
mod plurals;

pub use ast::{FormatKind, Node, Options, PluralKind};
pub use parser::{ParseOptions, SyntaxError, SyntaxErrorKind, parse, parse_plural_form, parse_with};
pub use plurals::{
    PluralCategory, PluralRules, categories, expression, match_expression, rules_for, samples,
    selector, variants,
};
