use alloc::string::String;
use core::fmt;

/// CLDR plural categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One plural rule family. The world's plural systems reduce to a
/// small closed set of these; each is immutable shared data.
///
/// `select` returns an index into `categories` for any finite value.
/// `samples` is parallel to `categories` and holds representative
/// integers for each category. `expression` is the legacy Gettext
/// `Plural-Forms` rule whose form indices line up with `categories`.
#[derive(Clone, Copy)]
pub struct PluralRules {
    pub name: &'static str,
    pub categories: &'static [PluralCategory],
    pub select: fn(f64) -> usize,
    pub expression: &'static str,
    pub samples: &'static [&'static [i64]],
}

impl PluralRules {
    pub fn nplurals(&self) -> usize {
        self.categories.len()
    }

    pub fn category_index(&self, category: PluralCategory) -> Option<usize> {
        self.categories.iter().position(|&c| c == category)
    }

    pub fn select_category(&self, value: f64) -> PluralCategory {
        let index = (self.select)(value);
        self.categories[index.min(self.categories.len() - 1)]
    }
}

impl fmt::Debug for PluralRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluralRules")
            .field("name", &self.name)
            .field("categories", &self.categories)
            .field("expression", &self.expression)
            .finish()
    }
}

fn as_int(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Some(value.abs() as i64)
    } else {
        None
    }
}

use PluralCategory::{Few, Many, One, Other, Two, Zero};

/// Japanese, Chinese, Korean, Thai, Vietnamese and friends: no plural
/// distinction at all.
pub static NO_PLURAL: PluralRules = PluralRules {
    name: "no-plural",
    categories: &[Other],
    select: |_| 0,
    expression: "nplurals=1; plural=0;",
    samples: &[&[0, 1, 7, 100]],
};

/// Germanic family and the default: `one` for exactly 1.
pub static ENGLISH: PluralRules = PluralRules {
    name: "english",
    categories: &[One, Other],
    select: |n| match as_int(n) {
        Some(1) => 0,
        _ => 1,
    },
    expression: "nplurals=2; plural=(n != 1);",
    samples: &[&[1], &[0, 2, 5, 100]],
};

/// Romance family where 0 and 1 are both singular; values below 2,
/// fractions included, stay `one`.
pub static FRENCH: PluralRules = PluralRules {
    name: "french",
    categories: &[One, Other],
    select: |n| if n >= 0.0 && n < 2.0 { 0 } else { 1 },
    expression: "nplurals=2; plural=(n > 1);",
    samples: &[&[0, 1], &[2, 3, 100]],
};

/// Icelandic and Macedonian: singular for every number ending in 1
/// except those ending in 11. Non-integers go to `other`.
pub static ICELANDIC: PluralRules = PluralRules {
    name: "icelandic",
    categories: &[One, Other],
    select: |n| match as_int(n) {
        Some(t) if t % 10 == 1 && t % 100 != 11 => 0,
        _ => 1,
    },
    expression: "nplurals=2; plural=(n%10!=1 || n%100==11);",
    samples: &[&[1, 21, 31], &[2, 11, 100]],
};

/// Czech and Slovak: paucal 2-4.
pub static CZECH: PluralRules = PluralRules {
    name: "czech",
    categories: &[One, Few, Other],
    select: |n| match as_int(n) {
        Some(1) => 0,
        Some(t) if (2..=4).contains(&t) => 1,
        _ => 2,
    },
    expression: "nplurals=3; plural=(n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2;",
    samples: &[&[1], &[2, 3, 4], &[0, 5, 100]],
};

/// Romanian: 0 and x01-x19 take the paucal. Non-integers follow the
/// paucal as well.
pub static ROMANIAN: PluralRules = PluralRules {
    name: "romanian",
    categories: &[One, Few, Other],
    select: |n| match as_int(n) {
        Some(1) => 0,
        Some(t) if t == 0 || (t % 100 > 0 && t % 100 < 20) => 1,
        Some(_) => 2,
        None => 1,
    },
    expression: "nplurals=3; plural=(n==1 ? 0 : (n==0 || (n%100 > 0 && n%100 < 20)) ? 1 : 2);",
    samples: &[&[1], &[0, 2, 19, 101], &[20, 100]],
};

/// Lithuanian.
pub static LITHUANIAN: PluralRules = PluralRules {
    name: "lithuanian",
    categories: &[One, Few, Other],
    select: |n| match as_int(n) {
        Some(t) if t % 10 == 1 && t % 100 != 11 => 0,
        Some(t) if t % 10 >= 2 && (t % 100 < 10 || t % 100 >= 20) => 1,
        _ => 2,
    },
    expression: "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && (n%100<10 || n%100>=20) ? 1 : 2);",
    samples: &[&[1, 21, 31], &[2, 5, 22], &[0, 10, 11]],
};

/// Sami family and Inuktitut: a true dual.
pub static SAMI: PluralRules = PluralRules {
    name: "sami",
    categories: &[One, Two, Other],
    select: |n| match as_int(n) {
        Some(1) => 0,
        Some(2) => 1,
        _ => 2,
    },
    expression: "nplurals=3; plural=(n==1 ? 0 : n==2 ? 1 : 2);",
    samples: &[&[1], &[2], &[0, 3, 100]],
};

/// Polish, Russian, Ukrainian and the rest of the Slavic family.
///
/// Approximation: compounds ending in 1 other than 1 itself (21, 31,
/// 101) land in `other` here, where true CLDR keeps them in `one` for
/// the East Slavic languages. This keeps every category reachable by
/// an integer and the form count at four.
pub static SLAVIC: PluralRules = PluralRules {
    name: "slavic",
    categories: &[One, Few, Many, Other],
    select: |n| match as_int(n) {
        Some(1) => 0,
        Some(t) if (2..=4).contains(&(t % 10)) && !(12..=14).contains(&(t % 100)) => 1,
        Some(t) if t % 10 == 0 || (5..=9).contains(&(t % 10)) || (11..=14).contains(&(t % 100)) => 2,
        Some(_) => 3,
        None => 3,
    },
    expression: "nplurals=4; plural=(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<12 || n%100>14) ? 1 : n%10==0 || (n%10>=5 && n%10<=9) || (n%100>=11 && n%100<=14) ? 2 : 3);",
    samples: &[&[1], &[2, 3, 4, 22], &[0, 5, 11, 19], &[21, 31, 101]],
};

/// Maltese.
pub static MALTESE: PluralRules = PluralRules {
    name: "maltese",
    categories: &[One, Few, Many, Other],
    select: |n| match as_int(n) {
        Some(1) => 0,
        Some(t) if t == 0 || (t % 100 > 1 && t % 100 < 11) => 1,
        Some(t) if t % 100 > 10 && t % 100 < 20 => 2,
        _ => 3,
    },
    expression: "nplurals=4; plural=(n==1 ? 0 : n==0 || (n%100>1 && n%100<11) ? 1 : (n%100>10 && n%100<20) ? 2 : 3);",
    samples: &[&[1], &[0, 2, 10, 102], &[11, 19, 111], &[20, 21, 100]],
};

/// Scottish Gaelic. A documented approximation of the CLDR rule: the
/// paucal band is taken as the whole 3-19 range minus the dual.
pub static GAELIC: PluralRules = PluralRules {
    name: "gaelic",
    categories: &[One, Two, Few, Other],
    select: |n| match as_int(n) {
        Some(1) | Some(11) => 0,
        Some(2) | Some(12) => 1,
        Some(t) if t > 2 && t < 20 => 2,
        _ => 3,
    },
    expression: "nplurals=4; plural=(n==1 || n==11) ? 0 : (n==2 || n==12) ? 1 : (n > 2 && n < 20) ? 2 : 3;",
    samples: &[&[1, 11], &[2, 12], &[3, 13, 19], &[0, 20, 100]],
};

/// Slovenian: singular/dual/paucal on the last two digits.
pub static SLOVENIAN: PluralRules = PluralRules {
    name: "slovenian",
    categories: &[One, Two, Few, Other],
    select: |n| match as_int(n) {
        Some(t) if t % 100 == 1 => 0,
        Some(t) if t % 100 == 2 => 1,
        Some(t) if t % 100 == 3 || t % 100 == 4 => 2,
        Some(_) => 3,
        None => 2,
    },
    expression: "nplurals=4; plural=(n%100==1 ? 0 : n%100==2 ? 1 : n%100==3 || n%100==4 ? 2 : 3);",
    samples: &[&[1, 101], &[2, 102], &[3, 4, 103], &[0, 5, 100]],
};

/// Welsh. A documented approximation: true CLDR Welsh distinguishes
/// six categories; the conventional Gettext rule keeps four, with the
/// catch-all third form and a special band for 8 and 11. The category
/// list follows the Gettext form order, so `other` sits at index 2.
pub static WELSH: PluralRules = PluralRules {
    name: "welsh",
    categories: &[One, Two, Other, Few],
    select: |n| match as_int(n) {
        Some(1) => 0,
        Some(2) => 1,
        Some(8) | Some(11) => 3,
        _ => 2,
    },
    expression: "nplurals=4; plural=(n==1) ? 0 : (n==2) ? 1 : (n != 8 && n != 11) ? 2 : 3;",
    samples: &[&[1], &[2], &[0, 3, 5, 100], &[8, 11]],
};

/// Irish: five forms.
pub static IRISH: PluralRules = PluralRules {
    name: "irish",
    categories: &[One, Two, Few, Many, Other],
    select: |n| match as_int(n) {
        Some(1) => 0,
        Some(2) => 1,
        Some(t) if t > 2 && t < 7 => 2,
        Some(t) if t > 6 && t < 11 => 3,
        _ => 4,
    },
    expression: "nplurals=5; plural=n==1 ? 0 : n==2 ? 1 : (n>2 && n<7) ? 2 : (n>6 && n<11) ? 3 : 4;",
    samples: &[&[1], &[2], &[3, 6], &[7, 10], &[0, 11, 100]],
};

/// Arabic: the full six-way split.
pub static ARABIC: PluralRules = PluralRules {
    name: "arabic",
    categories: &[Zero, One, Two, Few, Many, Other],
    select: |n| match as_int(n) {
        Some(0) => 0,
        Some(1) => 1,
        Some(2) => 2,
        Some(t) if (3..=10).contains(&(t % 100)) => 3,
        Some(t) if t % 100 >= 11 => 4,
        _ => 5,
    },
    expression: "nplurals=6; plural=(n==0 ? 0 : n==1 ? 1 : n==2 ? 2 : n%100>=3 && n%100<=10 ? 3 : n%100>=11 ? 4 : 5);",
    samples: &[&[0], &[1], &[2], &[3, 10, 103], &[11, 99, 111], &[100, 101, 102]],
};

static VARIANTS: &[&PluralRules] = &[
    &NO_PLURAL, &ENGLISH, &FRENCH, &ICELANDIC, &CZECH, &ROMANIAN, &LITHUANIAN, &SAMI, &SLAVIC,
    &MALTESE, &GAELIC, &SLOVENIAN, &WELSH, &IRISH, &ARABIC,
];

/// Every known rule family, for diagnostics and exhaustive checks.
pub fn variants() -> &'static [&'static PluralRules] {
    VARIANTS
}

/// Full-tag entries consulted before the base-language fallback.
static EXACT_LOCALES: &[(&str, &PluralRules)] = &[("pt-br", &FRENCH)];

static BASE_LOCALES: &[(&str, &PluralRules)] = &[
    ("id", &NO_PLURAL),
    ("ja", &NO_PLURAL),
    ("ka", &NO_PLURAL),
    ("km", &NO_PLURAL),
    ("ko", &NO_PLURAL),
    ("lo", &NO_PLURAL),
    ("ms", &NO_PLURAL),
    ("my", &NO_PLURAL),
    ("th", &NO_PLURAL),
    ("vi", &NO_PLURAL),
    ("yo", &NO_PLURAL),
    ("zh", &NO_PLURAL),
    ("af", &ENGLISH),
    ("az", &ENGLISH),
    ("bg", &ENGLISH),
    ("ca", &ENGLISH),
    ("da", &ENGLISH),
    ("de", &ENGLISH),
    ("el", &ENGLISH),
    ("en", &ENGLISH),
    ("eo", &ENGLISH),
    ("es", &ENGLISH),
    ("et", &ENGLISH),
    ("eu", &ENGLISH),
    ("fi", &ENGLISH),
    ("fo", &ENGLISH),
    ("gl", &ENGLISH),
    ("he", &ENGLISH),
    ("hu", &ENGLISH),
    ("it", &ENGLISH),
    ("nb", &ENGLISH),
    ("ne", &ENGLISH),
    ("nl", &ENGLISH),
    ("nn", &ENGLISH),
    ("no", &ENGLISH),
    ("pt", &ENGLISH),
    ("sq", &ENGLISH),
    ("sv", &ENGLISH),
    ("sw", &ENGLISH),
    ("ta", &ENGLISH),
    ("te", &ENGLISH),
    ("tr", &ENGLISH),
    ("ur", &ENGLISH),
    ("am", &FRENCH),
    ("bn", &FRENCH),
    ("br", &FRENCH),
    ("fa", &FRENCH),
    ("fil", &FRENCH),
    ("fr", &FRENCH),
    ("hi", &FRENCH),
    ("oc", &FRENCH),
    ("pa", &FRENCH),
    ("tl", &FRENCH),
    ("is", &ICELANDIC),
    ("mk", &ICELANDIC),
    ("cs", &CZECH),
    ("sk", &CZECH),
    ("mo", &ROMANIAN),
    ("ro", &ROMANIAN),
    ("lt", &LITHUANIAN),
    ("iu", &SAMI),
    ("naq", &SAMI),
    ("se", &SAMI),
    ("sma", &SAMI),
    ("smi", &SAMI),
    ("smj", &SAMI),
    ("smn", &SAMI),
    ("sms", &SAMI),
    ("be", &SLAVIC),
    ("bs", &SLAVIC),
    ("hr", &SLAVIC),
    ("pl", &SLAVIC),
    ("ru", &SLAVIC),
    ("sh", &SLAVIC),
    ("sr", &SLAVIC),
    ("uk", &SLAVIC),
    ("mt", &MALTESE),
    ("gd", &GAELIC),
    ("sl", &SLOVENIAN),
    ("cy", &WELSH),
    ("ga", &IRISH),
    ("ar", &ARABIC),
];

fn normalize(locale: &str) -> String {
    let mut tag = String::new();
    for ch in locale.chars() {
        if ch == '_' {
            tag.push('-');
        } else {
            tag.push(ch.to_ascii_lowercase());
        }
    }
    tag
}

/// Exact tag first, then the base language, then the default
/// two-category family.
pub fn rules_for(locale: &str) -> &'static PluralRules {
    let tag = normalize(locale);
    if let Some(rules) = EXACT_LOCALES
        .iter()
        .find(|(key, _)| *key == tag)
        .map(|(_, rules)| *rules)
    {
        return rules;
    }
    let base = tag.split('-').next().unwrap_or(tag.as_str());
    BASE_LOCALES
        .iter()
        .find(|(key, _)| *key == base)
        .map(|(_, rules)| *rules)
        .unwrap_or(&ENGLISH)
}

pub fn categories(locale: &str) -> &'static [PluralCategory] {
    rules_for(locale).categories
}

pub fn selector(locale: &str) -> fn(f64) -> usize {
    rules_for(locale).select
}

pub fn samples(locale: &str) -> &'static [&'static [i64]] {
    rules_for(locale).samples
}

pub fn expression(locale: &str) -> &'static str {
    rules_for(locale).expression
}

/// Pattern-matches a raw Gettext `Plural-Forms` rule against the known
/// families and returns the matching selector. The expression text is
/// never evaluated. Accepts either the full header value or just the
/// `plural=` part.
pub fn match_expression(raw: &str) -> Option<fn(f64) -> usize> {
    let wanted = strip_expression(raw);
    if wanted.is_empty() {
        return None;
    }
    let full_header = wanted.contains("nplurals=");
    for rules in VARIANTS {
        let known = strip_expression(rules.expression);
        let matched = if full_header {
            wanted == known
        } else {
            plural_part(&wanted) == plural_part(&known)
        };
        if matched {
            return Some(rules.select);
        }
    }
    None
}

fn strip_expression(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .trim_end_matches(';')
        .chars()
        .collect()
}

fn plural_part(stripped: &str) -> String {
    match stripped.split_once("plural=") {
        Some((_, rest)) => {
            let mut part = String::from(rest);
            // Tolerate one layer of surrounding parentheses.
            if part.starts_with('(') && part.ends_with(')') {
                part = part[1..part.len() - 1].chars().collect();
            }
            part
        }
        None => String::from(stripped),
    }
}
