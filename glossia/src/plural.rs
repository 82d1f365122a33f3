//! Pluralization rules
//!
//! Maps `(locale code, numeric value)` to a CLDR plural category. Languages
//! share rule bodies: the table below assigns each language one of 25 rules,
//! and unknown languages fall back to a rule that always selects `other`.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

/// CLDR plural categories.
///
/// Not all languages use all categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    /// Zero items (Arabic, Welsh)
    Zero,
    /// One item (most languages)
    One,
    /// Two items (Arabic, Welsh, Hebrew)
    Two,
    /// Few items (Slavic languages, Celtic languages)
    Few,
    /// Many items (Slavic languages, Arabic)
    Many,
    /// All other cases
    Other,
}

impl PluralCategory {
    /// Convert to the hash-label string.
    pub fn as_str(&self) -> &'static str {
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
        write!(f, "{}", self.as_str())
    }
}

/// A plural rule: maps a numeric value to its category.
pub type PluralRule = fn(f64) -> PluralCategory;

fn is_in(n: f64, list: &[f64]) -> bool {
    list.contains(&n)
}

fn is_between(n: f64, start: f64, end: f64) -> bool {
    start <= n && n <= end
}

use PluralCategory::{Few, Many, One, Other, Two, Zero};

fn rule00(_n: f64) -> PluralCategory {
    Other
}

fn rule01(n: f64) -> PluralCategory {
    if is_between(n % 100.0, 3.0, 10.0) {
        return Few;
    }
    if n == 0.0 {
        return Zero;
    }
    if is_between(n % 100.0, 11.0, 99.0) {
        return Many;
    }
    if n == 2.0 {
        return Two;
    }
    if n == 1.0 {
        return One;
    }
    Other
}

fn rule02(n: f64) -> PluralCategory {
    if n != 0.0 && n % 10.0 == 0.0 {
        return Many;
    }
    if n == 2.0 {
        return Two;
    }
    if n == 1.0 {
        return One;
    }
    Other
}

fn rule03(n: f64) -> PluralCategory {
    if n == 1.0 { One } else { Other }
}

fn rule04(n: f64) -> PluralCategory {
    if is_between(n, 0.0, 1.0) { One } else { Other }
}

fn rule05(n: f64) -> PluralCategory {
    if is_between(n, 0.0, 2.0) && n != 2.0 {
        One
    } else {
        Other
    }
}

fn rule06(n: f64) -> PluralCategory {
    if n == 0.0 {
        return Zero;
    }
    if n % 10.0 == 1.0 && n % 100.0 != 11.0 {
        return One;
    }
    Other
}

fn rule07(n: f64) -> PluralCategory {
    if n == 2.0 {
        return Two;
    }
    if n == 1.0 {
        return One;
    }
    Other
}

fn rule08(n: f64) -> PluralCategory {
    if is_between(n, 3.0, 6.0) {
        return Few;
    }
    if is_between(n, 7.0, 10.0) {
        return Many;
    }
    if n == 2.0 {
        return Two;
    }
    if n == 1.0 {
        return One;
    }
    Other
}

fn rule09(n: f64) -> PluralCategory {
    if n == 0.0 || (n != 1.0 && is_between(n % 100.0, 1.0, 19.0)) {
        return Few;
    }
    if n == 1.0 {
        return One;
    }
    Other
}

fn rule10(n: f64) -> PluralCategory {
    if is_between(n % 10.0, 2.0, 9.0) && !is_between(n % 100.0, 11.0, 19.0) {
        return Few;
    }
    if n % 10.0 == 1.0 && !is_between(n % 100.0, 11.0, 19.0) {
        return One;
    }
    Other
}

fn rule11(n: f64) -> PluralCategory {
    if is_between(n % 10.0, 2.0, 4.0) && !is_between(n % 100.0, 12.0, 14.0) {
        return Few;
    }
    if n % 10.0 == 0.0 || is_between(n % 10.0, 5.0, 9.0) || is_between(n % 100.0, 11.0, 14.0) {
        return Many;
    }
    if n % 10.0 == 1.0 && n % 100.0 != 11.0 {
        return One;
    }
    Other
}

fn rule12(n: f64) -> PluralCategory {
    if is_between(n, 2.0, 4.0) {
        return Few;
    }
    if n == 1.0 {
        return One;
    }
    Other
}

fn rule13(n: f64) -> PluralCategory {
    if is_between(n % 10.0, 2.0, 4.0) && !is_between(n % 100.0, 12.0, 14.0) {
        return Few;
    }
    if (n != 1.0 && is_between(n % 10.0, 0.0, 1.0))
        || is_between(n % 10.0, 5.0, 9.0)
        || is_between(n % 100.0, 12.0, 14.0)
    {
        return Many;
    }
    if n == 1.0 {
        return One;
    }
    Other
}

fn rule14(n: f64) -> PluralCategory {
    if is_between(n % 100.0, 3.0, 4.0) {
        return Few;
    }
    if n % 100.0 == 2.0 {
        return Two;
    }
    if n % 100.0 == 1.0 {
        return One;
    }
    Other
}

fn rule15(n: f64) -> PluralCategory {
    if n == 0.0 || is_between(n % 100.0, 2.0, 10.0) {
        return Few;
    }
    if is_between(n % 100.0, 11.0, 19.0) {
        return Many;
    }
    if n == 1.0 {
        return One;
    }
    Other
}

fn rule16(n: f64) -> PluralCategory {
    if n % 10.0 == 1.0 && n != 11.0 {
        return One;
    }
    Other
}

fn rule17(n: f64) -> PluralCategory {
    if n == 3.0 {
        return Few;
    }
    if n == 0.0 {
        return Zero;
    }
    if n == 6.0 {
        return Many;
    }
    if n == 2.0 {
        return Two;
    }
    if n == 1.0 {
        return One;
    }
    Other
}

fn rule18(n: f64) -> PluralCategory {
    if n == 0.0 {
        return Zero;
    }
    if is_between(n, 0.0, 2.0) && n != 0.0 && n != 2.0 {
        return One;
    }
    Other
}

fn rule19(n: f64) -> PluralCategory {
    if is_between(n, 2.0, 10.0) {
        return Few;
    }
    if is_between(n, 0.0, 1.0) {
        return One;
    }
    Other
}

fn rule20(n: f64) -> PluralCategory {
    if (is_between(n % 10.0, 3.0, 4.0) || n % 10.0 == 9.0)
        && !(is_between(n % 100.0, 10.0, 19.0)
            || is_between(n % 100.0, 70.0, 79.0)
            || is_between(n % 100.0, 90.0, 99.0))
    {
        return Few;
    }
    if n % 1_000_000.0 == 0.0 && n != 0.0 {
        return Many;
    }
    if n % 10.0 == 2.0 && !is_in(n % 100.0, &[12.0, 72.0, 92.0]) {
        return Two;
    }
    if n % 10.0 == 1.0 && !is_in(n % 100.0, &[11.0, 71.0, 91.0]) {
        return One;
    }
    Other
}

fn rule21(n: f64) -> PluralCategory {
    if n == 0.0 {
        return Zero;
    }
    if n == 1.0 {
        return One;
    }
    Other
}

fn rule22(n: f64) -> PluralCategory {
    if is_between(n, 0.0, 1.0) || is_between(n, 11.0, 99.0) {
        return One;
    }
    Other
}

fn rule23(n: f64) -> PluralCategory {
    if is_between(n % 10.0, 1.0, 2.0) || n % 20.0 == 0.0 {
        return One;
    }
    Other
}

fn rule24(n: f64) -> PluralCategory {
    if is_between(n, 3.0, 10.0) || is_between(n, 13.0, 19.0) {
        return Few;
    }
    if is_in(n, &[2.0, 12.0]) {
        return Two;
    }
    if is_in(n, &[1.0, 11.0]) {
        return One;
    }
    Other
}

const RULES: [PluralRule; 25] = [
    rule00, rule01, rule02, rule03, rule04, rule05, rule06, rule07, rule08, rule09, rule10,
    rule11, rule12, rule13, rule14, rule15, rule16, rule17, rule18, rule19, rule20, rule21,
    rule22, rule23, rule24,
];

#[rustfmt::skip]
static LOCALES_TO_RULES: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    [
        ("af", 3), ("ak", 4), ("am", 4), ("ar", 1), ("asa", 3), ("az", 0),
        ("be", 11), ("bem", 3), ("bez", 3), ("bg", 3), ("bh", 4), ("bm", 0),
        ("bn", 3), ("bo", 0), ("br", 20), ("brx", 3), ("bs", 11), ("ca", 3),
        ("cgg", 3), ("chr", 3), ("cs", 12), ("cy", 17), ("da", 3), ("de", 3),
        ("dv", 3), ("dz", 0), ("ee", 3), ("el", 3), ("en", 3), ("eo", 3),
        ("es", 3), ("et", 3), ("eu", 3), ("fa", 0), ("ff", 5), ("fi", 3),
        ("fil", 4), ("fo", 3), ("fr", 5), ("fur", 3), ("fy", 3), ("ga", 8),
        ("gd", 24), ("gl", 3), ("gsw", 3), ("gu", 3), ("guw", 4), ("gv", 23),
        ("ha", 3), ("haw", 3), ("he", 2), ("hi", 4), ("hr", 11), ("hu", 0),
        ("id", 0), ("ig", 0), ("ii", 0), ("is", 3), ("it", 3), ("iu", 7),
        ("ja", 0), ("jmc", 3), ("jv", 0), ("ka", 0), ("kab", 5), ("kaj", 3),
        ("kcg", 3), ("kde", 0), ("kea", 0), ("kk", 3), ("kl", 3), ("km", 0),
        ("kn", 0), ("ko", 0), ("ksb", 3), ("ksh", 21), ("ku", 3), ("kw", 7),
        ("lag", 18), ("lb", 3), ("lg", 3), ("ln", 4), ("lo", 0), ("lt", 10),
        ("lv", 6), ("mas", 3), ("mg", 4), ("mk", 16), ("ml", 3), ("mn", 3),
        ("mo", 9), ("mr", 3), ("ms", 0), ("mt", 15), ("my", 0), ("nah", 3),
        ("naq", 7), ("nb", 3), ("nd", 3), ("ne", 3), ("nl", 3), ("nn", 3),
        ("no", 3), ("nr", 3), ("nso", 4), ("ny", 3), ("nyn", 3), ("om", 3),
        ("or", 3), ("pa", 3), ("pap", 3), ("pl", 13), ("ps", 3), ("pt", 3),
        ("rm", 3), ("ro", 9), ("rof", 3), ("ru", 11), ("rwk", 3), ("sah", 0),
        ("saq", 3), ("se", 7), ("seh", 3), ("ses", 0), ("sg", 0), ("sh", 11),
        ("shi", 19), ("sk", 12), ("sl", 14), ("sma", 7), ("smi", 7), ("smj", 7),
        ("smn", 7), ("sms", 7), ("sn", 3), ("so", 3), ("sq", 3), ("sr", 11),
        ("ss", 3), ("ssy", 3), ("st", 3), ("sv", 3), ("sw", 3), ("syr", 3),
        ("ta", 3), ("te", 3), ("teo", 3), ("th", 0), ("ti", 4), ("tig", 3),
        ("tk", 3), ("tl", 4), ("tn", 3), ("to", 0), ("tr", 0), ("ts", 3),
        ("tzm", 22), ("uk", 11), ("ur", 3), ("ve", 3), ("vi", 0), ("vun", 3),
        ("wa", 4), ("wae", 3), ("wo", 0), ("xh", 3), ("xog", 3), ("yo", 0),
        ("zh", 0), ("zu", 3),
    ]
    .into_iter()
    .collect()
});

/// Look up the plural rule for a locale code.
///
/// Only the language subtag is significant; unknown languages get a rule
/// that always selects [`PluralCategory::Other`].
pub fn plural_rule(code: &str) -> PluralRule {
    let lang = match code.find('-') {
        Some(pos) => &code[..pos],
        None => code,
    };
    match LOCALES_TO_RULES.get(lang) {
        Some(&index) => RULES[index],
        None => rule00,
    }
}

/// The plural category for a number in a locale.
///
/// # Example
///
/// ```
/// use glossia::plural::{plural_category, PluralCategory};
///
/// assert_eq!(plural_category(1.0, "en"), PluralCategory::One);
/// assert_eq!(plural_category(2.0, "en"), PluralCategory::Other);
/// assert_eq!(plural_category(0.0, "fr"), PluralCategory::One);
/// ```
pub fn plural_category(n: f64, code: &str) -> PluralCategory {
    plural_rule(code)(n)
}
