use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Typographic variants that are folded to their ASCII form.
const PUNCTUATION_FOLDS: [(char, char); 13] = [
    ('\u{2019}', '\''), // right single quotation mark
    ('\u{2018}', '\''), // left single quotation mark
    ('\u{201B}', '\''),
    ('\u{02BC}', '\''), // modifier letter apostrophe
    ('\u{2032}', '\''), // prime
    ('`', '\''),
    ('\u{2010}', '-'), // hyphen
    ('\u{2011}', '-'), // non-breaking hyphen
    ('\u{2012}', '-'), // figure dash
    ('\u{2013}', '-'), // en dash
    ('\u{2014}', '-'), // em dash
    ('\u{2015}', '-'), // horizontal bar
    ('\u{2212}', '-'), // minus sign
];

fn fold_punctuation(c: char) -> char {
    PUNCTUATION_FOLDS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

/// Turns a free-text candidate name into its comparison key.
///
/// The steps are applied in this order:
/// 1. typographic apostrophes, backticks and dashes become `'` and `-`
/// 2. the text is decomposed (NFD) and the combining marks are dropped
/// 3. runs of whitespace become a single space, and the ends are trimmed
/// 4. the text is lowercased
///
/// ```
/// use poll_merge::normalize;
///
/// assert_eq!(normalize("  Jean-Luc  MÉLENCHON "), "jean-luc melenchon");
/// assert_eq!(normalize("Nicolas Dupont\u{2013}Aignan"), "nicolas dupont-aignan");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    let folded: String = text.chars().map(fold_punctuation).collect();
    let stripped: String = folded.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<&str>>().join(" ");
    // Lowercasing may produce combining marks again (U+0130 gives "i\u{307}").
    collapsed
        .to_lowercase()
        .chars()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Same as [normalize], for optional values. A missing value has an empty key.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize("Éric Zemmour"), "eric zemmour");
        assert_eq!(normalize("François Bayrou"), "francois bayrou");
        assert_eq!(normalize("Nathalie ARTHAUD"), "nathalie arthaud");
    }

    #[test]
    fn unifies_punctuation() {
        assert_eq!(normalize("Jean\u{2014}Marie"), "jean-marie");
        assert_eq!(normalize("d\u{2019}Estaing"), "d'estaing");
        assert_eq!(normalize("d`Estaing"), "d'estaing");
        assert_eq!(normalize("Nicolas Dupont\u{2010}Aignan"), "nicolas dupont-aignan");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  jean \t  martin\n"), "jean martin");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn empty_and_missing() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some("Jean")), "jean");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "Éric Zemmour",
            "  Jean-Luc   Mélenchon",
            "Marine LE PEN",
            "d\u{2019}Estaing",
            "\u{130}stanbul",
            "Ségolène\u{00A0}Royal",
            "Ｆｕｌｌｗｉｄｔｈ",
            "",
            "ß",
        ];
        for s in samples.iter() {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }
}
