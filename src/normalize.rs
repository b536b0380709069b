use unicode_normalization::UnicodeNormalization;

const SUBSTITUTIONS: &[(char, Option<char>)] = &[
    ('\u{2018}', Some('\'')),
    ('\u{2019}', Some('\'')),
    ('\u{201B}', Some('\'')),
    ('\u{201C}', Some('"')),
    ('\u{201D}', Some('"')),
    ('\u{201E}', Some('"')),
    ('\u{00A0}', Some(' ')),
    ('\u{202F}', Some(' ')),
    ('\u{00B6}', None),
    ('\u{200B}', None),
    ('\u{200C}', None),
    ('\u{200D}', None),
    ('\u{FEFF}', None),
];

/// Applies the fixed substitution table, then canonical decomposition (NFD).
pub fn normalize_text(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let substituted: String = raw
        .chars()
        .filter_map(|ch| {
            match SUBSTITUTIONS.iter().find(|(from, _)| *from == ch) {
                Some((_, replacement)) => *replacement,
                None => Some(ch),
            }
        })
        .collect();

    substituted.nfd().collect::<String>().trim().to_string()
}
