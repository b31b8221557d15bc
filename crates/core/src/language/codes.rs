//! ISO 639 language code table.
//!
//! Configuration uses 639-1 codes (`en`, `nl`), OpenSubtitles answers with
//! 639-1 and Plex reports 639-2 codes in either the terminological (`deu`) or
//! bibliographic (`ger`) form. Everything is normalized to 639-1 internally.

/// One row of the language table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub iso639_1: &'static str,
    pub iso639_2t: &'static str,
    pub iso639_2b: &'static str,
    pub name: &'static str,
}

impl Language {
    /// Code Plex uses for stream languages.
    pub fn plex_code(&self) -> &'static str {
        self.iso639_2t
    }

    /// Every code this language may appear under in file names or API payloads.
    pub fn aliases(&self) -> Vec<&'static str> {
        let mut aliases = vec![self.iso639_1, self.iso639_2t];
        if self.iso639_2b != self.iso639_2t {
            aliases.push(self.iso639_2b);
        }
        aliases
    }
}

const fn lang(
    iso639_1: &'static str,
    iso639_2t: &'static str,
    iso639_2b: &'static str,
    name: &'static str,
) -> Language {
    Language {
        iso639_1,
        iso639_2t,
        iso639_2b,
        name,
    }
}

pub static LANGUAGES: &[Language] = &[
    lang("ar", "ara", "ara", "Arabic"),
    lang("bg", "bul", "bul", "Bulgarian"),
    lang("bs", "bos", "bos", "Bosnian"),
    lang("ca", "cat", "cat", "Catalan"),
    lang("cs", "ces", "cze", "Czech"),
    lang("da", "dan", "dan", "Danish"),
    lang("de", "deu", "ger", "German"),
    lang("el", "ell", "gre", "Greek"),
    lang("en", "eng", "eng", "English"),
    lang("es", "spa", "spa", "Spanish"),
    lang("et", "est", "est", "Estonian"),
    lang("eu", "eus", "baq", "Basque"),
    lang("fa", "fas", "per", "Persian"),
    lang("fi", "fin", "fin", "Finnish"),
    lang("fr", "fra", "fre", "French"),
    lang("he", "heb", "heb", "Hebrew"),
    lang("hi", "hin", "hin", "Hindi"),
    lang("hr", "hrv", "hrv", "Croatian"),
    lang("hu", "hun", "hun", "Hungarian"),
    lang("id", "ind", "ind", "Indonesian"),
    lang("is", "isl", "ice", "Icelandic"),
    lang("it", "ita", "ita", "Italian"),
    lang("ja", "jpn", "jpn", "Japanese"),
    lang("ko", "kor", "kor", "Korean"),
    lang("lt", "lit", "lit", "Lithuanian"),
    lang("lv", "lav", "lav", "Latvian"),
    lang("mk", "mkd", "mac", "Macedonian"),
    lang("ms", "msa", "may", "Malay"),
    lang("nl", "nld", "dut", "Dutch"),
    lang("no", "nor", "nor", "Norwegian"),
    lang("pl", "pol", "pol", "Polish"),
    lang("pt", "por", "por", "Portuguese"),
    lang("ro", "ron", "rum", "Romanian"),
    lang("ru", "rus", "rus", "Russian"),
    lang("sk", "slk", "slo", "Slovak"),
    lang("sl", "slv", "slv", "Slovenian"),
    lang("sq", "sqi", "alb", "Albanian"),
    lang("sr", "srp", "srp", "Serbian"),
    lang("sv", "swe", "swe", "Swedish"),
    lang("th", "tha", "tha", "Thai"),
    lang("tr", "tur", "tur", "Turkish"),
    lang("uk", "ukr", "ukr", "Ukrainian"),
    lang("vi", "vie", "vie", "Vietnamese"),
    lang("zh", "zho", "chi", "Chinese"),
];

/// Finds a language by any of its codes or its English name (case-insensitive).
///
/// Regional suffixes are ignored, so `pt-BR` and `pt_br` resolve to Portuguese.
pub fn lookup(code: &str) -> Option<&'static Language> {
    let code = code.trim().to_lowercase();
    let base = code.split(['-', '_']).next().unwrap_or_default();
    if base.is_empty() {
        return None;
    }

    LANGUAGES.iter().find(|l| {
        l.iso639_1 == base
            || l.iso639_2t == base
            || l.iso639_2b == base
            || l.name.eq_ignore_ascii_case(&code)
    })
}

/// Normalizes any supported code to ISO 639-1.
pub fn normalize(code: &str) -> Option<&'static str> {
    lookup(code).map(|l| l.iso639_1)
}

/// Whether two codes, in any supported form, name the same language.
pub fn same_language(a: &str, b: &str) -> bool {
    match (normalize(a), normalize(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_all_forms() {
        assert_eq!(lookup("nl").unwrap().name, "Dutch");
        assert_eq!(lookup("nld").unwrap().name, "Dutch");
        assert_eq!(lookup("dut").unwrap().name, "Dutch");
        assert_eq!(lookup("Dutch").unwrap().iso639_1, "nl");
        assert_eq!(lookup("DE").unwrap().iso639_2t, "deu");
    }

    #[test]
    fn test_lookup_regional_variant() {
        assert_eq!(normalize("pt-BR"), Some("pt"));
        assert_eq!(normalize("zh_tw"), Some("zh"));
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("xx").is_none());
        assert!(lookup("").is_none());
        assert!(lookup("   ").is_none());
    }

    #[test]
    fn test_plex_code() {
        assert_eq!(lookup("en").unwrap().plex_code(), "eng");
        assert_eq!(lookup("nl").unwrap().plex_code(), "nld");
        assert_eq!(lookup("de").unwrap().plex_code(), "deu");
    }

    #[test]
    fn test_aliases_include_bibliographic() {
        let aliases = lookup("fr").unwrap().aliases();
        assert_eq!(aliases, vec!["fr", "fra", "fre"]);

        let aliases = lookup("en").unwrap().aliases();
        assert_eq!(aliases, vec!["en", "eng"]);
    }

    #[test]
    fn test_same_language() {
        assert!(same_language("ger", "de"));
        assert!(same_language("eng", "EN"));
        assert!(!same_language("en", "nl"));
        assert!(!same_language("xx", "xx"));
    }

    #[test]
    fn test_table_has_unique_primary_codes() {
        let mut codes: Vec<_> = LANGUAGES.iter().map(|l| l.iso639_1).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), LANGUAGES.len());
    }
}
