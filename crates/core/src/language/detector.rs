//! Stop-word and script based language detection for subtitle text.
//!
//! Close relatives share a family. Stop-words pick the family, then
//! marker words pick the member.
//!
//! Detection is deliberately conservative: anything short, mixed or
//! ambiguous comes back [`Detection::Inconclusive`] and fails verification.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::codes;

/// Cleaned text shorter than this is never classified.
const MIN_TEXT_CHARS: usize = 50;
/// Upper bound on words inspected per subtitle.
const SAMPLE_WORDS: usize = 2000;
/// Minimum weighted stop-word hits for a Latin/Cyrillic verdict.
const MIN_SCORE: f64 = 3.0;
/// Minimum share of sampled words that must be stop-words of the winner.
const MIN_DENSITY: f64 = 0.05;
/// The winner must beat the runner-up by this factor.
const MIN_MARGIN: f64 = 1.25;
/// Marker hits needed to pick one language out of a family.
const MIN_MARKERS: usize = 2;
/// The chosen family member must have this many times the markers of any other.
const MARKER_MARGIN: usize = 2;
/// Share of letters a script needs before it decides the language.
const SCRIPT_DOMINANCE: f64 = 0.6;

static SRT_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*\d+\s*$").unwrap());
static TIMING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,2}:\d{2}:\d{2}[,.]\d{3}\s*-->\s*\d{1,2}:\d{2}:\d{2}[,.]\d{3}[^\n]*").unwrap()
});
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static ASS_OVERRIDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());

/// Stop words of one language, plus the words that set it apart from the
/// other members of its family.
#[derive(Debug, Clone, Copy)]
struct Profile {
    code: &'static str,
    stop_words: &'static [&'static str],
    markers: &'static [&'static str],
}

impl Profile {
    const fn new(code: &'static str, stop_words: &'static [&'static str]) -> Self {
        Self {
            code,
            stop_words,
            markers: &[],
        }
    }

    const fn with_markers(self, markers: &'static [&'static str]) -> Self {
        Self { markers, ..self }
    }
}

/// Languages too close to tell apart on common stop words. A family is
/// chosen first, then one member by its markers.
type Family = &'static [Profile];

const LATIN_FAMILIES: &[Family] = &[
    &[Profile::new(
        "en",
        &[
            "the", "and", "you", "that", "what", "this", "is", "to", "of", "it", "have", "not",
            "was", "are", "with", "for", "me", "my", "we", "he", "she", "your", "just", "know",
            "be", "all", "there", "don", "can", "right",
        ],
    )],
    &[Profile::new(
        "nl",
        &[
            "de", "het", "een", "en", "is", "dat", "niet", "ik", "je", "van", "wat", "op",
            "zijn", "maar", "met", "voor", "hij", "ze", "er", "hebben", "naar", "jij", "wij",
            "mij", "dit", "kan", "niets", "hier", "waar", "weet",
        ],
    )],
    &[Profile::new(
        "de",
        &[
            "der", "die", "das", "und", "ist", "nicht", "ich", "du", "sie", "es", "ein",
            "eine", "zu", "mit", "den", "auf", "was", "wir", "mir", "dich", "ihr", "haben",
            "sein", "hier", "aber", "wie", "nein", "ja", "noch", "schon",
        ],
    )],
    &[Profile::new(
        "fr",
        &[
            "le", "la", "les", "et", "est", "je", "tu", "vous", "nous", "il", "elle", "pas",
            "un", "une", "de", "des", "que", "qui", "ce", "ça", "mais", "pour", "avec", "sur",
            "dans", "suis", "moi", "toi", "oui", "non",
        ],
    )],
    &[
        Profile::new(
            "es",
            &[
                "el", "la", "los", "las", "y", "es", "que", "no", "de", "en", "un", "una",
                "por", "con", "para", "yo", "tú", "usted", "lo", "le", "se", "pero", "qué",
                "está", "esto", "muy", "bien", "aquí", "sí", "nada",
            ],
        )
        .with_markers(&[
            "el", "los", "las", "y", "usted", "qué", "esto", "muy", "bien", "aquí", "sí", "yo",
            "hay", "también", "ahora", "eres", "soy", "estoy", "hacer", "cómo", "dónde",
            "ella", "tengo", "puedo",
        ]),
        Profile::new(
            "pt",
            &[
                "o", "a", "os", "as", "e", "é", "que", "não", "de", "em", "um", "uma", "por",
                "com", "para", "eu", "você", "ele", "ela", "mas", "isso", "aqui", "está",
                "estou", "muito", "bem", "sim", "nada", "tem", "vai",
            ],
        )
        .with_markers(&[
            "não", "você", "isso", "é", "os", "eu", "uma", "em", "estou", "muito", "bem",
            "sim", "aqui", "também", "agora", "fazer", "onde", "nós", "meu", "minha",
            "obrigado", "ele", "ela",
        ]),
        Profile::new(
            "it",
            &[
                "il", "lo", "la", "gli", "le", "e", "è", "che", "non", "di", "un", "una",
                "per", "con", "sono", "io", "tu", "lui", "lei", "ma", "cosa", "questo", "qui",
                "sei", "ho", "hai", "bene", "perché", "niente", "come",
            ],
        )
        .with_markers(&[
            "il", "gli", "è", "che", "non", "di", "per", "sono", "io", "lui", "lei", "cosa",
            "questo", "qui", "ho", "hai", "bene", "perché", "niente", "come", "anche",
            "adesso", "fare", "dove", "mio", "grazie",
        ]),
    ],
    &[
        Profile::new(
            "sv",
            &[
                "och", "att", "det", "som", "en", "är", "jag", "du", "inte", "på", "med",
                "har", "för", "han", "hon", "vi", "ni", "den", "vad", "här", "kan", "ska",
                "mig", "dig", "nej", "ja", "bara", "så", "om", "var",
            ],
        )
        .with_markers(&[
            "och", "inte", "är", "jag", "vad", "hur", "också", "någon", "något", "mycket",
            "varför", "vem", "kanske", "hon", "honom", "ni", "gör", "säger", "vill", "bara",
            "hjälp", "göra",
        ]),
        Profile::new(
            "da",
            &[
                "og", "at", "det", "som", "en", "er", "jeg", "du", "ikke", "på", "med", "har",
                "for", "han", "hun", "vi", "der", "hvad", "her", "kan", "skal", "mig", "dig",
                "nej", "ja", "bare", "så", "jer", "hvorfor", "til",
            ],
        )
        .with_markers(&[
            "hvad", "af", "ud", "op", "meget", "noget", "nogen", "hende", "mand", "sådan",
            "tak", "lige", "gøre", "blive", "bliver", "vores", "jer", "måske", "mit", "dit",
            "sit", "os", "hjælp",
        ]),
        Profile::new(
            "no",
            &[
                "og", "at", "det", "som", "en", "er", "jeg", "du", "ikke", "på", "med", "har",
                "for", "han", "hun", "vi", "hva", "her", "kan", "skal", "meg", "deg", "nei",
                "ja", "bare", "så", "dere", "hvorfor", "til", "noe",
            ],
        )
        .with_markers(&[
            "hva", "meg", "deg", "seg", "noe", "noen", "mye", "etter", "opp", "mann", "sånn",
            "takk", "gjøre", "nei", "veldig", "dere", "kanskje", "hjelp", "ikkje",
        ]),
    ],
    &[Profile::new(
        "fi",
        &[
            "ja", "on", "ei", "se", "että", "en", "hän", "mitä", "minä", "sinä", "me", "te",
            "he", "oli", "olen", "olet", "tämä", "mutta", "kun", "niin", "nyt", "vain", "jos",
            "kanssa", "mikä", "tässä", "siellä", "täällä", "kaikki", "voi",
        ],
    )],
    &[
        Profile::new(
            "pl",
            &[
                "nie", "się", "to", "jest", "że", "w", "na", "i", "z", "co", "jak", "ale",
                "tak", "ja", "ty", "mnie", "mi", "go", "już", "tu", "czy", "jestem", "był",
                "może", "tylko", "dla", "wiem", "proszę", "dobrze", "o",
            ],
        )
        .with_markers(&[
            "nie", "się", "że", "jest", "już", "czy", "jestem", "był", "może", "tylko", "dla",
            "wiem", "proszę", "dobrze", "mnie", "ja", "tego", "jego", "mam", "chcę",
            "wszystko", "dzięki", "teraz", "gdzie", "bardzo",
        ]),
        Profile::new(
            "cs",
            &[
                "a", "je", "to", "se", "na", "že", "v", "ne", "co", "jsem", "jak", "ale",
                "tak", "já", "ty", "mě", "mi", "by", "tady", "už", "jsi", "být", "pro", "s",
                "z", "nic", "dobře", "ano", "ten", "tohle",
            ],
        )
        .with_markers(&[
            "je", "se", "že", "ne", "jsem", "jsi", "já", "mě", "tady", "už", "být", "pro",
            "tohle", "dobře", "ano", "jeho", "mám", "chci", "všechno", "děkuji", "teď", "kde",
            "moc", "velmi", "není",
        ]),
    ],
    &[Profile::new(
        "ro",
        &[
            "și", "nu", "este", "în", "de", "la", "că", "ce", "pe", "cu", "o", "un", "să",
            "mă", "eu", "tu", "el", "ea", "am", "ai", "asta", "aici", "da", "dar", "mai",
            "foarte", "bine", "acum", "sunt", "pentru",
        ],
    )],
    &[Profile::new(
        "hu",
        &[
            "a", "az", "és", "hogy", "nem", "is", "egy", "van", "meg", "mi", "te", "ez", "azt",
            "de", "csak", "már", "igen", "jó", "itt", "mit", "ki", "én", "vagy", "volt",
            "lesz", "kell", "most", "még", "nagyon", "miért",
        ],
    )],
    &[Profile::new(
        "tr",
        &[
            "bir", "bu", "ve", "ne", "de", "da", "ben", "sen", "o", "için", "ama", "çok",
            "var", "yok", "mi", "mı", "evet", "hayır", "şey", "gibi", "daha", "iyi", "burada",
            "neden", "nasıl", "biz", "siz", "onu", "beni", "seni",
        ],
    )],
];

const CYRILLIC_FAMILIES: &[Family] = &[
    &[
        Profile::new(
            "ru",
            &[
                "и", "в", "не", "что", "я", "ты", "он", "она", "на", "это", "с", "как", "мы",
                "вы", "но", "да", "нет", "так", "все", "его", "меня", "тебя", "был", "здесь",
                "только", "уже", "мне", "вот", "ну", "тут",
            ],
        )
        .with_markers(&[
            "что", "он", "она", "это", "мы", "вы", "нет", "его", "меня", "тебя", "был",
            "здесь", "только", "уже", "мне", "вот", "есть", "будет", "хорошо", "сейчас",
            "могу", "почему", "ничего", "где", "тоже", "очень",
        ]),
        Profile::new(
            "uk",
            &[
                "і", "в", "не", "що", "я", "ти", "він", "вона", "на", "це", "з", "як", "ми",
                "ви", "але", "так", "ні", "все", "його", "мене", "тебе", "був", "тут",
                "тільки", "вже", "мені", "є", "та", "до", "бути",
            ],
        )
        .with_markers(&[
            "і", "що", "він", "вона", "це", "з", "але", "ні", "його", "мене", "був", "тільки",
            "вже", "мені", "є", "бути", "також", "дуже", "зараз", "чому", "нічого", "треба",
            "мій", "твій",
        ]),
        Profile::new(
            "bg",
            &[
                "и", "в", "не", "че", "аз", "ти", "той", "тя", "на", "това", "с", "как", "ние",
                "вие", "но", "да", "така", "всичко", "го", "ме", "те", "беше", "тук", "само",
                "вече", "ми", "е", "за", "от", "какво",
            ],
        )
        .with_markers(&[
            "че", "аз", "той", "тя", "това", "ние", "вие", "всичко", "го", "ме", "беше", "тук",
            "само", "вече", "е", "какво", "съм", "си", "искам", "няма", "ще", "трябва", "защо",
            "нищо", "къде", "много",
        ]),
    ],
];

/// Languages recognized from their writing system alone.
const SCRIPT_LANGUAGES: &[&str] = &["ko", "ja", "zh", "el", "he", "th", "hi", "ar", "fa"];

/// Word -> number of families listing it.
static LATIN_SHARES: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| share_counts(LATIN_FAMILIES));
static CYRILLIC_SHARES: Lazy<HashMap<&'static str, usize>> =
    Lazy::new(|| share_counts(CYRILLIC_FAMILIES));

fn share_counts(families: &[Family]) -> HashMap<&'static str, usize> {
    let mut shares = HashMap::new();
    for family in families {
        let words: HashSet<&'static str> = family
            .iter()
            .flat_map(|p| p.stop_words.iter().copied())
            .collect();
        for word in words {
            *shares.entry(word).or_insert(0) += 1;
        }
    }
    shares
}

/// Outcome of a detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// ISO 639-1 code of the detected language.
    Detected(&'static str),
    Inconclusive,
}

#[derive(Debug, Default, Clone, Copy)]
struct ScriptCounts {
    latin: usize,
    cyrillic: usize,
    greek: usize,
    hebrew: usize,
    arabic: usize,
    persian_letters: usize,
    thai: usize,
    devanagari: usize,
    hangul: usize,
    kana: usize,
    han: usize,
}

impl ScriptCounts {
    fn of(text: &str) -> Self {
        let mut counts = Self::default();
        for c in text.chars().filter(|c| c.is_alphabetic()) {
            match c as u32 {
                0x0041..=0x024F => counts.latin += 1,
                0x0370..=0x03FF => counts.greek += 1,
                0x0400..=0x04FF => counts.cyrillic += 1,
                0x0590..=0x05FF => counts.hebrew += 1,
                0x0600..=0x06FF => {
                    counts.arabic += 1;
                    if matches!(c, 'پ' | 'چ' | 'ژ' | 'گ' | 'ی') {
                        counts.persian_letters += 1;
                    }
                }
                0x0900..=0x097F => counts.devanagari += 1,
                0x0E00..=0x0E7F => counts.thai += 1,
                0x1100..=0x11FF | 0xAC00..=0xD7AF => counts.hangul += 1,
                0x3040..=0x30FF => counts.kana += 1,
                0x4E00..=0x9FFF => counts.han += 1,
                _ => {}
            }
        }
        counts
    }

    fn total(&self) -> usize {
        self.latin
            + self.cyrillic
            + self.greek
            + self.hebrew
            + self.arabic
            + self.thai
            + self.devanagari
            + self.hangul
            + self.kana
            + self.han
    }
}

/// Verifies that subtitle text is written in the language it claims.
#[derive(Debug, Clone, Default)]
pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        Self
    }

    /// Whether this detector can ever confirm `code`.
    pub fn supports(&self, code: &str) -> bool {
        let Some(code) = codes::normalize(code) else {
            return false;
        };
        SCRIPT_LANGUAGES.contains(&code)
            || LATIN_FAMILIES
                .iter()
                .chain(CYRILLIC_FAMILIES)
                .flat_map(|family| family.iter())
                .any(|p| p.code == code)
    }

    /// Returns `true` only when the text is confidently detected as `claimed`.
    ///
    /// Short, mixed or unrecognized content returns `false`.
    pub fn verify(&self, subtitle_text: &str, claimed: &str) -> bool {
        let Some(claimed) = codes::normalize(claimed) else {
            debug!(claimed, "Unknown claimed language, rejecting");
            return false;
        };

        match self.detect(subtitle_text) {
            Detection::Detected(code) if code == claimed => true,
            Detection::Detected(code) => {
                debug!(claimed, detected = code, "Language mismatch");
                false
            }
            Detection::Inconclusive => {
                debug!(claimed, "Language detection inconclusive, rejecting");
                false
            }
        }
    }

    /// Detects the language of raw subtitle file content (SRT, VTT or ASS).
    pub fn detect(&self, subtitle_text: &str) -> Detection {
        let text = clean_subtitle_text(subtitle_text);
        if text.chars().count() < MIN_TEXT_CHARS {
            return Detection::Inconclusive;
        }

        let scripts = ScriptCounts::of(&text);
        let total = scripts.total();
        if total == 0 {
            return Detection::Inconclusive;
        }
        let share = |n: usize| n as f64 / total as f64;

        if share(scripts.hangul) >= 0.5 {
            return Detection::Detected("ko");
        }
        let cjk = scripts.kana + scripts.han;
        if share(cjk) >= 0.5 {
            return if scripts.kana * 10 >= cjk {
                Detection::Detected("ja")
            } else {
                Detection::Detected("zh")
            };
        }

        let dominant = [
            ("el", scripts.greek),
            ("he", scripts.hebrew),
            ("th", scripts.thai),
            ("hi", scripts.devanagari),
        ];
        for (code, count) in dominant {
            if share(count) >= SCRIPT_DOMINANCE {
                return Detection::Detected(code);
            }
        }

        if share(scripts.arabic) >= SCRIPT_DOMINANCE {
            return if scripts.persian_letters * 100 >= scripts.arabic {
                Detection::Detected("fa")
            } else {
                Detection::Detected("ar")
            };
        }
        if share(scripts.cyrillic) >= SCRIPT_DOMINANCE {
            return score_stop_words(&text, CYRILLIC_FAMILIES, &CYRILLIC_SHARES);
        }
        if share(scripts.latin) >= SCRIPT_DOMINANCE {
            return score_stop_words(&text, LATIN_FAMILIES, &LATIN_SHARES);
        }

        Detection::Inconclusive
    }
}

fn score_stop_words(
    text: &str,
    families: &[Family],
    shares: &HashMap<&'static str, usize>,
) -> Detection {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .take(SAMPLE_WORDS)
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        return Detection::Inconclusive;
    }

    // Words listed by several families count fractionally toward each.
    let mut scores: Vec<(Family, f64)> = families
        .iter()
        .map(|family| {
            let score: f64 = words
                .iter()
                .filter(|w| family.iter().any(|p| p.stop_words.contains(&w.as_str())))
                .map(|w| 1.0 / shares.get(w.as_str()).copied().unwrap_or(1) as f64)
                .sum();
            (*family, score)
        })
        .collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (family, best) = scores[0];
    let runner_up = scores.get(1).map(|s| s.1).unwrap_or(0.0);
    let density = best / words.len() as f64;

    if best < MIN_SCORE || density < MIN_DENSITY || best < runner_up * MIN_MARGIN {
        debug!(
            family = family[0].code,
            score = best,
            runner_up,
            density,
            "Stop-word evidence too weak"
        );
        return Detection::Inconclusive;
    }

    match family {
        [only] => Detection::Detected(only.code),
        members => pick_family_member(&words, members),
    }
}

fn pick_family_member(words: &[String], members: &[Profile]) -> Detection {
    let mut hits: Vec<(&'static str, usize)> = members
        .iter()
        .map(|p| {
            let count = words
                .iter()
                .filter(|w| p.markers.contains(&w.as_str()))
                .count();
            (p.code, count)
        })
        .collect();
    hits.sort_by(|a, b| b.1.cmp(&a.1));

    let (code, best) = hits[0];
    let runner_up = hits.get(1).map(|h| h.1).unwrap_or(0);
    if best < MIN_MARKERS || best < runner_up * MARKER_MARGIN {
        debug!(best = code, markers = best, runner_up, "Family members too close to call");
        return Detection::Inconclusive;
    }
    Detection::Detected(code)
}

/// Strips numbering, timing lines, markup and styling from subtitle content
/// and collapses whitespace.
pub fn clean_subtitle_text(content: &str) -> String {
    let dialogue: String = if content.contains("[Events]") {
        // ASS/SSA: the text is the tenth field of each Dialogue line.
        content
            .lines()
            .filter(|l| l.starts_with("Dialogue:"))
            .filter_map(|l| l.splitn(10, ',').nth(9))
            .map(|t| t.replace("\\N", " ").replace("\\n", " "))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        content.replace("WEBVTT", "")
    };

    let text = TIMING.replace_all(&dialogue, "");
    let text = SRT_INDEX.replace_all(&text, "");
    let text = HTML_TAG.replace_all(&text, "");
    let text = ASS_OVERRIDE.replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGLISH_SRT: &str = "1
00:00:01,000 --> 00:00:03,500
<i>I don't know what you are talking about.</i>

2
00:00:04,000 --> 00:00:06,000
We have to go. There is no time for this.

3
00:00:06,500 --> 00:00:09,000
You said that it was safe, and it is not.

4
00:00:09,500 --> 00:00:12,000
Just tell me the truth. Can you do that for me?
";

    const DUTCH_SRT: &str = "1
00:00:01,000 --> 00:00:03,500
Ik weet niet wat je bedoelt.

2
00:00:04,000 --> 00:00:06,000
Het is hier niet veilig voor ons, maar we hebben geen keus.

3
00:00:06,500 --> 00:00:09,000
Waar is de auto? Ik heb hem daar gezien.

4
00:00:09,500 --> 00:00:12,000
Zeg me de waarheid. Kan je dat voor mij doen?
";

    const GERMAN_SRT: &str = "1
00:00:01,000 --> 00:00:03,500
Ich weiß nicht, was du meinst.

2
00:00:04,000 --> 00:00:06,000
Es ist hier nicht sicher für uns, aber wir haben keine Wahl.

3
00:00:06,500 --> 00:00:09,000
Wo ist das Auto? Ich habe es dort gesehen.

4
00:00:09,500 --> 00:00:12,000
Sag mir die Wahrheit. Kannst du das für mich tun?
";

    /// One short dialogue per stop-word profile.
    const SAMPLES: &[(&str, &[&str])] = &[
        (
            "en",
            &[
                "I don't know what you are talking about.",
                "We have to go. There is no time for this.",
                "You said that it was safe, and it is not.",
                "Just tell me the truth. Can you do that for me?",
            ],
        ),
        (
            "nl",
            &[
                "Ik weet niet wat je bedoelt.",
                "Het is hier niet veilig voor ons, maar we hebben geen keus.",
                "Waar is de auto? Ik heb hem daar gezien.",
                "Zeg me de waarheid. Kan je dat voor mij doen?",
            ],
        ),
        (
            "de",
            &[
                "Ich weiß nicht, was du meinst.",
                "Es ist hier nicht sicher für uns, aber wir haben keine Wahl.",
                "Wo ist das Auto? Ich habe es dort gesehen.",
                "Sag mir die Wahrheit. Kannst du das für mich tun?",
            ],
        ),
        (
            "fr",
            &[
                "Je ne sais pas de quoi tu parles.",
                "On doit partir maintenant. Il n'y a pas le temps pour ça.",
                "Tu as dit que c'était sûr, mais ce n'est pas le cas.",
                "Pourquoi tu ne m'as rien dit sur elle ?",
                "Dis-moi la vérité. Tu peux faire ça pour moi ?",
            ],
        ),
        (
            "es",
            &[
                "No sé de qué estás hablando.",
                "Tenemos que irnos ahora. No hay tiempo para esto.",
                "Dijiste que era seguro, pero no lo es.",
                "¿Por qué no me has dicho nada de ella?",
                "Dime la verdad. ¿Puedes hacer eso por mí?",
            ],
        ),
        (
            "pt",
            &[
                "Eu não sei do que você está falando.",
                "Temos que ir agora. Não há tempo para isso.",
                "Você disse que era seguro, mas não é.",
                "Por que você não me contou nada sobre ela?",
                "Diga a verdade. Você pode fazer isso por mim?",
            ],
        ),
        (
            "it",
            &[
                "Non so di cosa stai parlando.",
                "Dobbiamo andare adesso. Non c'è tempo per questo.",
                "Hai detto che era sicuro, ma non lo è.",
                "Perché non mi hai detto niente di lei?",
                "Dimmi la verità. Puoi farlo per me?",
            ],
        ),
        (
            "sv",
            &[
                "Jag vet inte vad du pratar om.",
                "Vi måste gå nu. Det finns ingen tid för det här.",
                "Du sa att det var säkert, men det är det inte.",
                "Varför har du inte berättat något om henne för mig?",
                "Säg sanningen. Kan du göra det för mig?",
            ],
        ),
        (
            "da",
            &[
                "Jeg ved ikke, hvad du taler om.",
                "Vi er nødt til at gå nu. Der er ikke tid til det her.",
                "Du sagde, at det var sikkert, men det er det ikke.",
                "Hvorfor har du ikke fortalt mig noget om hende?",
                "Sig mig sandheden. Kan du gøre det for mig?",
            ],
        ),
        (
            "no",
            &[
                "Jeg vet ikke hva du snakker om.",
                "Vi må gå nå. Det er ikke tid til dette.",
                "Du sa at det var trygt, men det er det ikke.",
                "Hvorfor har du ikke fortalt meg noe om henne?",
                "Si meg sannheten. Kan du gjøre det for meg?",
            ],
        ),
        (
            "fi",
            &[
                "En tiedä, mistä sinä puhut.",
                "Meidän täytyy lähteä nyt. Tähän ei ole aikaa.",
                "Sanoit, että se on turvallista, mutta ei se ole.",
                "Miksi et ole kertonut minulle mitään hänestä?",
                "Kerro minulle totuus. Voitko tehdä sen minun vuokseni?",
            ],
        ),
        (
            "pl",
            &[
                "Nie wiem, o czym mówisz.",
                "Musimy już iść. Nie ma na to czasu.",
                "Mówiłeś, że to jest bezpieczne, ale nie jest.",
                "Dlaczego nic mi o niej nie powiedziałeś?",
                "Powiedz mi prawdę. Możesz to dla mnie zrobić?",
            ],
        ),
        (
            "cs",
            &[
                "Nevím, o čem mluvíš.",
                "Musíme jít hned. Není na to čas.",
                "Říkal jsi, že je to bezpečné, ale není.",
                "Proč jsi mi o ní nic neřekl?",
                "Řekni mi pravdu. Můžeš to pro mě udělat?",
            ],
        ),
        (
            "ro",
            &[
                "Nu știu despre ce vorbești.",
                "Trebuie să plecăm acum. Nu avem timp pentru asta.",
                "Ai spus că este sigur, dar nu este.",
                "De ce nu mi-ai spus nimic despre ea?",
                "Spune-mi adevărul. Poți face asta pentru mine?",
            ],
        ),
        (
            "hu",
            &[
                "Nem tudom, miről beszélsz.",
                "Most mennünk kell. Nincs erre időnk.",
                "Azt mondtad, hogy biztonságos, de nem az.",
                "Miért nem mondtál nekem semmit róla?",
                "Mondd meg az igazat. Meg tudod ezt tenni értem?",
            ],
        ),
        (
            "tr",
            &[
                "Ne dediğini bilmiyorum.",
                "Şimdi gitmemiz lazım. Bunun için vaktimiz yok.",
                "Güvenli olduğunu söyledin ama değil.",
                "Neden bana onun hakkında bir şey söylemedin?",
                "Bana gerçeği söyle. Bunu benim için yapabilir misin?",
            ],
        ),
        (
            "ru",
            &[
                "Я не знаю, о чём ты говоришь.",
                "Нам нужно уходить сейчас. Здесь нет времени на это.",
                "Ты сказал, что это безопасно, но это не так.",
                "Почему ты ничего мне о ней не рассказал?",
                "Скажи мне правду. Ты можешь сделать это для меня?",
            ],
        ),
        (
            "uk",
            &[
                "Я не знаю, про що ти говориш.",
                "Нам треба йти зараз. Тут немає часу на це.",
                "Ти сказав, що це безпечно, але це не так.",
                "Чому ти нічого мені про неї не розповів?",
                "Скажи мені правду. Ти можеш зробити це для мене?",
            ],
        ),
        (
            "bg",
            &[
                "Не знам за какво говориш.",
                "Трябва да тръгваме веднага. Няма време за това.",
                "Ти каза, че е безопасно, но не е.",
                "Защо не ми каза нищо за нея?",
                "Кажи ми истината. Можеш ли да направиш това за мен?",
            ],
        ),
    ];

    fn srt(lines: &[&str]) -> String {
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                format!(
                    "{}\n00:00:{:02},000 --> 00:00:{:02},500\n{}\n",
                    i + 1,
                    i * 3 + 1,
                    i * 3 + 3,
                    line
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn sample(code: &str) -> String {
        let (_, lines) = SAMPLES
            .iter()
            .find(|(c, _)| *c == code)
            .unwrap_or_else(|| panic!("no sample for {code}"));
        srt(lines)
    }

    #[test]
    fn test_clean_removes_srt_structure() {
        let cleaned = clean_subtitle_text(ENGLISH_SRT);
        assert!(!cleaned.contains("-->"));
        assert!(!cleaned.contains("<i>"));
        assert!(!cleaned.starts_with('1'));
        assert!(cleaned.starts_with("I don't know"));
    }

    #[test]
    fn test_clean_extracts_ass_dialogue() {
        let ass = "[Script Info]
Title: Test

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,{\\i1}Hello there,\\Nmy friend
";
        assert_eq!(clean_subtitle_text(ass), "Hello there, my friend");
    }

    #[test]
    fn test_detects_english() {
        assert_eq!(LanguageDetector::new().detect(ENGLISH_SRT), Detection::Detected("en"));
    }

    #[test]
    fn test_detects_dutch() {
        assert_eq!(LanguageDetector::new().detect(DUTCH_SRT), Detection::Detected("nl"));
    }

    #[test]
    fn test_detects_german() {
        assert_eq!(LanguageDetector::new().detect(GERMAN_SRT), Detection::Detected("de"));
    }

    #[test]
    fn test_verify_matches_claim() {
        let detector = LanguageDetector::new();
        assert!(detector.verify(ENGLISH_SRT, "en"));
        assert!(detector.verify(ENGLISH_SRT, "eng"));
        assert!(detector.verify(DUTCH_SRT, "nld"));
    }

    #[test]
    fn test_verify_rejects_mislabeled() {
        let detector = LanguageDetector::new();
        assert!(!detector.verify(ENGLISH_SRT, "nl"));
        assert!(!detector.verify(DUTCH_SRT, "de"));
    }

    #[test]
    fn test_short_text_fails_closed() {
        let short = "1\n00:00:01,000 --> 00:00:02,000\nHello!\n";
        let detector = LanguageDetector::new();
        assert_eq!(detector.detect(short), Detection::Inconclusive);
        assert!(!detector.verify(short, "en"));
    }

    #[test]
    fn test_non_linguistic_content_fails_closed() {
        let noise = "1\n00:00:01,000 --> 00:00:02,000\n♪ ♪ ♪ 12345 67890 ♪ ♪ ♪ ... !!! ??? ### $$$ %%% ^^^ &&& *** (((\n";
        assert!(!LanguageDetector::new().verify(noise, "en"));
    }

    #[test]
    fn test_supports() {
        let detector = LanguageDetector::new();
        assert!(detector.supports("en"));
        assert!(detector.supports("rus"));
        assert!(detector.supports("ja"));
        assert!(!detector.supports("vi"));
        assert!(!detector.supports("xx"));
    }

    #[test]
    fn test_unknown_claim_fails_closed() {
        assert!(!LanguageDetector::new().verify(ENGLISH_SRT, "xx"));
    }

    #[test]
    fn test_detects_script_languages() {
        let greek = "Δεν ξέρω τι λες. Πρέπει να φύγουμε τώρα, δεν υπάρχει χρόνος για αυτό.";
        assert_eq!(LanguageDetector::new().detect(greek), Detection::Detected("el"));

        let japanese = "何を言っているのか分かりません。もう行かなければなりません。時間がないんです。本当のことを教えてください。私はあなたを信じていますから、大丈夫です。";
        assert_eq!(LanguageDetector::new().detect(japanese), Detection::Detected("ja"));
    }

    #[test]
    fn test_detects_russian() {
        let russian = "Я не знаю, что ты говоришь. Нам надо идти, здесь нет времени. \
                       Ты сказал, что это безопасно, но это не так. Просто скажи мне правду.";
        assert_eq!(LanguageDetector::new().detect(russian), Detection::Detected("ru"));
    }

    #[test]
    fn test_every_profile_verifies_its_own_text() {
        let detector = LanguageDetector::new();
        for (code, lines) in SAMPLES {
            let text = srt(lines);
            assert_eq!(detector.detect(&text), Detection::Detected(*code), "{code}");
            assert!(detector.verify(&text, code), "{code} rejected its own text");
        }
    }

    #[test]
    fn test_every_profile_has_a_sample() {
        for profile in LATIN_FAMILIES
            .iter()
            .chain(CYRILLIC_FAMILIES)
            .flat_map(|family| family.iter())
        {
            assert!(
                SAMPLES.iter().any(|(code, _)| *code == profile.code),
                "{} has no sample",
                profile.code
            );
        }
    }

    #[test]
    fn test_markers_are_unique_within_family() {
        for family in LATIN_FAMILIES.iter().chain(CYRILLIC_FAMILIES) {
            for a in family.iter() {
                for b in family.iter().filter(|b| b.code != a.code) {
                    for marker in a.markers {
                        assert!(
                            !b.markers.contains(marker),
                            "{marker} marks both {} and {}",
                            a.code,
                            b.code
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_scandinavian_siblings_are_told_apart() {
        let detector = LanguageDetector::new();
        let danish = sample("da");
        let norwegian = sample("no");
        let swedish = sample("sv");

        assert!(detector.verify(&danish, "dan"));
        assert!(!detector.verify(&danish, "no"));
        assert!(!detector.verify(&danish, "sv"));
        assert!(detector.verify(&norwegian, "nor"));
        assert!(!detector.verify(&norwegian, "da"));
        assert!(!detector.verify(&swedish, "da"));
    }

    #[test]
    fn test_close_siblings_reject_each_other() {
        let detector = LanguageDetector::new();
        assert!(!detector.verify(&sample("es"), "pt"));
        assert!(!detector.verify(&sample("pt"), "es"));
        assert!(!detector.verify(&sample("it"), "es"));
        assert!(!detector.verify(&sample("uk"), "ru"));
        assert!(!detector.verify(&sample("bg"), "ru"));
        assert!(!detector.verify(&sample("cs"), "pl"));
    }

    #[test]
    fn test_family_without_markers_is_inconclusive() {
        let text = srt(&[
            "Det er ikke det, som du tror.",
            "Han kan ikke komme, og vi har det godt.",
            "Du er her, og jeg er her for at hjelpe til.",
            "Ja, det er bare for det.",
        ]);
        assert_eq!(LanguageDetector::new().detect(&text), Detection::Inconclusive);
    }
}
