use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

/// Extensions stripped before parsing.
const KNOWN_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "ts", "m2ts", "webm", "srt", "sub", "ass", "ssa",
    "vtt", "idx", "zip",
];

/// Ordered tag patterns: the first pattern that matches wins, so more
/// specific spellings come before generic ones.
static SOURCES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    tag_patterns(&[
        (r"\b(bd-?remux|remux)\b", "REMUX"),
        (r"\b(blu-?ray|bdrip|brrip|bd25|bd50)\b", "BLURAY"),
        (r"\bweb-?rip\b", "WEBRIP"),
        (r"\b(web-?dl|web)\b", "WEB-DL"),
        (r"\b(hdtv|pdtv)\b", "HDTV"),
        (r"\bhdrip\b", "HDRIP"),
        (r"\b(dvd-?rip|dvdr|dvd)\b", "DVD"),
    ])
});

static RESOLUTIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    tag_patterns(&[
        (r"\b(2160p|4k|uhd)\b", "2160P"),
        (r"\b1080[pi]\b", "1080P"),
        (r"\b720p\b", "720P"),
        (r"\b(576p|480p|sd)\b", "SD"),
    ])
});

static CODECS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    tag_patterns(&[
        (r"\b(x265|hevc|h\.?265)\b", "X265"),
        (r"\b(x264|avc|h\.?264)\b", "X264"),
        (r"\bxvid\b", "XVID"),
        (r"\bav1\b", "AV1"),
    ])
});

/// Trailing `-GROUP`, optionally followed by a bracketed site tag.
static SUFFIX_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-([a-z0-9]+)(\s*\[[^\]]*\])?$").unwrap());

/// Leading `[Group]`, common for fansub releases.
static PREFIX_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([^\]]+)\]").unwrap());

fn tag_patterns(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(pattern, tag)| (Regex::new(pattern).unwrap(), *tag))
        .collect()
}

fn first_tag(patterns: &[(Regex, &'static str)], text: &str) -> Option<String> {
    patterns
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, tag)| tag.to_string())
}

/// Tags parsed from a release or file name. All values are canonical
/// upper-case tokens, so equal tags compare equal across spellings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseSignature {
    pub group: Option<String>,
    pub source: Option<String>,
    pub resolution: Option<String>,
    pub codec: Option<String>,
}

impl ReleaseSignature {
    pub fn parse(name: &str) -> Self {
        let text = normalize(name);
        if text.is_empty() {
            return Self::default();
        }

        Self {
            group: parse_group(&text),
            source: first_tag(&SOURCES, &text),
            resolution: first_tag(&RESOLUTIONS, &text),
            codec: first_tag(&CODECS, &text),
        }
    }

    /// Parses both names and fills each tag from whichever has it,
    /// preferring `primary`.
    pub fn parse_either(primary: &str, fallback: &str) -> Self {
        let a = Self::parse(primary);
        let b = Self::parse(fallback);
        Self {
            group: a.group.or(b.group),
            source: a.source.or(b.source),
            resolution: a.resolution.or(b.resolution),
            codec: a.codec.or(b.codec),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_none()
            && self.source.is_none()
            && self.resolution.is_none()
            && self.codec.is_none()
    }
}

/// Lower-cases, drops a known extension and turns `_` into `.` so word
/// boundaries fall between tags.
fn normalize(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    let stem = match base.rsplit_once('.') {
        Some((stem, ext)) if KNOWN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => stem,
        _ => base,
    };
    stem.to_lowercase().replace('_', ".")
}

fn parse_group(text: &str) -> Option<String> {
    let candidate = SUFFIX_GROUP
        .captures(text)
        .or_else(|| PREFIX_GROUP.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())?;

    // `...1080p.WEB-DL` ends in a hyphenated tag, not a group.
    let is_tag = [&*SOURCES, &*RESOLUTIONS, &*CODECS]
        .iter()
        .any(|patterns| patterns.iter().any(|(re, _)| re.is_match(&candidate)))
        || candidate == "dl"
        || candidate == "rip";

    if candidate.is_empty() || is_tag {
        None
    } else {
        Some(candidate.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_name() {
        let sig = ReleaseSignature::parse("Breaking.Bad.S01E01.720p.BluRay.x264-DEMAND.mkv");
        assert_eq!(sig.group.as_deref(), Some("DEMAND"));
        assert_eq!(sig.source.as_deref(), Some("BLURAY"));
        assert_eq!(sig.resolution.as_deref(), Some("720P"));
        assert_eq!(sig.codec.as_deref(), Some("X264"));
    }

    #[test]
    fn test_parse_aliases_canonicalize() {
        let a = ReleaseSignature::parse("Movie.2019.2160p.WEB-DL.H.265-FLUX");
        let b = ReleaseSignature::parse("movie_2019_4k_webdl_hevc-flux");
        assert_eq!(a, b);
        assert_eq!(a.source.as_deref(), Some("WEB-DL"));
        assert_eq!(a.codec.as_deref(), Some("X265"));
        assert_eq!(a.group.as_deref(), Some("FLUX"));
    }

    #[test]
    fn test_webrip_is_not_web_dl() {
        let sig = ReleaseSignature::parse("Show.S02E03.1080p.WEBRip.x264-ION10");
        assert_eq!(sig.source.as_deref(), Some("WEBRIP"));
    }

    #[test]
    fn test_trailing_tag_is_not_group() {
        let sig = ReleaseSignature::parse("Movie.2020.1080p.WEB-DL");
        assert_eq!(sig.group, None);
        assert_eq!(sig.source.as_deref(), Some("WEB-DL"));
    }

    #[test]
    fn test_site_tag_after_group() {
        let sig = ReleaseSignature::parse("Movie.2018.1080p.BluRay.x264-SPARKS[rarbg]");
        assert_eq!(sig.group.as_deref(), Some("SPARKS"));
    }

    #[test]
    fn test_bracket_prefix_group() {
        let sig = ReleaseSignature::parse("[SubsPlease] Frieren - 12 (1080p).mkv");
        assert_eq!(sig.group.as_deref(), Some("SUBSPLEASE"));
        assert_eq!(sig.resolution.as_deref(), Some("1080P"));
    }

    #[test]
    fn test_path_and_empty() {
        let sig = ReleaseSignature::parse("/media/movies/Arrival (2016)/Arrival.2016.DVDRip.XviD-EVO.avi");
        assert_eq!(sig.source.as_deref(), Some("DVD"));
        assert_eq!(sig.codec.as_deref(), Some("XVID"));
        assert_eq!(sig.group.as_deref(), Some("EVO"));

        assert!(ReleaseSignature::parse("").is_empty());
        assert!(ReleaseSignature::parse("Home Video.mkv").is_empty());
    }

    #[test]
    fn test_parse_either_fills_gaps() {
        let sig = ReleaseSignature::parse_either("Breaking Bad 1x01", "Breaking.Bad.S01E01.HDTV.x264-0TV.srt");
        assert_eq!(sig.group.as_deref(), Some("0TV"));
        assert_eq!(sig.source.as_deref(), Some("HDTV"));
    }
}
