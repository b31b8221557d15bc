use serde::Serialize;

use super::ReleaseSignature;

const GROUP_WEIGHT: f64 = 10.0;
const SOURCE_WEIGHT: f64 = 4.0;
const CODEC_WEIGHT: f64 = 3.0;
const RESOLUTION_WEIGHT: f64 = 2.0;

/// How well a subtitle release fits the media file. Ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    None,
    Weak,
    Good,
    Perfect,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Weak => "weak",
            Self::Good => "good",
            Self::Perfect => "perfect",
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchScore {
    pub tier: MatchTier,
    /// Weighted share of the media's tags the candidate carries, 0.0 to 1.0.
    pub score: f64,
}

fn same(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Scores a candidate signature against the media's.
///
/// Perfect needs the same release group. Good needs the same source and
/// codec. Weak is any single shared tag.
pub fn score(candidate: &ReleaseSignature, media: &ReleaseSignature) -> MatchScore {
    let group = same(&candidate.group, &media.group);
    let source = same(&candidate.source, &media.source);
    let codec = same(&candidate.codec, &media.codec);
    let resolution = same(&candidate.resolution, &media.resolution);

    let tier = if group {
        MatchTier::Perfect
    } else if source && codec {
        MatchTier::Good
    } else if source || codec || resolution {
        MatchTier::Weak
    } else {
        MatchTier::None
    };

    let weights = [
        (media.group.is_some(), group, GROUP_WEIGHT),
        (media.source.is_some(), source, SOURCE_WEIGHT),
        (media.codec.is_some(), codec, CODEC_WEIGHT),
        (media.resolution.is_some(), resolution, RESOLUTION_WEIGHT),
    ];
    let possible: f64 = weights.iter().filter(|(p, _, _)| *p).map(|(_, _, w)| w).sum();
    let matched: f64 = weights.iter().filter(|(_, m, _)| *m).map(|(_, _, w)| w).sum();
    let score = if possible > 0.0 { matched / possible } else { 0.0 };

    MatchScore { tier, score }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> ReleaseSignature {
        ReleaseSignature::parse("Breaking.Bad.S01E01.720p.BluRay.x264-DEMAND.mkv")
    }

    #[test]
    fn test_same_group_is_perfect() {
        let a = ReleaseSignature::parse("Breaking.Bad.S01E01.720p.BluRay.x264-DEMAND");
        let b = ReleaseSignature::parse("Breaking.Bad.S01E01.1080p.WEB-DL-demand");
        let sa = score(&a, &media());
        let sb = score(&b, &media());
        assert_eq!(sa.tier, MatchTier::Perfect);
        assert_eq!(sb.tier, MatchTier::Perfect);
        assert!((sa.score - 1.0).abs() < f64::EPSILON);
        assert!(sb.score < sa.score);
    }

    #[test]
    fn test_source_and_codec_is_good() {
        let c = ReleaseSignature::parse("Breaking.Bad.S01E01.1080p.BluRay.x264-REWARD");
        let s = score(&c, &media());
        assert_eq!(s.tier, MatchTier::Good);
        assert!(s.tier < MatchTier::Perfect);
    }

    #[test]
    fn test_partial_overlap_is_weak() {
        let c = ReleaseSignature::parse("Breaking.Bad.S01E01.720p.HDTV.XviD-FQM");
        assert_eq!(score(&c, &media()).tier, MatchTier::Weak);

        let only_source = ReleaseSignature::parse("Breaking.Bad.S01E01.BluRay.XviD-FQM");
        assert_eq!(score(&only_source, &media()).tier, MatchTier::Weak);
    }

    #[test]
    fn test_nothing_shared_is_none() {
        let c = ReleaseSignature::parse("Breaking.Bad.S01E01.1080p.WEBRip.x265-RARBG");
        let s = score(&c, &media());
        assert_eq!(s.tier, MatchTier::None);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn test_empty_media_signature() {
        let c = ReleaseSignature::parse("Movie.720p.BluRay.x264-DEMAND");
        let s = score(&c, &ReleaseSignature::default());
        assert_eq!(s.tier, MatchTier::None);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn test_tier_ordering() {
        let mut tiers = vec![MatchTier::Weak, MatchTier::Perfect, MatchTier::None, MatchTier::Good];
        tiers.sort();
        assert_eq!(
            tiers,
            vec![MatchTier::None, MatchTier::Weak, MatchTier::Good, MatchTier::Perfect]
        );
        assert_eq!(MatchTier::Perfect.to_string(), "perfect");
    }
}
