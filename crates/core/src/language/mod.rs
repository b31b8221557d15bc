//! Language handling: ISO 639 code tables, the ordered language preference
//! and the statistical detector used to verify downloaded subtitles.

mod codes;
mod detector;
mod preference;

pub use codes::{lookup, normalize, same_language, Language, LANGUAGES};
pub use detector::{clean_subtitle_text, Detection, LanguageDetector};
pub use preference::{LanguagePreference, LanguagePreferenceError};
