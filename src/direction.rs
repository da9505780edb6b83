use std::fmt;
use std::str::FromStr;

/// Translation direction for one whole `translate` call. Selects the segmenter,
/// the model pair, and the postprocessing variant; immutable for the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    EnJa,
    JaEn,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::EnJa, Direction::JaEn];

    /// Stable slot index, used by the per-direction bundle cache.
    pub fn index(self) -> usize {
        match self {
            Direction::EnJa => 0,
            Direction::JaEn => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::EnJa => "English-to-Japanese",
            Direction::JaEn => "Japanese-to-English",
        }
    }

    /// Default on-disk identifier of the translation model directory.
    pub fn translator_id(self) -> &'static str {
        match self {
            Direction::EnJa => "ENJP_ctranslate2",
            Direction::JaEn => "JPEN_ctranslate2",
        }
    }

    /// Default (source, target) subword model file names.
    pub fn subword_ids(self) -> (&'static str, &'static str) {
        match self {
            Direction::EnJa => ("EN_Final.model", "JP_Final.model"),
            Direction::JaEn => ("JP_Final.model", "EN_Final.model"),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::EnJa => "en-ja",
            Direction::JaEn => "ja-en",
        })
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en-ja" | "enja" | "en2ja" | "english-to-japanese" => Ok(Direction::EnJa),
            "ja-en" | "jaen" | "ja2en" | "japanese-to-english" => Ok(Direction::JaEn),
            other => Err(format!("unknown direction: {other} (expected en-ja or ja-en)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!("en-ja".parse::<Direction>().unwrap(), Direction::EnJa);
        assert_eq!("Japanese-to-English".parse::<Direction>().unwrap(), Direction::JaEn);
        assert!("fr-de".parse::<Direction>().is_err());
    }

    #[test]
    fn indices_are_distinct() {
        assert_ne!(Direction::EnJa.index(), Direction::JaEn.index());
    }
}
