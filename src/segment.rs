use crate::errors::SegmentationError;

/// Japanese sentence-final punctuation the JA->EN splitter keys on.
pub const SENTENCE_TERMINATOR: char = '。';

/// One translatable sentence unit derived from a line. Transient: produced
/// fresh per translate call, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Sentence text, already word-segmented for the morphological direction.
    pub text: String,
    /// Index of the originating line in the input document.
    pub line_index: usize,
    /// Set when this segment followed an embedded line break inside its
    /// originating unit; postprocessing re-inserts the break before it.
    pub restore_break: bool,
}

/// Word-segmentation collaborator for the morphological (JA->EN) direction.
/// Produces wakati-style output: one space-joined string of segmented words.
pub trait Tagger: Send + Sync {
    fn wakati(&self, unit: &str) -> Result<String, SegmentationError>;
}

/// Split on `terminator`, retaining it at the end of the preceding unit. The
/// delimiter is never dropped and never duplicated, and a trailing delimiter
/// does not emit a trailing empty unit. Text without the delimiter is one unit.
pub fn split_keep_terminator(text: &str, terminator: char) -> Vec<String> {
    let mut units = Vec::new();
    let mut start = 0usize;
    for (idx, c) in text.char_indices() {
        if c == terminator {
            let end = idx + c.len_utf8();
            units.push(text[start..end].to_string());
            start = end;
        }
    }
    if start < text.len() {
        units.push(text[start..].to_string());
    }
    units
}

// Trailing tokens that never end a sentence on their own, checked against the
// word immediately before a period. Input is case-folded upstream.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "rev", "st", "jr", "sr", "vs", "etc", "inc", "ltd", "co",
    "e.g", "i.e", "cf", "approx",
];

fn is_abbreviation(text: &str, dot_idx: usize) -> bool {
    let head = &text[..dot_idx];
    let word_start = head
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '\''))
        .map(|i| i + head[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    let word = head[word_start..].trim_matches('.');
    if word.is_empty() {
        return false;
    }
    // Single-letter initials ("j. smith") do not end a sentence.
    if word.len() == 1 && word.chars().all(|c| c.is_ascii_alphabetic()) {
        return true;
    }
    ABBREVIATIONS.contains(&word)
}

const CLOSERS: [char; 6] = ['"', '\'', ')', ']', '\u{2019}', '\u{201d}'];

/// Sentence boundary detection for the whitespace-delimited source language.
/// Applied to whole (case-folded) lines; each detected sentence becomes one
/// segment. A pragmatic scan: a run of `.!?` plus trailing closers, followed
/// by whitespace or end of text, ends a sentence unless the preceding word is
/// a known abbreviation or a single-letter initial.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < chars.len() {
        let (byte_idx, c) = chars[i];
        if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?') {
                j += 1;
            }
            while j < chars.len() && CLOSERS.contains(&chars[j].1) {
                j += 1;
            }
            let at_end = j >= chars.len();
            let boundary = (at_end || chars[j].1.is_whitespace())
                && !(c == '.' && is_abbreviation(text, byte_idx));
            if boundary {
                let end = if at_end { text.len() } else { chars[j].0 };
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    out.push(sentence.to_string());
                }
                while j < chars.len() && chars[j].1.is_whitespace() {
                    j += 1;
                }
                start = if j < chars.len() { chars[j].0 } else { text.len() };
                i = j;
                continue;
            }
        }
        i += 1;
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

/// Segment one line for the EN->JA direction. Empty line -> no segments.
pub fn segment_en_line(line: &str, line_index: usize) -> Vec<Segment> {
    split_sentences(line)
        .into_iter()
        .map(|text| Segment {
            text,
            line_index,
            restore_break: false,
        })
        .collect()
}

/// Segment one line for the JA->EN direction: split on the sentence terminator
/// (keeping it), then run each unit through the wakati tagger.
///
/// Callers going through the pipeline hand us break-free lines, but the text
/// may still contain embedded line breaks when this is used directly on
/// multi-line input. Those breaks are stripped here and recorded as
/// `restore_break` markers on the following segment so the output can
/// reproduce them; they are never silently lost.
pub fn segment_ja_line(
    line: &str,
    line_index: usize,
    tagger: &dyn Tagger,
) -> Result<Vec<Segment>, SegmentationError> {
    let mut segments = Vec::new();
    let mut pending_break = false;
    for (part_idx, part) in line.split('\n').enumerate() {
        let part = part.strip_suffix('\r').unwrap_or(part);
        if part_idx > 0 {
            pending_break = true;
        }
        let units = split_keep_terminator(part, SENTENCE_TERMINATOR);
        if units.is_empty() {
            // An empty part still owes its break marker; carry it on an empty
            // segment so downstream counts and breaks stay aligned.
            if pending_break {
                segments.push(Segment {
                    text: String::new(),
                    line_index,
                    restore_break: true,
                });
                pending_break = false;
            }
            continue;
        }
        for unit in units {
            let tagged = tagger.wakati(&unit)?;
            segments.push(Segment {
                text: tagged,
                line_index,
                restore_break: pending_break,
            });
            pending_break = false;
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTagger;

    impl Tagger for EchoTagger {
        fn wakati(&self, unit: &str) -> Result<String, SegmentationError> {
            Ok(unit.to_string())
        }
    }

    #[test]
    fn keep_terminator_retains_delimiter_once() {
        let units = split_keep_terminator("今日は晴れ。明日は雨。", SENTENCE_TERMINATOR);
        assert_eq!(units, vec!["今日は晴れ。", "明日は雨。"]);
    }

    #[test]
    fn keep_terminator_no_trailing_empty_unit() {
        let units = split_keep_terminator("終わり。", SENTENCE_TERMINATOR);
        assert_eq!(units, vec!["終わり。"]);
    }

    #[test]
    fn keep_terminator_without_delimiter_is_one_unit() {
        let units = split_keep_terminator("句点なし", SENTENCE_TERMINATOR);
        assert_eq!(units, vec!["句点なし"]);
    }

    #[test]
    fn keep_terminator_empty_input_yields_nothing() {
        assert!(split_keep_terminator("", SENTENCE_TERMINATOR).is_empty());
    }

    #[test]
    fn keep_terminator_consecutive_delimiters() {
        let units = split_keep_terminator("あ。。い", SENTENCE_TERMINATOR);
        assert_eq!(units, vec!["あ。", "。", "い"]);
    }

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        let sents = split_sentences("hello world. good morning! how are you?");
        assert_eq!(sents, vec!["hello world.", "good morning!", "how are you?"]);
    }

    #[test]
    fn sentences_keep_abbreviations_together() {
        let sents = split_sentences("dr. smith arrived. he was late.");
        assert_eq!(sents, vec!["dr. smith arrived.", "he was late."]);
    }

    #[test]
    fn sentences_keep_initials_together() {
        let sents = split_sentences("j. r. hartley wrote it. really.");
        assert_eq!(sents, vec!["j. r. hartley wrote it.", "really."]);
    }

    #[test]
    fn sentences_handle_closers_and_ellipsis() {
        let sents = split_sentences("\"stop.\" she left... nobody followed.");
        assert_eq!(sents, vec!["\"stop.\"", "she left...", "nobody followed."]);
    }

    #[test]
    fn empty_line_yields_no_segments() {
        assert!(segment_en_line("", 0).is_empty());
        assert!(segment_ja_line("", 0, &EchoTagger).unwrap().is_empty());
    }

    #[test]
    fn ja_line_without_terminator_is_one_segment() {
        let segs = segment_ja_line("これはテスト", 4, &EchoTagger).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].text, "これはテスト");
        assert_eq!(segs[0].line_index, 4);
        assert!(!segs[0].restore_break);
    }

    #[test]
    fn ja_embedded_break_marks_following_segment() {
        let segs = segment_ja_line("こんにちは\n世界。続き。", 0, &EchoTagger).unwrap();
        assert_eq!(segs.len(), 3);
        assert!(!segs[0].restore_break);
        assert!(segs[1].restore_break);
        assert!(!segs[2].restore_break);
        assert_eq!(segs[1].text, "世界。");
    }

    #[test]
    fn ja_blank_part_still_carries_its_break() {
        let segs = segment_ja_line("あ。\n\nい。", 0, &EchoTagger).unwrap();
        assert_eq!(segs.len(), 3);
        assert!(segs[1].restore_break);
        assert!(segs[1].text.is_empty());
        assert!(segs[2].restore_break);
    }
}
