use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::PostprocessError;

// -- Japanese script normalization (EN->JA output cleanup) --------------------

const HALFWIDTH_KANA: &str = "ｦｧｨｩｪｫｬｭｮｯｰｱｲｳｴｵｶｷｸｹｺｻｼｽｾｿﾀﾁﾂﾃﾄﾅﾆﾇﾈﾉﾊﾋﾌﾍﾎﾏﾐﾑﾒﾓﾔﾕﾖﾗﾘﾙﾚﾛﾜﾝ｡｢｣､･";
const FULLWIDTH_KANA: &str = "ヲァィゥェォャュョッーアイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワン。「」、・";

static KANA_MAP: Lazy<HashMap<char, char>> = Lazy::new(|| {
    HALFWIDTH_KANA
        .chars()
        .zip(FULLWIDTH_KANA.chars())
        .collect()
});

const HYPHEN_VARIANTS: &str = "˗֊‐‑‒–⁃⁻₋−";
const CHOON_VARIANTS: &str = "﹣－—―─━ｰ";
const TILDE_VARIANTS: &str = "~∼∾〜〰～";

fn voiced(c: char) -> Option<char> {
    if c == 'ウ' {
        return Some('ヴ');
    }
    if "カキクケコサシスセソタチツテトハヒフヘホ".contains(c) {
        // The voiced form sits immediately after the base kana.
        return char::from_u32(c as u32 + 1);
    }
    None
}

fn semi_voiced(c: char) -> Option<char> {
    if "ハヒフヘホ".contains(c) {
        return char::from_u32(c as u32 + 2);
    }
    None
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x303F   // CJK punctuation
        | 0x3040..=0x30FF // hiragana, katakana
        | 0x3400..=0x9FFF // ideographs
        | 0xF900..=0xFAFF // compatibility ideographs
        | 0xFF66..=0xFF9F // halfwidth katakana
    )
}

/// Width/variant normalization of the translated Japanese text, in the spirit
/// of neologdn: fullwidth ASCII folded to halfwidth, halfwidth katakana to
/// fullwidth (voiced marks combined), hyphen and prolonged-sound-mark variants
/// unified, tildes dropped, prolonged-sound-mark runs collapsed, and spaces
/// removed where they touch CJK text.
pub fn normalize_ja(text: &str) -> String {
    // Character-level folding first.
    let mut folded: Vec<char> = Vec::with_capacity(text.chars().count());
    for c in text.chars() {
        let mapped = match c as u32 {
            // Fullwidth ASCII block -> ASCII.
            0xFF01..=0xFF5E => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            0x3000 => ' ',
            _ if HYPHEN_VARIANTS.contains(c) => '-',
            _ if CHOON_VARIANTS.contains(c) => 'ー',
            _ => *KANA_MAP.get(&c).unwrap_or(&c),
        };
        if TILDE_VARIANTS.contains(mapped) {
            continue;
        }
        // Combine halfwidth voiced/semi-voiced sound marks with the kana
        // that precedes them.
        if c == 'ﾞ' || c == '\u{3099}' || c == '゛' {
            if let Some(prev) = folded.last().copied().and_then(voiced) {
                *folded.last_mut().unwrap() = prev;
                continue;
            }
        }
        if c == 'ﾟ' || c == '\u{309A}' || c == '゜' {
            if let Some(prev) = folded.last().copied().and_then(semi_voiced) {
                *folded.last_mut().unwrap() = prev;
                continue;
            }
        }
        folded.push(mapped);
    }

    // Collapse prolonged-sound-mark runs and whitespace runs.
    static CHOON_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new("ー+").expect("choon regex"));
    static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("space regex"));
    let folded: String = folded.into_iter().collect();
    let folded = CHOON_RUN_RE.replace_all(&folded, "ー");
    let folded = SPACE_RUN_RE.replace_all(&folded, " ");
    let collapsed: Vec<char> = folded.chars().collect();

    // Drop spaces adjacent to CJK characters; keep them between Latin words.
    let mut out = String::with_capacity(collapsed.len() * 3);
    for (i, &c) in collapsed.iter().enumerate() {
        if c == ' ' {
            let prev_cjk = i.checked_sub(1).map(|j| is_cjk(collapsed[j]));
            let next_cjk = collapsed.get(i + 1).map(|&n| is_cjk(n));
            if prev_cjk.unwrap_or(true) || next_cjk.unwrap_or(true) {
                continue;
            }
            if prev_cjk == Some(false) && next_cjk == Some(false) {
                out.push(' ');
            }
            continue;
        }
        out.push(c);
    }
    out.trim().to_string()
}

// -- English detokenization (JA->EN output cleanup) ---------------------------

const ATTACH_LEFT: &[&str] = &[
    ".", ",", "!", "?", ";", ":", "%", ")", "]", "}", "…", "...",
];
const NO_SPACE_AFTER: &[&str] = &["(", "[", "{", "$", "£", "€"];
const CONTRACTIONS: &[&str] = &["'s", "'m", "'ll", "'re", "'ve", "'d", "'t", "n't"];

/// Reassemble space-separated translator output into natural prose: reattach
/// punctuation and contractions, fix bracket and quote spacing. Moses-style
/// detokenization for English.
pub fn detokenize_en(text: &str) -> Result<String, PostprocessError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(PostprocessError::EmptyDetokenization);
    }

    let mut out = String::with_capacity(text.len());
    let mut no_space_next = true;
    let mut quote_open = false;
    for token in tokens {
        let lower = token.to_ascii_lowercase();
        if token == "\"" {
            if quote_open {
                out.push('"');
            } else {
                if !no_space_next {
                    out.push(' ');
                }
                out.push('"');
            }
            quote_open = !quote_open;
            no_space_next = quote_open;
            continue;
        }
        let attach = ATTACH_LEFT.contains(&token) || CONTRACTIONS.contains(&lower.as_str());
        if !attach && !no_space_next {
            out.push(' ');
        }
        out.push_str(token);
        no_space_next = NO_SPACE_AFTER.contains(&token);
    }
    Ok(out)
}

// -- True-casing --------------------------------------------------------------

/// Statistical restoration of case in caseless translator output. Backed by a
/// surface-form lexicon (most frequent cased form per lowercased word,
/// `lower<TAB>Surface` TSV); falls back to rule-only behavior without a model.
/// Sentence-level: must run after detokenization, since it keys on natural
/// word boundaries and sentence-initial position.
#[derive(Default)]
pub struct TrueCaser {
    forms: HashMap<String, String>,
}

impl TrueCaser {
    pub fn from_forms(forms: HashMap<String, String>) -> Self {
        Self { forms }
    }

    pub fn from_tsv_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read truecase model: {}", path.display()))?;
        let mut forms = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((lower, surface)) = line.split_once('\t') {
                forms.insert(lower.to_string(), surface.to_string());
            }
        }
        Ok(Self { forms })
    }

    pub fn true_case(&self, sentence: &str) -> Result<String, PostprocessError> {
        if sentence.trim().is_empty() {
            return Err(PostprocessError::EmptyInput);
        }
        let mut out = String::with_capacity(sentence.len());
        let mut sentence_initial = true;
        let mut first = true;
        for token in sentence.split(' ') {
            if !first {
                out.push(' ');
            }
            first = false;
            if token.is_empty() {
                continue;
            }
            let cased = self.case_token(token, sentence_initial);
            if token.chars().any(|c| c.is_alphabetic()) {
                sentence_initial = false;
            }
            out.push_str(&cased);
        }
        Ok(out)
    }

    fn case_token(&self, token: &str, sentence_initial: bool) -> String {
        // Strip surrounding punctuation so "hello," still hits the lexicon.
        let core_start = token.find(|c: char| c.is_alphanumeric()).unwrap_or(0);
        let core_end = token
            .rfind(|c: char| c.is_alphanumeric())
            .map(|i| i + token[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(token.len());
        let (prefix, rest) = token.split_at(core_start);
        let (core, suffix) = rest.split_at(core_end - core_start);

        let lower = core.to_lowercase();
        let mut cased = if let Some(surface) = self.forms.get(&lower) {
            surface.clone()
        } else if lower == "i" || lower.starts_with("i'") {
            capitalize_first(&lower)
        } else {
            core.to_string()
        };
        if sentence_initial {
            cased = capitalize_first(&cased);
        }
        format!("{prefix}{cased}{suffix}")
    }
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// -- Per-segment finishing with local recovery --------------------------------

/// JA->EN finishing for one decoded segment: detokenize, then true-case. Any
/// step that fails degrades to the unmodified decoded text; a single malformed
/// sentence must never abort the document.
pub fn finish_en(decoded: &str, truecaser: &TrueCaser) -> String {
    let detok = match detokenize_en(decoded) {
        Ok(s) => s,
        Err(err) => {
            log::warn!("detokenization failed ({err}); passing decoded text through");
            return decoded.to_string();
        }
    };
    match truecaser.true_case(&detok) {
        Ok(s) => s,
        Err(err) => {
            log::warn!("true-casing failed ({err}); passing detokenized text through");
            detok
        }
    }
}

/// EN->JA finishing for one line: join decoded segments with a single space,
/// then apply script normalization.
pub fn finish_ja(decoded_segments: &[String]) -> String {
    normalize_ja(&decoded_segments.join(" "))
}
