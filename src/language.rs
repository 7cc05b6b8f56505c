//! Best-effort language labelling for short inputs such as search terms.
//!
//! Scoring counts function words and language-specific letters. The result is
//! always one of the configured codes; with no evidence the first configured
//! code wins.

struct Profile {
    code: &'static str,
    stop_words: &'static [&'static str],
    letters: &'static [char],
}

const PROFILES: &[Profile] = &[
    Profile {
        code: "de",
        stop_words: &[
            "der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "einer",
            "und", "oder", "ist", "sind", "war", "wer", "wie", "was", "wo", "wann", "warum",
            "welche", "welcher", "von", "mit", "auf", "für", "nicht", "ich", "du", "er", "sie",
            "es", "wir", "ihr", "zu", "im", "aus", "bei", "nach", "hat", "haben", "wird",
        ],
        letters: &['ä', 'ö', 'ü', 'ß'],
    },
    Profile {
        code: "en",
        stop_words: &[
            "the", "a", "an", "and", "or", "is", "are", "was", "were", "who", "what", "where",
            "when", "why", "how", "which", "of", "to", "in", "on", "for", "with", "from", "by",
            "at", "not", "it", "this", "that", "does", "did", "do", "has", "have", "can", "his",
            "her", "their",
        ],
        letters: &[],
    },
    Profile {
        code: "fr",
        stop_words: &[
            "le", "la", "les", "un", "une", "des", "du", "et", "ou", "est", "sont", "qui", "que",
            "quoi", "où", "quand", "pourquoi", "comment", "quel", "quelle", "dans", "sur",
            "pour", "avec", "pas", "ce", "cette", "il", "elle", "nous", "vous", "au", "aux",
        ],
        letters: &['é', 'è', 'ê', 'à', 'ç', 'ù', 'œ'],
    },
    Profile {
        code: "es",
        stop_words: &[
            "el", "la", "los", "las", "un", "una", "y", "o", "es", "son", "quién", "quien",
            "qué", "dónde", "cuándo", "cómo", "por", "para", "con", "del", "al", "en", "no",
            "se", "su", "sus", "lo", "pero", "como", "está",
        ],
        letters: &['ñ', 'á', 'í', 'ó', 'ú', '¿', '¡'],
    },
    Profile {
        code: "it",
        stop_words: &[
            "il", "lo", "la", "gli", "le", "un", "una", "e", "o", "è", "sono", "chi", "che",
            "cosa", "dove", "quando", "perché", "come", "di", "del", "della", "per", "con",
            "non", "nel", "nella", "anche",
        ],
        letters: &['ì', 'ò'],
    },
    Profile {
        code: "nl",
        stop_words: &[
            "de", "het", "een", "en", "of", "is", "zijn", "was", "wie", "wat", "waar", "wanneer",
            "waarom", "hoe", "welke", "van", "met", "op", "voor", "niet", "ik", "je", "hij",
            "zij", "wij", "naar", "bij", "uit",
        ],
        letters: &['ĳ'],
    },
];

const STOP_WORD_WEIGHT: u32 = 2;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LanguageError {
    #[error("no supported languages configured")]
    Empty,

    #[error("unsupported language code '{0}' (available: de, en, fr, es, it, nl)")]
    Unknown(String),
}

/// Classifier restricted to a fixed set of language codes.
#[derive(Debug, Clone)]
pub struct LanguageGate {
    languages: Vec<&'static str>,
}

impl LanguageGate {
    /// The first code is the fallback when an input carries no evidence.
    pub fn new<S: AsRef<str>>(codes: &[S]) -> Result<Self, LanguageError> {
        let mut languages = Vec::with_capacity(codes.len());
        for code in codes {
            let code = code.as_ref().trim().to_lowercase();
            let profile = PROFILES
                .iter()
                .find(|p| p.code == code)
                .ok_or_else(|| LanguageError::Unknown(code.clone()))?;
            if !languages.contains(&profile.code) {
                languages.push(profile.code);
            }
        }
        if languages.is_empty() {
            return Err(LanguageError::Empty);
        }
        Ok(Self { languages })
    }

    pub fn languages(&self) -> &[&'static str] {
        &self.languages
    }

    pub fn classify(&self, text: &str) -> &'static str {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut best = self.languages[0];
        let mut best_score = 0;
        for &code in &self.languages {
            let Some(profile) = PROFILES.iter().find(|p| p.code == code) else {
                continue;
            };
            let score = score(profile, &words, &lower);
            if score > best_score {
                best = code;
                best_score = score;
            }
        }
        best
    }
}

fn score(profile: &Profile, words: &[&str], lower: &str) -> u32 {
    let word_hits = words
        .iter()
        .filter(|w| profile.stop_words.contains(w))
        .count() as u32;
    let letter_hits = lower
        .chars()
        .filter(|c| profile.letters.contains(c))
        .count() as u32;
    word_hits * STOP_WORD_WEIGHT + letter_hits
}
