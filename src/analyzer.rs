//! Sentence splitting, lemmatization and part-of-speech tagging.
//!
//! The pipeline only depends on the [`LinguisticAnalyzer`] trait. Two
//! implementations ship with the crate:
//!
//! - [`HeuristicAnalyzer`]: rule-based tagging for space-delimited languages,
//!   with language detection (`whatlang`) and Snowball stemming
//!   (`rust-stemmers`) standing in for lemmatization.
//! - [`TaggedAnalyzer`]: reads text that an external tagger already turned
//!   into `lemma/TAG` tokens (Universal Dependencies tag names).

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use clap::ValueEnum;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use whatlang::Lang;

use crate::error::Result;

/// Universal Dependencies coarse part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PosTag {
    Noun,
    ProperNoun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Determiner,
    Adposition,
    Auxiliary,
    Conjunction,
    Numeral,
    Particle,
    Interjection,
    Punctuation,
    Symbol,
    Other,
}

impl PosTag {
    /// Parse a UD / spaCy tag name. Unknown names map to [`PosTag::Other`].
    pub fn from_ud(tag: &str) -> Self {
        tag.parse().unwrap_or(PosTag::Other)
    }

    pub fn as_ud(&self) -> &'static str {
        match self {
            PosTag::Noun => "NOUN",
            PosTag::ProperNoun => "PROPN",
            PosTag::Verb => "VERB",
            PosTag::Adjective => "ADJ",
            PosTag::Adverb => "ADV",
            PosTag::Pronoun => "PRON",
            PosTag::Determiner => "DET",
            PosTag::Adposition => "ADP",
            PosTag::Auxiliary => "AUX",
            PosTag::Conjunction => "CCONJ",
            PosTag::Numeral => "NUM",
            PosTag::Particle => "PART",
            PosTag::Interjection => "INTJ",
            PosTag::Punctuation => "PUNCT",
            PosTag::Symbol => "SYM",
            PosTag::Other => "X",
        }
    }

    /// Tags kept by default: nouns, proper nouns, verbs and adjectives.
    pub fn default_whitelist() -> Vec<PosTag> {
        vec![
            PosTag::Noun,
            PosTag::ProperNoun,
            PosTag::Verb,
            PosTag::Adjective,
        ]
    }
}

impl FromStr for PosTag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let tag = match s.trim().to_uppercase().as_str() {
            "NOUN" => PosTag::Noun,
            "PROPN" => PosTag::ProperNoun,
            "VERB" => PosTag::Verb,
            "ADJ" => PosTag::Adjective,
            "ADV" => PosTag::Adverb,
            "PRON" => PosTag::Pronoun,
            "DET" => PosTag::Determiner,
            "ADP" => PosTag::Adposition,
            "AUX" => PosTag::Auxiliary,
            "CCONJ" | "SCONJ" | "CONJ" => PosTag::Conjunction,
            "NUM" => PosTag::Numeral,
            "PART" => PosTag::Particle,
            "INTJ" => PosTag::Interjection,
            "PUNCT" => PosTag::Punctuation,
            "SYM" => PosTag::Symbol,
            "X" => PosTag::Other,
            other => return Err(format!("unknown part-of-speech tag '{other}'")),
        };
        Ok(tag)
    }
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ud())
    }
}

impl From<PosTag> for String {
    fn from(tag: PosTag) -> Self {
        tag.as_ud().to_string()
    }
}

impl TryFrom<String> for PosTag {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// One analyzed word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Surface form as it appeared in the text
    pub text: String,
    /// Base form used as the network node label
    pub lemma: String,
    pub pos: PosTag,
}

impl Token {
    pub fn new(text: impl Into<String>, lemma: impl Into<String>, pos: PosTag) -> Self {
        Self {
            text: text.into(),
            lemma: lemma.into(),
            pos,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

/// Turns raw text into sentences of tagged tokens.
pub trait LinguisticAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Sentence>;
}

/// Languages with a Snowball stemmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum StemLang {
    En,
    De,
    Fr,
    Es,
    It,
    Pt,
    Nl,
    Ru,
    Sv,
    Fi,
    Da,
    No,
    Hu,
    Ro,
    Tr,
}

impl StemLang {
    fn algorithm(self) -> Algorithm {
        match self {
            StemLang::En => Algorithm::English,
            StemLang::De => Algorithm::German,
            StemLang::Fr => Algorithm::French,
            StemLang::Es => Algorithm::Spanish,
            StemLang::It => Algorithm::Italian,
            StemLang::Pt => Algorithm::Portuguese,
            StemLang::Nl => Algorithm::Dutch,
            StemLang::Ru => Algorithm::Russian,
            StemLang::Sv => Algorithm::Swedish,
            StemLang::Fi => Algorithm::Finnish,
            StemLang::Da => Algorithm::Danish,
            StemLang::No => Algorithm::Norwegian,
            StemLang::Hu => Algorithm::Hungarian,
            StemLang::Ro => Algorithm::Romanian,
            StemLang::Tr => Algorithm::Turkish,
        }
    }

    fn from_whatlang(lang: Lang) -> Option<Self> {
        let lang = match lang {
            Lang::Eng => StemLang::En,
            Lang::Deu => StemLang::De,
            Lang::Fra => StemLang::Fr,
            Lang::Spa => StemLang::Es,
            Lang::Ita => StemLang::It,
            Lang::Por => StemLang::Pt,
            Lang::Nld => StemLang::Nl,
            Lang::Rus => StemLang::Ru,
            Lang::Swe => StemLang::Sv,
            Lang::Fin => StemLang::Fi,
            Lang::Dan => StemLang::Da,
            Lang::Nob => StemLang::No,
            Lang::Hun => StemLang::Hu,
            Lang::Ron => StemLang::Ro,
            Lang::Tur => StemLang::Tr,
            _ => return None,
        };
        Some(lang)
    }
}

/// How the heuristic analyzer derives lemmas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StemMode {
    /// Detect the language of each row and stem if a stemmer exists for it
    #[default]
    Auto,
    /// Always stem with the given language
    Force(StemLang),
    /// Lowercase only
    Off,
}

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "some", "any", "no",
    "all", "both", "either", "neither", "another", "such", "what", "which", "whose",
];
const PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "he", "him", "his",
    "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us", "our", "ours",
    "ourselves", "they", "them", "their", "theirs", "themselves", "who", "whom", "someone",
    "something", "anyone", "anything", "everyone", "everything", "nothing", "nobody",
];
const ADPOSITIONS: &[&str] = &[
    "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through",
    "during", "before", "after", "above", "below", "to", "from", "up", "down", "of", "off",
    "over", "under", "near", "without", "within", "among", "across", "via", "per",
];
const CONJUNCTIONS: &[&str] = &[
    "and", "or", "but", "nor", "so", "yet", "because", "although", "though", "while", "if",
    "unless", "until", "whether", "than", "as", "since", "when", "where",
];
const AUXILIARIES: &[&str] = &[
    "be", "am", "is", "are", "was", "were", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "will", "would", "shall", "should", "can", "could", "may", "might",
    "must",
];
const ADVERBS: &[&str] = &[
    "not", "very", "also", "too", "just", "only", "then", "there", "here", "now", "never",
    "always", "often", "still", "again", "already", "even", "how", "why", "more", "most",
    "less", "least", "quite", "rather",
];

const VERB_SUFFIXES: &[&str] = &["ing", "ed", "ize", "ise", "ify", "ate"];
const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ous", "ful", "ive", "able", "ible", "al", "ic", "less", "ish", "ary", "est",
];

/// Rule-based analyzer for space-delimited text.
///
/// Tagging rules, first match wins:
/// 1. numbers are `NUM`
/// 2. closed-class English words and configured function words
/// 3. words capitalized past the start of any sentence are `PROPN` everywhere,
///    surface form kept
/// 4. English suffix rules for `ADV`, `VERB` and `ADJ` (English text only)
/// 5. everything else is `NOUN`
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnalyzer {
    stem_mode: StemMode,
    function_words: HashSet<String>,
}

impl HeuristicAnalyzer {
    pub fn new(stem_mode: StemMode) -> Self {
        Self {
            stem_mode,
            function_words: HashSet::new(),
        }
    }

    /// Additional words tagged `X` and therefore never part of the network.
    pub fn with_function_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.function_words.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
        self
    }

    /// Read a stopword file with one word per line.
    pub fn load_function_words(path: &Path) -> Result<Vec<String>> {
        let content = fs::read_to_string(path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(String::from)
            .collect())
    }

    fn language(&self, text: &str) -> Option<StemLang> {
        match self.stem_mode {
            StemMode::Force(lang) => Some(lang),
            StemMode::Auto | StemMode::Off => {
                whatlang::detect(text).and_then(|info| StemLang::from_whatlang(info.lang()))
            }
        }
    }

    fn tag(
        &self,
        word: &str,
        proper: bool,
        lang: Option<StemLang>,
        stemmer: Option<&Stemmer>,
    ) -> Token {
        let lower = word.to_lowercase();

        if word.chars().all(|c| c.is_numeric()) {
            return Token::new(word, lower, PosTag::Numeral);
        }
        if let Some(pos) = closed_class(&lower) {
            return Token::new(word, lower, pos);
        }
        if self.function_words.contains(&lower) {
            return Token::new(word, lower, PosTag::Other);
        }
        if proper {
            return Token::new(word, word, PosTag::ProperNoun);
        }

        let pos = if lang == Some(StemLang::En) {
            english_suffix_tag(&lower)
        } else {
            PosTag::Noun
        };
        let lemma = match stemmer {
            Some(stemmer) => stemmer.stem(&lower).into_owned(),
            None => lower,
        };
        Token::new(word, lemma, pos)
    }
}

impl LinguisticAnalyzer for HeuristicAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Sentence> {
        let lang = self.language(text);
        let stemmer = match self.stem_mode {
            StemMode::Off => None,
            _ => lang.map(|l| Stemmer::create(l.algorithm())),
        };

        let sentences: Vec<Vec<&str>> = split_sentences(text)
            .into_iter()
            .map(split_words)
            .filter(|words| !words.is_empty())
            .collect();

        // Capitalized past the start of some sentence: a name wherever it occurs.
        let names: HashSet<&str> = sentences
            .iter()
            .flat_map(|words| words.iter().skip(1))
            .copied()
            .filter(|w| is_capitalized(w))
            .collect();

        sentences
            .into_iter()
            .map(|words| Sentence {
                tokens: words
                    .into_iter()
                    .map(|w| self.tag(w, names.contains(w), lang, stemmer.as_ref()))
                    .collect(),
            })
            .collect()
    }
}

/// Analyzer for pre-tagged text: whitespace separated `lemma/TAG` tokens.
///
/// A sentence ends at a line break or at a `PUNCT` token that is a sentence
/// terminator (`.`, `!`, `?`, `。`, `！`, `？`). Tokens without a tag are `X`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedAnalyzer;

impl LinguisticAnalyzer for TaggedAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        for line in text.lines() {
            let mut current = Sentence::default();
            for raw in line.split_whitespace() {
                let token = match raw.rsplit_once('/') {
                    Some((lemma, tag)) if !lemma.is_empty() => {
                        Token::new(lemma, lemma, PosTag::from_ud(tag))
                    }
                    _ => Token::new(raw, raw, PosTag::Other),
                };
                let ends_sentence =
                    token.pos == PosTag::Punctuation && token.lemma.chars().all(is_terminator);
                current.tokens.push(token);
                if ends_sentence {
                    sentences.push(std::mem::take(&mut current));
                }
            }
            if !current.tokens.is_empty() {
                sentences.push(current);
            }
        }
        sentences
    }
}

// ---- Internal helpers ----

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
}

fn split_sentences(text: &str) -> Vec<&str> {
    text.split(|c: char| is_terminator(c) || c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_words(sentence: &str) -> Vec<&str> {
    sentence
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '’'))
        .map(|w| w.trim_matches(|c| c == '\'' || c == '’'))
        .map(|w| {
            w.strip_suffix("'s")
                .or_else(|| w.strip_suffix("’s"))
                .unwrap_or(w)
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn closed_class(lower: &str) -> Option<PosTag> {
    let tables: [(&[&str], PosTag); 6] = [
        (DETERMINERS, PosTag::Determiner),
        (PRONOUNS, PosTag::Pronoun),
        (ADPOSITIONS, PosTag::Adposition),
        (CONJUNCTIONS, PosTag::Conjunction),
        (AUXILIARIES, PosTag::Auxiliary),
        (ADVERBS, PosTag::Adverb),
    ];
    tables
        .iter()
        .find(|(words, _)| words.contains(&lower))
        .map(|(_, pos)| *pos)
}

fn english_suffix_tag(lower: &str) -> PosTag {
    let long_enough = |suffix: &str| lower.chars().count() >= suffix.chars().count() + 3;
    if lower.ends_with("ly") && long_enough("ly") {
        PosTag::Adverb
    } else if VERB_SUFFIXES
        .iter()
        .any(|s| lower.ends_with(s) && long_enough(s))
    {
        PosTag::Verb
    } else if ADJECTIVE_SUFFIXES
        .iter()
        .any(|s| lower.ends_with(s) && long_enough(s))
    {
        PosTag::Adjective
    } else {
        PosTag::Noun
    }
}
