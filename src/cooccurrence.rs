//! Sentence-level co-occurrence counting.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde::Serialize;

use crate::analyzer::{PosTag, Sentence};

/// Distinct lemmas of one sentence, kept in sorted order.
pub type TokenSet = BTreeSet<String>;

/// Unordered pair of distinct words, stored with `first < second`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WordPair {
    pub first: String,
    pub second: String,
}

impl WordPair {
    /// Canonicalize `(a, b)`. Returns `None` for a self pair.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Option<Self> {
        let (a, b) = (a.into(), b.into());
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self {
                first: a,
                second: b,
            }),
            std::cmp::Ordering::Greater => Some(Self {
                first: b,
                second: a,
            }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Number of sentences in which each pair of words appears together.
///
/// Absent pairs have a count of zero; stored counts are always at least 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairCounts {
    counts: BTreeMap<WordPair, u32>,
}

impl PairCounts {
    /// Count for `(a, b)`, independent of argument order.
    pub fn get(&self, a: &str, b: &str) -> u32 {
        WordPair::new(a, b)
            .and_then(|pair| self.counts.get(&pair).copied())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Pairs in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&WordPair, u32)> + '_ {
        self.counts.iter().map(|(pair, &count)| (pair, count))
    }

    fn increment(&mut self, pair: WordPair) {
        *self.counts.entry(pair).or_insert(0) += 1;
    }
}

/// Reduce analyzed sentences to the token sets that can form a pair.
///
/// Only tokens whose tag is in `whitelist` are kept. Sentences with fewer
/// than two distinct lemmas are dropped.
pub fn token_sets(sentences: &[Sentence], whitelist: &[PosTag]) -> Vec<TokenSet> {
    sentences
        .iter()
        .map(|sentence| {
            sentence
                .tokens
                .iter()
                .filter(|t| whitelist.contains(&t.pos))
                .map(|t| t.lemma.clone())
                .collect::<TokenSet>()
        })
        .filter(|set| set.len() > 1)
        .collect()
}

/// Count every unordered pair of each token set once.
///
/// Repeated sentences are counted per occurrence.
///
/// # Example
/// ```
/// use cooccurrence_network::{TokenSet, count_pairs};
/// let sets: Vec<TokenSet> = vec![
///     ["a", "b", "c"].iter().map(|s| s.to_string()).collect(),
///     ["b", "a"].iter().map(|s| s.to_string()).collect(),
/// ];
/// let counts = count_pairs(&sets);
/// assert_eq!(counts.get("a", "b"), 2);
/// assert_eq!(counts.get("c", "b"), 1);
/// assert_eq!(counts.len(), 3);
/// ```
pub fn count_pairs(sets: &[TokenSet]) -> PairCounts {
    let mut counts = PairCounts::default();
    for set in sets {
        for (a, b) in set.iter().tuple_combinations() {
            if let Some(pair) = WordPair::new(a.as_str(), b.as_str()) {
                counts.increment(pair);
            }
        }
    }
    counts
}
