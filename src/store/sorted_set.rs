use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
};

use crate::store::normalize_range;

/// Score wrapper ordered with `f64::total_cmp` so it can key a `BTreeSet`.
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Members ordered by `(score, member)`.
#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    scores: HashMap<String, f64>,
    index: BTreeSet<(Score, String)>,
}

impl PartialEq for SortedSet {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `member` was not present before.
    pub fn add(&mut self, member: &str, score: f64) -> bool {
        match self.scores.insert(member.to_string(), score) {
            Some(previous) => {
                self.index.remove(&(Score(previous), member.to_string()));
                self.index.insert((Score(score), member.to_string()));
                false
            }
            None => {
                self.index.insert((Score(score), member.to_string()));
                true
            }
        }
    }

    pub fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.index.remove(&(Score(score), member.to_string()));
                true
            }
            None => false,
        }
    }

    pub fn rank(&self, member: &str) -> Option<usize> {
        let score = *self.scores.get(member)?;
        let key = (Score(score), member.to_string());

        Some(self.index.range(..key).count())
    }

    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    pub fn range(&self, start: i64, end: i64) -> Vec<(String, f64)> {
        let Some((start, end)) = normalize_range(start, end, self.len()) else {
            return Vec::new();
        };

        self.index
            .iter()
            .skip(start)
            .take(end - start + 1)
            .map(|(score, member)| (member.clone(), score.0))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
