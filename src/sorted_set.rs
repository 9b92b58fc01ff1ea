use std::collections::{BTreeSet, HashMap};

use ordered_float::OrderedFloat;

use crate::commands::CommandError;

/// Unique members ordered by score ascending, ties broken by member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    scores: HashMap<String, f64>,
    ordered: BTreeSet<(OrderedFloat<f64>, String)>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Inserts or updates a member, returning its previous score.
    pub fn insert(&mut self, member: &str, score: f64) -> Option<f64> {
        let previous = self.scores.insert(member.to_string(), score);

        if let Some(old) = previous {
            self.ordered.remove(&(OrderedFloat(old), member.to_string()));
        }
        self.ordered.insert((OrderedFloat(score), member.to_string()));

        previous
    }

    pub fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ordered.remove(&(OrderedFloat(score), member.to_string()));
                true
            }
            None => false,
        }
    }

    pub fn rank(&self, member: &str) -> Option<usize> {
        let score = self.scores.get(member)?;
        let key = (OrderedFloat(*score), member.to_string());

        Some(self.ordered.range(..key).count())
    }

    /// Members in canonical order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, f64)> + '_ {
        self.ordered
            .iter()
            .map(|(score, member)| (member.as_str(), score.into_inner()))
    }

    pub fn range_by_score<'a>(
        &'a self,
        min: &'a ScoreBound,
        max: &'a ScoreBound,
    ) -> impl DoubleEndedIterator<Item = (&'a str, f64)> + 'a {
        self.iter()
            .filter(move |(_, score)| min.allows_above(*score) && max.allows_below(*score))
    }
}

/// One end of a score interval: `5`, `(5`, `-inf` or `+inf`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBound {
    pub value: f64,
    pub exclusive: bool,
}

impl ScoreBound {
    pub fn parse(token: &str) -> Result<Self, CommandError> {
        let (digits, exclusive) = match token.strip_prefix('(') {
            Some(rest) => (rest, true),
            None => (token, false),
        };

        let value = parse_score(digits).map_err(|_| CommandError::InvalidScoreBound)?;

        Ok(Self { value, exclusive })
    }

    /// True if `score` lies on the allowed side of this bound used as a minimum.
    pub fn allows_above(&self, score: f64) -> bool {
        if self.exclusive {
            score > self.value
        } else {
            score >= self.value
        }
    }

    /// True if `score` lies on the allowed side of this bound used as a maximum.
    pub fn allows_below(&self, score: f64) -> bool {
        if self.exclusive {
            score < self.value
        } else {
            score <= self.value
        }
    }
}

/// Parses a score, accepting `inf`, `+inf` and `-inf` but never NaN.
pub fn parse_score(token: &str) -> Result<f64, CommandError> {
    match token.parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(CommandError::NotFloat),
    }
}
