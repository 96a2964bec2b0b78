//! Hyperparameter maps.
//!
//! Every engine publishes a default table (`Engine::hyper_defaults`). A user
//! supplies a possibly partial map of overrides; the effective map is the
//! defaults overlaid with those overrides.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OptimError, Result};

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HyperValue {
    /// Counts: population size, number of generations, ...
    Int(i64),
    /// Real valued constants
    Float(f64),
    /// A (start, end) pair, typically a schedule decaying over the run
    Pair([f64; 2]),
    /// Named choices such as a mutation strategy
    Text(String),
}

impl From<usize> for HyperValue {
    fn from(v: usize) -> Self {
        HyperValue::Int(v as i64)
    }
}

impl From<i64> for HyperValue {
    fn from(v: i64) -> Self {
        HyperValue::Int(v)
    }
}

impl From<i32> for HyperValue {
    fn from(v: i32) -> Self {
        HyperValue::Int(v as i64)
    }
}

impl From<f64> for HyperValue {
    fn from(v: f64) -> Self {
        HyperValue::Float(v)
    }
}

impl From<(f64, f64)> for HyperValue {
    fn from(v: (f64, f64)) -> Self {
        HyperValue::Pair([v.0, v.1])
    }
}

impl From<&str> for HyperValue {
    fn from(v: &str) -> Self {
        HyperValue::Text(v.to_string())
    }
}

impl From<String> for HyperValue {
    fn from(v: String) -> Self {
        HyperValue::Text(v)
    }
}

impl fmt::Display for HyperValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HyperValue::Int(v) => write!(f, "{}", v),
            HyperValue::Float(v) => write!(f, "{}", v),
            HyperValue::Pair([a, b]) => write!(f, "{},{}", a, b),
            HyperValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Parses the textual form used on the command line:
/// `5` -> Int, `0.5` -> Float, `0.9,0.4` -> Pair, anything else -> Text.
impl FromStr for HyperValue {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let t = s.trim();
        if t.is_empty() {
            return Err("empty hyperparameter value".to_string());
        }
        if let Ok(i) = t.parse::<i64>() {
            return Ok(HyperValue::Int(i));
        }
        if let Ok(v) = t.parse::<f64>() {
            return Ok(HyperValue::Float(v));
        }
        if let Some((a, b)) = t.split_once(',') {
            return match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
                (Ok(a), Ok(b)) => Ok(HyperValue::Pair([a, b])),
                _ => Err(format!("cannot parse pair: {}", s)),
            };
        }
        Ok(HyperValue::Text(t.to_string()))
    }
}

/// Named hyperparameters, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hypers(BTreeMap<String, HyperValue>);

impl Hypers {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder style insert
    pub fn with(mut self, name: &str, value: impl Into<HyperValue>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<HyperValue>) -> Option<HyperValue> {
        self.0.insert(name.to_string(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&HyperValue> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HyperValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Defaults overlaid with `overrides`: override wins, missing keys keep
    /// the default, extra keys are carried over untouched.
    pub fn overlay(&self, overrides: &Hypers) -> Hypers {
        let mut merged = self.0.clone();
        for (k, v) in &overrides.0 {
            merged.insert(k.clone(), v.clone());
        }
        Hypers(merged)
    }

    /// Keys of `self` that `reference` does not know about
    pub fn unknown_keys<'a>(&'a self, reference: &Hypers) -> Vec<&'a str> {
        self.keys().filter(|k| !reference.contains_key(k)).collect()
    }

    fn require(&self, name: &str) -> Result<&HyperValue> {
        self.0.get(name).ok_or_else(|| OptimError::MissingHyper { name: name.to_string() })
    }

    /// Non-negative integer; integral reals are accepted
    pub fn usize(&self, name: &str) -> Result<usize> {
        let err = || OptimError::HyperType { name: name.to_string(), expected: "a non-negative integer" };
        match *self.require(name)? {
            HyperValue::Int(v) if v >= 0 => Ok(v as usize),
            HyperValue::Float(v) if v >= 0.0 && v.fract() == 0.0 && v.is_finite() => Ok(v as usize),
            _ => Err(err()),
        }
    }

    /// Finite real; integers are accepted
    pub fn f64(&self, name: &str) -> Result<f64> {
        let err = || OptimError::HyperType { name: name.to_string(), expected: "a finite real number" };
        match *self.require(name)? {
            HyperValue::Int(v) => Ok(v as f64),
            HyperValue::Float(v) if v.is_finite() => Ok(v),
            _ => Err(err()),
        }
    }

    /// (start, end) pair; a single number is read as a constant schedule
    pub fn pair(&self, name: &str) -> Result<(f64, f64)> {
        let err = || OptimError::HyperType { name: name.to_string(), expected: "a pair of finite reals" };
        match *self.require(name)? {
            HyperValue::Pair([a, b]) if a.is_finite() && b.is_finite() => Ok((a, b)),
            HyperValue::Float(v) if v.is_finite() => Ok((v, v)),
            HyperValue::Int(v) => Ok((v as f64, v as f64)),
            _ => Err(err()),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            HyperValue::Text(s) => Ok(s.as_str()),
            _ => Err(OptimError::HyperType { name: name.to_string(), expected: "a string" }),
        }
    }

    /// Integer that must be at least `min`
    pub(crate) fn usize_at_least(&self, name: &str, min: usize) -> Result<usize> {
        let v = self.usize(name)?;
        if v < min {
            return Err(OptimError::invalid_hyper(name, format!("must be >= {}, got {}", min, v)));
        }
        Ok(v)
    }

    /// Real that must lie in `[lo, hi]`
    pub(crate) fn f64_in(&self, name: &str, lo: f64, hi: f64) -> Result<f64> {
        let v = self.f64(name)?;
        if v < lo || v > hi {
            return Err(OptimError::invalid_hyper(name, format!("must be in [{}, {}], got {}", lo, hi, v)));
        }
        Ok(v)
    }

    /// Strictly positive real
    pub(crate) fn f64_positive(&self, name: &str) -> Result<f64> {
        let v = self.f64(name)?;
        if v <= 0.0 {
            return Err(OptimError::invalid_hyper(name, format!("must be > 0, got {}", v)));
        }
        Ok(v)
    }

    /// Pair with both ends strictly positive
    pub(crate) fn pair_positive(&self, name: &str) -> Result<(f64, f64)> {
        let (a, b) = self.pair(name)?;
        if a <= 0.0 || b <= 0.0 {
            return Err(OptimError::invalid_hyper(name, format!("both ends must be > 0, got ({}, {})", a, b)));
        }
        Ok((a, b))
    }
}

impl<K: Into<String>, V: Into<HyperValue>> FromIterator<(K, V)> for Hypers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Hypers(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Linear interpolation of a (start, end) schedule at `progress` in [0, 1]
pub(crate) fn schedule(range: (f64, f64), progress: f64) -> f64 {
    range.0 + (range.1 - range.0) * progress.clamp(0.0, 1.0)
}

/// Geometric interpolation between two positive values
pub(crate) fn geometric_schedule(range: (f64, f64), progress: f64) -> f64 {
    range.0 * (range.1 / range.0).powf(progress.clamp(0.0, 1.0))
}
