//! Result records returned by an optimiser invocation.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hypers::Hypers;

/// Everything an invocation produced, sorted best first.
///
/// Plain data only, so it round-trips through JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullOutput {
    /// Display name of the optimiser
    pub optimiser: String,
    /// All final members of all runs, ascending by score
    pub solutions: Vec<Vec<f64>>,
    /// Scores parallel to `solutions`; infinite scores are written as
    /// `"inf"` / `"-inf"` since JSON has no number for them
    #[serde(with = "score_list")]
    pub scores: Vec<f64>,
    /// Objective evaluations over all runs
    pub nfe: usize,
    /// Number of independent runs merged here
    pub nruns: usize,
    /// Effective hyperparameters
    pub hypers: Hypers,
    /// Search box as (low, high) pairs
    pub bounds: Vec<(f64, f64)>,
}

impl FullOutput {
    /// Best solution and its score
    pub fn best(&self) -> Option<(&[f64], f64)> {
        self.solutions.first().map(|x| (x.as_slice(), self.scores[0]))
    }

    /// The `m` best solutions (fewer when not enough are available)
    pub fn top(&self, m: usize) -> Vec<Vec<f64>> {
        self.solutions.iter().take(m).cloned().collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Write `<output_dir>/<stem>.json`, creating the directory if needed
    pub fn save_json(&self, output_dir: &Path, stem: &str) -> Result<PathBuf> {
        create_dir_all(output_dir)?;
        let filename = output_dir.join(format!("{}.json", stem));
        let mut file = File::create(&filename)?;
        writeln!(file, "{}", self.to_json_pretty()?)?;
        Ok(filename)
    }
}

mod score_list {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Score {
        Number(f64),
        Text(String),
    }

    impl From<f64> for Score {
        fn from(v: f64) -> Self {
            if v.is_finite() {
                Score::Number(v)
            } else if v > 0.0 {
                Score::Text("inf".into())
            } else {
                Score::Text("-inf".into())
            }
        }
    }

    pub fn serialize<S: Serializer>(scores: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(scores.iter().map(|&v| Score::from(v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Vec::<Score>::deserialize(deserializer)?
            .into_iter()
            .map(|score| match score {
                Score::Number(v) => Ok(v),
                Score::Text(t) => match t.as_str() {
                    "inf" => Ok(f64::INFINITY),
                    "-inf" => Ok(f64::NEG_INFINITY),
                    _ => Err(D::Error::custom(format!("invalid score '{}'", t))),
                },
            })
            .collect()
    }
}

/// Either the full record or just the best vectors
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutput {
    Full(FullOutput),
    Best(Vec<Vec<f64>>),
}

impl RunOutput {
    pub fn into_full(self) -> Option<FullOutput> {
        match self {
            RunOutput::Full(out) => Some(out),
            RunOutput::Best(_) => None,
        }
    }

    /// Solutions best first, whatever the shape
    pub fn into_solutions(self) -> Vec<Vec<f64>> {
        match self {
            RunOutput::Full(out) => out.solutions,
            RunOutput::Best(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RunOutput::Full(out) => out.solutions.len(),
            RunOutput::Best(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
