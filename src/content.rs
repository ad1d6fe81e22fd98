//! Display text for the terminal UI.
//!
//! Labels, grade names and the reaction profiles live in JSON packs under
//! `src/content`, one per language, embedded at build time. The sequencer
//! and the scoring code never look at any of this.

use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FlinchError, Result};
use crate::score::{Consistency, Grade, Report};

static CONTENT_DIR: Dir = include_dir!("src/content");

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Korean,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Korean => "ko",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Labels {
    pub title: String,
    pub tagline: String,
    pub instructions: String,
    pub start_hint: String,
    pub waiting: String,
    pub go: String,
    pub too_early: String,
    pub round: String,
    pub results: String,
    pub average: String,
    /// `{percent}`
    pub top_percent: String,
    /// `{best}`
    pub best: String,
    pub new_best: String,
    pub profile: String,
    pub reaction_type: String,
    pub traits: String,
    pub careers: String,
    pub improvement: String,
    pub data_analysis: String,
    pub average_time: String,
    pub std_dev: String,
    pub consistency: String,
    pub history: String,
    pub no_history: String,
    /// `{avg}`, `{grade}`
    pub share_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub title: String,
    pub description: String,
    pub traits: Vec<String>,
    pub careers: Vec<String>,
    pub improvement: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradeContent {
    pub icon: String,
    pub name: String,
    pub profile: Profile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentPack {
    pub name: String,
    pub labels: Labels,
    grades: HashMap<Grade, GradeContent>,
    consistency: HashMap<Consistency, String>,
}

impl ContentPack {
    pub fn load(language: Language) -> Result<Self> {
        Self::from_file(&format!("{}.json", language.code()))
    }

    fn from_file(file_name: &str) -> Result<Self> {
        let file = CONTENT_DIR
            .get_file(file_name)
            .ok_or_else(|| FlinchError::ContentNotFound(file_name.to_string()))?;

        let contents = file
            .contents_utf8()
            .ok_or_else(|| FlinchError::ContentNotFound(format!("{file_name} is not utf-8")))?;

        Self::from_json(contents)
    }

    /// Parse a pack, checking that every grade and consistency level has text
    pub fn from_json(json: &str) -> Result<Self> {
        let pack: ContentPack = serde_json::from_str(json)?;

        if let Some(grade) = Grade::ALL.iter().find(|g| !pack.grades.contains_key(*g)) {
            return Err(FlinchError::ContentNotFound(format!(
                "{}: no entry for grade {grade}",
                pack.name
            )));
        }
        if let Some(level) = [
            Consistency::VeryConsistent,
            Consistency::Consistent,
            Consistency::Somewhat,
            Consistency::Inconsistent,
        ]
        .iter()
        .find(|c| !pack.consistency.contains_key(*c))
        {
            return Err(FlinchError::ContentNotFound(format!(
                "{}: no label for consistency {level}",
                pack.name
            )));
        }

        Ok(pack)
    }

    pub fn grade(&self, grade: Grade) -> &GradeContent {
        // presence of every grade is checked in from_json
        &self.grades[&grade]
    }

    pub fn consistency(&self, consistency: Consistency) -> &str {
        &self.consistency[&consistency]
    }

    /// Tip shown in the profile for sessions slow enough to need one
    pub fn improvement_tip(&self, report: &Report) -> Option<&str> {
        if !report.needs_improvement() {
            return None;
        }
        self.grade(report.grade).profile.improvement.as_deref()
    }

    pub fn top_percent(&self, report: &Report) -> String {
        fill(&self.labels.top_percent, &[("percent", report.percentile)])
    }

    pub fn best(&self, best_ms: u64) -> String {
        fill(&self.labels.best, &[("best", best_ms.to_string().as_str())])
    }

    pub fn share_text(&self, report: &Report) -> String {
        let avg = report.mean_ms.to_string();
        fill(
            &self.labels.share_text,
            &[
                ("avg", avg.as_str()),
                ("grade", self.grade(report.grade).name.as_str()),
            ],
        )
    }
}

/// Substitute `{key}` placeholders
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{key}}}"), value)
        })
}
