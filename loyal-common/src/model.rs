//! Person records
//!
//! Field names match the `people` table columns so rows deserialize directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geo::GeoPoint;

/// Presentation/category tag; no other semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Boy,
    Girl,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Boy => "boy",
            Gender::Girl => "girl",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boy" => Ok(Gender::Boy),
            "girl" => Ok(Gender::Girl),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

/// The two votes a visitor can cast on a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Real,
    Fake,
}

/// A pinned person as stored in the `people` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub area: String,
    pub quote: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub social_media_link: Option<String>,
    #[serde(flatten)]
    pub location: GeoPoint,
    #[serde(default)]
    pub real_votes: u32,
    #[serde(default)]
    pub fake_votes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Person {
    /// `real_votes - fake_votes`, the ranking key
    pub fn score(&self) -> i64 {
        i64::from(self.real_votes) - i64::from(self.fake_votes)
    }

    pub fn total_votes(&self) -> u64 {
        u64::from(self.real_votes) + u64::from(self.fake_votes)
    }

    /// Share of real votes, rounded to a whole percent; 50 with no votes
    pub fn loyalty_percent(&self) -> u8 {
        let total = self.total_votes();
        if total == 0 {
            return 50;
        }
        (self.real_votes as f64 / total as f64 * 100.0).round() as u8
    }

    pub fn votes(&self, kind: VoteKind) -> u32 {
        match kind {
            VoteKind::Real => self.real_votes,
            VoteKind::Fake => self.fake_votes,
        }
    }

    /// Increment the counter for `kind`; the other counter is untouched
    pub(crate) fn add_vote(&mut self, kind: VoteKind) {
        match kind {
            VoteKind::Real => self.real_votes = self.real_votes.saturating_add(1),
            VoteKind::Fake => self.fake_votes = self.fake_votes.saturating_add(1),
        }
    }

    /// Label shown under the pin
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Fields sent to the store when a person is created; vote counters use
/// the store default of 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPerson {
    pub name: String,
    pub gender: Gender,
    pub area: String,
    pub quote: String,
    pub social_media_link: Option<String>,
    #[serde(flatten)]
    pub location: GeoPoint,
}

/// Partial update of a person's vote counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_votes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fake_votes: Option<u32>,
}

impl VotePatch {
    /// Patch carrying only the counter for `kind`
    pub fn single(kind: VoteKind, value: u32) -> Self {
        match kind {
            VoteKind::Real => Self {
                real_votes: Some(value),
                fake_votes: None,
            },
            VoteKind::Fake => Self {
                real_votes: None,
                fake_votes: Some(value),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.real_votes.is_none() && self.fake_votes.is_none()
    }
}

/// Everything the profile card displays for the selected person
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileCard {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub area: String,
    pub quote: String,
    pub social_media_link: Option<String>,
    pub location: GeoPoint,
    pub real_votes: u32,
    pub fake_votes: u32,
    pub score: i64,
    pub loyalty_percent: u8,
}

impl From<&Person> for ProfileCard {
    fn from(p: &Person) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            gender: p.gender,
            area: p.area.clone(),
            quote: p.quote.clone(),
            social_media_link: p.social_media_link.clone(),
            location: p.location,
            real_votes: p.real_votes,
            fake_votes: p.fake_votes,
            score: p.score(),
            loyalty_percent: p.loyalty_percent(),
        }
    }
}

/// Boys/girls tally for the stats bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GenderCounts {
    pub boys: usize,
    pub girls: usize,
}

/// Treat `""` the same as a missing link
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
