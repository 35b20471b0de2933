/*!
 * Glossary data model.
 *
 * - `GlossaryEntry`: one source-language proper noun and its chosen translation
 * - `Role`: informational tag for an entry
 * - `ProposalRecord`: one line of the proposal log kept for conflict review
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of name an entry is. Does not influence resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Protagonist,
    Antagonist,
    Major,
    Supporting,
    Minor,
    Place,
    Organization,
    // Hand-edited files may carry "unknown" or anything else
    #[default]
    #[serde(other)]
    Unspecified,
}

impl Role {
    /// Derive a role from how often a name occurs across scanned chapters.
    pub fn from_frequency(frequency: usize) -> Self {
        match frequency {
            f if f > 50 => Self::Protagonist,
            f if f > 20 => Self::Major,
            f if f > 10 => Self::Supporting,
            _ => Self::Minor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Protagonist => "protagonist",
            Self::Antagonist => "antagonist",
            Self::Major => "major",
            Self::Supporting => "supporting",
            Self::Minor => "minor",
            Self::Place => "place",
            Self::Organization => "organization",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "protagonist" => Ok(Self::Protagonist),
            "antagonist" => Ok(Self::Antagonist),
            "major" => Ok(Self::Major),
            "supporting" => Ok(Self::Supporting),
            "minor" => Ok(Self::Minor),
            "place" => Ok(Self::Place),
            "organization" => Ok(Self::Organization),
            "unspecified" | "unknown" => Ok(Self::Unspecified),
            _ => Err(anyhow::anyhow!("Invalid role: {}", s)),
        }
    }
}

/// A proper noun and the translation every chapter must use for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    /// Normalized source-language term, unique within the store
    pub source_term: String,

    /// Chosen target-language translation
    pub target_term: String,

    /// Informational role tag
    #[serde(default)]
    pub role: Role,

    /// Chapter index where the term was first observed.
    /// `None` for entries pinned by an operator before any chapter mentioned them.
    #[serde(default)]
    pub first_seen_unit: Option<u64>,

    /// Set by manual override; pinned entries are never rewritten automatically
    #[serde(default)]
    pub pinned: bool,

    /// Alternative source spellings resolving to this entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Operator note
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl GlossaryEntry {
    /// Create an entry for a term first observed in `unit`.
    pub fn observed(source_term: &str, target_term: &str, role: Role, unit: u64) -> Self {
        Self {
            source_term: source_term.to_string(),
            target_term: target_term.to_string(),
            role,
            first_seen_unit: Some(unit),
            pinned: false,
            aliases: Vec::new(),
            description: String::new(),
        }
    }

    /// Create a pinned entry for a term no chapter has mentioned yet.
    pub fn pinned(source_term: &str, target_term: &str) -> Self {
        Self {
            source_term: source_term.to_string(),
            target_term: target_term.to_string(),
            role: Role::Unspecified,
            first_seen_unit: None,
            pinned: true,
            aliases: Vec::new(),
            description: String::new(),
        }
    }

    /// Record that `unit` mentioned this term.
    ///
    /// Only fills in a missing first sighting; an existing one never moves,
    /// so out-of-order processing cannot rewrite history. Returns whether the
    /// entry changed.
    pub fn observe(&mut self, unit: u64) -> bool {
        if self.first_seen_unit.is_none() {
            self.first_seen_unit = Some(unit);
            return true;
        }
        false
    }
}

/// Who produced a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalOrigin {
    /// The translation capability, during `resolve`
    Automated,
    /// An operator override
    Manual,
    /// Found in a hand-edited glossary file without a matching log line
    Imported,
}

/// One translation ever proposed or pinned for a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub source_term: String,
    pub target_term: String,
    #[serde(default)]
    pub unit_index: Option<u64>,
    pub origin: ProposalOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ProposalRecord {
    pub fn new(source_term: &str, target_term: &str, unit_index: Option<u64>, origin: ProposalOrigin) -> Self {
        Self {
            source_term: source_term.to_string(),
            target_term: target_term.to_string(),
            unit_index,
            origin,
            actor: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = Some(actor.to_string());
        self
    }
}

/// Who is performing a manual override.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Actor {
    #[default]
    Manual,
    Named(String),
}

impl Actor {
    pub fn name(&self) -> &str {
        match self {
            Self::Manual => "manual",
            Self::Named(name) => name,
        }
    }
}
