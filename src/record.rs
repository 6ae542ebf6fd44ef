//! Dataset record types
//!
//! One `ProfessorRecord` is written per line of the dataset. Field names are
//! part of the on-disk format and must not change.

use serde::{Deserialize, Serialize};

/// Structured data extracted from one professor profile page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessorRecord {
    /// Identifier the page was fetched for
    pub professor_id: u64,

    /// Display name and title, cleaned for spacing
    pub name_title: Option<String>,

    /// Department line
    pub department: Option<String>,

    /// Overall rating, kept as the text shown on the page
    pub main_rating: Option<String>,

    /// Rating count text, cleaned for spacing
    pub num_ratings: Option<String>,

    /// Short descriptive tags attached to the professor
    #[serde(default)]
    pub tags: Vec<String>,

    /// "Would take again" percentage text
    pub would_take_again: Option<String>,

    /// Perceived difficulty text
    pub level_of_difficulty: Option<String>,

    /// Individual student ratings in page order
    #[serde(default)]
    pub ratings: Vec<RatingEntry>,
}

/// One student rating shown on a profile page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub quality: Option<String>,
    pub difficulty: Option<String>,
    pub for_credit: Option<String>,
    pub attendance: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ProfessorRecord {
    /// Creates a record with only the identifier set
    pub fn empty(professor_id: u64) -> Self {
        Self {
            professor_id,
            name_title: None,
            department: None,
            main_rating: None,
            num_ratings: None,
            tags: Vec::new(),
            would_take_again: None,
            level_of_difficulty: None,
            ratings: Vec::new(),
        }
    }

    /// Whether the page carried enough identity fields to be a real profile
    pub fn has_identity(&self) -> bool {
        self.name_title.is_some() || self.department.is_some()
    }
}
