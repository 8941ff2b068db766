use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Category id every unrecognized submission or event type normalizes to.
pub const OTHER_TYPE: &str = "other";

/// Category id for meeting attendance records, which are listed and
/// reported separately from point submissions.
pub const ATTENDANCE_TYPE: &str = "attendance";

/// Color tags the presentation layer understands; anything else falls back
/// to "neutral" at parse time.
const KNOWN_COLORS: &[&str] = &[
    "neutral", "stone", "zinc", "slate", "gray", "red", "orange", "amber", "yellow", "lime",
    "green", "emerald", "teal", "cyan", "sky", "blue", "indigo", "violet", "purple", "fuchsia",
    "pink", "rose",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCategory {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub minimum_points: i64,
    #[serde(default)]
    pub color: Option<String>,
}

/// The externally supplied, read-only list of point categories. Order is
/// preserved from the configuration source.
#[derive(Debug, Clone, Default)]
pub struct PointConfig {
    categories: Vec<PointCategory>,
}

impl PointConfig {
    /// Parse and normalize the configured category list from its JSON form.
    /// Entries missing an id, name, or icon are rejected outright; negative
    /// minimums clamp to zero and unknown colors fall back to "neutral".
    pub fn parse(json: &str) -> Result<Self> {
        let raw: Vec<PointCategory> = serde_json::from_str(json)
            .map_err(|e| AppError::Validation(format!("Invalid point type configuration: {}", e)))?;

        let mut categories = Vec::with_capacity(raw.len());
        for mut category in raw {
            if category.id.is_empty() || category.name.is_empty() || category.icon.is_empty() {
                return Err(AppError::Validation(
                    "Point type configuration entries need an id, name, and icon".to_string(),
                ));
            }
            if category.minimum_points < 0 {
                category.minimum_points = 0;
            }
            category.color = match category.color {
                Some(c) if KNOWN_COLORS.contains(&c.as_str()) => Some(c),
                _ => Some("neutral".to_string()),
            };
            categories.push(category);
        }

        Ok(Self { categories })
    }

    pub fn from_categories(categories: Vec<PointCategory>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[PointCategory] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&PointCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Map an arbitrary type string onto a configured category id, falling
    /// back to `OTHER_TYPE` for anything unrecognized.
    pub fn normalize_type(&self, submission_type: &str) -> String {
        if self.is_known(submission_type) {
            submission_type.to_string()
        } else {
            OTHER_TYPE.to_string()
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.id.clone()).collect()
    }
}
