//! Per-category retention policies.

use aria_state::MemoryCategory;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Longest accepted retention window (about a century).
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Retention rules for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    /// Days until a record expires.
    pub retention_days: u32,
    /// Cap on active records; the lowest-importance, oldest ones are evicted.
    pub max_active_entries: usize,
    /// Minimum score for admission.
    pub importance_threshold: u8,
}

impl CategoryPolicy {
    pub const fn new(retention_days: u32, max_active_entries: usize, importance_threshold: u8) -> Self {
        Self {
            retention_days,
            max_active_entries,
            importance_threshold,
        }
    }

    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }

    /// Built-in policy for `category`.
    pub const fn default_for(category: MemoryCategory) -> Self {
        match category {
            MemoryCategory::ShortTerm => Self::new(7, 1000, 3),
            MemoryCategory::LongTerm => Self::new(365, 10_000, 5),
            MemoryCategory::MissionSpecific => Self::new(30, 5000, 4),
            MemoryCategory::Reflective => Self::new(90, 2000, 6),
        }
    }
}

/// Policies for all four categories. Missing tables fall back to the
/// built-in policy of that category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    #[serde(default = "default_short_term")]
    pub short_term: CategoryPolicy,
    #[serde(default = "default_long_term")]
    pub long_term: CategoryPolicy,
    #[serde(default = "default_mission_specific")]
    pub mission_specific: CategoryPolicy,
    #[serde(default = "default_reflective")]
    pub reflective: CategoryPolicy,
}

fn default_short_term() -> CategoryPolicy {
    CategoryPolicy::default_for(MemoryCategory::ShortTerm)
}

fn default_long_term() -> CategoryPolicy {
    CategoryPolicy::default_for(MemoryCategory::LongTerm)
}

fn default_mission_specific() -> CategoryPolicy {
    CategoryPolicy::default_for(MemoryCategory::MissionSpecific)
}

fn default_reflective() -> CategoryPolicy {
    CategoryPolicy::default_for(MemoryCategory::Reflective)
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            short_term: default_short_term(),
            long_term: default_long_term(),
            mission_specific: default_mission_specific(),
            reflective: default_reflective(),
        }
    }
}

impl PolicyTable {
    pub fn get(&self, category: MemoryCategory) -> &CategoryPolicy {
        match category {
            MemoryCategory::ShortTerm => &self.short_term,
            MemoryCategory::LongTerm => &self.long_term,
            MemoryCategory::MissionSpecific => &self.mission_specific,
            MemoryCategory::Reflective => &self.reflective,
        }
    }

    /// Replace the policy of one category.
    pub fn with(mut self, category: MemoryCategory, policy: CategoryPolicy) -> Self {
        let slot = match category {
            MemoryCategory::ShortTerm => &mut self.short_term,
            MemoryCategory::LongTerm => &mut self.long_term,
            MemoryCategory::MissionSpecific => &mut self.mission_specific,
            MemoryCategory::Reflective => &mut self.reflective,
        };
        *slot = policy;
        self
    }

    /// `(category, policy)` pairs in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (MemoryCategory, &CategoryPolicy)> {
        MemoryCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}
