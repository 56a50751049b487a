//! Importance scoring on the 1..=10 scale.

use aria_state::{Importance, MemoryCategory};

use super::keywords::{count_hits, IMPORTANCE_KEYWORDS};
use super::metadata::RecordMetadata;

/// Most points importance keywords can add.
pub const MAX_KEYWORD_BOOST: usize = 3;
/// Content longer than this many characters earns one point.
pub const LONG_CONTENT_CHARS: usize = 500;

/// Starting score for a category before any adjustment.
pub fn base_score(category: MemoryCategory) -> i64 {
    match category {
        MemoryCategory::ShortTerm => 3,
        MemoryCategory::LongTerm => 6,
        MemoryCategory::MissionSpecific => 5,
        MemoryCategory::Reflective => 7,
    }
}

/// Score `content` for `category`.
///
/// Base offset, plus one per importance keyword (at most
/// [`MAX_KEYWORD_BOOST`]), plus one for long content, plus the priority bonus,
/// plus one for an explicit user request. The sum is clamped into 1..=10.
pub fn score(content: &str, category: MemoryCategory, metadata: &RecordMetadata) -> Importance {
    let lowered = content.to_lowercase();
    let mut total = base_score(category);

    total += count_hits(&lowered, IMPORTANCE_KEYWORDS).min(MAX_KEYWORD_BOOST) as i64;

    if content.chars().count() > LONG_CONTENT_CHARS {
        total += 1;
    }
    if let Some(priority) = metadata.priority_level() {
        total += priority.bonus();
    }
    if metadata.is_user_explicit() {
        total += 1;
    }

    Importance::clamped(total)
}
