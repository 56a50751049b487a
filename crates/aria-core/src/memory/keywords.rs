//! Keyword tables for category classification and importance scoring.
//!
//! Matching is a case-insensitive substring test against the lower-cased
//! content; each keyword contributes at most one point regardless of how
//! often it occurs.

use aria_state::MemoryCategory;

pub const SHORT_TERM_KEYWORDS: &[&str] = &[
    "فعلا", "الان", "امروز", "فوری", "سریع", "currently", "now", "today", "urgent", "quick",
    "temporary", "موقت", "زودگذر", "immediate", "instant",
];

pub const LONG_TERM_KEYWORDS: &[&str] = &[
    "همیشه", "مدام", "دائمی", "مهم", "یادگیری", "always", "permanent", "important", "learning",
    "remember", "knowledge", "skill", "habit", "routine", "دانش", "عادت", "مهارت",
];

pub const MISSION_SPECIFIC_KEYWORDS: &[&str] = &[
    "پروژه", "کار", "وظیفه", "هدف", "برنامه", "project", "task", "mission", "goal", "plan",
    "assignment", "objective", "target", "deadline", "مأموریت", "تکلیف",
];

pub const REFLECTIVE_KEYWORDS: &[&str] = &[
    "فکر", "تأمل", "بررسی", "تجربه", "درس", "think", "reflect", "review", "experience", "lesson",
    "insight", "wisdom", "understanding", "بینش", "حکمت", "درک", "تحلیل",
];

/// Words that raise a record's importance score.
pub const IMPORTANCE_KEYWORDS: &[&str] = &[
    "مهم", "ضروری", "اساسی", "کلیدی", "بحرانی", "important", "crucial", "essential", "key",
    "critical", "urgent", "priority", "significant",
];

/// Classification keywords for `category`.
pub fn category_keywords(category: MemoryCategory) -> &'static [&'static str] {
    match category {
        MemoryCategory::ShortTerm => SHORT_TERM_KEYWORDS,
        MemoryCategory::LongTerm => LONG_TERM_KEYWORDS,
        MemoryCategory::MissionSpecific => MISSION_SPECIFIC_KEYWORDS,
        MemoryCategory::Reflective => REFLECTIVE_KEYWORDS,
    }
}

/// Number of distinct `keywords` contained in `lowered`.
pub fn count_hits(lowered: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| lowered.contains(*kw)).count()
}

/// Keyword score of every category, in tie-break priority order.
pub fn category_scores(content: &str) -> [(MemoryCategory, usize); 4] {
    let lowered = content.to_lowercase();
    MemoryCategory::ALL.map(|c| (c, count_hits(&lowered, category_keywords(c))))
}

/// Best-scoring category by keywords alone.
///
/// Ties resolve to the earliest category in [`MemoryCategory::ALL`]. Returns
/// `None` when no keyword of any category occurs.
pub fn classify_by_keywords(content: &str) -> Option<MemoryCategory> {
    let mut best: Option<(MemoryCategory, usize)> = None;
    for (category, hits) in category_scores(content) {
        if hits > best.map_or(0, |(_, h)| h) {
            best = Some((category, hits));
        }
    }
    best.map(|(category, _)| category)
}
