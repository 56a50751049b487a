//! Free-text commands addressed to the memory manager handler.
//!
//! Messages the router sends to [`MEMORY_MANAGER_HANDLER`] are read as one of
//! a few commands by their leading verb words (Persian or English). Verbs are
//! checked in a fixed order: store, retrieve, statistics.

use aria_state::MemoryCategory;

/// Handler identifier the router uses for the memory manager.
pub const MEMORY_MANAGER_HANDLER: &str = "AdvancedMemoryManagerAgent";

/// Agent name recorded for memories stored through a routed message.
pub const INTERACTIVE_AGENT_NAME: &str = "user";

/// Records returned by a routed retrieve command.
pub const COMMAND_RETRIEVE_LIMIT: usize = 10;

const STORE_WORDS: &[&str] = &["ذخیره", "نگهداری", "store", "save"];
const RETRIEVE_WORDS: &[&str] = &["بازیابی", "جستجو", "retrieve", "search"];
const STATISTICS_WORDS: &[&str] = &["آمار", "statistics", "stats"];

/// Commands listed when a message matches none.
pub const AVAILABLE_COMMANDS: &[&str] = &["store", "retrieve", "statistics"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryCommand {
    /// Store the whole message as a memory.
    Store,
    /// List memories of the category named in the message (`short_term` when
    /// none is named).
    Retrieve { category: MemoryCategory },
    Statistics,
    /// No command word found.
    Help,
}

impl MemoryCommand {
    pub fn parse(message: &str) -> Self {
        let lower = message.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if mentions(STORE_WORDS) {
            MemoryCommand::Store
        } else if mentions(RETRIEVE_WORDS) {
            MemoryCommand::Retrieve {
                category: named_category(&lower).unwrap_or(MemoryCategory::ShortTerm),
            }
        } else if mentions(STATISTICS_WORDS) {
            MemoryCommand::Statistics
        } else {
            MemoryCommand::Help
        }
    }
}

/// First category whose label (`long_term`, ...) appears in `lower`.
fn named_category(lower: &str) -> Option<MemoryCategory> {
    MemoryCategory::ALL
        .into_iter()
        .find(|c| lower.contains(c.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_words() {
        for message in [
            "لطفا این را ذخیره کن",
            "نگهداری این نکته",
            "Store this note",
            "please SAVE the plan",
        ] {
            assert_eq!(MemoryCommand::parse(message), MemoryCommand::Store, "{message}");
        }
    }

    #[test]
    fn test_retrieve_words_pick_named_category() {
        assert_eq!(
            MemoryCommand::parse("retrieve long_term memory"),
            MemoryCommand::Retrieve {
                category: MemoryCategory::LongTerm
            }
        );
        assert_eq!(
            MemoryCommand::parse("search reflective notes"),
            MemoryCommand::Retrieve {
                category: MemoryCategory::Reflective
            }
        );
        assert_eq!(
            MemoryCommand::parse("بازیابی mission_specific"),
            MemoryCommand::Retrieve {
                category: MemoryCategory::MissionSpecific
            }
        );
        assert_eq!(
            MemoryCommand::parse("جستجو در حافظه"),
            MemoryCommand::Retrieve {
                category: MemoryCategory::ShortTerm
            }
        );
    }

    #[test]
    fn test_statistics_words() {
        for message in ["آمار حافظه", "memory statistics", "show stats"] {
            assert_eq!(
                MemoryCommand::parse(message),
                MemoryCommand::Statistics,
                "{message}"
            );
        }
    }

    #[test]
    fn test_store_takes_precedence() {
        assert_eq!(
            MemoryCommand::parse("save these stats"),
            MemoryCommand::Store
        );
        assert_eq!(
            MemoryCommand::parse("search the stats"),
            MemoryCommand::Retrieve {
                category: MemoryCategory::ShortTerm
            }
        );
    }

    #[test]
    fn test_unrecognised_message_is_help() {
        assert_eq!(MemoryCommand::parse("tell me about memory"), MemoryCommand::Help);
        assert_eq!(MemoryCommand::parse(""), MemoryCommand::Help);
    }
}
