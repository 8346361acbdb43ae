//! Canned reply catalog with keyword routing.
//!
//! A reply is chosen by lower-casing the user's text and testing it against an
//! ordered list of keyword groups. The first group with a keyword present in
//! the text decides the entry; when none matches, the entry is drawn uniformly
//! at random from the whole catalog.

use swasthya_core::config::CatalogConfig;

use crate::error::ChatError;
use crate::picker::IndexSource;

/// Built-in replies, in catalog order.
pub const BUILTIN_ENTRIES: [&str; 8] = [
    "Based on your symptoms, I recommend consulting a healthcare professional. In the meantime, ensure adequate rest and hydration.",
    "For vaccination schedules, children should receive their first dose at birth. Would you like specific information about any particular vaccine?",
    "Common signs of fever include elevated body temperature, chills, and fatigue. Please monitor your temperature and seek medical care if it exceeds 101°F.",
    "Preventive healthcare includes regular hand washing, balanced nutrition, adequate sleep, and staying up-to-date with vaccinations.",
    "If you're experiencing persistent symptoms, it's important to visit your nearest healthcare center. Would you like help finding one?",
    "For digestive issues, try eating smaller meals, staying hydrated, and avoiding spicy foods. Contact a doctor if symptoms persist.",
    "Regular health check-ups are crucial for early detection. Adults should have annual check-ups, while children need more frequent monitoring.",
    "Emergency warning signs include difficulty breathing, chest pain, severe headache, or loss of consciousness. Seek immediate medical attention.",
];

pub const FEVER_ENTRY: usize = 2;
pub const VACCINATION_ENTRY: usize = 1;
pub const DIGESTIVE_ENTRY: usize = 5;
pub const EMERGENCY_ENTRY: usize = 7;

// =============================================================================
// KeywordGroup
// =============================================================================

/// A set of trigger keywords that routes to one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordGroup {
    pub name: String,
    /// Lower-cased, non-blank keywords.
    pub keywords: Vec<String>,
    pub entry: usize,
}

impl KeywordGroup {
    pub fn new<I, S>(name: impl Into<String>, keywords: I, entry: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            entry,
        }
    }

    /// Whether any keyword occurs in already lower-cased text.
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

// =============================================================================
// ResponseCatalog
// =============================================================================

/// Immutable list of replies plus the keyword routing over them.
#[derive(Debug, Clone)]
pub struct ResponseCatalog {
    entries: Vec<String>,
    groups: Vec<KeywordGroup>,
}

impl Default for ResponseCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ResponseCatalog {
    /// Build a catalog, rejecting empty catalogs, blank entries, keyword-less
    /// groups and groups pointing past the end.
    pub fn new(entries: Vec<String>, groups: Vec<KeywordGroup>) -> Result<Self, ChatError> {
        if entries.is_empty() {
            return Err(ChatError::EmptyCatalog);
        }
        if let Some(idx) = entries.iter().position(|e| e.trim().is_empty()) {
            return Err(ChatError::BlankEntry(idx));
        }
        for group in &groups {
            if group.keywords.is_empty() {
                return Err(ChatError::EmptyGroup(group.name.clone()));
            }
            if group.entry >= entries.len() {
                return Err(ChatError::EntryOutOfRange {
                    group: group.name.clone(),
                    entry: group.entry,
                    len: entries.len(),
                });
            }
        }
        Ok(Self { entries, groups })
    }

    /// The eight built-in replies with fever, vaccination, digestive and
    /// emergency routing, in that precedence.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_ENTRIES.iter().map(|e| e.to_string()).collect(),
            groups: vec![
                KeywordGroup::new("fever", ["fever", "temperature"], FEVER_ENTRY),
                KeywordGroup::new("vaccination", ["vaccine", "vaccination"], VACCINATION_ENTRY),
                KeywordGroup::new("digestive", ["stomach", "digestion"], DIGESTIVE_ENTRY),
                KeywordGroup::new("emergency", ["emergency", "urgent"], EMERGENCY_ENTRY),
            ],
        }
    }

    /// Build from the `[catalog]` config section.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, ChatError> {
        let groups = config
            .groups
            .iter()
            .map(|g| KeywordGroup::new(g.name.clone(), &g.keywords, g.entry))
            .collect();
        Self::new(config.entries.clone(), groups)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn groups(&self) -> &[KeywordGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry the first matching keyword group routes to.
    pub fn route(&self, user_text: &str) -> Option<usize> {
        let lowered = user_text.to_lowercase();
        self.groups
            .iter()
            .find(|g| g.matches(&lowered))
            .map(|g| g.entry)
    }

    /// Choose the reply for `user_text`. Never fails and never returns an
    /// empty string.
    pub fn select(&self, user_text: &str, picker: &dyn IndexSource) -> &str {
        let idx = match self.route(user_text) {
            Some(idx) => idx,
            None => picker.pick(self.entries.len()).min(self.entries.len() - 1),
        };
        &self.entries[idx]
    }
}
