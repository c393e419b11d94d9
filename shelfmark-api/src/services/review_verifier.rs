//! Review quality verifier
//!
//! Deterministic, explainable accept/reject decision over free-text review
//! content. An ordered list of rules, each a predicate over the lowercased
//! text, evaluated in order with a short-circuit on the first violation. The
//! verdict names the rule that fired, so a rejection is always explainable to
//! the caller.
//!
//! Pure and stateless after construction: no I/O, no shared mutable state,
//! safe to call from any number of concurrent requests.

use std::path::Path;
use tracing::{info, warn};

/// Built-in denylisted terms, matched as case-insensitive substrings
///
/// Deliberately substring-level: "shit" inside "This book is shit" must
/// match. A config-supplied terms file replaces this list.
const DEFAULT_DENYLIST_TERMS: &[&str] = &["shit", "fuck", "damn", "crap", "bastard"];

/// Built-in placeholder/spam phrases
const DEFAULT_SPAM_PHRASES: &[&str] = &["lorem ipsum"];

/// Minimum number of whitespace-separated words for a meaningful review
const MIN_WORD_COUNT: usize = 3;

/// A run of this many identical characters is treated as keyboard spam
const MAX_CHARACTER_RUN: usize = 5;

/// Outcome of one classification call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationVerdict {
    /// No rule fired; the content meets quality standards
    Pass,
    /// A rule fired; the id names the violated rule
    Reject { rule: String },
}

impl ClassificationVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, ClassificationVerdict::Pass)
    }

    /// The violated rule id, if any
    pub fn violated_rule(&self) -> Option<&str> {
        match self {
            ClassificationVerdict::Pass => None,
            ClassificationVerdict::Reject { rule } => Some(rule),
        }
    }
}

/// One quality rule: a predicate over lowercased review text
///
/// Rules are added by pushing another implementation into the verifier's
/// list; the evaluation loop never changes.
pub trait Rule: Send + Sync {
    /// Stable identifier reported in rejection verdicts
    fn id(&self) -> &str;

    /// Whether the (already lowercased) text violates this rule
    fn matches(&self, normalized: &str) -> bool;
}

/// Content contains a denylisted term (substring match)
pub struct DenylistedTermRule {
    terms: Vec<String>,
}

impl DenylistedTermRule {
    pub fn new(terms: Vec<String>) -> Self {
        let terms = terms
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }
}

impl Rule for DenylistedTermRule {
    fn id(&self) -> &str {
        "denylisted-term"
    }

    fn matches(&self, normalized: &str) -> bool {
        self.terms.iter().any(|term| normalized.contains(term))
    }
}

/// Content contains a known placeholder/spam phrase
pub struct DenylistedPhraseRule {
    phrases: Vec<String>,
}

impl DenylistedPhraseRule {
    pub fn new(phrases: Vec<String>) -> Self {
        let phrases = phrases
            .into_iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }
}

impl Rule for DenylistedPhraseRule {
    fn id(&self) -> &str {
        "denylisted-phrase"
    }

    fn matches(&self, normalized: &str) -> bool {
        self.phrases.iter().any(|phrase| normalized.contains(phrase))
    }
}

/// Content is too short to be a meaningful review
pub struct MinWordCountRule {
    min_words: usize,
}

impl MinWordCountRule {
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }
}

impl Rule for MinWordCountRule {
    fn id(&self) -> &str {
        "too-short"
    }

    fn matches(&self, normalized: &str) -> bool {
        normalized.split_whitespace().count() < self.min_words
    }
}

/// Content contains a long run of one repeated character (keyboard spam)
pub struct RepeatedCharacterRule {
    max_run: usize,
}

impl RepeatedCharacterRule {
    pub fn new(max_run: usize) -> Self {
        Self { max_run }
    }
}

impl Rule for RepeatedCharacterRule {
    fn id(&self) -> &str {
        "repeated-characters"
    }

    fn matches(&self, normalized: &str) -> bool {
        let mut run = 0usize;
        let mut previous = None;

        for c in normalized.chars() {
            if Some(c) == previous {
                run += 1;
                if run >= self.max_run {
                    return true;
                }
            } else {
                previous = Some(c);
                run = 1;
            }
        }
        false
    }
}

/// Rule-based review quality classifier
pub struct ReviewVerifier {
    rules: Vec<Box<dyn Rule>>,
}

impl ReviewVerifier {
    /// Verifier with the built-in rule set
    pub fn new() -> Self {
        Self::with_rules(default_rules(builtin_terms()))
    }

    /// Verifier with an explicit, ordered rule list
    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Verifier with denylist terms read from a newline-separated file
    ///
    /// Falls back to the built-in terms when the file cannot be read or
    /// parses to zero terms; a misconfigured denylist must not disable
    /// profanity filtering.
    pub fn from_denylist_file(path: &Path) -> Self {
        let terms = match std::fs::read_to_string(path) {
            Ok(content) => {
                let terms = parse_denylist(&content);
                if terms.is_empty() {
                    warn!(
                        path = %path.display(),
                        "Denylist file contains no terms, using built-in terms"
                    );
                    builtin_terms()
                } else {
                    info!(
                        path = %path.display(),
                        terms = terms.len(),
                        "Loaded denylist terms"
                    );
                    terms
                }
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read denylist file, using built-in terms"
                );
                builtin_terms()
            }
        };

        Self::with_rules(default_rules(terms))
    }

    /// Classify review content
    ///
    /// Lowercases once, then evaluates rules in order and fails on the first
    /// violation. Deterministic for any input, including empty and non-ASCII
    /// text; never panics.
    pub fn classify(&self, text: &str) -> ClassificationVerdict {
        let normalized = text.to_lowercase();

        for rule in &self.rules {
            if rule.matches(&normalized) {
                return ClassificationVerdict::Reject {
                    rule: rule.id().to_string(),
                };
            }
        }

        ClassificationVerdict::Pass
    }
}

impl Default for ReviewVerifier {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_terms() -> Vec<String> {
    DEFAULT_DENYLIST_TERMS.iter().map(|t| t.to_string()).collect()
}

/// Parse a newline-separated denylist; blank lines and `#` comments are skipped
fn parse_denylist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect()
}

/// The standard rule order: denylisted terms, spam phrases, then heuristics
fn default_rules(denylist_terms: Vec<String>) -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(DenylistedTermRule::new(denylist_terms)),
        Box::new(DenylistedPhraseRule::new(
            DEFAULT_SPAM_PHRASES.iter().map(|p| p.to_string()).collect(),
        )),
        Box::new(MinWordCountRule::new(MIN_WORD_COUNT)),
        Box::new(RepeatedCharacterRule::new(MAX_CHARACTER_RUN)),
    ]
}
