//! Keyword fallback classifier.
//!
//! A deterministic substring matcher over static per-label keyword lists.
//! Used whenever the remote zero-shot classifier fails or returns nothing
//! usable.
//!
//! # Scoring
//!
//! 1. Lower-case the text.
//! 2. For each label, count how many of its keywords occur anywhere in the
//!    text (each keyword counts at most once).
//! 3. Any Urgent match wins outright.
//! 4. Otherwise the label with the highest count wins; the first maximum in
//!    [`Tag::ALL`] order breaks ties.
//! 5. No matches at all → [`Tag::General`].

use crate::config::KeywordsConfig;
use crate::models::Tag;

const TECHNICAL: &[&str] = &[
    "bug", "error", "code", "function", "api", "database", "server", "crash",
    "exception", "debug", "algorithm", "framework", "library", "deployment",
    "backend", "frontend", "sql", "python", "javascript", "flutter", "react",
    "django", "git", "repository", "stack", "memory", "performance", "latency",
    "endpoint", "request", "response", "json", "rest", "http", "ssl",
    "authentication", "token", "query", "migration", "schema", "model",
    "component", "module", "syntax", "compile", "runtime", "null", "undefined",
    "traceback", "log",
];

const URGENT: &[&str] = &[
    "urgent", "asap", "immediately", "critical", "emergency", "deadline",
    "priority", "blocker", "production down", "outage", "broken", "failing",
    "down", "fix now", "hotfix", "as soon as possible", "time sensitive",
    "escalate", "escalation", "p0", "p1", "must", "required by", "overdue",
    "breached", "sla",
];

const GENERAL: &[&str] = &[
    "note", "idea", "thought", "question", "information", "update", "meeting",
    "discussion", "summary", "reminder", "feedback", "suggestion", "plan",
    "overview", "description", "detail",
];

/// Immutable label → keywords table, built once at startup and shared
/// read-only.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<(Tag, Vec<String>)>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::from_lists(TECHNICAL, URGENT, GENERAL)
    }
}

impl KeywordTable {
    fn from_lists<S: AsRef<str>>(technical: &[S], urgent: &[S], general: &[S]) -> Self {
        // Duplicates after normalizing would be counted twice.
        let normalize = |words: &[S]| -> Vec<String> {
            let mut out: Vec<String> = Vec::with_capacity(words.len());
            for word in words {
                let word = word.as_ref().trim().to_lowercase();
                if !out.contains(&word) {
                    out.push(word);
                }
            }
            out
        };
        Self {
            entries: vec![
                (Tag::Technical, normalize(technical)),
                (Tag::Urgent, normalize(urgent)),
                (Tag::General, normalize(general)),
            ],
        }
    }

    /// Build the table from config, or the built-in lists when the config
    /// has no `[keywords]` section.
    pub fn from_config(config: Option<&KeywordsConfig>) -> Self {
        match config {
            Some(k) => Self::from_lists(
                k.technical.as_slice(),
                k.urgent.as_slice(),
                k.general.as_slice(),
            ),
            None => Self::default(),
        }
    }

    pub fn keywords(&self, tag: Tag) -> &[String] {
        self.entries
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, words)| words.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct keywords per label found in `text`, in
    /// [`Tag::ALL`] order.
    pub fn scores(&self, text: &str) -> Vec<(Tag, usize)> {
        let normalized = text.to_lowercase();
        self.entries
            .iter()
            .map(|(tag, words)| {
                let hits = words.iter().filter(|w| normalized.contains(w.as_str())).count();
                (*tag, hits)
            })
            .collect()
    }

    /// Classify `text`. Never fails.
    pub fn classify(&self, text: &str) -> Tag {
        let scores = self.scores(text);

        if scores.iter().any(|(tag, n)| *tag == Tag::Urgent && *n > 0) {
            return Tag::Urgent;
        }

        let mut best: Option<(Tag, usize)> = None;
        for (tag, n) in scores {
            match best {
                Some((_, top)) if n <= top => {}
                _ => best = Some((tag, n)),
            }
        }

        match best {
            Some((tag, n)) if n > 0 => tag,
            _ => Tag::General,
        }
    }
}
