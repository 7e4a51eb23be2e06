//! Two-layer tagging: remote zero-shot classification first, keyword
//! matching as the fallback.
//!
//! The [`Tagger`] never fails. Blank text is labelled [`Tag::General`]
//! without consulting either layer; otherwise the remote classifier runs
//! once, and any error or unusable answer hands the text to the
//! [`KeywordTable`], whose answer is final.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::keywords::KeywordTable;
use crate::models::Tag;
use crate::remote::{create_classifier, ZeroShotClassifier};

/// Which layer produced a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSource {
    /// Blank input; no classifier consulted.
    Empty,
    Remote,
    Keyword,
}

impl fmt::Display for TagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TagSource::Empty => "empty",
            TagSource::Remote => "remote",
            TagSource::Keyword => "keyword",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDecision {
    pub tag: Tag,
    pub source: TagSource,
}

pub struct Tagger {
    remote: Box<dyn ZeroShotClassifier>,
    keywords: Arc<KeywordTable>,
}

impl Tagger {
    pub fn new(remote: Box<dyn ZeroShotClassifier>, keywords: Arc<KeywordTable>) -> Self {
        Self { remote, keywords }
    }

    /// Build the configured remote classifier and keyword table.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let remote = create_classifier(&config.classifier)?;
        let keywords = Arc::new(KeywordTable::from_config(config.keywords.as_ref()));
        Ok(Self::new(remote, keywords))
    }

    pub fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }

    /// Tag `text`, reporting which layer decided.
    pub async fn decide(&self, text: &str) -> TagDecision {
        if text.trim().is_empty() {
            return TagDecision {
                tag: Tag::General,
                source: TagSource::Empty,
            };
        }

        match self.remote.classify(text).await {
            Ok(Some(tag)) => {
                info!(classifier = self.remote.name(), %tag, "remote classifier tagged text");
                return TagDecision {
                    tag,
                    source: TagSource::Remote,
                };
            }
            Ok(None) => {
                info!(
                    classifier = self.remote.name(),
                    "remote classifier returned no usable label, using keyword fallback"
                );
            }
            Err(e) if e.is_configuration() => {
                debug!(classifier = self.remote.name(), error = %e, "remote classifier unavailable, using keyword fallback");
            }
            Err(e) => {
                warn!(classifier = self.remote.name(), error = %e, "remote classifier failed, using keyword fallback");
            }
        }

        let tag = self.keywords.classify(text);
        info!(%tag, "keyword fallback tagged text");
        TagDecision {
            tag,
            source: TagSource::Keyword,
        }
    }

    pub async fn tag(&self, text: &str) -> Tag {
        self.decide(text).await.tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{ClassifierError, DisabledClassifier};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Label(Tag),
        Nothing,
        Fail,
    }

    struct ScriptedClassifier {
        reply: Reply,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ZeroShotClassifier for ScriptedClassifier {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn classify(&self, _text: &str) -> Result<Option<Tag>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Label(tag) => Ok(Some(tag)),
                Reply::Nothing => Ok(None),
                Reply::Fail => Err(ClassifierError::Status {
                    status: 503,
                    body: "overloaded".to_string(),
                }),
            }
        }
    }

    fn scripted(reply: Reply) -> (Tagger, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let classifier = ScriptedClassifier {
            reply,
            calls: calls.clone(),
        };
        let tagger = Tagger::new(Box::new(classifier), Arc::new(KeywordTable::default()));
        (tagger, calls)
    }

    #[tokio::test]
    async fn test_blank_text_skips_classifiers() {
        let (tagger, calls) = scripted(Reply::Label(Tag::Urgent));
        for text in ["", "   ", "\n\t "] {
            let decision = tagger.decide(text).await;
            assert_eq!(decision.tag, Tag::General);
            assert_eq!(decision.source, TagSource::Empty);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_label_wins_over_keywords() {
        let (tagger, calls) = scripted(Reply::Label(Tag::General));
        let decision = tagger.decide("critical outage, production down").await;
        assert_eq!(decision.tag, Tag::General);
        assert_eq!(decision.source, TagSource::Remote);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_result_falls_back() {
        let (tagger, calls) = scripted(Reply::Nothing);
        let decision = tagger.decide("this is a critical outage").await;
        assert_eq!(decision.tag, Tag::Urgent);
        assert_eq!(decision.source, TagSource::Keyword);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_falls_back() {
        let (tagger, _) = scripted(Reply::Fail);
        assert_eq!(
            tagger.tag("server returned a 500 error and stack trace").await,
            Tag::Technical
        );
        assert_eq!(tagger.tag("lovely weather today").await, Tag::General);
    }

    #[tokio::test]
    async fn test_disabled_classifier_uses_keywords() {
        let tagger = Tagger::new(Box::new(DisabledClassifier), Arc::new(KeywordTable::default()));
        let decision = tagger.decide("please fix asap").await;
        assert_eq!(decision.tag, Tag::Urgent);
        assert_eq!(decision.source, TagSource::Keyword);
    }

    #[tokio::test]
    async fn test_from_minimal_config() {
        let tagger = Tagger::from_config(&Config::minimal()).unwrap();
        assert_eq!(tagger.tag("an idea for the meeting").await, Tag::General);
        assert!(!tagger.keywords().keywords(Tag::Urgent).is_empty());
    }
}
