//! Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use claimcheck::config::PipelineConfig;
use claimcheck::extract::{Extractor, PageFetcher};
use claimcheck::models::{NliScores, Source};
use claimcheck::search::SearchProvider;
use claimcheck::select::Embedder;
use claimcheck::store::{MemoryStore, ResultStore};
use claimcheck::verdict::EntailmentScorer;
use claimcheck::{CheckError, Pipeline, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub enum SearchBehavior {
    Return(Vec<Source>),
    Fail,
    Hang,
}

pub struct ScriptedSearch {
    pub behavior: SearchBehavior,
    pub calls: AtomicUsize,
}

impl ScriptedSearch {
    pub fn new(behavior: SearchBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, _claim: &str) -> Result<Vec<Source>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            SearchBehavior::Return(sources) => Ok(sources.clone()),
            SearchBehavior::Fail => Err(CheckError::Search("HTTP 500: upstream down".to_string())),
            SearchBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }
}

pub struct PageMap(pub HashMap<String, String>);

#[async_trait]
impl PageFetcher for PageMap {
    async fn fetch(&self, url: &Url) -> Option<String> {
        self.0.get(url.as_str()).cloned()
    }
}

/// Every text maps to the same unit vector, so every passage clears the floor
pub struct ConstantEmbedder;

#[async_trait]
impl Embedder for ConstantEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0, 0.0]; texts.len()])
    }
}

/// Scores premises containing "refute" as contradiction, everything else as
/// entailment
pub struct KeywordScorer {
    pub calls: AtomicUsize,
}

impl KeywordScorer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl EntailmentScorer for KeywordScorer {
    async fn score(&self, pairs: &[(String, String)]) -> Result<Vec<NliScores>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(pairs
            .iter()
            .map(|(premise, _)| {
                if premise.contains("refute") {
                    NliScores::new(0.05, 0.9, 0.05)
                } else {
                    NliScores::new(0.9, 0.05, 0.05)
                }
            })
            .collect())
    }
}

pub fn article(topic: &str) -> String {
    let paragraph = |n: usize| {
        format!(
            "<p>{}</p>",
            format!("Observation {} on {} was recorded by the survey team in detail. ", n, topic)
                .repeat(4)
        )
    };
    format!(
        "<html><body><article>{}{}</article></body></html>",
        paragraph(1),
        paragraph(2)
    )
}

pub fn source(url: &str) -> Source {
    Source::new(format!("Page at {}", url), Url::parse(url).unwrap())
}

pub struct Harness {
    pub pipeline: Arc<Pipeline>,
    pub search: Arc<ScriptedSearch>,
    pub scorer: Arc<KeywordScorer>,
    pub store: Arc<dyn ResultStore>,
}

pub fn harness(search: SearchBehavior, pages: &[(&str, String)], deadline_secs: u64) -> Harness {
    let search = ScriptedSearch::new(search);
    let scorer = KeywordScorer::new();
    let store: Arc<dyn ResultStore> = Arc::new(MemoryStore::new(100, Duration::from_secs(600)));
    let pages = pages
        .iter()
        .map(|(url, html)| (url.to_string(), html.clone()))
        .collect();

    let pipeline = Pipeline::new(
        search.clone(),
        Extractor::new(Arc::new(PageMap(pages))),
        Arc::new(ConstantEmbedder),
        scorer.clone(),
        store.clone(),
        PipelineConfig {
            deadline_secs,
            ..Default::default()
        },
    );

    Harness {
        pipeline: Arc::new(pipeline),
        search,
        scorer,
        store,
    }
}
