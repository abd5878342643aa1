//! Testing utilities for CPG workspace
//!
//! Shared fixtures: raw scraper documents, seeded stores, and a scripted
//! generator that replays per-module responses.

#![allow(missing_docs)]

use async_trait::async_trait;
use cpg_core::{GenerationError, Generator, ModuleKey};
use cpg_model::Platform;
use cpg_storage::MemoryBlobStore;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};

/// Raw post list as a scraper would store it
pub fn raw_posts(username: &str, texts: &[&str]) -> Value {
    Value::Array(
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                json!({
                    "id": format!("{username}-{i}"),
                    "text": text,
                    "likes": 100 + 10 * i,
                    "comments": 5 + i,
                    "timestamp": format!("2024-03-{:02}T12:00:00Z", i + 1),
                })
            })
            .collect(),
    )
}

/// Store primary posts at the canonical primary location
pub fn seed_primary(store: &MemoryBlobStore, platform: Platform, username: &str, texts: &[&str]) {
    store.insert(format!("{platform}/{username}/{username}.json"), raw_posts(username, texts));
}

/// Store competitor posts co-located with the primary account
pub fn seed_competitor(
    store: &MemoryBlobStore,
    platform: Platform,
    primary: &str,
    competitor: &str,
    texts: &[&str],
) {
    store.insert(
        format!("{platform}/{primary}/{competitor}.json"),
        raw_posts(competitor, texts),
    );
}

/// Twitter store for `geoffreyhinton` with three co-located competitors
pub fn hinton_store() -> MemoryBlobStore {
    let store = MemoryBlobStore::new();
    seed_primary(
        &store,
        Platform::Twitter,
        "geoffreyhinton",
        &[
            "Worried about the pace of #AI capabilities",
            "Backprop still surprises me #research",
            "We need more work on #AIsafety",
        ],
    );
    for (name, text) in [
        ("elonmusk", "Rockets and #AI"),
        ("ylecun", "Open research wins #science"),
        ("sama", "Scaling laws continue #tech"),
    ] {
        seed_competitor(&store, Platform::Twitter, "geoffreyhinton", name, &[text]);
    }
    store
}

/// Output that passes every audit check for `key`
pub fn good_module_output(key: &ModuleKey) -> Value {
    match key {
        ModuleKey::NextPost => json!({
            "caption": "Interpretability research deserves as much funding as scaling",
            "hashtags": ["#AI", "#Research", "#MachineLearning"],
            "image_prompt": "A researcher studying a glowing neural network diagram at dusk",
            "call_to_action": "Share which safety paper changed your mind"
        }),
        ModuleKey::Improvements => json!({
            "recommendations": [
                "Post short threads explaining one alignment idea at a time",
                "Reply to researchers who cite your papers to grow discussion",
                "Pin a thread that summarizes your current position on AI risk"
            ]
        }),
        ModuleKey::CompetitorAnalysis(name) => json!({
            "overview": format!("{name} posts frequently about AI progress"),
            "strengths": ["large audience", "frequent posting"],
            "vulnerabilities": ["little technical depth"],
            "counter_strategies": ["publish technical explainers"]
        }),
        ModuleKey::Recommendation => json!({
            "competitive_intelligence": {
                "summary": "Competitors focus on product news over research",
                "opportunities": ["own the safety research conversation"],
                "threats": ["announcement fatigue"]
            }
        }),
    }
}

/// One recorded generator call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// `ModuleKey` display label
    pub module: String,
    pub prompt_context: Value,
}

/// Generator that replays scripted responses per module
///
/// Scripted responses are consumed in order; once a module's script is
/// exhausted it answers with [`good_module_output`].
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    scripts: Mutex<HashMap<String, VecDeque<Result<Value, GenerationError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the module labelled `module`
    pub fn push(&self, module: &str, response: Result<Value, GenerationError>) {
        self.scripts
            .lock()
            .entry(module.to_string())
            .or_default()
            .push_back(response);
    }

    /// Queue a response and return self
    pub fn with(self, module: &str, response: Result<Value, GenerationError>) -> Self {
        self.push(module, response);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Calls made for one module label
    pub fn calls_for(&self, module: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.module == module)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        module: &ModuleKey,
        prompt_context: &Value,
        _output_schema: &Value,
    ) -> Result<Value, GenerationError> {
        let label = module.to_string();
        self.calls.lock().push(RecordedCall {
            module: label.clone(),
            prompt_context: prompt_context.clone(),
        });

        let scripted = self.scripts.lock().get_mut(&label).and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(good_module_output(module)))
    }
}
