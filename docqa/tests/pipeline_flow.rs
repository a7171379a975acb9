use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use docqa::agents::generator::Generator;
use docqa::agents::retriever::Retriever;
use docqa::agents::router::Router;
use docqa::agents::verifier::Verifier;
use docqa::models::{Channel, MemoryEntry, RetrievalHit, Role};
use docqa::pipeline::Pipeline;
use docqa::services::{ConversationStore, DocumentIndex, Embeddings, Generation};

struct FakeLlm {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl FakeLlm {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generation for FakeLlm {
    async fn complete(&self, system: &str, user: &str, _temperature: f32) -> Result<String> {
        if self.fail {
            return Err(anyhow!("generation service down"));
        }
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

struct FakeEmbeddings;

#[async_trait]
impl Embeddings for FakeEmbeddings {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1, 0.2, 0.3])
    }
}

#[derive(Default)]
struct FakeIndex {
    vector_hits: HashMap<String, Vec<RetrievalHit>>,
    keyword_hits: HashMap<String, Vec<RetrievalHit>>,
    queried: Mutex<Vec<String>>,
}

impl FakeIndex {
    fn queried_namespaces(&self) -> Vec<String> {
        let mut namespaces = self.queried.lock().unwrap().clone();
        namespaces.sort();
        namespaces.dedup();
        namespaces
    }
}

#[async_trait]
impl DocumentIndex for FakeIndex {
    async fn vector_search(
        &self,
        namespace: &str,
        _query: &[f32],
        _k: usize,
    ) -> Result<Vec<RetrievalHit>> {
        self.queried.lock().unwrap().push(namespace.to_string());
        Ok(self.vector_hits.get(namespace).cloned().unwrap_or_default())
    }

    async fn keyword_search(
        &self,
        namespace: &str,
        _query: &str,
        _k: usize,
    ) -> Result<Vec<RetrievalHit>> {
        self.queried.lock().unwrap().push(namespace.to_string());
        Ok(self.keyword_hits.get(namespace).cloned().unwrap_or_default())
    }

    async fn insert_chunk(
        &self,
        _namespace: &str,
        _content: &str,
        _meta: serde_json::Value,
        _embedding: &[f32],
    ) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeMemory {
    entries: Mutex<HashMap<String, Vec<MemoryEntry>>>,
}

impl FakeMemory {
    fn seeded(user_id: &str, turns: &[(Role, &str)]) -> Arc<Self> {
        let memory = Self::default();
        let mut log = Vec::new();
        for (role, content) in turns {
            log.insert(
                0,
                MemoryEntry {
                    role: *role,
                    content: content.to_string(),
                    timestamp: Utc::now(),
                },
            );
        }
        memory
            .entries
            .lock()
            .unwrap()
            .insert(user_id.to_string(), log);
        Arc::new(memory)
    }
}

#[async_trait]
impl ConversationStore for FakeMemory {
    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(user_id)
            .map(|log| log.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn append(&self, user_id: &str, role: Role, content: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .insert(
                0,
                MemoryEntry {
                    role,
                    content: content.to_string(),
                    timestamp: Utc::now(),
                },
            );
        Ok(())
    }
}

fn hit(id: &str, score: f32, channel: Channel, source: &str) -> RetrievalHit {
    RetrievalHit {
        id: id.to_string(),
        content: format!("excerpt {}", id),
        meta: serde_json::json!({"source": source, "chunk_index": 0}),
        score,
        channel,
    }
}

fn pipeline_with(llm: Arc<FakeLlm>, index: Arc<FakeIndex>, memory: Arc<FakeMemory>) -> Pipeline {
    let llm: Arc<dyn Generation> = llm;
    Pipeline::new(
        Router::new(llm.clone()),
        Retriever::new(Arc::new(FakeEmbeddings), index, 8, 8, 8000),
        Generator::new(llm.clone()),
        Verifier::new(llm),
        memory,
        10,
    )
}

#[tokio::test]
async fn route_to_pdf_only_queries_the_pdf_namespace() {
    let llm = FakeLlm::new(&[r#"{"agents": ["pdf"]}"#, "the draft [1]"]);
    let index = Arc::new(FakeIndex {
        vector_hits: HashMap::from([(
            "pdf".to_string(),
            vec![hit("p1", 0.9, Channel::Vector, "manual.pdf")],
        )]),
        ..Default::default()
    });

    let pipeline = pipeline_with(llm.clone(), index.clone(), Arc::new(FakeMemory::default()));
    let result = pipeline.ask("what does the manual say?", "u1").await.unwrap();

    assert_eq!(index.queried_namespaces(), vec!["pdf".to_string()]);
    assert!(result.text.starts_with("the draft [1]"));
    assert!(result.text.contains("Sources: [1]manual.pdf:0"));
    assert_eq!(result.used_context.len(), 1);
}

#[tokio::test]
async fn unparseable_route_output_consults_every_namespace() {
    let llm = FakeLlm::new(&["not json", "draft", "verified"]);
    let index = Arc::new(FakeIndex::default());

    let pipeline = pipeline_with(llm, index.clone(), Arc::new(FakeMemory::default()));
    let result = pipeline.ask("anything", "u1").await.unwrap();

    // Fail-open default includes factcheck, so the verifier's reply wins.
    assert_eq!(
        index.queried_namespaces(),
        vec!["law".to_string(), "pdf".to_string()]
    );
    assert!(result.text.starts_with("verified"));
}

#[tokio::test]
async fn without_factcheck_the_final_answer_is_the_draft() {
    let llm = FakeLlm::new(&[r#"{"agents": ["law"]}"#, "draft answer"]);
    let index = Arc::new(FakeIndex::default());

    let pipeline = pipeline_with(llm.clone(), index, Arc::new(FakeMemory::default()));
    let result = pipeline.ask("a legal question", "u1").await.unwrap();

    assert!(result.text.starts_with("draft answer"));
    // Only route + generate were invoked.
    assert_eq!(llm.calls().len(), 2);
}

#[tokio::test]
async fn with_factcheck_the_final_answer_is_the_verifier_output() {
    let llm = FakeLlm::new(&[
        r#"{"agents": ["law", "factcheck"]}"#,
        "draft answer",
        "corrected answer",
    ]);
    let index = Arc::new(FakeIndex {
        keyword_hits: HashMap::from([(
            "law".to_string(),
            vec![hit("l1", 3.0, Channel::Keyword, "statute")],
        )]),
        ..Default::default()
    });

    let pipeline = pipeline_with(llm.clone(), index, Arc::new(FakeMemory::default()));
    let result = pipeline.ask("a legal question", "u1").await.unwrap();

    assert!(result.text.starts_with("corrected answer"));
    assert!(!result.text.contains("draft answer"));
    // The verifier saw the draft in its prompt.
    let calls = llm.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[2].1.contains("draft answer"));
}

#[tokio::test]
async fn cross_scale_duplicate_keeps_the_keyword_hit() {
    let llm = FakeLlm::new(&[r#"{"agents": ["pdf"]}"#, "answer"]);
    let index = Arc::new(FakeIndex {
        vector_hits: HashMap::from([(
            "pdf".to_string(),
            vec![hit("x", 0.9, Channel::Vector, "doc")],
        )]),
        keyword_hits: HashMap::from([(
            "pdf".to_string(),
            vec![hit("x", 5.0, Channel::Keyword, "doc")],
        )]),
        ..Default::default()
    });

    let pipeline = pipeline_with(llm, index, Arc::new(FakeMemory::default()));
    let result = pipeline.ask("q", "u1").await.unwrap();

    assert_eq!(result.used_context.len(), 1);
    assert_eq!(result.used_context[0].id, "x");
    assert_eq!(result.used_context[0].score, 5.0);
    assert_eq!(result.used_context[0].channel, Channel::Keyword);
}

#[tokio::test]
async fn recent_history_is_prepended_to_the_question() {
    let llm = FakeLlm::new(&[r#"{"agents": ["pdf"]}"#, "answer"]);
    let memory = FakeMemory::seeded(
        "u1",
        &[
            (Role::User, "what is clause four?"),
            (Role::Assistant, "clause four covers termination"),
        ],
    );

    let pipeline = pipeline_with(llm.clone(), Arc::new(FakeIndex::default()), memory.clone());
    pipeline.ask("and clause five?", "u1").await.unwrap();

    let calls = llm.calls();
    let route_prompt = &calls[0].1;
    assert!(route_prompt.contains("clause four covers termination"));
    assert!(route_prompt.contains("Question: and clause five?"));

    // Both turns of this exchange were appended, answer last (newest).
    let log = memory.recent("u1", 10).await.unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0].role, Role::Assistant);
    assert_eq!(log[1].role, Role::User);
    assert_eq!(log[1].content, "and clause five?");
}

#[tokio::test]
async fn generation_failure_fails_the_request() {
    let llm = FakeLlm::failing();
    let pipeline = pipeline_with(
        llm,
        Arc::new(FakeIndex::default()),
        Arc::new(FakeMemory::default()),
    );

    // Router fails open, then generation's failure is fatal.
    assert!(pipeline.ask("q", "u1").await.is_err());
}

#[tokio::test]
async fn empty_context_still_invokes_the_generator() {
    let llm = FakeLlm::new(&[r#"{"agents": ["pdf"]}"#, "no grounding evidence found"]);
    let pipeline = pipeline_with(
        llm.clone(),
        Arc::new(FakeIndex::default()),
        Arc::new(FakeMemory::default()),
    );

    let result = pipeline.ask("q", "u1").await.unwrap();
    assert!(result.text.starts_with("no grounding evidence found"));
    assert_eq!(llm.calls().len(), 2);
    assert!(result.used_context.is_empty());
}
