use crate::answer::AnswerGenerator;
use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::EmbeddingProvider;
use crate::index::SimilarityIndex;
use crate::ingest::ingest;
use crate::pipeline::QueryContext;
use crate::retriever::Retriever;
use crate::types::{IngestOptions, IngestOutcome};
use async_trait::async_trait;
use paperbot_core::config::INDEX_FILE_NAME;
use paperbot_core::AppResult;
use paperbot_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use paperbot_prompt::{PromptBuilder, SYSTEM_INSTRUCTION};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const DIMENSIONS: usize = 256;

/// Replies with a fixed text and records every prompt it receives.
struct ScriptedClient {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let user = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(user);

        Ok(LlmResponse {
            content: self.reply.clone(),
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }
}

fn options(papers_dir: &Path, index_dir: &Path, chunk_size: usize) -> IngestOptions {
    IngestOptions {
        papers_dir: papers_dir.to_path_buf(),
        index_dir: index_dir.to_path_buf(),
        extension: "tex".to_string(),
        chunk_size,
        chunk_overlap: 20,
        batch_size: 4,
    }
}

fn write_papers(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("optimization.tex"),
        "\\section{Optimization}\nGradient descent converges under convexity assumptions. \
         % reviewer: cite Nesterov\nThe learning rate controls the step size and momentum \
         accelerates convergence on ill-conditioned problems.\n",
    )
    .unwrap();
    fs::write(
        dir.join("generalization.tex"),
        "\\section{Generalization}\nRegularization reduces overfitting. Dropout randomly \
         disables units during training. Weight decay penalizes large parameters.\n",
    )
    .unwrap();
}

async fn load(index_dir: &Path) -> Retriever {
    let index = SimilarityIndex::open(&index_dir.join(INDEX_FILE_NAME)).unwrap();
    Retriever::new(Arc::new(index), Arc::new(TrigramProvider::new(DIMENSIONS))).unwrap()
}

#[tokio::test]
async fn test_reingestion_gives_identical_retrieval() {
    let temp = TempDir::new().unwrap();
    let papers = temp.path().join("papers");
    write_papers(&papers);
    let embedder = TrigramProvider::new(DIMENSIONS);

    let first_dir = temp.path().join("first");
    let second_dir = temp.path().join("second");
    ingest(&options(&papers, &first_dir, 60), &embedder)
        .await
        .unwrap();
    ingest(&options(&papers, &second_dir, 60), &embedder)
        .await
        .unwrap();

    let first = load(&first_dir).await;
    let second = load(&second_dir).await;

    for query in [
        "What affects convergence speed?",
        "How does dropout work?",
        "weight decay",
        "",
    ] {
        let a = first.retrieve(query).await.unwrap();
        let b = second.retrieve(query).await.unwrap();

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.chunk.id, y.chunk.id, "query {:?}", query);
            assert_eq!(x.chunk.text, y.chunk.text);
            assert_eq!(x.score, y.score);
        }
    }
}

#[tokio::test]
async fn test_empty_papers_dir_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let papers = temp.path().join("papers");
    let index_dir = temp.path().join("models/index");
    fs::create_dir_all(&papers).unwrap();
    fs::write(papers.join("notes.md"), "not a paper").unwrap();

    let outcome = ingest(
        &options(&papers, &index_dir, 2000),
        &TrigramProvider::new(DIMENSIONS),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, IngestOutcome::NothingToIndex { .. }));
    assert!(!index_dir.join(INDEX_FILE_NAME).exists());
    assert_eq!(fs::read_dir(&index_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn test_end_to_end_answer() {
    let temp = TempDir::new().unwrap();
    let papers = temp.path().join("papers");
    let index_dir = temp.path().join("models/index");
    fs::create_dir_all(&papers).unwrap();
    fs::write(
        papers.join("paper.tex"),
        "Gradient descent converges under convexity assumptions. % this is a comment\nLearning rate controls step size.",
    )
    .unwrap();

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(TrigramProvider::new(DIMENSIONS));
    let outcome = ingest(&options(&papers, &index_dir, 2000), embedder.as_ref())
        .await
        .unwrap();
    let IngestOutcome::Indexed(stats) = outcome else {
        panic!("expected an index to be written");
    };
    assert_eq!(stats.chunks_count, 1);

    let index = Arc::new(SimilarityIndex::open(&stats.index_path).unwrap());
    let retriever = Retriever::new(index, embedder).unwrap();
    let client = Arc::new(ScriptedClient::new("Convexity and the learning rate."));
    let generator = AnswerGenerator::new(
        client.clone(),
        "llama3",
        SYSTEM_INSTRUCTION,
        Duration::from_secs(5),
    );
    let context = QueryContext::new(retriever, PromptBuilder::new().unwrap(), generator);

    let question = "What affects convergence speed?";
    let answer = context.answer(question).await.unwrap();

    let expected_chunk =
        "Gradient descent converges under convexity assumptions. Learning rate controls step size.";
    assert_eq!(answer.chunks.len(), 1);
    assert_eq!(answer.chunks[0].chunk.text, expected_chunk);
    assert!(!answer.chunks[0].chunk.text.contains("comment"));

    let prompts = client.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(expected_chunk));
    assert!(prompts[0].contains(question));

    assert_eq!(answer.text, "Convexity and the learning rate.");
}
