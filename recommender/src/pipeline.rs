//! The recommendation pipeline.
//!
//! `Start → Embedding → Retrieval → ContextAssembly → PromptBuild → Generation → Done`
//!
//! Each stage runs once, in order; the first error ends the run. The pipeline
//! holds only shared immutable handles, so one instance serves all requests.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use review_index::ReviewIndex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api_types::{Query, RecommendOptions};
use crate::cfg::RecommenderConfig;
use crate::context::assemble;
use crate::embedding::EmbeddingClient;
use crate::error::RecommendError;
use crate::generation::GenerationClient;
use crate::ports::{EmbeddingBackend, GenerationBackend, SearchBackend};
use crate::prompt::build;
use crate::retrieval::SimilaritySearchClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Start,
    Embedding,
    Retrieval,
    ContextAssembly,
    PromptBuild,
    Generation,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Embedding => "embedding",
            Self::Retrieval => "retrieval",
            Self::ContextAssembly => "context_assembly",
            Self::PromptBuild => "prompt_build",
            Self::Generation => "generation",
            Self::Done => "done",
        })
    }
}

pub struct Pipeline {
    cfg: RecommenderConfig,
    embedder: EmbeddingClient,
    search: SimilaritySearchClient,
    generator: GenerationClient,
}

impl Pipeline {
    pub fn new(
        cfg: RecommenderConfig,
        embedding: Arc<dyn EmbeddingBackend>,
        search: Arc<dyn SearchBackend>,
        generation: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            cfg,
            embedder: EmbeddingClient::new(embedding),
            search: SimilaritySearchClient::new(search),
            generator: GenerationClient::new(generation),
        }
    }

    /// Wires the production backends: one LLM service for both profiles plus the review index.
    pub fn from_services(
        cfg: RecommenderConfig,
        llm: Arc<LlmServiceProfiles>,
        index: Arc<ReviewIndex>,
    ) -> Self {
        Self::new(cfg, llm.clone(), index, llm)
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.cfg
    }

    /// Runs the pipeline without a deadline.
    ///
    /// Blank text never gets here: building the [`Query`] already rejected it.
    pub async fn recommend(&self, query: &Query) -> Result<String, RecommendError> {
        self.recommend_with(query, RecommendOptions::default()).await
    }

    /// Runs the pipeline; external stages are bounded by `opts.deadline` when set.
    pub async fn recommend_with(
        &self,
        query: &Query,
        opts: RecommendOptions,
    ) -> Result<String, RecommendError> {
        let started = Instant::now();
        let mut stage = Stage::Start;

        let res = self.run(query, opts.deadline, &mut stage).await;
        let elapsed_ms = started.elapsed().as_millis();

        match &res {
            Ok(text) => info!(elapsed_ms, chars = text.len(), "recommendation produced"),
            Err(e) => warn!(%stage, elapsed_ms, code = e.code(), error = %e, "recommendation failed"),
        }
        res
    }

    async fn run(
        &self,
        query: &Query,
        deadline: Option<Instant>,
        stage: &mut Stage,
    ) -> Result<String, RecommendError> {
        enter(stage, Stage::Start);

        enter(stage, Stage::Embedding);
        let vector = bounded(deadline, *stage, self.embedder.embed(query.as_str())).await?;

        enter(stage, Stage::Retrieval);
        let records = bounded(deadline, *stage, self.search.search(&vector, self.cfg.top_k)).await?;
        for r in &records {
            debug!(professor = %r.id, score = r.score, "retrieved");
        }

        enter(stage, Stage::ContextAssembly);
        let context = assemble(&records);

        enter(stage, Stage::PromptBuild);
        let request = build(&self.cfg.system_instruction, &context, query.as_str());

        enter(stage, Stage::Generation);
        let answer = bounded(deadline, *stage, self.generator.generate(&request)).await?;

        enter(stage, Stage::Done);
        Ok(answer)
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    *stage = next;
    debug!(stage = %next, "pipeline stage");
}

async fn bounded<T, F>(deadline: Option<Instant>, stage: Stage, fut: F) -> Result<T, RecommendError>
where
    F: Future<Output = Result<T, RecommendError>>,
{
    match deadline {
        Some(at) => tokio::time::timeout_at(at, fut)
            .await
            .map_err(|_| RecommendError::Timeout { stage })?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use review_index::{NeighborRecord, ReviewMetadata};
    use serde_json::{Value, json};

    use super::*;
    use crate::context::NO_MATCHES;
    use crate::retrieval::SEARCH_FAILED;
    use crate::ports::{BackendError, BoxFuture};

    struct FakeEmbedder {
        payload: Value,
        calls: AtomicUsize,
        hang: bool,
    }

    impl FakeEmbedder {
        fn returning(payload: Value) -> Arc<Self> {
            Arc::new(Self {
                payload,
                calls: AtomicUsize::new(0),
                hang: false,
            })
        }
    }

    impl EmbeddingBackend for FakeEmbedder {
        fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Value, BackendError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if self.hang {
                    std::future::pending::<()>().await;
                }
                Ok(self.payload.clone())
            })
        }
    }

    struct FakeIndex {
        records: Vec<NeighborRecord>,
        fail: bool,
        calls: AtomicUsize,
        seen_k: AtomicUsize,
    }

    impl FakeIndex {
        fn with(records: Vec<NeighborRecord>) -> Arc<Self> {
            Arc::new(Self {
                records,
                fail: false,
                calls: AtomicUsize::new(0),
                seen_k: AtomicUsize::new(0),
            })
        }
    }

    impl SearchBackend for FakeIndex {
        fn query<'a>(
            &'a self,
            _vector: &'a [f32],
            top_k: u64,
        ) -> BoxFuture<'a, Result<Vec<NeighborRecord>, BackendError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_k.store(top_k as usize, Ordering::SeqCst);
            Box::pin(async move {
                if self.fail {
                    return Err("index unavailable".into());
                }
                Ok(self.records.clone())
            })
        }
    }

    #[derive(Default)]
    struct FakeGenerator {
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl GenerationBackend for FakeGenerator {
        fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BackendError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut slot) = self.last_prompt.lock() {
                *slot = Some(prompt.to_string());
            }
            Box::pin(async move {
                let picks: Vec<&str> = ["Dr. Ada", "Dr. Bo", "Dr. Cy"]
                    .into_iter()
                    .filter(|name| prompt.contains(name))
                    .collect();
                if picks.is_empty() {
                    Ok("Sorry, no professor in the database matches that request.".to_string())
                } else {
                    Ok(format!("Top picks: {}", picks.join(", ")))
                }
            })
        }
    }

    fn rec(id: &str, score: f32) -> NeighborRecord {
        NeighborRecord {
            id: id.into(),
            score,
            metadata: ReviewMetadata {
                review: "Grades leniently and explains clearly.".into(),
                subject: "Computer Science".into(),
                stars: Some(5.0),
                ..Default::default()
            },
        }
    }

    fn pipeline(
        emb: &Arc<FakeEmbedder>,
        idx: &Arc<FakeIndex>,
        generator: &Arc<FakeGenerator>,
    ) -> Pipeline {
        Pipeline::new(
            RecommenderConfig::default(),
            emb.clone(),
            idx.clone(),
            generator.clone(),
        )
    }

    fn q(text: &str) -> Query {
        Query::new(text).unwrap()
    }

    fn prompt_of(generator: &FakeGenerator) -> String {
        generator.last_prompt.lock().unwrap().clone().unwrap_or_default()
    }

    #[tokio::test]
    async fn three_matches_produce_a_grounded_answer() {
        let emb = FakeEmbedder::returning(json!([0.1, 0.2, 0.3]));
        let idx = FakeIndex::with(vec![rec("Dr. Bo", 0.8), rec("Dr. Ada", 0.9), rec("Dr. Cy", 0.7)]);
        let generator = Arc::new(FakeGenerator::default());

        let text = pipeline(&emb, &idx, &generator)
            .recommend(&q("I want a lenient grader in computer science"))
            .await
            .unwrap();

        assert_eq!(text, "Top picks: Dr. Ada, Dr. Bo, Dr. Cy");
        assert_eq!(emb.calls.load(Ordering::SeqCst), 1);
        assert_eq!(idx.calls.load(Ordering::SeqCst), 1);
        assert_eq!(idx.seen_k.load(Ordering::SeqCst), 3);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        let prompt = prompt_of(&generator);
        let ada = prompt.find("1. Professor: Dr. Ada").unwrap();
        let bo = prompt.find("2. Professor: Dr. Bo").unwrap();
        let query = prompt.find("I want a lenient grader").unwrap();
        assert!(ada < bo && bo < query);
    }

    #[tokio::test]
    async fn empty_query_makes_no_calls() {
        let emb = FakeEmbedder::returning(json!([0.1]));
        let idx = FakeIndex::with(vec![]);
        let generator = Arc::new(FakeGenerator::default());
        let _pipeline = pipeline(&emb, &idx, &generator);

        // The only way into the pipeline is a `Query`, and blank text cannot become one.
        let err = Query::new("   ").unwrap_err();

        assert!(matches!(err, RecommendError::InvalidInput(_)));
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(emb.calls.load(Ordering::SeqCst), 0);
        assert_eq!(idx.calls.load(Ordering::SeqCst), 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_matches_still_generates() {
        let emb = FakeEmbedder::returning(json!([0.4, 0.5]));
        let idx = FakeIndex::with(vec![]);
        let generator = Arc::new(FakeGenerator::default());

        let text = pipeline(&emb, &idx, &generator)
            .recommend(&q("quantum chromodynamics for poets"))
            .await
            .unwrap();

        assert!(!text.is_empty());
        assert!(prompt_of(&generator).contains(NO_MATCHES));
    }

    #[tokio::test]
    async fn malformed_embedding_stops_before_search() {
        let emb = FakeEmbedder::returning(json!([0.1, "oops", 0.3]));
        let idx = FakeIndex::with(vec![rec("Dr. Ada", 0.9)]);
        let generator = Arc::new(FakeGenerator::default());

        let err = pipeline(&emb, &idx, &generator)
            .recommend(&q("easy A"))
            .await
            .unwrap_err();

        assert!(matches!(err, RecommendError::MalformedEmbedding(_)));
        assert_eq!(idx.calls.load(Ordering::SeqCst), 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_unsorted_results_are_capped() {
        let emb = FakeEmbedder::returning(json!([1.0]));
        let idx = FakeIndex::with(vec![
            rec("Dr. Cy", 0.1),
            rec("Dr. Bo", 0.5),
            rec("Dr. Dee", 0.3),
            rec("Dr. Ada", 0.9),
        ]);
        let generator = Arc::new(FakeGenerator::default());

        pipeline(&emb, &idx, &generator).recommend(&q("anyone")).await.unwrap();

        let prompt = prompt_of(&generator);
        assert!(prompt.contains("1. Professor: Dr. Ada"));
        assert!(prompt.contains("3. Professor: Dr. Dee"));
        assert!(!prompt.contains("Dr. Cy"));
    }

    #[tokio::test]
    async fn retrieval_failure_skips_generation() {
        let emb = FakeEmbedder::returning(json!([1.0]));
        let idx = Arc::new(FakeIndex {
            records: vec![],
            fail: true,
            calls: AtomicUsize::new(0),
            seen_k: AtomicUsize::new(0),
        });
        let generator = Arc::new(FakeGenerator::default());

        let err = pipeline(&emb, &idx, &generator).recommend(&q("x")).await.unwrap_err();

        assert!(matches!(err, RecommendError::Retrieval(ref m) if m == SEARCH_FAILED));
        assert!(!err.to_string().contains("index unavailable"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn deadline_names_the_stuck_stage() {
        let emb = Arc::new(FakeEmbedder {
            payload: json!([1.0]),
            calls: AtomicUsize::new(0),
            hang: true,
        });
        let idx = FakeIndex::with(vec![]);
        let generator = Arc::new(FakeGenerator::default());

        let opts = RecommendOptions {
            deadline: Some(Instant::now() + Duration::from_millis(50)),
        };
        let err = pipeline(&emb, &idx, &generator)
            .recommend_with(&q("slow provider"), opts)
            .await
            .unwrap_err();

        assert!(matches!(err, RecommendError::Timeout { stage: Stage::Embedding }));
        assert_eq!(err.code(), "TIMEOUT");
        assert_eq!(idx.calls.load(Ordering::SeqCst), 0);
    }
}
