//! The retrieval pipeline: ingestion and answering.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use tenant_store::{ChatRecord, RecordStore, Tenant};
use vector_store::{ChunkMeta, MetadataFilter, VectorRecord};

use crate::chunker::{DEFAULT_CHUNK_CHARS, chunk_text};
use crate::error::EngineError;
use crate::prompt;
use crate::quota::QuotaGate;
use crate::traits::{CompletionModel, Embedder, VectorIndex};

/// Number of candidates requested from the index per query.
pub const TOP_K: u64 = 5;

/// Visitor partition used when the caller does not supply one.
pub const DEFAULT_VISITOR: &str = "default";

/// Bounded fan-out for per-chunk embedding calls during ingestion.
const EMBED_CONCURRENCY: usize = 4;

/// Orchestrates chunking, embedding, tenant-scoped retrieval and completion
/// over the collaborator traits. Constructed once at startup and shared
/// across requests; every entrypoint delegates here.
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    model: Arc<dyn CompletionModel>,
    store: Arc<dyn RecordStore>,
    chunk_chars: usize,
}

impl RetrievalPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn CompletionModel>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            model,
            store,
            chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }

    /// Ingests one document for a tenant/visitor pair.
    ///
    /// Chunks the text, embeds every non-blank chunk (bounded concurrency,
    /// all-or-nothing: any embedding failure aborts before the index
    /// write), batch-upserts records with ids
    /// `{tenant}_{visitor}_{filename}_{index}`, then increments the upload
    /// counter exactly once per document. Re-ingesting the same
    /// (tenant, visitor, filename) overwrites the same record ids but still
    /// counts as a new upload.
    ///
    /// # Errors
    /// - [`EngineError::InvalidInput`] on blank filename/text
    /// - [`EngineError::InvalidVisitor`] on a malformed visitor id
    /// - [`EngineError::QuotaExceeded`] before any expensive work
    /// - [`EngineError::Upstream`] on embedding/index failures
    pub async fn ingest_document(
        &self,
        tenant: &Tenant,
        visitor_id: Option<&str>,
        filename: &str,
        text: &str,
    ) -> Result<(), EngineError> {
        if filename.trim().is_empty() {
            return Err(EngineError::InvalidInput("filename is required".into()));
        }
        // A whitespace-only document would chunk to nothing and store
        // nothing; charging an upload for it would be wrong.
        if text.trim().is_empty() {
            return Err(EngineError::InvalidInput("text is required".into()));
        }
        let visitor = visitor_id.unwrap_or(DEFAULT_VISITOR);
        validate_visitor(visitor)?;

        QuotaGate::check_upload(tenant)?;

        let chunks = chunk_text(text, self.chunk_chars);
        let total = chunks.len();

        // Blank chunks are dropped before embedding; the surviving chunks
        // keep their original position indices.
        let embeddable: Vec<(usize, String)> = chunks
            .into_iter()
            .filter(|c| !c.text.trim().is_empty())
            .map(|c| (c.index, c.text.trim().to_string()))
            .collect();

        debug!(
            tenant_id = %tenant.id,
            visitor_id = %visitor,
            filename,
            chunks = total,
            embeddable = embeddable.len(),
            "ingesting document"
        );

        let mut embedded: Vec<(usize, String, Vec<f32>)> = stream::iter(embeddable)
            .map(|(index, chunk)| {
                let embedder = Arc::clone(&self.embedder);
                async move {
                    let vector = embedder.embed(&chunk).await?;
                    Ok::<_, EngineError>((index, chunk, vector))
                }
            })
            .buffer_unordered(EMBED_CONCURRENCY)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, EngineError>>()?;

        // Completion order of the concurrent embeds is irrelevant to the
        // stored state (distinct ids), but keep the batch deterministic.
        embedded.sort_by_key(|(index, _, _)| *index);

        let records: Vec<VectorRecord> = embedded
            .into_iter()
            .map(|(index, chunk, vector)| VectorRecord {
                id: format!("{}_{}_{}_{}", tenant.id, visitor, filename, index),
                embedding: vector,
                meta: ChunkMeta {
                    tenant_id: tenant.id.clone(),
                    visitor_id: visitor.to_string(),
                    filename: filename.to_string(),
                    text: chunk,
                },
            })
            .collect();

        let stored = records.len();
        self.index.upsert(records).await?;

        // One logical ingestion event per document, regardless of chunk
        // count.
        self.store.increment_upload_count(&tenant.id).await?;

        info!(
            tenant_id = %tenant.id,
            visitor_id = %visitor,
            filename,
            stored,
            "document ingested"
        );
        Ok(())
    }

    /// Answers a visitor question against the tenant's corpus.
    ///
    /// Embeds the question, queries with a `{tenant, visitor}` filter, and
    /// on zero matches relaxes to `{tenant}` only, a controlled broadening
    /// that never crosses the tenant boundary. With no context at
    /// all the fixed no-knowledge reply is returned without a completion
    /// call. On success the conversation record is persisted and the
    /// question counter incremented; a completion failure leaves both
    /// untouched.
    ///
    /// Each call is a fresh conversation turn; there is no dedup.
    ///
    /// # Errors
    /// - [`EngineError::InvalidInput`] / [`EngineError::InvalidVisitor`]
    /// - [`EngineError::QuotaExceeded`] before any expensive work
    /// - [`EngineError::Upstream`] on embedding/index/completion failures
    pub async fn answer(
        &self,
        tenant: &Tenant,
        visitor_id: &str,
        message: &str,
    ) -> Result<String, EngineError> {
        let question = message.trim();
        if question.is_empty() {
            return Err(EngineError::InvalidInput("message is required".into()));
        }
        validate_visitor(visitor_id)?;

        QuotaGate::check_question(tenant)?;

        // Non-critical telemetry; never blocks the reply path.
        if let Err(err) = self.store.record_question(&tenant.id, question).await {
            warn!(tenant_id = %tenant.id, error = %err, "analytics update failed");
        }

        let query_vector = self.embedder.embed(question).await?;

        let mut matches = self
            .index
            .query(
                query_vector.clone(),
                TOP_K,
                &MetadataFilter::tenant_visitor(&tenant.id, visitor_id),
            )
            .await?;

        if matches.is_empty() {
            debug!(
                tenant_id = %tenant.id,
                visitor_id,
                "no visitor-scoped matches, relaxing filter to tenant scope"
            );
            matches = self
                .index
                .query(query_vector, TOP_K, &MetadataFilter::tenant(&tenant.id))
                .await?;
        }

        // The index filter already scopes by tenant; a foreign record here
        // would mean index corruption. Drop it rather than leak it.
        matches.retain(|m| {
            if m.meta.tenant_id == tenant.id {
                true
            } else {
                warn!(
                    tenant_id = %tenant.id,
                    foreign = %m.meta.tenant_id,
                    record = %m.id,
                    "dropping cross-tenant match from index response"
                );
                false
            }
        });

        let context = prompt::join_context(&matches);
        let reply = if context.trim().is_empty() {
            info!(tenant_id = %tenant.id, visitor_id, "no context available, skipping completion");
            prompt::NO_KNOWLEDGE_REPLY.to_string()
        } else {
            let user = prompt::build_user_prompt(&context, question);
            self.model.complete(prompt::SYSTEM_PROMPT, &user).await?
        };

        self.store
            .append_chat(&ChatRecord {
                tenant_id: tenant.id.clone(),
                visitor_id: visitor_id.to_string(),
                message: question.to_string(),
                reply: reply.clone(),
                created_at: Utc::now(),
            })
            .await?;
        self.store.increment_question_count(&tenant.id).await?;

        Ok(reply)
    }

    /// Conversation history for a tenant/visitor pair, ascending by time.
    pub async fn history(
        &self,
        tenant: &Tenant,
        visitor_id: &str,
    ) -> Result<Vec<ChatRecord>, EngineError> {
        validate_visitor(visitor_id)?;
        Ok(self.store.history(&tenant.id, visitor_id).await?)
    }
}

/// Validates a client-held opaque visitor id: non-empty, at most 128
/// characters, ASCII alphanumeric plus `-`, `_` and `.`. Visitor ids are
/// embedded in composite vector record ids, so the shape is restricted.
fn validate_visitor(visitor_id: &str) -> Result<(), EngineError> {
    if visitor_id.is_empty() || visitor_id.len() > 128 {
        return Err(EngineError::InvalidVisitor);
    }
    if !visitor_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(EngineError::InvalidVisitor);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tenant_store::{
        AnalyticsSnapshot, Plan, StoreError, SubscriptionStatus, WidgetSettings,
    };
    use vector_store::VectorMatch;

    use crate::prompt::{NO_KNOWLEDGE_REPLY, SYSTEM_PROMPT};
    use crate::quota::UPGRADE_MESSAGE;

    fn tenant(plan: Plan, status: SubscriptionStatus, uploads: i64, questions: i64) -> Tenant {
        Tenant {
            id: "t1".into(),
            plan,
            subscription_status: status,
            upload_count: uploads,
            question_count: questions,
            allowed_origins: vec![],
            widget_settings: WidgetSettings::default(),
            api_key: "ck_test".into(),
            created_at: Utc::now(),
        }
    }

    fn free_tenant() -> Tenant {
        tenant(Plan::Free, SubscriptionStatus::Inactive, 0, 0)
    }

    struct MockEmbedder {
        calls: AtomicUsize,
        fail_from_call: Option<usize>,
    }

    impl MockEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_from_call: None,
            }
        }

        fn failing_from(call: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_from_call: Some(call),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EngineError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(from) = self.fail_from_call {
                if n >= from {
                    return Err(EngineError::upstream(
                        "embedding",
                        std::io::Error::other("rate limited"),
                    ));
                }
            }
            Ok(vec![0.1; 8])
        }
    }

    #[derive(Default)]
    struct MockIndex {
        upserts: Mutex<Vec<Vec<VectorRecord>>>,
        responses: Mutex<VecDeque<Vec<VectorMatch>>>,
        queries: Mutex<Vec<MetadataFilter>>,
    }

    impl MockIndex {
        fn respond_with(&self, matches: Vec<VectorMatch>) {
            self.responses.lock().unwrap().push_back(matches);
        }

        fn upserted(&self) -> Vec<Vec<VectorRecord>> {
            self.upserts.lock().unwrap().clone()
        }

        fn queries(&self) -> Vec<MetadataFilter> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorIndex for MockIndex {
        async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), EngineError> {
            self.upserts.lock().unwrap().push(records);
            Ok(())
        }

        async fn query(
            &self,
            _vector: Vec<f32>,
            _top_k: u64,
            filter: &MetadataFilter,
        ) -> Result<Vec<VectorMatch>, EngineError> {
            self.queries.lock().unwrap().push(filter.clone());
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default())
        }
    }

    struct MockModel {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MockModel {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionModel for MockModel {
        async fn complete(&self, system: &str, user: &str) -> Result<String, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(system, SYSTEM_PROMPT);
            if self.fail {
                return Err(EngineError::upstream(
                    "completion",
                    std::io::Error::other("bad gateway"),
                ));
            }
            Ok(format!("answer to: {user}"))
        }
    }

    /// In-memory store double tracking exactly what the pipeline mutates.
    struct MemStore {
        tenant: Mutex<Tenant>,
        chats: Mutex<Vec<ChatRecord>>,
        questions: Mutex<Vec<String>>,
        fail_analytics: bool,
    }

    impl MemStore {
        fn with_tenant(tenant: Tenant) -> Self {
            Self {
                tenant: Mutex::new(tenant),
                chats: Mutex::new(vec![]),
                questions: Mutex::new(vec![]),
                fail_analytics: false,
            }
        }

        fn upload_count(&self) -> i64 {
            self.tenant.lock().unwrap().upload_count
        }

        fn question_count(&self) -> i64 {
            self.tenant.lock().unwrap().question_count
        }

        fn chats(&self) -> Vec<ChatRecord> {
            self.chats.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordStore for MemStore {
        async fn create_tenant(
            &self,
            _plan: Plan,
            _allowed_origins: &[String],
        ) -> Result<Tenant, StoreError> {
            Ok(self.tenant.lock().unwrap().clone())
        }

        async fn tenant(&self, id: &str) -> Result<Tenant, StoreError> {
            let t = self.tenant.lock().unwrap().clone();
            if t.id == id { Ok(t) } else { Err(StoreError::NotFound) }
        }

        async fn tenant_by_api_key(&self, api_key: &str) -> Result<Tenant, StoreError> {
            let t = self.tenant.lock().unwrap().clone();
            if t.api_key == api_key {
                Ok(t)
            } else {
                Err(StoreError::NotFound)
            }
        }

        async fn increment_upload_count(&self, _id: &str) -> Result<(), StoreError> {
            self.tenant.lock().unwrap().upload_count += 1;
            Ok(())
        }

        async fn increment_question_count(&self, _id: &str) -> Result<(), StoreError> {
            self.tenant.lock().unwrap().question_count += 1;
            Ok(())
        }

        async fn update_widget_settings(
            &self,
            _id: &str,
            settings: &WidgetSettings,
        ) -> Result<(), StoreError> {
            self.tenant.lock().unwrap().widget_settings = settings.clone();
            Ok(())
        }

        async fn append_chat(&self, record: &ChatRecord) -> Result<(), StoreError> {
            self.chats.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn history(
            &self,
            tenant_id: &str,
            visitor_id: &str,
        ) -> Result<Vec<ChatRecord>, StoreError> {
            Ok(self
                .chats
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.tenant_id == tenant_id && c.visitor_id == visitor_id)
                .cloned()
                .collect())
        }

        async fn record_question(
            &self,
            _tenant_id: &str,
            question: &str,
        ) -> Result<(), StoreError> {
            if self.fail_analytics {
                return Err(StoreError::NotFound);
            }
            self.questions.lock().unwrap().push(question.to_string());
            Ok(())
        }

        async fn analytics(&self, _tenant_id: &str) -> Result<AnalyticsSnapshot, StoreError> {
            Ok(AnalyticsSnapshot::default())
        }
    }

    struct Harness {
        embedder: Arc<MockEmbedder>,
        index: Arc<MockIndex>,
        model: Arc<MockModel>,
        store: Arc<MemStore>,
        pipeline: RetrievalPipeline,
    }

    fn harness(tenant: Tenant) -> Harness {
        harness_with(tenant, MockEmbedder::new(), MockModel::new())
    }

    fn harness_with(tenant: Tenant, embedder: MockEmbedder, model: MockModel) -> Harness {
        let embedder = Arc::new(embedder);
        let index = Arc::new(MockIndex::default());
        let model = Arc::new(model);
        let store = Arc::new(MemStore::with_tenant(tenant));
        let pipeline = RetrievalPipeline::new(
            embedder.clone(),
            index.clone(),
            model.clone(),
            store.clone(),
        );
        Harness {
            embedder,
            index,
            model,
            store,
            pipeline,
        }
    }

    fn hit(tenant_id: &str, text: &str, score: f32) -> VectorMatch {
        VectorMatch {
            id: format!("{tenant_id}_v1_foo.txt_0"),
            score,
            meta: ChunkMeta {
                tenant_id: tenant_id.into(),
                visitor_id: "v1".into(),
                filename: "foo.txt".into(),
                text: text.into(),
            },
        }
    }

    #[tokio::test]
    async fn ingestion_chunks_embeds_and_counts_once() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();
        let text = "x".repeat(4500);

        h.pipeline
            .ingest_document(&tenant, Some("v1"), "foo.txt", &text)
            .await
            .unwrap();

        assert_eq!(h.embedder.calls(), 3);

        let upserts = h.index.upserted();
        assert_eq!(upserts.len(), 1, "one batch upsert per document");
        let ids: Vec<&str> = upserts[0].iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t1_v1_foo.txt_0", "t1_v1_foo.txt_1", "t1_v1_foo.txt_2"]);
        assert_eq!(upserts[0][0].meta.tenant_id, "t1");
        assert_eq!(upserts[0][2].meta.text.len(), 500);

        assert_eq!(h.store.upload_count(), 1);
    }

    #[tokio::test]
    async fn reingestion_produces_identical_ids_but_counts_again() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();
        let text = "data ".repeat(500);

        h.pipeline
            .ingest_document(&tenant, Some("v1"), "foo.txt", &text)
            .await
            .unwrap();
        h.pipeline
            .ingest_document(&tenant, Some("v1"), "foo.txt", &text)
            .await
            .unwrap();

        let upserts = h.index.upserted();
        assert_eq!(upserts.len(), 2);
        let first: Vec<&str> = upserts[0].iter().map(|r| r.id.as_str()).collect();
        let second: Vec<&str> = upserts[1].iter().map(|r| r.id.as_str()).collect();
        assert_eq!(first, second, "same identity triple overwrites, not duplicates");

        // Deliberate policy: the upload counter is per call, not per id set.
        assert_eq!(h.store.upload_count(), 2);
    }

    #[tokio::test]
    async fn default_visitor_is_applied_when_absent() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();

        h.pipeline
            .ingest_document(&tenant, None, "foo.txt", "hello")
            .await
            .unwrap();

        let upserts = h.index.upserted();
        assert_eq!(upserts[0][0].id, "t1_default_foo.txt_0");
        assert_eq!(upserts[0][0].meta.visitor_id, "default");
    }

    #[tokio::test]
    async fn blank_chunks_are_skipped_without_renumbering() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();
        // Chunk 0 is entirely whitespace, chunk 1 holds the text.
        let text = format!("{}hello world", " ".repeat(2000));

        h.pipeline
            .ingest_document(&tenant, Some("v1"), "foo.txt", &text)
            .await
            .unwrap();

        assert_eq!(h.embedder.calls(), 1);
        let upserts = h.index.upserted();
        assert_eq!(upserts[0].len(), 1);
        assert_eq!(upserts[0][0].id, "t1_v1_foo.txt_1");
        assert_eq!(upserts[0][0].meta.text, "hello world");
    }

    #[tokio::test]
    async fn whitespace_only_document_is_rejected_without_a_quota_charge() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();

        let err = h
            .pipeline
            .ingest_document(&tenant, Some("v1"), "foo.txt", &" \n\t".repeat(800))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert_eq!(h.embedder.calls(), 0);
        assert!(h.index.upserted().is_empty());
        assert_eq!(h.store.upload_count(), 0);
    }

    #[tokio::test]
    async fn sixth_upload_is_rejected_before_any_work() {
        let h = harness(tenant(Plan::Free, SubscriptionStatus::Inactive, 5, 0));
        let tenant = h.store.tenant("t1").await.unwrap();

        let err = h
            .pipeline
            .ingest_document(&tenant, Some("v1"), "foo.txt", "hello")
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::QuotaExceeded(msg) if msg == UPGRADE_MESSAGE));
        assert_eq!(h.embedder.calls(), 0, "gate precedes embedding");
        assert!(h.index.upserted().is_empty(), "gate precedes index writes");
        assert_eq!(h.store.upload_count(), 5);
    }

    #[tokio::test]
    async fn fifth_upload_is_permitted_and_counted() {
        let h = harness(tenant(Plan::Free, SubscriptionStatus::Inactive, 4, 0));
        let tenant = h.store.tenant("t1").await.unwrap();

        h.pipeline
            .ingest_document(&tenant, Some("v1"), "foo.txt", "hello")
            .await
            .unwrap();

        assert_eq!(h.store.upload_count(), 5);
    }

    #[tokio::test]
    async fn embedding_failure_aborts_the_whole_batch() {
        let h = harness_with(free_tenant(), MockEmbedder::failing_from(1), MockModel::new());
        let tenant = h.store.tenant("t1").await.unwrap();
        let text = "x".repeat(4500);

        let err = h
            .pipeline
            .ingest_document(&tenant, Some("v1"), "foo.txt", &text)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Upstream { stage: "embedding", .. }));
        assert!(h.index.upserted().is_empty(), "no partial commits");
        assert_eq!(h.store.upload_count(), 0);
    }

    #[tokio::test]
    async fn answer_uses_visitor_scoped_filter_first() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();
        h.index
            .respond_with(vec![hit("t1", "alpha", 0.9), hit("t1", "beta", 0.8)]);

        let reply = h.pipeline.answer(&tenant, "v1", "what?").await.unwrap();

        let queries = h.index.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0], MetadataFilter::tenant_visitor("t1", "v1"));

        assert_eq!(reply, "answer to: Context: alpha\nbeta\n\nQuestion: what?");
        assert_eq!(h.model.calls(), 1);

        let chats = h.store.chats();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].message, "what?");
        assert_eq!(chats[0].reply, reply);
        assert_eq!(h.store.question_count(), 1);
        assert_eq!(h.store.questions.lock().unwrap().as_slice(), ["what?"]);
    }

    #[tokio::test]
    async fn zero_visitor_matches_fall_back_to_tenant_scope() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();
        h.index.respond_with(vec![]);
        h.index.respond_with(vec![hit("t1", "from fallback", 0.7)]);

        let reply = h.pipeline.answer(&tenant, "v1", "what?").await.unwrap();

        let queries = h.index.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], MetadataFilter::tenant_visitor("t1", "v1"));
        assert_eq!(queries[1], MetadataFilter::tenant("t1"));
        assert!(reply.contains("from fallback") || h.model.calls() == 1);
    }

    #[tokio::test]
    async fn no_context_returns_fixed_reply_without_completion() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();
        // Both the scoped and the relaxed query return nothing.

        let reply = h.pipeline.answer(&tenant, "v1", "what?").await.unwrap();

        assert_eq!(reply, NO_KNOWLEDGE_REPLY);
        assert_eq!(h.model.calls(), 0, "no completion call in no-knowledge state");
        assert_eq!(h.index.queries().len(), 2);
        // Still a successful turn: recorded and counted.
        assert_eq!(h.store.chats().len(), 1);
        assert_eq!(h.store.question_count(), 1);
    }

    #[tokio::test]
    async fn cross_tenant_matches_are_dropped() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();
        h.index.respond_with(vec![hit("other-tenant", "secret", 0.99)]);

        let reply = h.pipeline.answer(&tenant, "v1", "what?").await.unwrap();

        // The foreign record never reaches the model or the reply.
        assert_eq!(reply, NO_KNOWLEDGE_REPLY);
        assert_eq!(h.model.calls(), 0);
    }

    #[tokio::test]
    async fn completion_failure_persists_nothing() {
        let h = harness_with(free_tenant(), MockEmbedder::new(), MockModel::failing());
        let tenant = h.store.tenant("t1").await.unwrap();
        h.index.respond_with(vec![hit("t1", "alpha", 0.9)]);

        let err = h.pipeline.answer(&tenant, "v1", "what?").await.unwrap_err();

        assert!(matches!(err, EngineError::Upstream { stage: "completion", .. }));
        assert!(h.store.chats().is_empty(), "no record on completion failure");
        assert_eq!(h.store.question_count(), 0, "no quota charge on failure");
    }

    #[tokio::test]
    async fn question_counter_tracks_each_successful_turn() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();

        for i in 0..3 {
            h.index.respond_with(vec![hit("t1", "alpha", 0.9)]);
            // Re-read the tenant so the gate sees fresh counters.
            let current = h.store.tenant("t1").await.unwrap();
            h.pipeline
                .answer(&current, "v1", &format!("question {i}"))
                .await
                .unwrap();
        }

        assert_eq!(h.store.question_count(), 3);
        assert_eq!(h.store.chats().len(), 3);
        assert_eq!(tenant.question_count, 0, "gate reads a snapshot");
    }

    #[tokio::test]
    async fn twenty_first_question_is_rejected() {
        let h = harness(tenant(Plan::Free, SubscriptionStatus::Inactive, 0, 20));
        let tenant = h.store.tenant("t1").await.unwrap();

        let err = h.pipeline.answer(&tenant, "v1", "what?").await.unwrap_err();

        assert!(matches!(err, EngineError::QuotaExceeded(msg) if msg == UPGRADE_MESSAGE));
        assert_eq!(h.embedder.calls(), 0);
        assert_eq!(h.store.question_count(), 20);
    }

    #[tokio::test]
    async fn active_paid_tenant_is_never_blocked() {
        let h = harness(tenant(Plan::Paid, SubscriptionStatus::Active, 100, 1000));
        let tenant = h.store.tenant("t1").await.unwrap();
        h.index.respond_with(vec![hit("t1", "alpha", 0.9)]);

        h.pipeline.answer(&tenant, "v1", "what?").await.unwrap();
        assert_eq!(h.store.question_count(), 1001, "still tracked for analytics");
    }

    #[tokio::test]
    async fn invalid_visitor_ids_are_rejected() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();

        for bad in ["", "has spaces", "semi;colon", &"v".repeat(200)] {
            let err = h.pipeline.answer(&tenant, bad, "what?").await.unwrap_err();
            assert!(matches!(err, EngineError::InvalidVisitor), "visitor {bad:?}");
        }
        assert_eq!(h.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn analytics_failure_does_not_block_the_reply() {
        let mut store = MemStore::with_tenant(free_tenant());
        store.fail_analytics = true;
        let store = Arc::new(store);
        let index = Arc::new(MockIndex::default());
        index.respond_with(vec![hit("t1", "alpha", 0.9)]);
        let pipeline = RetrievalPipeline::new(
            Arc::new(MockEmbedder::new()),
            index,
            Arc::new(MockModel::new()),
            store.clone(),
        );
        let tenant = store.tenant("t1").await.unwrap();

        let reply = pipeline.answer(&tenant, "v1", "what?").await.unwrap();
        assert!(reply.starts_with("answer to:"));
    }

    #[tokio::test]
    async fn empty_message_and_filename_are_validation_errors() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();

        assert!(matches!(
            h.pipeline.answer(&tenant, "v1", "   ").await.unwrap_err(),
            EngineError::InvalidInput(_)
        ));
        assert!(matches!(
            h.pipeline
                .ingest_document(&tenant, Some("v1"), "  ", "body")
                .await
                .unwrap_err(),
            EngineError::InvalidInput(_)
        ));
        assert!(matches!(
            h.pipeline
                .ingest_document(&tenant, Some("v1"), "foo.txt", "")
                .await
                .unwrap_err(),
            EngineError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn history_is_scoped_to_the_visitor() {
        let h = harness(free_tenant());
        let tenant = h.store.tenant("t1").await.unwrap();
        h.index.respond_with(vec![hit("t1", "alpha", 0.9)]);
        h.pipeline.answer(&tenant, "v1", "first").await.unwrap();
        h.index.respond_with(vec![hit("t1", "alpha", 0.9)]);
        h.pipeline.answer(&tenant, "v2", "second").await.unwrap();

        let history = h.pipeline.history(&tenant, "v1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "first");
    }
}
