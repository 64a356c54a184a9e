//! BrainOrchestrator: owns the stores and runs the load, update, persist cycle.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::Value;
use specbrain_core::config::{BanditMode, BrainConfig, PersistMode};
use specbrain_core::errors::{ArtifactError, BrainError, BrainResult};
use specbrain_core::types::RunOutcome;
use specbrain_learning::bandit::{rank_values, RankedCandidate};
use specbrain_learning::hypothesis::{build_hypothesis_queue, HypothesisQueueEntry};
use specbrain_learning::profile::{merge_profile, profile_kind, LearningProfile, ProfileUpdate};
use specbrain_learning::{decode_artifact, encode_artifact, BrainArtifact, SourceIntel};
use specbrain_storage::memory::{DomainYieldMemory, DomainYieldSummary};
use specbrain_storage::{
    ArtifactStore, DatabaseManager, InMemoryMemoryStore, JsonArtifactStore, MemoryStore, SqliteArtifactStore,
    SqliteMemoryStore,
};

use crate::brain::CategoryBrain;
use crate::degradation::{
    artifact_document, DegradationEvent, DegradationTracker, TrackedDegradation, MEMORY_STORE, PRIMARY_ARTIFACT_STORE,
};
use crate::report::BrainReport;
use crate::update::{apply_learners, write_memories, UpdateReport};

const REPORT_LIMIT: usize = 10;

pub struct BrainOrchestrator {
    config: BrainConfig,
    primary: Option<Arc<dyn ArtifactStore>>,
    json: Arc<dyn ArtifactStore>,
    memory: Arc<dyn MemoryStore>,
    degradation: Mutex<DegradationTracker>,
}

impl BrainOrchestrator {
    /// Open the stores under `root`. The memory tables always live in the
    /// SQLite database; artifacts use it only when the persist mode asks for
    /// it. A database that cannot be opened degrades to JSON artifacts and
    /// in-process memory tables.
    pub fn open(config: BrainConfig, root: &Path) -> Self {
        let mut tracker = DegradationTracker::new();
        let json: Arc<dyn ArtifactStore> =
            Arc::new(JsonArtifactStore::new(root.join(config.storage.effective_json_root())));
        let mode = config.storage.effective_persist_mode();
        let db_path = root.join(config.storage.effective_db_path());

        let (primary, memory): (Option<Arc<dyn ArtifactStore>>, Arc<dyn MemoryStore>) =
            match DatabaseManager::open(&db_path, config.storage.effective_read_pool_size()) {
                Ok(db) => {
                    let db = Arc::new(db);
                    let primary = mode
                        .uses_primary()
                        .then(|| Arc::new(SqliteArtifactStore::new(Arc::clone(&db))) as Arc<dyn ArtifactStore>);
                    (primary, Arc::new(SqliteMemoryStore::new(db, config.decay.clone())))
                }
                Err(e) => {
                    if mode.uses_primary() {
                        tracker.record(DegradationEvent::new(PRIMARY_ARTIFACT_STORE, e.to_string(), json.name()));
                    }
                    tracker.record(DegradationEvent::new(MEMORY_STORE, e.to_string(), "memory"));
                    (None, Arc::new(InMemoryMemoryStore::new(config.decay.clone())))
                }
            };

        tracing::info!(
            root = %root.display(),
            persist_mode = mode.name(),
            primary = primary.is_some(),
            memory = memory.backend(),
            "brain orchestrator opened"
        );
        Self {
            config,
            primary,
            json,
            memory,
            degradation: Mutex::new(tracker),
        }
    }

    /// Assemble from explicit stores.
    pub fn with_stores(
        config: BrainConfig,
        primary: Option<Arc<dyn ArtifactStore>>,
        json: Arc<dyn ArtifactStore>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            config,
            primary,
            json,
            memory,
            degradation: Mutex::new(DegradationTracker::new()),
        }
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    pub fn memory(&self) -> &Arc<dyn MemoryStore> {
        &self.memory
    }

    pub fn degradations(&self) -> Vec<TrackedDegradation> {
        self.tracker().events().to_vec()
    }

    fn tracker(&self) -> MutexGuard<'_, DegradationTracker> {
        self.degradation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn degrade(&self, component: &str, error: &BrainError, fallback: &str) {
        self.tracker()
            .record(DegradationEvent::new(component, error.to_string(), fallback));
    }

    fn recovered(&self, component: &str) {
        let mut tracker = self.tracker();
        if tracker.is_degraded(component) {
            tracker.mark_recovered(component);
        }
    }

    /// Primary first; an error or a missing document falls through to JSON.
    fn load_document(&self, category: &str, kind: &str) -> BrainResult<Option<Value>> {
        if let Some(primary) = &self.primary {
            match primary.load(category, kind) {
                Ok(Some(document)) => {
                    self.recovered(PRIMARY_ARTIFACT_STORE);
                    return Ok(Some(document));
                }
                Ok(None) => self.recovered(PRIMARY_ARTIFACT_STORE),
                Err(e) => self.degrade(PRIMARY_ARTIFACT_STORE, &e, self.json.name()),
            }
        }
        self.load_json_document(category, kind)
    }

    /// A JSON document that does not parse is read as absent, so only that
    /// artifact starts over from empty.
    fn load_json_document(&self, category: &str, kind: &str) -> BrainResult<Option<Value>> {
        let component = artifact_document(kind);
        match self.json.load(category, kind) {
            Ok(document) => {
                self.recovered(&component);
                Ok(document)
            }
            Err(BrainError::Artifact(e @ ArtifactError::Parse { .. })) => {
                self.tracker()
                    .record(DegradationEvent::new(&component, e.to_string(), "empty"));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Write one document according to the persist mode. Only a failure of
    /// the JSON write surfaces as an error.
    fn save_document(&self, category: &str, kind: &str, document: &Value) -> BrainResult<()> {
        let mode = self.config.storage.effective_persist_mode();
        let mut primary_ok = false;
        if mode.uses_primary() {
            if let Some(primary) = &self.primary {
                match primary.save(category, kind, document) {
                    Ok(()) => {
                        self.recovered(PRIMARY_ARTIFACT_STORE);
                        primary_ok = true;
                    }
                    Err(e) => self.degrade(PRIMARY_ARTIFACT_STORE, &e, self.json.name()),
                }
            }
        }
        if mode == PersistMode::DualWrite || !primary_ok {
            self.json.save(category, kind, document)?;
        }
        Ok(())
    }

    pub fn load(&self, category: &str) -> BrainResult<CategoryBrain> {
        let _span = specbrain_core::load_span!(category).entered();
        CategoryBrain::from_loader(category, |kind| self.load_document(category, kind))
    }

    pub fn persist(&self, brain: &CategoryBrain) -> BrainResult<()> {
        let mode = self.config.storage.effective_persist_mode();
        let _span = specbrain_core::persist_span!(brain.category, mode.name()).entered();
        for (kind, document) in brain.documents()? {
            self.save_document(&brain.category, kind, &document)?;
        }
        tracing::debug!(category = %brain.category, "brain persisted");
        Ok(())
    }

    pub fn load_profile(&self, category: &str, identity_key: &str) -> BrainResult<LearningProfile> {
        Ok(decode_artifact(self.load_document(category, &profile_kind(identity_key))?))
    }

    /// Fold one run into the category brain and persist every sub-artifact.
    pub fn update(&self, category: &str, run: &RunOutcome) -> BrainResult<UpdateReport> {
        let now = Utc::now();
        let brain = self.load(category)?;
        let output = apply_learners(brain, run, &self.config, now);
        let mut brain = output.brain;

        let identity_key = run.job.identity_key();
        if !identity_key.is_empty() {
            let profile = self.load_profile(category, &identity_key)?;
            let mut profile = merge_profile(profile, &identity_key, &ProfileUpdate::from_run(run));
            profile.touch(now);
            self.save_document(category, &profile_kind(&identity_key), &encode_artifact(&profile)?)?;
        }

        let writes = write_memories(self.memory.as_ref(), category, run, &self.config.gate, &output.deltas, now);
        if let Some(first) = writes.errors.first() {
            self.tracker().record(DegradationEvent::new(MEMORY_STORE, first.to_string(), "skipped"));
        }

        brain.touch(now);
        self.persist(&brain)?;

        let report = UpdateReport {
            category: category.to_string(),
            identity_key,
            validated: run.summary.validated,
            gate_decisions: writes.decisions,
            promoted: output.promoted,
            memory_writes: writes.written,
            memory_failures: writes.errors.len(),
            yield_deltas: output.deltas.len(),
        };
        tracing::info!(
            category,
            validated = report.validated,
            promoted = report.promoted.len(),
            memory_writes = report.memory_writes,
            "brain updated"
        );
        Ok(report)
    }

    pub fn report(&self, category: &str) -> BrainResult<BrainReport> {
        let brain = self.load(category)?;
        let degraded = self
            .tracker()
            .active_degradations()
            .into_iter()
            .map(|t| t.event.component.clone())
            .collect();
        Ok(BrainReport::build(&brain, REPORT_LIMIT, degraded))
    }

    /// Rank candidate rows with the configured seed; `mode` overrides the configured mode.
    pub fn rank_candidates(
        &self,
        rows: &[Value],
        brand_rewards: &BTreeMap<String, f64>,
        mode: Option<BanditMode>,
    ) -> BrainResult<Vec<RankedCandidate>> {
        let bandit = &self.config.bandit;
        let mode = mode.unwrap_or_else(|| bandit.effective_mode());
        Ok(rank_values(rows, brand_rewards, mode, bandit.effective_seed())?)
    }

    /// Hypothesis queue for a run, using the category's stored source intel.
    pub fn hypothesis_queue(&self, category: &str, run: &RunOutcome) -> BrainResult<Vec<HypothesisQueueEntry>> {
        let intel: SourceIntel = decode_artifact(self.load_document(category, SourceIntel::KIND)?);
        Ok(build_hypothesis_queue(run, &intel, &self.config.hypothesis))
    }

    pub fn low_yield_domains(
        &self,
        category: &str,
        min_seen: i64,
        max_yield: f64,
    ) -> BrainResult<Vec<DomainYieldSummary>> {
        Ok(self.memory.low_yield_domains(category, min_seen, max_yield)?)
    }
}
