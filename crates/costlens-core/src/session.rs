//! The costlens session.
//!
//! [`Session`] owns every piece of mutable state (mode, cost store, ledger,
//! snapshots, open panels) and turns editor requests into [`Outcome`]s. It
//! never runs the analyzer itself: commands that need a run hand back a
//! [`PendingAnalysis`], the host executes it off the request loop, and the
//! result comes back through [`Session::complete_analysis`].
//!
//! ```text
//!  request ──▶ Session::handle ──▶ Outcome { events, analysis? }
//!                                              │
//!                      ┌───────────────────────┘
//!                      ▼
//!               Analyzer::run (blocking task)
//!                      │
//!                      ▼
//!        Session::complete_analysis ──▶ Outcome { events }
//! ```
//!
//! At most one analysis is in flight; commands that would start another are
//! rejected with `Busy`.

use crate::{
    analyzer::{split_command, AnalysisJob, AnalysisTarget, Analyzer},
    cache::{CachedDocument, CostCache},
    config::{resolve_path, CostlensConfig},
    error::CostlensError,
    mode::ExecutionMode,
    protocol::{Decoration, Event, PanelKind, Request},
    render, Result,
};

use chrono::Local;
use costlens_drift::{
    bind_declarations, DeclarationExtractor, JavaExtractor, SignificanceDetector, SnapshotCache,
};
use costlens_ledger::{report, CostLedger, CostRecord, CostStore, DocumentId, RecordId};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why an analysis was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPurpose {
    /// Enabling costlens in the given mode.
    Enable(ExecutionMode),
    /// Re-running the analysis of the current mode.
    ReExecute,
    /// Re-analyzing one file while in project mode.
    FileInProject,
}

/// An analysis the host must run and report back.
#[derive(Debug, Clone)]
pub struct PendingAnalysis {
    id: u64,
    purpose: JobPurpose,
    document: Option<DocumentId>,
    job: AnalysisJob,
}

impl PendingAnalysis {
    /// Analyzer invocation.
    pub fn job(&self) -> &AnalysisJob {
        &self.job
    }

    /// Why the analysis was started.
    pub fn purpose(&self) -> JobPurpose {
        self.purpose
    }

    /// Analyzed document, for single-file runs.
    pub fn document(&self) -> Option<&DocumentId> {
        self.document.as_ref()
    }

    /// Progress title.
    pub fn title(&self) -> String {
        match &self.document {
            Some(document) => format!("Running cost analysis on {}", document.file_name()),
            None => "Running cost analysis on the project".to_string(),
        }
    }
}

/// Result of handling a request.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Events for the editor, in order.
    pub events: Vec<Event>,
    /// Analysis to run, if the request started one.
    pub analysis: Option<PendingAnalysis>,
}

impl Outcome {
    fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            analysis: None,
        }
    }
}

#[derive(Debug)]
struct ActiveDocument {
    id: DocumentId,
    text: String,
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    discard: bool,
}

/// Session state and command handling.
pub struct Session {
    config: CostlensConfig,
    analyzer: Arc<dyn Analyzer>,
    detector: SignificanceDetector<Box<dyn DeclarationExtractor>>,
    cache: CostCache,

    mode: ExecutionMode,
    store: CostStore,
    ledger: CostLedger,
    snapshots: SnapshotCache,
    active: Option<ActiveDocument>,
    build_command: Option<Vec<String>>,
    stale: HashSet<DocumentId>,
    open_panels: BTreeSet<PanelKind>,

    in_flight: Option<InFlight>,
    next_job: u64,
}

impl Session {
    /// Creates a session, opening the ledger at `config.ledger.db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger database cannot be opened.
    pub fn new(config: CostlensConfig, analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        let ledger = CostLedger::new(&config.ledger.db_path, config.ledger.history_limit)?;
        Ok(Self::with_ledger(config, analyzer, ledger))
    }

    /// Creates a session over an already opened ledger.
    ///
    /// A relative `workspace.root` is resolved against the current directory.
    pub fn with_ledger(
        mut config: CostlensConfig,
        analyzer: Arc<dyn Analyzer>,
        ledger: CostLedger,
    ) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => config.resolve_workspace_root(&cwd),
            Err(e) => warn!(
                "Workspace root {} left unresolved: {}",
                config.workspace.root.display(),
                e
            ),
        }
        let cache = CostCache::new(config.cache_dir());
        let extractor: Box<dyn DeclarationExtractor> = Box::new(JavaExtractor);
        info!(
            "Session started (workspace {}, expensive from degree {})",
            config.workspace.root.display(),
            config.display.expensive_degree
        );

        Self {
            config,
            analyzer,
            detector: SignificanceDetector::new(extractor),
            cache,
            mode: ExecutionMode::Disabled,
            store: CostStore::new(),
            ledger,
            snapshots: SnapshotCache::new(),
            active: None,
            build_command: None,
            stale: HashSet::new(),
            open_panels: BTreeSet::new(),
            in_flight: None,
            next_job: 1,
        }
    }

    /// Replaces the declaration extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: impl DeclarationExtractor + 'static) -> Self {
        let extractor: Box<dyn DeclarationExtractor> = Box::new(extractor);
        self.detector = SignificanceDetector::new(extractor);
        self
    }

    /// Current mode.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Returns true while an analysis is in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Analyzer shared with the host.
    pub fn analyzer(&self) -> Arc<dyn Analyzer> {
        Arc::clone(&self.analyzer)
    }

    /// Session configuration.
    pub fn config(&self) -> &CostlensConfig {
        &self.config
    }

    /// Cost records by document.
    pub fn store(&self) -> &CostStore {
        &self.store
    }

    /// History and whitelist.
    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    /// Document baselines.
    pub fn snapshots(&self) -> &SnapshotCache {
        &self.snapshots
    }

    /// Panels currently open in the editor.
    pub fn open_panels(&self) -> impl Iterator<Item = PanelKind> + '_ {
        self.open_panels.iter().copied()
    }

    /// Returns true if edits to `document` since its last analysis were
    /// significant.
    pub fn is_stale(&self, document: &DocumentId) -> bool {
        self.stale.contains(document)
    }

    /// Dispatches one request.
    ///
    /// # Errors
    ///
    /// Returns the error to show the user; no state has changed.
    pub fn handle(&mut self, request: Request) -> Result<Outcome> {
        debug!("Handling {:?}", request);
        match request {
            Request::EnableForFile => self.enable_for_file(),
            Request::EnableForProject { build_command } => self.enable_for_project(&build_command),
            Request::ReExecute => self.re_execute(),
            Request::ReExecuteFileInProject => self.re_execute_file_in_project(),
            Request::Disable => self.disable(),
            Request::CleanOutput => self.clean_output(),
            Request::WhitelistAdd { name } => self.whitelist_add(&name),
            Request::WhitelistRemove { name } => self.whitelist_remove(&name),
            Request::OpenDetail { method_id } => self.open_detail(&method_id),
            Request::OpenOverview { selected } => self.open_overview(selected.as_deref()),
            Request::DocumentActivated { document, text } => {
                Ok(self.document_activated(document, text))
            }
            Request::DocumentChanged { document, text } => {
                Ok(self.document_changed(document, text))
            }
            Request::DocumentSaved { document, text } => self.document_saved(document, text),
            Request::Shutdown => {
                self.shutdown()?;
                Ok(Outcome::default())
            }
        }
    }

    // ------------------------------------------------------------------
    // Mode commands
    // ------------------------------------------------------------------

    /// Enables file mode for the active document, from the cache if it holds
    /// costs for it, otherwise through an analyzer run.
    pub fn enable_for_file(&mut self) -> Result<Outcome> {
        self.mode.check_enable(ExecutionMode::File)?;
        self.ensure_idle()?;
        let document = self.active_java_document()?;

        let cached = self
            .cache
            .load(&self.cache.file_path(document.file_stem()))
            .and_then(|documents| documents.into_iter().find(|c| c.document == document));
        if let Some(entry) = cached {
            info!("Enabling file mode for {} from cache", document);
            return Ok(Outcome::new(self.enable_from_cache(ExecutionMode::File, vec![entry])));
        }

        let job = self.file_job(&document);
        Ok(self.start(JobPurpose::Enable(ExecutionMode::File), Some(document), job))
    }

    /// Enables project mode, from the cache if present, otherwise by running
    /// `build_command` under the analyzer.
    pub fn enable_for_project(&mut self, build_command: &str) -> Result<Outcome> {
        self.mode.check_enable(ExecutionMode::Project)?;
        let build = split_command(build_command)?;
        self.ensure_idle()?;

        if let Some(documents) = self.cache.load(&self.cache.project_path()) {
            info!("Enabling project mode from cache");
            self.build_command = Some(build);
            return Ok(Outcome::new(self.enable_from_cache(ExecutionMode::Project, documents)));
        }

        let job = self.project_job(build);
        Ok(self.start(JobPurpose::Enable(ExecutionMode::Project), None, job))
    }

    /// Re-runs the analysis of the current mode, bypassing the cache.
    pub fn re_execute(&mut self) -> Result<Outcome> {
        self.mode.require_enabled()?;
        self.ensure_idle()?;

        if self.mode == ExecutionMode::Project {
            let build = self.build_command.clone().ok_or_else(|| {
                CostlensError::NotApplicable("No build command recorded for the project".to_string())
            })?;
            let job = self.project_job(build);
            return Ok(self.start(JobPurpose::ReExecute, None, job));
        }

        let document = self.active_java_document()?;
        let job = self.file_job(&document);
        Ok(self.start(JobPurpose::ReExecute, Some(document), job))
    }

    /// Re-analyzes the active document alone while in project mode.
    pub fn re_execute_file_in_project(&mut self) -> Result<Outcome> {
        if self.mode != ExecutionMode::Project {
            return Err(CostlensError::NotApplicable(
                "Re-executing a single file is only available in project mode".to_string(),
            ));
        }
        self.ensure_idle()?;

        let document = self.active_java_document()?;
        let job = self.file_job(&document);
        Ok(self.start(JobPurpose::FileInProject, Some(document), job))
    }

    /// Disables costlens, clearing decorations and panels. Stored costs and
    /// history stay; an analysis in flight is discarded when it completes.
    pub fn disable(&mut self) -> Result<Outcome> {
        self.mode.check_disable()?;

        self.mode = ExecutionMode::Disabled;
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.discard = true;
        }
        self.store.clear_current();
        self.snapshots.clear();
        self.stale.clear();
        let panels = std::mem::take(&mut self.open_panels).into_iter().collect();

        info!("Costlens disabled");
        Ok(Outcome::new(vec![
            Event::Cleared { panels },
            Event::info("Costlens disabled"),
        ]))
    }

    /// Deletes the cost caches and analyzer output, and forgets stored costs.
    pub fn clean_output(&mut self) -> Result<Outcome> {
        self.ensure_idle()?;

        let removed_cache = self.cache.clean()?;
        let output_dir = &self.config.analyzer.output_dir;
        if output_dir.exists() {
            std::fs::remove_dir_all(output_dir)?;
        }
        self.store.clear();
        info!("Cleaned output (cache removed: {})", removed_cache);

        let mut events = Vec::new();
        if self.mode.is_enabled() {
            let panels = std::mem::take(&mut self.open_panels).into_iter().collect();
            events.push(Event::Cleared { panels });
        }
        events.push(Event::info("Removed cached costs and analyzer output"));
        Ok(Outcome::new(events))
    }

    // ------------------------------------------------------------------
    // Whitelist and panels
    // ------------------------------------------------------------------

    /// Adds a method name to the whitelist.
    pub fn whitelist_add(&mut self, name: &str) -> Result<Outcome> {
        let added = self.ledger.add_to_whitelist(name)?;
        let message = if added {
            format!("'{}' added to the whitelist", name.trim())
        } else {
            format!("'{}' is already whitelisted", name.trim())
        };
        Ok(Outcome::new(vec![Event::info(message)]))
    }

    /// Removes a method name from the whitelist.
    pub fn whitelist_remove(&mut self, name: &str) -> Result<Outcome> {
        let removed = self.ledger.remove_from_whitelist(name)?;
        let message = if removed {
            format!("'{}' removed from the whitelist", name.trim())
        } else {
            format!("'{}' is not whitelisted", name.trim())
        };
        Ok(Outcome::new(vec![Event::info(message)]))
    }

    /// Opens the history panel of `method_id`.
    pub fn open_detail(&mut self, method_id: &RecordId) -> Result<Outcome> {
        self.mode.require_enabled()?;

        let html = self
            .ledger
            .history(method_id)
            .and_then(render::render_history)
            .ok_or_else(|| {
                CostlensError::NotApplicable(format!("No cost history for {}", method_id.as_str()))
            })?;

        self.open_panels.insert(PanelKind::History);
        Ok(Outcome::new(vec![Event::Panel {
            kind: PanelKind::History,
            title: render::HISTORY_TITLE.to_string(),
            html,
        }]))
    }

    /// Opens the overview panel of the active document.
    pub fn open_overview(&mut self, selected: Option<&str>) -> Result<Outcome> {
        self.mode.require_enabled()?;
        if !self.store.has_current() {
            return Err(CostlensError::NotApplicable(
                "No costs for the active document".to_string(),
            ));
        }

        let html = render::render_overview(
            self.store.current(),
            selected,
            self.config.display.hide_constructors,
        );
        self.open_panels.insert(PanelKind::Overview);
        Ok(Outcome::new(vec![Event::Panel {
            kind: PanelKind::Overview,
            title: render::OVERVIEW_TITLE.to_string(),
            html,
        }]))
    }

    // ------------------------------------------------------------------
    // Document events
    // ------------------------------------------------------------------

    /// Tracks the active document and shows its costs.
    pub fn document_activated(&mut self, document: DocumentId, text: String) -> Outcome {
        self.active = Some(ActiveDocument {
            id: document.clone(),
            text: text.clone(),
        });
        if !self.mode.is_enabled() {
            return Outcome::default();
        }

        self.snapshots.insert_if_absent(document, text);
        self.select_current();
        Outcome::new(self.decorations().into_iter().collect())
    }

    /// Re-binds decorations after an edit of the active document.
    pub fn document_changed(&mut self, document: DocumentId, text: String) -> Outcome {
        match self.active.as_mut() {
            Some(active) if active.id == document => active.text = text,
            _ => return Outcome::default(),
        }
        if !self.mode.is_enabled() {
            return Outcome::default();
        }
        Outcome::new(self.decorations().into_iter().collect())
    }

    /// Checks a save for significant changes against the document's
    /// snapshot, then replaces the snapshot.
    pub fn document_saved(&mut self, document: DocumentId, text: String) -> Result<Outcome> {
        let is_active = match self.active.as_mut() {
            Some(active) if active.id == document => {
                active.text = text.clone();
                true
            }
            _ => false,
        };
        if !self.mode.is_enabled() {
            return Ok(Outcome::default());
        }

        let report = match self.snapshots.get(&document) {
            Some(baseline) => self.detector.check(baseline, &text, self.ledger.whitelist()),
            None => {
                self.snapshots.replace(document, text);
                return Ok(Outcome::default());
            }
        };
        self.snapshots.replace(document.clone(), text);

        if !report.significant {
            debug!("Save of {} is not significant", document);
            return Ok(Outcome::default());
        }

        info!("Significant changes in {}: {}", document, report.summary());
        self.stale.insert(document.clone());

        if is_active && self.config.global.reexecute_on_significant_save && !self.is_busy() {
            match self.re_execute() {
                Ok(outcome) => return Ok(outcome),
                Err(e) => warn!("Could not re-execute after save: {}", e),
            }
        }

        let mut events = vec![Event::warning(format!(
            "Significant changes in {} ({}); re-execute to refresh costs",
            document.file_name(),
            report.summary()
        ))];
        if is_active {
            events.extend(self.decorations());
        }
        Ok(Outcome::new(events))
    }

    // ------------------------------------------------------------------
    // Analysis lifecycle
    // ------------------------------------------------------------------

    /// Applies the result of an analysis started by this session.
    ///
    /// Failures leave stored costs, history and mode untouched and become
    /// notices in the returned outcome.
    pub fn complete_analysis(
        &mut self,
        pending: PendingAnalysis,
        result: Result<Vec<u8>>,
    ) -> Outcome {
        let discard = match self.in_flight.take() {
            Some(in_flight) if in_flight.id == pending.id => in_flight.discard,
            other => {
                self.in_flight = other;
                warn!("Ignoring result of unknown analysis {}", pending.id);
                return Outcome::default();
            }
        };

        let mut events = vec![Event::Progress {
            active: false,
            title: pending.title(),
        }];

        if discard {
            info!("Discarding analysis {}: costlens was disabled", pending.id);
            events.push(Event::info("Analysis result discarded: costlens was disabled"));
            return Outcome::new(events);
        }

        match result.and_then(|bytes| self.apply_report(&pending, &bytes)) {
            Ok(applied) => events.extend(applied),
            Err(e) => {
                warn!("Analysis {} failed: {}", pending.id, e);
                events.push(Event::from(&e));
            }
        }
        Outcome::new(events)
    }

    /// Flushes the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be flushed.
    pub fn shutdown(&mut self) -> Result<()> {
        let bytes = self.ledger.flush()?;
        info!("Session closed ({} bytes flushed)", bytes);
        Ok(())
    }

    fn start(
        &mut self,
        purpose: JobPurpose,
        document: Option<DocumentId>,
        job: AnalysisJob,
    ) -> Outcome {
        let id = self.next_job;
        self.next_job += 1;
        self.in_flight = Some(InFlight { id, discard: false });

        let pending = PendingAnalysis {
            id,
            purpose,
            document,
            job,
        };
        info!("Starting analysis {} ({:?})", id, purpose);

        Outcome {
            events: vec![Event::Progress {
                active: true,
                title: pending.title(),
            }],
            analysis: Some(pending),
        }
    }

    fn apply_report(&mut self, pending: &PendingAnalysis, bytes: &[u8]) -> Result<Vec<Event>> {
        let root = self.config.workspace.root.clone();
        let document_for = |file: &str| match &pending.document {
            Some(document) => document.clone(),
            None => DocumentId::from(resolve_path(&root, Path::new(file)).as_path()),
        };

        let records = report::parse_report(bytes, &document_for)?;
        let changed = self.ledger.record_all(&records, Local::now())?;
        let count = records.len();

        let mut grouped: BTreeMap<DocumentId, Vec<CostRecord>> = BTreeMap::new();
        if let Some(document) = &pending.document {
            grouped.insert(document.clone(), Vec::new());
        }
        for record in records {
            grouped
                .entry(document_for(&record.location.file))
                .or_default()
                .push(record);
        }
        let documents: Vec<CachedDocument> = grouped
            .into_iter()
            .map(|(document, records)| CachedDocument { document, records })
            .collect();

        let cache_path = match &pending.document {
            Some(document) => self.cache.file_path(document.file_stem()),
            None => self.cache.project_path(),
        };
        if let Err(e) = self.cache.store(&cache_path, &documents) {
            warn!("Could not write cost cache: {}", e);
        }

        self.install(documents);
        if let JobPurpose::Enable(mode) = pending.purpose {
            self.mode = mode;
            if let AnalysisTarget::Project(build) = &pending.job.target {
                self.build_command = Some(build.clone());
            }
        }
        self.refresh_snapshot();

        info!(
            "Analysis {} applied: {} methods, {} histories updated",
            pending.id,
            count,
            changed.len()
        );
        let mut events: Vec<Event> = self.decorations().into_iter().collect();
        events.push(Event::info(format!(
            "Cost analysis finished. Methods analyzed: {}",
            count
        )));
        Ok(events)
    }

    fn enable_from_cache(
        &mut self,
        mode: ExecutionMode,
        documents: Vec<CachedDocument>,
    ) -> Vec<Event> {
        let count: usize = documents.iter().map(|d| d.records.len()).sum();
        self.install(documents);
        self.mode = mode;
        self.refresh_snapshot();

        let mut events: Vec<Event> = self.decorations().into_iter().collect();
        events.push(Event::info(format!(
            "Loaded {} cached method costs; re-execute to refresh",
            count
        )));
        events
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn ensure_idle(&self) -> Result<()> {
        if self.is_busy() {
            return Err(CostlensError::Busy);
        }
        Ok(())
    }

    fn active_java_document(&self) -> Result<DocumentId> {
        let active = self
            .active
            .as_ref()
            .ok_or_else(|| CostlensError::InputInvalid("No active document".to_string()))?;
        if !active.id.is_java() {
            return Err(CostlensError::InputInvalid(format!(
                "Costlens can only analyze Java files, not {}",
                active.id.file_name()
            )));
        }
        Ok(active.id.clone())
    }

    fn file_job(&self, document: &DocumentId) -> AnalysisJob {
        AnalysisJob {
            target: AnalysisTarget::File(document.as_path().to_path_buf()),
            output_dir: self.config.analyzer.output_dir.join(document.file_stem()),
            working_dir: self.config.workspace.root.clone(),
        }
    }

    fn project_job(&self, build: Vec<String>) -> AnalysisJob {
        AnalysisJob {
            target: AnalysisTarget::Project(build),
            output_dir: self.config.analyzer.output_dir.join("project"),
            working_dir: self.config.workspace.root.clone(),
        }
    }

    fn install(&mut self, documents: Vec<CachedDocument>) {
        for CachedDocument { document, records } in documents {
            self.stale.remove(&document);
            self.store.set_costs(document, records);
        }
        self.select_current();
    }

    fn select_current(&mut self) {
        let current = self
            .active
            .as_ref()
            .and_then(|active| self.store.get_costs(&active.id));
        match current {
            Some(records) => self.store.set_current(records),
            None => self.store.clear_current(),
        }
    }

    fn refresh_snapshot(&mut self) {
        if let Some(active) = &self.active {
            self.snapshots.replace(active.id.clone(), active.text.clone());
        }
    }

    /// Decorations for the active document, or `None` when its text cannot
    /// be parsed (the editor keeps what it shows).
    fn decorations(&self) -> Option<Event> {
        let active = self.active.as_ref()?;
        let declarations = match self.detector.extractor().extract(&active.text) {
            Ok(declarations) => declarations,
            Err(e) => {
                debug!("Keeping decorations of {}: {}", active.id, e);
                return None;
            }
        };

        let threshold = self.config.display.expensive_degree;
        let items = bind_declarations(&declarations, self.store.current())
            .into_iter()
            .map(|binding| Decoration {
                method_id: binding.record.id.clone(),
                method_name: binding.record.method_name.clone(),
                declaration_range: binding.declaration.declaration_range,
                name_range: binding.declaration.name_range,
                hover: binding.hover_text(),
                expensive: binding.is_expensive(threshold),
            })
            .collect();

        Some(Event::Decorations {
            document: active.id.clone(),
            stale: self.stale.contains(&active.id),
            items,
        })
    }
}
