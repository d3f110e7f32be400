//! # Integration Tests for Costlens Core
//!
//! Drives whole sessions through analyzer runs, caches and history.
//!
//! ## Test Categories
//!
//! 1. **History**: Re-executions grow per-method histories
//! 2. **Caching**: Later sessions start from cached costs
//! 3. **Project Mode**: Report files map onto workspace documents
//! 4. **Failures**: Failed runs leave earlier results in place
//! 5. **Persistence**: Whitelist survives a restart

use costlens_core::{
    AnalysisJob, Analyzer, CostlensConfig, CostlensError, DocumentId, Event, ExecutionMode,
    JobPurpose, Outcome, PanelKind, RecordId, Result, Session,
};
use costlens_ledger::CostLedger;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const SORTER: &str = r#"class Sorter {
    void sort(int[] a) {
        for (int i = 0; i < a.length; i++) {
            for (int j = i + 1; j < a.length; j++) {
                if (a[j] < a[i]) { int t = a[i]; a[i] = a[j]; a[j] = t; }
            }
        }
    }
}
"#;

/// Analyzer that replays scripted reports; `None` entries fail.
struct ScriptedAnalyzer {
    reports: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    fn new(reports: Vec<Option<String>>) -> Arc<Self> {
        Arc::new(Self {
            reports: Mutex::new(reports.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Analyzer for ScriptedAnalyzer {
    fn run(&self, _job: &AnalysisJob) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reports.lock().unwrap().pop_front().flatten() {
            Some(report) => Ok(report.into_bytes()),
            None => Err(CostlensError::AnalysisFailed(
                "infer exited with status 2".to_string(),
            )),
        }
    }
}

/// Builds a report from `(file, method, line, polynomial, degree)` entries.
fn report(entries: &[(&str, &str, u32, &str, u32)]) -> Option<String> {
    let items: Vec<_> = entries
        .iter()
        .map(|(file, method, lnum, polynomial, degree)| {
            serde_json::json!({
                "procedure_name": method,
                "loc": {"file": file, "lnum": lnum},
                "alloc_cost": {"hum": {"hum_polynomial": "0", "hum_degree": 0, "big_o": "O(1)"}},
                "exec_cost": {"hum": {
                    "hum_polynomial": polynomial,
                    "hum_degree": degree,
                    "big_o": format!("O(n^{})", degree)
                }}
            })
        })
        .collect();
    Some(serde_json::Value::Array(items).to_string())
}

fn sort_report(polynomial: &str, degree: u32) -> Option<String> {
    report(&[("Sorter.java", "sort", 2, polynomial, degree)])
}

fn test_config(workspace: &Path) -> CostlensConfig {
    let mut config = CostlensConfig::default();
    config.workspace.root = workspace.to_path_buf();
    config.analyzer.output_dir = workspace.join("infer-out");
    config.ledger.db_path = workspace.join("ledger.db");
    config
}

fn session(workspace: &Path, analyzer: Arc<ScriptedAnalyzer>) -> Session {
    let ledger = CostLedger::temporary(Some(10)).unwrap();
    Session::with_ledger(test_config(workspace), analyzer, ledger)
}

fn document(workspace: &Path, relative: &str) -> DocumentId {
    DocumentId::from(workspace.join(relative).as_path())
}

fn finish(session: &mut Session, outcome: Outcome) -> Outcome {
    let pending = outcome.analysis.expect("analysis started");
    let result = session.analyzer().run(pending.job());
    session.complete_analysis(pending, result)
}

fn decorations(outcome: &Outcome) -> Option<&Event> {
    outcome
        .events
        .iter()
        .find(|e| matches!(e, Event::Decorations { .. }))
}

// =============================================================================
// HISTORY
// =============================================================================

#[test]
fn test_history_keeps_distinct_estimates_only() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let analyzer = ScriptedAnalyzer::new(vec![
        sort_report("n^2", 2),
        sort_report("n^2", 2),
        sort_report("n^3", 3),
    ]);
    let mut session = session(workspace, analyzer.clone());
    let sorter = document(workspace, "Sorter.java");
    session.document_activated(sorter.clone(), SORTER.to_string());

    let outcome = session.enable_for_file().unwrap();
    finish(&mut session, outcome);
    for _ in 0..2 {
        let outcome = session.re_execute().unwrap();
        finish(&mut session, outcome);
    }
    assert_eq!(analyzer.calls(), 3);

    let id = RecordId::new(&sorter, "sort");
    let history = session.ledger().history(&id).unwrap();
    let polynomials: Vec<_> = history
        .iter()
        .map(|r| r.exec_cost.polynomial.as_str())
        .collect();
    assert_eq!(polynomials, vec!["n^3", "n^2"]);
    assert!(history.iter().all(|r| r.timestamp.is_some()));

    let outcome = session.open_detail(&id).unwrap();
    match &outcome.events[0] {
        Event::Panel { kind, html, .. } => {
            assert_eq!(*kind, PanelKind::History);
            assert_eq!(html.matches("(most recent)").count(), 1);
            assert!(html.find("n^3").unwrap() < html.find("n^2").unwrap());
        }
        other => panic!("Expected history panel, got {:?}", other),
    }
}

#[test]
fn test_detail_for_unknown_method_is_not_applicable() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let mut session = session(workspace, ScriptedAnalyzer::new(vec![sort_report("n^2", 2)]));
    session.document_activated(document(workspace, "Sorter.java"), SORTER.to_string());
    let outcome = session.enable_for_file().unwrap();
    finish(&mut session, outcome);

    let err = session
        .open_detail(&RecordId::from_key("/nowhere/Ghost.java:haunt"))
        .unwrap_err();
    assert!(matches!(err, CostlensError::NotApplicable(_)));
}

// =============================================================================
// CACHING
// =============================================================================

#[test]
fn test_later_session_enables_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let sorter = document(workspace, "Sorter.java");

    let mut first = session(workspace, ScriptedAnalyzer::new(vec![sort_report("n^2", 2)]));
    first.document_activated(sorter.clone(), SORTER.to_string());
    let outcome = first.enable_for_file().unwrap();
    finish(&mut first, outcome);
    assert!(workspace
        .join("infer-out-vscode")
        .join("file-Sorter-costs.json")
        .exists());

    let analyzer = ScriptedAnalyzer::new(vec![]);
    let mut second = session(workspace, analyzer.clone());
    second.document_activated(sorter.clone(), SORTER.to_string());
    let outcome = second.enable_for_file().unwrap();

    assert!(outcome.analysis.is_none());
    assert_eq!(analyzer.calls(), 0);
    assert_eq!(second.mode(), ExecutionMode::File);
    match decorations(&outcome) {
        Some(Event::Decorations { items, stale, .. }) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].hover, "Execution cost: n^2 -- O(n^2)");
            assert!(items[0].expensive);
            assert!(!stale);
        }
        other => panic!("Expected decorations, got {:?}", other),
    }

    // Cache hits are not new estimates.
    assert!(second.ledger().history(&RecordId::new(&sorter, "sort")).is_none());
}

#[test]
fn test_re_execute_bypasses_cache() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let analyzer = ScriptedAnalyzer::new(vec![sort_report("n^2", 2), sort_report("n", 1)]);
    let mut session = session(workspace, analyzer.clone());
    session.document_activated(document(workspace, "Sorter.java"), SORTER.to_string());

    let outcome = session.enable_for_file().unwrap();
    finish(&mut session, outcome);
    let outcome = session.re_execute().unwrap();
    assert_eq!(outcome.analysis.as_ref().unwrap().purpose(), JobPurpose::ReExecute);
    finish(&mut session, outcome);

    assert_eq!(analyzer.calls(), 2);
    assert_eq!(session.store().current()[0].exec_cost.polynomial, "n");
}

#[test]
fn test_clean_output_forces_fresh_analysis() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let sorter = document(workspace, "Sorter.java");

    let mut session = session(workspace, ScriptedAnalyzer::new(vec![sort_report("n^2", 2)]));
    session.document_activated(sorter.clone(), SORTER.to_string());
    let outcome = session.enable_for_file().unwrap();
    finish(&mut session, outcome);

    session.clean_output().unwrap();
    assert!(!workspace.join("infer-out-vscode").exists());
    assert!(session.store().is_empty());

    session.disable().unwrap();
    let outcome = session.enable_for_file().unwrap();
    assert!(outcome.analysis.is_some());
}

#[test]
fn test_corrupt_cache_is_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let cache_dir = workspace.join("infer-out-vscode");
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("file-Sorter-costs.json"), "{ not json").unwrap();

    let mut session = session(workspace, ScriptedAnalyzer::new(vec![sort_report("n^2", 2)]));
    session.document_activated(document(workspace, "Sorter.java"), SORTER.to_string());
    let outcome = session.enable_for_file().unwrap();
    assert!(outcome.analysis.is_some());
}

// =============================================================================
// PROJECT MODE
// =============================================================================

const CART: &str = "class Cart {\n    int size() { return 0; }\n}\n";
const ORDER: &str = "class Order {\n    int lines(int n) { return n; }\n}\n";

#[test]
fn test_project_report_maps_files_to_documents() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let analyzer = ScriptedAnalyzer::new(vec![report(&[
        ("src/Order.java", "lines", 2, "n", 1),
        ("src/Cart.java", "size", 2, "1", 0),
    ])]);
    let mut session = session(workspace, analyzer);
    let cart = document(workspace, "src/Cart.java");
    let order = document(workspace, "src/Order.java");

    let outcome = session.enable_for_project("mvn -q compile").unwrap();
    assert_eq!(
        outcome.analysis.as_ref().unwrap().purpose(),
        JobPurpose::Enable(ExecutionMode::Project)
    );
    finish(&mut session, outcome);

    assert_eq!(session.mode(), ExecutionMode::Project);
    assert!(session.store().get_costs(&cart).is_some());
    assert!(session.store().get_costs(&order).is_some());
    assert!(workspace
        .join("infer-out-vscode")
        .join("project-costs.json")
        .exists());

    let outcome = session.document_activated(order.clone(), ORDER.to_string());
    match decorations(&outcome) {
        Some(Event::Decorations { document, items, .. }) => {
            assert_eq!(document, &order);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].method_name, "lines");
            assert!(!items[0].expensive);
        }
        other => panic!("Expected decorations, got {:?}", other),
    }
}

#[test]
fn test_file_in_project_keeps_project_mode() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let cart = document(workspace, "src/Cart.java");
    let analyzer = ScriptedAnalyzer::new(vec![
        report(&[("src/Cart.java", "size", 2, "1", 0)]),
        report(&[("Cart.java", "size", 2, "items.length", 1)]),
    ]);
    let mut session = session(workspace, analyzer);
    session.document_activated(cart.clone(), CART.to_string());

    let outcome = session.enable_for_project("make").unwrap();
    finish(&mut session, outcome);

    let outcome = session.re_execute_file_in_project().unwrap();
    let pending = outcome.analysis.as_ref().unwrap();
    assert_eq!(pending.purpose(), JobPurpose::FileInProject);
    assert_eq!(pending.document(), Some(&cart));
    finish(&mut session, outcome);

    assert_eq!(session.mode(), ExecutionMode::Project);
    let records = session.store().get_costs(&cart).unwrap();
    assert_eq!(records[0].exec_cost.polynomial, "items.length");
}

#[test]
fn test_file_in_project_needs_project_mode() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let mut session = session(workspace, ScriptedAnalyzer::new(vec![sort_report("n^2", 2)]));
    session.document_activated(document(workspace, "Sorter.java"), SORTER.to_string());
    let outcome = session.enable_for_file().unwrap();
    finish(&mut session, outcome);

    assert!(matches!(
        session.re_execute_file_in_project(),
        Err(CostlensError::NotApplicable(_))
    ));
}

// =============================================================================
// FAILURES
// =============================================================================

#[test]
fn test_failed_re_execute_keeps_previous_results() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let sorter = document(workspace, "Sorter.java");
    let analyzer = ScriptedAnalyzer::new(vec![sort_report("n^2", 2), None]);
    let mut session = session(workspace, analyzer);
    session.document_activated(sorter.clone(), SORTER.to_string());

    let outcome = session.enable_for_file().unwrap();
    finish(&mut session, outcome);
    let outcome = session.re_execute().unwrap();
    let outcome = finish(&mut session, outcome);

    assert!(matches!(outcome.events.last(), Some(Event::Notice { .. })));
    assert_eq!(session.mode(), ExecutionMode::File);
    assert_eq!(session.store().current()[0].exec_cost.polynomial, "n^2");
    assert_eq!(
        session.ledger().history(&RecordId::new(&sorter, "sort")).unwrap().len(),
        1
    );
}

#[test]
fn test_malformed_report_fails_whole_run() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let analyzer = ScriptedAnalyzer::new(vec![Some(
        r#"[{"procedure_name": "sort", "loc": {"file": "Sorter.java", "lnum": 2}}]"#.to_string(),
    )]);
    let mut session = session(workspace, analyzer);
    session.document_activated(document(workspace, "Sorter.java"), SORTER.to_string());

    let outcome = session.enable_for_file().unwrap();
    finish(&mut session, outcome);

    assert_eq!(session.mode(), ExecutionMode::Disabled);
    assert!(session.store().is_empty());
    assert!(!workspace.join("infer-out-vscode").exists());
}

// =============================================================================
// PERSISTENCE
// =============================================================================

#[test]
fn test_whitelist_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();

    {
        let mut session =
            Session::new(test_config(workspace), ScriptedAnalyzer::new(vec![])).unwrap();
        session.whitelist_add("sort").unwrap();
        session.whitelist_add("merge").unwrap();
        session.whitelist_remove("merge").unwrap();
        session.shutdown().unwrap();
    }

    let session = Session::new(test_config(workspace), ScriptedAnalyzer::new(vec![])).unwrap();
    assert!(session.ledger().is_whitelisted("sort"));
    assert!(!session.ledger().is_whitelisted("merge"));
}

#[test]
fn test_history_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let sorter = document(workspace, "Sorter.java");

    {
        let analyzer = ScriptedAnalyzer::new(vec![sort_report("n^2", 2)]);
        let mut session = Session::new(test_config(workspace), analyzer).unwrap();
        session.document_activated(sorter.clone(), SORTER.to_string());
        let outcome = session.enable_for_file().unwrap();
        finish(&mut session, outcome);
        session.shutdown().unwrap();
    }

    let session = Session::new(test_config(workspace), ScriptedAnalyzer::new(vec![])).unwrap();
    let history = session.ledger().history(&RecordId::new(&sorter, "sort")).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].exec_cost.polynomial, "n^2");
}
