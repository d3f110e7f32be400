//! # Costlens Core
//!
//! Editor backend for per-method cost estimates of Java code. Ties the
//! ledger and drift crates into one session driven by editor requests.
//!
//! ## Responsibilities
//!
//! | Concern | Module | Notes |
//! |---------|--------|-------|
//! | Mode gating | [`mode`] | Disabled / File / Project |
//! | Analyzer runs | [`analyzer`] | Infer `--cost`, blocking |
//! | Cost caches | [`cache`] | `infer-out-vscode/*.json` |
//! | Panels | [`render`] | Overview and history HTML |
//! | Wire format | [`protocol`] | Tagged JSON requests and events |
//! | State owner | [`session`] | Store, ledger, snapshots, busy guard |
//! | Event loop | [`host`] | stdin/stdout, `select!` over completions |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        COSTLENS CORE                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   editor ◀──── JSON lines ────▶ ┌─────────────┐                 │
//! │                                 │    Host     │                 │
//! │                                 └──────┬──────┘                 │
//! │                                        │                        │
//! │                                 ┌──────▼──────┐   ┌──────────┐  │
//! │                                 │   Session   │──▶│ Analyzer │  │
//! │                                 └──────┬──────┘   └──────────┘  │
//! │                                        │                        │
//! │         ┌──────────────┬───────────────┼──────────────┐         │
//! │         ▼              ▼               ▼              ▼         │
//! │  ┌────────────┐ ┌────────────┐ ┌─────────────┐ ┌────────────┐   │
//! │  │ CostStore  │ │ CostLedger │ │  Snapshots  │ │ CostCache  │   │
//! │  │            │ │ + Whitelist│ │ + Detector  │ │            │   │
//! │  └────────────┘ └────────────┘ └─────────────┘ └────────────┘   │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use costlens_core::{host, CostlensConfig, InferAnalyzer, Session};
//! use std::sync::Arc;
//!
//! let config = CostlensConfig::load("costlens.json")?;
//! let analyzer = Arc::new(InferAnalyzer::new(&config.analyzer.binary));
//! let session = Session::new(config, analyzer)?;
//! host::serve_stdio(session).await?;
//! ```
//!
//! ## Error Policy
//!
//! - Every command error becomes a notice; the session keeps running
//! - Failed analyses leave stored costs, history and mode untouched
//! - The mode turns enabled only after an analysis pass succeeded

pub mod analyzer;
pub mod cache;
mod config;
mod error;
pub mod host;
pub mod mode;
pub mod protocol;
pub mod render;
pub mod session;

pub use analyzer::{split_command, AnalysisJob, AnalysisTarget, Analyzer, InferAnalyzer};
pub use cache::{CachedDocument, CostCache};
pub use config::{
    resolve_path, AnalyzerConfig, CostlensConfig, DisplayConfig, GlobalConfig, LedgerConfig,
    WorkspaceConfig,
};
pub use error::CostlensError;
pub use mode::ExecutionMode;
pub use protocol::{Decoration, Event, NoticeLevel, PanelKind, Request};
pub use session::{JobPurpose, Outcome, PendingAnalysis, Session};

// Re-export component types for convenience
pub use costlens_drift::{JavaExtractor, SignificanceDetector, SignificanceReport};
pub use costlens_ledger::{CostLedger, CostRecord, DocumentId, RecordId, Whitelist};

/// Core result type for costlens operations.
pub type Result<T> = std::result::Result<T, CostlensError>;
