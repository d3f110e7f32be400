//! # Costlens Drift - Keeping Costs in Step with Edits
//!
//! Analyzer runs are slow, so costlens only re-runs the analyzer when an edit
//! could plausibly change a method's cost, and keeps decorations attached to
//! the right declarations while the user types.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`JavaExtractor`] | Locates method and constructor declarations |
//! | [`normalize`] | Comment- and whitespace-insensitive body fingerprints |
//! | [`SnapshotCache`] | Per-document baseline text |
//! | [`SignificanceDetector`] | Decides whether edits warrant re-analysis |
//! | [`bind_declarations`] | Pairs declarations with cost records |
//!
//! ## Flow
//!
//! ```text
//!   save ──▶ SnapshotCache ──▶ SignificanceDetector ──▶ significant? ──▶ re-run analyzer
//!                 ▲                     │
//!                 └─── replace ─────────┘
//!
//!   edit ──▶ JavaExtractor ──▶ bind_declarations(records) ──▶ decorations
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use costlens_drift::{DeclarationExtractor, JavaExtractor, SignificanceDetector, SnapshotCache};
//! use costlens_ledger::{DocumentId, Whitelist};
//!
//! let document = DocumentId::new("/work/Calc.java");
//! let saved = "class Calc { int sq(int n) { return n * n; } }";
//! let edited = "class Calc {\n  int sq(int n) {\n    return n * n; // square\n  }\n}";
//!
//! let mut snapshots = SnapshotCache::new();
//! snapshots.insert_if_absent(document.clone(), saved);
//!
//! let detector = SignificanceDetector::new(JavaExtractor);
//! let report = detector.check(snapshots.get(&document).unwrap(), edited, &Whitelist::new());
//! snapshots.replace(document, edited);
//!
//! assert!(!report.significant);
//! assert_eq!(JavaExtractor.extract(edited)?.len(), 1);
//! # Ok::<(), costlens_drift::DriftError>(())
//! ```

mod declarations;
mod error;
mod matcher;
pub mod normalize;
mod significance;
mod snapshot;

pub use declarations::{DeclarationExtractor, JavaExtractor, MethodDeclaration, Position, Range};
pub use error::{DriftError, Result};
pub use matcher::{bind_declarations, Binding};
pub use normalize::{fingerprint, normalize_body, Fingerprint};
pub use significance::{SignificanceDetector, SignificanceReport};
pub use snapshot::SnapshotCache;
