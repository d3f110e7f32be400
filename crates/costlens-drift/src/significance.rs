//! # Change-Significance Detection
//!
//! Decides whether the edits between a document's snapshot and its current
//! text are significant enough to re-run the analyzer or to distrust the
//! costs on screen.
//!
//! ## Rules
//!
//! | Edit | Significant |
//! |------|-------------|
//! | Body of a non-whitelisted method changed | Yes |
//! | Non-whitelisted method added or removed | Yes |
//! | Text unparsable on either side | Yes |
//! | Body of a whitelisted method changed, added or removed | No |
//! | Comments or whitespace only | No |
//! | Anything outside method bodies | No |
//!
//! Bodies are compared after [`normalize_body`](crate::normalize::normalize_body).
//! Overloads are paired by name and position among same-named declarations,
//! so inserting an overload ahead of an existing one shows up as a change.
//!
//! ## Detection Philosophy
//!
//! The detector leans toward re-analysis: when it cannot tell, it reports a
//! significant change. A stale cost display is worse than a redundant run.

use crate::declarations::{DeclarationExtractor, MethodDeclaration};
use crate::normalize::{fingerprint, Fingerprint};
use costlens_ledger::Whitelist;
use std::collections::BTreeMap;
use tracing::debug;

/// Method key: name plus position among declarations sharing that name.
type MethodKey = (String, usize);

/// Outcome of a significance check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignificanceReport {
    /// Overall verdict.
    pub significant: bool,

    /// Non-whitelisted methods whose body changed.
    pub changed: Vec<String>,

    /// Non-whitelisted methods present only in the current text.
    pub added: Vec<String>,

    /// Non-whitelisted methods present only in the snapshot.
    pub removed: Vec<String>,

    /// Whitelisted methods that changed, appeared or disappeared.
    pub exempted: Vec<String>,

    /// Set when either side could not be parsed.
    pub extraction_error: Option<String>,
}

impl SignificanceReport {
    fn unchanged() -> Self {
        Self::default()
    }

    fn extraction_failed(reason: String) -> Self {
        Self {
            significant: true,
            extraction_error: Some(reason),
            ..Self::default()
        }
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        if let Some(error) = &self.extraction_error {
            return format!("could not compare methods ({})", error);
        }
        if !self.significant {
            return "no significant changes".to_string();
        }

        let mut parts = Vec::new();
        if !self.changed.is_empty() {
            parts.push(format!("changed: {}", self.changed.join(", ")));
        }
        if !self.added.is_empty() {
            parts.push(format!("added: {}", self.added.join(", ")));
        }
        if !self.removed.is_empty() {
            parts.push(format!("removed: {}", self.removed.join(", ")));
        }
        parts.join("; ")
    }
}

/// Change-significance detector over a declaration extractor.
///
/// # Example
///
/// ```rust
/// use costlens_drift::{JavaExtractor, SignificanceDetector};
/// use costlens_ledger::Whitelist;
///
/// let detector = SignificanceDetector::new(JavaExtractor);
/// let before = "class A { int f(int n) { return n; } }";
/// let after = "class A {\n  // doubled\n  int f(int n) { return n * 2; }\n}";
///
/// let report = detector.check(before, after, &Whitelist::new());
/// assert!(report.significant);
/// assert_eq!(report.changed, vec!["f".to_string()]);
///
/// let whitelist: Whitelist = ["f"].into_iter().collect();
/// assert!(!detector.check(before, after, &whitelist).significant);
/// ```
#[derive(Debug, Clone)]
pub struct SignificanceDetector<E> {
    extractor: E,
}

impl<E: DeclarationExtractor> SignificanceDetector<E> {
    /// Creates a detector that locates methods with `extractor`.
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    /// The underlying extractor.
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Compares `current` against `snapshot`.
    ///
    /// Pure: replacing the snapshot afterwards is the caller's job.
    pub fn check(&self, snapshot: &str, current: &str, whitelist: &Whitelist) -> SignificanceReport {
        if snapshot == current {
            return SignificanceReport::unchanged();
        }

        let before = match self.extractor.extract(snapshot) {
            Ok(declarations) => fingerprints(&declarations, snapshot),
            Err(e) => {
                debug!("Snapshot extraction failed: {}", e);
                return SignificanceReport::extraction_failed(format!("snapshot: {}", e));
            }
        };
        let after = match self.extractor.extract(current) {
            Ok(declarations) => fingerprints(&declarations, current),
            Err(e) => {
                debug!("Current text extraction failed: {}", e);
                return SignificanceReport::extraction_failed(format!("current text: {}", e));
            }
        };

        let mut report = SignificanceReport::unchanged();

        for (key, old) in &before {
            let name = &key.0;
            let bucket = match after.get(key) {
                Some(new) if new == old => continue,
                Some(_) => &mut report.changed,
                None => &mut report.removed,
            };
            if whitelist.contains(name) {
                report.exempted.push(name.clone());
            } else {
                bucket.push(name.clone());
            }
        }

        for key in after.keys().filter(|key| !before.contains_key(*key)) {
            if whitelist.contains(&key.0) {
                report.exempted.push(key.0.clone());
            } else {
                report.added.push(key.0.clone());
            }
        }

        report.significant =
            !(report.changed.is_empty() && report.added.is_empty() && report.removed.is_empty());

        debug!("Significance check: {}", report.summary());
        report
    }
}

/// Fingerprints each declaration's body, keyed by name and overload ordinal.
///
/// Bodyless declarations map to `None`, so an abstract method gaining a body
/// counts as a change.
fn fingerprints(
    declarations: &[MethodDeclaration],
    text: &str,
) -> BTreeMap<MethodKey, Option<Fingerprint>> {
    let mut ordinals: BTreeMap<&str, usize> = BTreeMap::new();
    let mut out = BTreeMap::new();

    for declaration in declarations {
        let ordinal = ordinals.entry(declaration.name.as_str()).or_insert(0);
        let key = (declaration.name.clone(), *ordinal);
        *ordinal += 1;
        out.insert(key, declaration.body(text).map(fingerprint));
    }

    out
}
