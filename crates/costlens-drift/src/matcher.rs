//! # Method-Declaration Matcher
//!
//! Binds the declarations found in a document to the cost records on screen.
//!
//! ```text
//! records (line order)      declarations (source order)
//! ┌──────────────┐          ┌──────────────┐
//! │ foo  line 4  │ ───────▶ │ foo  (1st)   │
//! │ bar  line 9  │ ──┐      │ foo  (2nd)   │  unbound
//! └──────────────┘   └────▶ │ bar          │
//!                           │ baz          │  unbound
//!                           └──────────────┘
//! ```
//!
//! For each record in list order, the first unclaimed declaration with the
//! same name is bound. Records without a declaration (inlined, renamed, or
//! synthetic methods) and declarations without a record drop out silently.
//! The record list order is authoritative, so the same inputs always produce
//! the same bindings.

use crate::declarations::MethodDeclaration;
use costlens_ledger::CostRecord;

/// A declaration paired with its cost record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding<'a> {
    /// The bound declaration.
    pub declaration: &'a MethodDeclaration,
    /// The bound record.
    pub record: &'a CostRecord,
}

impl Binding<'_> {
    /// Hover text shown on the method name.
    pub fn hover_text(&self) -> String {
        format!(
            "Execution cost: {} -- {}",
            self.record.exec_cost.polynomial, self.record.exec_cost.big_o
        )
    }

    /// Returns true if the execution cost is unbounded or of degree
    /// `threshold` or higher.
    pub fn is_expensive(&self, threshold: u32) -> bool {
        match self.record.exec_cost.degree {
            Some(degree) => degree >= threshold,
            None => true,
        }
    }
}

/// Binds `records` to `declarations`, first match wins.
///
/// The output follows record order. No declaration and no record appears in
/// more than one binding.
pub fn bind_declarations<'a>(
    declarations: &'a [MethodDeclaration],
    records: &'a [CostRecord],
) -> Vec<Binding<'a>> {
    let mut claimed = vec![false; declarations.len()];
    let mut bindings = Vec::with_capacity(records.len().min(declarations.len()));

    for record in records {
        let found = declarations
            .iter()
            .enumerate()
            .find(|(i, declaration)| !claimed[*i] && declaration.name == record.method_name);

        if let Some((i, declaration)) = found {
            claimed[i] = true;
            bindings.push(Binding {
                declaration,
                record,
            });
        }
    }

    bindings
}
