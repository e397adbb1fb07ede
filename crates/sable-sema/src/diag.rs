//! The diagnostic engine: append-only, concurrent, rendered late.
//!
//! Diagnostics are immutable once reported. The bag supports concurrent
//! append from parallel declaration binds through sharded buffers; `drain`
//! merges the shards, sorts by span start then insertion order, and dedupes
//! by (code, span) so recovery paths that re-visit a node cannot double
//! report.

use rustc_hash::FxHashSet;
use sable_common::diagnostics::{
    Diagnostic, DiagnosticCategory, category_for, format_message, get_diagnostic_message,
};
use sable_common::span::Span;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

const SHARD_COUNT: usize = 16;

/// Cooperative cancellation flag, checked between statement-level binding
/// steps. Setting it never corrupts partial state: a cancelled declaration's
/// output is discarded wholesale.
#[derive(Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Immutable suppression context threaded into every `report` call.
///
/// Carries pragma-style disabled codes. Passed by value so binding stays
/// referentially transparent and parallel-safe; there is no ambient global
/// suppression state.
#[derive(Clone, Debug, Default)]
pub struct SuppressionContext {
    suppressed: FxHashSet<u32>,
}

impl SuppressionContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn suppressing(codes: impl IntoIterator<Item = u32>) -> Self {
        Self {
            suppressed: codes.into_iter().collect(),
        }
    }

    pub fn is_suppressed(&self, code: u32) -> bool {
        self.suppressed.contains(&code)
    }

    /// A copy with one more code disabled.
    #[must_use]
    pub fn with(&self, code: u32) -> Self {
        let mut next = self.clone();
        next.suppressed.insert(code);
        next
    }
}

/// Append-only diagnostic collection for one compilation unit.
pub struct DiagnosticBag {
    shards: [Mutex<Vec<(u64, Diagnostic)>>; SHARD_COUNT],
    seq: AtomicU64,
}

impl Default for DiagnosticBag {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self {
            shards: std::array::from_fn(|_| Mutex::new(Vec::new())),
            seq: AtomicU64::new(0),
        }
    }

    /// Report a diagnostic. `args` are the ordered display strings the code's
    /// message template substitutes. Severity comes from the code table;
    /// suppressed warnings are dropped at the door (errors never are).
    pub fn report(&self, ctx: &SuppressionContext, code: u32, span: Span, args: &[&str]) {
        self.report_with_related(ctx, code, span, args, &[]);
    }

    pub fn report_with_related(
        &self,
        ctx: &SuppressionContext,
        code: u32,
        span: Span,
        args: &[&str],
        related: &[(Span, String)],
    ) {
        let category = category_for(code);
        if ctx.is_suppressed(code) && category != DiagnosticCategory::Error {
            return;
        }
        let template = get_diagnostic_message(code).map_or("", |m| m.message);
        let mut diagnostic = Diagnostic::new(code, category, span, format_message(template, args));
        for (related_span, message) in related {
            diagnostic = diagnostic.with_related(*related_span, message.clone());
        }
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let shard = &self.shards[seq as usize % SHARD_COUNT];
        shard
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((seq, diagnostic));
    }

    /// Merge another bag's contents into this one, preserving the other
    /// bag's internal order. Used when per-declaration bags are committed in
    /// declaration order after a parallel bind.
    pub fn absorb(&self, other: DiagnosticBag) {
        for diagnostic in other.drain_all() {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed);
            let shard = &self.shards[seq as usize % SHARD_COUNT];
            shard
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((seq, diagnostic));
        }
    }

    fn collect_sorted(&self) -> Vec<(u64, Diagnostic)> {
        let mut all: Vec<(u64, Diagnostic)> = Vec::new();
        for shard in &self.shards {
            all.extend(shard.lock().unwrap_or_else(|e| e.into_inner()).clone());
        }
        all.sort_by_key(|(seq, d)| (d.span.start, *seq));
        all
    }

    /// All diagnostics, sorted and deduped, including Hidden ones.
    pub fn drain_all(&self) -> Vec<Diagnostic> {
        let mut seen: FxHashSet<(u32, Span)> = FxHashSet::default();
        self.collect_sorted()
            .into_iter()
            .filter_map(|(_, d)| seen.insert((d.code, d.span)).then_some(d))
            .collect()
    }

    /// The default rendering: sorted, deduped, Hidden excluded.
    pub fn rendered(&self) -> Vec<Diagnostic> {
        self.drain_all()
            .into_iter()
            .filter(|d| d.category != DiagnosticCategory::Hidden)
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.shards.iter().any(|shard| {
            shard
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .any(|(_, d)| d.category == DiagnosticCategory::Error)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.shards
            .iter()
            .all(|shard| shard.lock().unwrap_or_else(|e| e.into_inner()).is_empty())
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(|e| e.into_inner()).len())
            .sum()
    }
}

#[cfg(test)]
#[path = "../tests/diag_tests.rs"]
mod tests;
