//! Definite-assignment and reachability analysis.
//!
//! A forward walk over one bound body with a three-point assignment lattice
//! per variable: Unassigned, MaybeAssigned, Assigned. Branch merges agree or
//! degrade to MaybeAssigned; reading anything not definitely assigned is an
//! error, reported once per variable so a loop body cannot flood the bag.
//!
//! The same walk carries reachability (one warning per unreachable region),
//! the yield/return placement rules for catch and finally blocks, unused
//! variable warnings, and the struct-constructor obligation to assign every
//! field on every exit path.

use crate::bound::{BoundCatch, BoundExpr, BoundExprKind, BoundStmt, BoundStmtKind};
use crate::const_eval::ConstValue;
use crate::diag::{DiagnosticBag, SuppressionContext};
use rustc_hash::{FxHashMap, FxHashSet};
use sable_ast::node::BinaryOp;
use sable_common::common::RefKind;
use sable_common::diagnostics::diagnostic_codes as dc;
use sable_common::span::Span;
use sable_symbols::{SymbolId, SymbolTable};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Assignment {
    Unassigned,
    MaybeAssigned,
    Assigned,
}

impl Assignment {
    fn merge(self, other: Assignment) -> Assignment {
        if self == other { self } else { Assignment::MaybeAssigned }
    }
}

#[derive(Clone, Debug)]
struct FlowState {
    vars: FxHashMap<SymbolId, Assignment>,
    reachable: bool,
}

impl FlowState {
    fn new() -> Self {
        Self {
            vars: FxHashMap::default(),
            reachable: true,
        }
    }

    fn get(&self, var: SymbolId) -> Assignment {
        self.vars.get(&var).copied().unwrap_or(Assignment::Assigned)
    }

    fn assign(&mut self, var: SymbolId) {
        if self.vars.contains_key(&var) {
            self.vars.insert(var, Assignment::Assigned);
        }
    }

    fn declare(&mut self, var: SymbolId, assignment: Assignment) {
        self.vars.insert(var, assignment);
    }

    /// Merge two branch exits. A variable is Assigned only when every
    /// reachable branch agrees; an unreachable branch imposes nothing.
    fn merge(&self, other: &FlowState) -> FlowState {
        if !self.reachable {
            return other.clone();
        }
        if !other.reachable {
            return self.clone();
        }
        let mut vars = FxHashMap::default();
        for (&var, &a) in &self.vars {
            let b = other.vars.get(&var).copied().unwrap_or(a);
            vars.insert(var, a.merge(b));
        }
        for (&var, &b) in &other.vars {
            vars.entry(var).or_insert(b);
        }
        FlowState {
            vars,
            reachable: true,
        }
    }
}

/// What kind of protected region the walk is currently inside.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Region {
    Open,
    Catch,
    Finally,
}

/// Per-body flow analysis. Create one per method body; it is not reusable.
pub struct FlowAnalyzer<'a> {
    table: &'a SymbolTable,
    bag: &'a DiagnosticBag,
    ctx: &'a SuppressionContext,
    /// Variables already reported unassigned; one error per variable.
    reported_unassigned: FxHashSet<SymbolId>,
    /// Locals declared in this body, with spans for the unused warnings.
    declared: Vec<(SymbolId, Span)>,
    read: FxHashSet<SymbolId>,
    written: FxHashSet<SymbolId>,
    /// Struct-constructor fields that must be assigned on every exit.
    tracked_fields: Vec<SymbolId>,
    /// States at every `return` plus the fall-off end, for the field check.
    exit_states: Vec<FlowState>,
    region: Region,
    in_unreported_dead_code: bool,
}

impl<'a> FlowAnalyzer<'a> {
    pub fn new(table: &'a SymbolTable, bag: &'a DiagnosticBag, ctx: &'a SuppressionContext) -> Self {
        Self {
            table,
            bag,
            ctx,
            reported_unassigned: FxHashSet::default(),
            declared: Vec::new(),
            read: FxHashSet::default(),
            written: FxHashSet::default(),
            tracked_fields: Vec::new(),
            exit_states: Vec::new(),
            region: Region::Open,
            in_unreported_dead_code: false,
        }
    }

    /// Analyze a method body. `params` are the method's parameter symbols in
    /// declaration order; `out` parameters start unassigned.
    pub fn analyze_method(mut self, method: SymbolId, params: &[SymbolId], body: &BoundStmt) {
        let mut state = FlowState::new();
        let infos = self.table.get(method).map(|m| m.params).unwrap_or_default();
        for (info, &symbol) in infos.iter().zip(params) {
            let initial = if info.ref_kind == RefKind::Out {
                Assignment::Unassigned
            } else {
                Assignment::Assigned
            };
            state.declare(symbol, initial);
        }
        self.visit_stmt(&mut state, body);
        self.exit_states.push(state);
        self.report_unused();
    }

    /// Analyze a struct constructor body: every field in `fields` must be
    /// definitely assigned on every exit path, and reading one before
    /// assignment is an error.
    pub fn analyze_struct_constructor(
        mut self,
        ctor: SymbolId,
        params: &[SymbolId],
        fields: &[SymbolId],
        body: &BoundStmt,
        end_span: Span,
    ) {
        let mut state = FlowState::new();
        let infos = self.table.get(ctor).map(|m| m.params).unwrap_or_default();
        for (info, &symbol) in infos.iter().zip(params) {
            let initial = if info.ref_kind == RefKind::Out {
                Assignment::Unassigned
            } else {
                Assignment::Assigned
            };
            state.declare(symbol, initial);
        }
        for &field in fields {
            state.declare(field, Assignment::Unassigned);
        }
        self.tracked_fields = fields.to_vec();

        self.visit_stmt(&mut state, body);
        self.exit_states.push(state);

        let mut unassigned_reported: FxHashSet<SymbolId> = FxHashSet::default();
        for exit in &self.exit_states {
            if !exit.reachable {
                continue;
            }
            for &field in &self.tracked_fields {
                if exit.get(field) != Assignment::Assigned && unassigned_reported.insert(field) {
                    let name = self.table.name_of(field);
                    self.bag
                        .report(self.ctx, dc::STRUCT_FIELDS_UNASSIGNED, end_span, &[&name]);
                }
            }
        }
        self.report_unused();
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn visit_stmt(&mut self, state: &mut FlowState, stmt: &BoundStmt) {
        if !state.reachable {
            if !self.in_unreported_dead_code {
                self.in_unreported_dead_code = true;
                self.bag
                    .report(self.ctx, dc::UNREACHABLE_CODE, stmt.span, &[]);
            }
        } else {
            self.in_unreported_dead_code = false;
        }

        match &stmt.kind {
            BoundStmtKind::LocalDecl { local, init } => {
                let assignment = match init {
                    Some(expr) => {
                        self.visit_expr(state, expr);
                        self.written.insert(*local);
                        Assignment::Assigned
                    }
                    None => Assignment::Unassigned,
                };
                state.declare(*local, assignment);
                let span = self
                    .table
                    .get(*local)
                    .and_then(|s| s.span)
                    .unwrap_or(stmt.span);
                self.declared.push((*local, span));
            }
            BoundStmtKind::Expr(expr) => self.visit_expr(state, expr),
            BoundStmtKind::Block(stmts) => {
                for s in stmts {
                    self.visit_stmt(state, s);
                }
            }
            BoundStmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.visit_expr(state, cond);
                let verdict = cond.constant.as_ref().and_then(ConstValue::as_bool);

                let mut then_state = state.clone();
                then_state.reachable = state.reachable && verdict != Some(false);
                self.visit_stmt(&mut then_state, then_branch);

                let mut else_state = state.clone();
                else_state.reachable = state.reachable && verdict != Some(true);
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(&mut else_state, else_branch);
                }
                *state = then_state.merge(&else_state);
            }
            BoundStmtKind::While { cond, body } => {
                self.visit_expr(state, cond);
                let verdict = cond.constant.as_ref().and_then(ConstValue::as_bool);

                let mut body_state = state.clone();
                body_state.reachable = state.reachable && verdict != Some(false);
                self.visit_stmt(&mut body_state, body);

                if verdict == Some(true) {
                    // No break statement exists in this language subset, so
                    // a constant-true loop never falls through.
                    state.reachable = false;
                } else {
                    // The body may not run; its assignments are only maybes.
                    let entry_reachable = state.reachable;
                    *state = state.merge(&body_state);
                    state.reachable = entry_reachable;
                }
            }
            BoundStmtKind::Return(value) => {
                if self.region == Region::Finally {
                    self.bag
                        .report(self.ctx, dc::CONTROL_CANNOT_LEAVE_FINALLY, stmt.span, &[]);
                }
                if let Some(value) = value {
                    self.visit_expr(state, value);
                }
                self.exit_states.push(state.clone());
                state.reachable = false;
            }
            BoundStmtKind::Throw(value) => {
                if let Some(value) = value {
                    self.visit_expr(state, value);
                }
                state.reachable = false;
            }
            BoundStmtKind::YieldReturn(value) => {
                match self.region {
                    Region::Finally => {
                        self.bag
                            .report(self.ctx, dc::YIELD_IN_FINALLY, stmt.span, &[]);
                    }
                    Region::Catch => {
                        self.bag.report(self.ctx, dc::YIELD_IN_CATCH, stmt.span, &[]);
                    }
                    Region::Open => {}
                }
                self.visit_expr(state, value);
            }
            BoundStmtKind::YieldBreak => {
                if self.region == Region::Finally {
                    self.bag
                        .report(self.ctx, dc::YIELD_IN_FINALLY, stmt.span, &[]);
                }
                state.reachable = false;
            }
            BoundStmtKind::Try {
                body,
                catches,
                finally,
            } => self.visit_try(state, body, catches, finally.as_deref()),
        }
    }

    fn visit_try(
        &mut self,
        state: &mut FlowState,
        body: &BoundStmt,
        catches: &[BoundCatch],
        finally: Option<&BoundStmt>,
    ) {
        let before = state.clone();
        let mut body_state = state.clone();
        self.visit_stmt(&mut body_state, body);

        // A catch can run after any prefix of the try body, so assignments
        // made inside it are only maybes at the catch entry.
        let catch_entry = before.merge(&body_state);
        let mut merged_exit = body_state;
        for catch in catches {
            let mut catch_state = catch_entry.clone();
            catch_state.reachable = before.reachable;
            if catch.local.is_valid() {
                catch_state.declare(catch.local, Assignment::Assigned);
                let span = self
                    .table
                    .get(catch.local)
                    .and_then(|s| s.span)
                    .unwrap_or(catch.span);
                self.declared.push((catch.local, span));
            }
            let saved = self.region;
            self.region = Region::Catch;
            self.visit_stmt(&mut catch_state, &catch.body);
            self.region = saved;
            merged_exit = merged_exit.merge(&catch_state);
        }

        if let Some(finally) = finally {
            // The finally runs after any exit, so it starts from the weakest
            // state; its own assignments are definite afterwards.
            let mut finally_state = before.merge(&merged_exit);
            finally_state.reachable = before.reachable;
            let saved = self.region;
            self.region = Region::Finally;
            self.visit_stmt(&mut finally_state, finally);
            self.region = saved;

            for (&var, &assignment) in &finally_state.vars {
                if assignment == Assignment::Assigned {
                    merged_exit.vars.insert(var, Assignment::Assigned);
                }
            }
            if !finally_state.reachable {
                merged_exit.reachable = false;
            }
        }
        *state = merged_exit;
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn visit_expr(&mut self, state: &mut FlowState, expr: &BoundExpr) {
        match &expr.kind {
            BoundExprKind::Error
            | BoundExprKind::Literal
            | BoundExprKind::This
            | BoundExprKind::DefaultValue => {}
            BoundExprKind::Local | BoundExprKind::Parameter => self.note_read(state, expr),
            BoundExprKind::Field { receiver } => {
                if self.is_tracked_field(expr, receiver.as_deref()) {
                    self.note_read(state, expr);
                } else if let Some(receiver) = receiver {
                    self.visit_expr(state, receiver);
                }
            }
            BoundExprKind::Property { receiver } => {
                if let Some(receiver) = receiver {
                    self.visit_expr(state, receiver);
                }
            }
            BoundExprKind::Call { receiver, args } => {
                if let Some(receiver) = receiver {
                    self.visit_expr(state, receiver);
                }
                for arg in args {
                    self.visit_expr(state, arg);
                }
            }
            BoundExprKind::New { args } => {
                for arg in args {
                    self.visit_expr(state, arg);
                }
            }
            BoundExprKind::Unary { operand, .. } => self.visit_expr(state, operand),
            BoundExprKind::Binary { op, lhs, rhs, .. } => {
                self.visit_expr(state, lhs);
                if matches!(op, BinaryOp::LogicalAnd | BinaryOp::LogicalOr) {
                    // The right side may not evaluate.
                    let mut rhs_state = state.clone();
                    self.visit_expr(&mut rhs_state, rhs);
                    *state = state.merge(&rhs_state);
                } else {
                    self.visit_expr(state, rhs);
                }
            }
            BoundExprKind::Assign { target, value } => {
                self.visit_expr(state, value);
                self.note_write(state, target);
            }
            BoundExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.visit_expr(state, cond);
                let mut then_state = state.clone();
                self.visit_expr(&mut then_state, then_expr);
                let mut else_state = state.clone();
                self.visit_expr(&mut else_state, else_expr);
                *state = then_state.merge(&else_state);
            }
            BoundExprKind::Convert { operand } | BoundExprKind::Cast { operand } => {
                self.visit_expr(state, operand);
            }
        }
    }

    fn is_tracked_field(&self, expr: &BoundExpr, receiver: Option<&BoundExpr>) -> bool {
        if !self.tracked_fields.contains(&expr.symbol) {
            return false;
        }
        // Only unqualified or `this.`-qualified accesses are the
        // constructor's own storage.
        matches!(receiver, None | Some(BoundExpr { kind: BoundExprKind::This, .. }))
    }

    fn note_read(&mut self, state: &FlowState, expr: &BoundExpr) {
        let symbol = expr.symbol;
        if !symbol.is_valid() {
            return;
        }
        self.read.insert(symbol);
        let assignment = state.get(symbol);
        if assignment == Assignment::Assigned {
            return;
        }
        // Unreachable code still binds and type-checks, but a merely possible
        // assignment gap there is noise; a definite one still reports.
        if assignment == Assignment::MaybeAssigned && !state.reachable {
            return;
        }
        if self.reported_unassigned.insert(symbol) {
            let name = self.table.name_of(symbol);
            let code = if self.tracked_fields.contains(&symbol) {
                dc::USE_OF_UNASSIGNED_FIELD
            } else {
                dc::USE_OF_UNASSIGNED_LOCAL
            };
            self.bag.report(self.ctx, code, expr.span, &[&name]);
        }
    }

    fn note_write(&mut self, state: &mut FlowState, target: &BoundExpr) {
        match &target.kind {
            BoundExprKind::Local | BoundExprKind::Parameter => {
                if target.symbol.is_valid() {
                    self.written.insert(target.symbol);
                    state.assign(target.symbol);
                }
            }
            BoundExprKind::Field { receiver } => {
                if self.is_tracked_field(target, receiver.as_deref()) {
                    state.assign(target.symbol);
                } else if let Some(receiver) = receiver {
                    self.visit_expr(state, receiver);
                }
            }
            // Property and indexer targets evaluate their receivers.
            _ => self.visit_expr(state, target),
        }
    }

    // =========================================================================
    // Post-pass warnings
    // =========================================================================

    /// Locals never read: warn 168 when never assigned beyond declaration,
    /// 219 when assigned but the value goes nowhere.
    fn report_unused(&self) {
        for &(local, span) in &self.declared {
            if self.read.contains(&local) {
                continue;
            }
            let name = self.table.name_of(local);
            let code = if self.written.contains(&local) {
                dc::VARIABLE_ASSIGNED_NEVER_USED
            } else {
                dc::UNUSED_VARIABLE
            };
            self.bag.report(self.ctx, code, span, &[&name]);
        }
    }
}

#[cfg(test)]
#[path = "../tests/flow_tests.rs"]
mod tests;
