//! The linearity checker: every value of a non-`Copyable`
//! type must be consumed exactly once between its definition and the
//! point it goes out of scope. Consumption is tracked as a single
//! `used: Option<AstNode>` flag per [`Variable`] rather than a separate
//! pass over the CFG; `typecheck::expr::synth_expr` calls
//! [`mark_used`] every time it synthesizes a `Name` read, and
//! `reconcile::check_rows_match` additionally requires the two sides of a
//! join to agree on whether a linear variable has been used.
//!
//! Struct fields are typed with their own bound, grounded on
//! `guppylang/definition/struct.py`, but this checker tracks consumption
//! at the granularity of the base variable: we
//! do not yet give two fields of the same linear struct independent
//! ownership, and conservatively mark the whole struct consumed as soon as
//! one linear field is read off of it. See `DESIGN.md` for the tradeoff.

use guppy_core::ast::AstNode;
use guppy_core::diagnostics::Diagnostics;
use guppy_core::variable::Row;
use guppy_core::Span;

use crate::typecheck::context::Context;

/// Records a read of `name`, failing if it is a linear variable already
/// consumed. No-op for `Copyable` variables. Returns `false` (having
/// already emitted a diagnostic) if `name` was linear and already used.
pub fn mark_used(ctx: &mut Context, diags: &mut Diagnostics, name: &str, node: &AstNode) -> bool {
    let Some(var) = ctx.get(name) else {
        // Undefined-name diagnostics are the caller's responsibility.
        return true;
    };
    if !var.is_linear() {
        return true;
    }
    if !var.owned {
        // Borrowed, not owned by this function: the caller keeps the
        // original value, so reading it here never consumes it and it
        // remains available for further reads.
        return true;
    }
    if let Some(prev) = &var.used {
        diags
            .error(format!("value of `{name}` was already used"), node.span())
            .related_to("first used here", prev.span())
            .emit();
        return false;
    }
    ctx.get_mut(name).unwrap().used = Some(node.clone());
    true
}

/// Checks that every linear, owned, non-synthetic variable still live in
/// `row` has been consumed: a linear value must be consumed exactly once on
/// every path from definition to function exit. Borrowed parameters are
/// exempt: the caller retains ownership, so this function has no
/// obligation to consume them.
pub fn check_all_consumed(row: &Row, diags: &mut Diagnostics) -> bool {
    let mut ok = true;
    for var in row.iter() {
        if var.is_linear() && var.owned && !var.is_synthetic() && var.used.is_none() {
            let span = var.defined_at.first().map(|n| n.span()).unwrap_or_else(|| Span::synthetic(0));
            diags
                .error(format!("value of `{}` (type `{}`) is never consumed", var.name, var.ty), span)
                .emit();
            ok = false;
        }
    }
    ok
}

/// Checks that no linear, owned, non-synthetic variable present in `before`
/// but absent from `after` was dropped while still unconsumed — the case of
/// a variable that is simply dead on one outgoing edge of a block (e.g. an
/// `@owned` parameter shadowed inside one `if` branch) rather than
/// explicitly reassigned, which `typecheck::stmt::assign_target` already
/// rejects directly.
pub fn check_not_dropped(before: &Row, after: &Row, diags: &mut Diagnostics, span: Span) -> bool {
    let mut ok = true;
    for var in before.iter() {
        if var.is_linear() && var.owned && !var.is_synthetic() && var.used.is_none() && !after.contains(&var.name) {
            diags
                .error(format!("value of `{}` (type `{}`) is dropped without being consumed", var.name, var.ty), span)
                .emit();
            ok = false;
        }
    }
    ok
}
