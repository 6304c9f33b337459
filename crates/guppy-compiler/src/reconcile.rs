//! Row reconciliation: when two control-flow paths rejoin,
//! every variable live after the join must have the same name and type
//! along both paths. Grounded on
//! `examples/original_source/guppy/checker/cfg_checker.py: check_rows_match`.

use guppy_core::diagnostics::Diagnostics;
use guppy_core::variable::{Row, Variable};

/// A human-facing label for a variable in a reconciliation diagnostic:
/// CFG-introduced temporaries (`%tmp0`, `%ret_0`, ...) are never
/// user-written, so they are described as "Expression" rather than by
/// their internal name.
fn describe(var: &Variable) -> String {
    if var.is_synthetic() {
        "Expression".to_string()
    } else {
        format!("variable `{}`", var.name)
    }
}

/// Checks that `a` and `b` (the live rows computed along two distinct
/// paths into the same join point) agree on every name's type, and that
/// neither path has a variable the other lacks. Returns `true` if the two
/// rows reconcile cleanly.
pub fn check_rows_match(a: &Row, b: &Row, diags: &mut Diagnostics) -> bool {
    let mut ok = true;

    for va in a.iter() {
        match b.get(&va.name) {
            None => {
                let (first, second) = earlier_definition(va, va);
                diags
                    .error(
                        format!("{} is defined on one branch but not the other", describe(first)),
                        first.defined_at.first().map(|n| n.span()).unwrap_or(guppy_core::Span::synthetic(0)),
                    )
                    .related_to(
                        "not defined here",
                        second.defined_at.last().map(|n| n.span()).unwrap_or(guppy_core::Span::synthetic(0)),
                    )
                    .emit();
                ok = false;
            }
            Some(vb) if vb.ty != va.ty => {
                let (first, second) = earlier_definition(va, vb);
                diags
                    .error(
                        format!(
                            "{} has type `{}` on one branch and `{}` on the other",
                            describe(first),
                            first.ty,
                            second.ty
                        ),
                        first.defined_at.first().map(|n| n.span()).unwrap_or(guppy_core::Span::synthetic(0)),
                    )
                    .related_to("other definition here", second.defined_at.last().map(|n| n.span()).unwrap_or(guppy_core::Span::synthetic(0)))
                    .emit();
                ok = false;
            }
            Some(vb) if va.is_linear() && va.used.is_some() != vb.used.is_some() => {
                let (used, unused) = if va.used.is_some() { (va, vb) } else { (vb, va) };
                diags
                    .error(
                        format!("{} is used on one branch but not the other", describe(used)),
                        used.used.as_ref().map(|n| n.span()).unwrap_or(guppy_core::Span::synthetic(0)),
                    )
                    .related_to(
                        "still unused on this branch",
                        unused.defined_at.last().map(|n| n.span()).unwrap_or(guppy_core::Span::synthetic(0)),
                    )
                    .emit();
                ok = false;
            }
            Some(_) => {}
        }
    }

    for vb in b.iter() {
        if a.get(&vb.name).is_none() {
            diags
                .error(
                    format!("{} is defined on one branch but not the other", describe(vb)),
                    vb.defined_at.first().map(|n| n.span()).unwrap_or(guppy_core::Span::synthetic(0)),
                )
                .emit();
            ok = false;
        }
    }

    ok
}

/// Orders two conflicting definitions of the same variable by source
/// location, earliest first, matching the original's diagnostic phrasing.
fn earlier_definition<'a>(a: &'a Variable, b: &'a Variable) -> (&'a Variable, &'a Variable) {
    let a_span = a.defined_at.first().map(|n| n.span());
    let b_span = b.defined_at.first().map(|n| n.span());
    match (a_span, b_span) {
        (Some(sa), Some(sb)) if sb < sa => (b, a),
        _ => (a, b),
    }
}
