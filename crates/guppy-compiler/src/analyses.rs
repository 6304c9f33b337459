//! Program analyses: three worklist fixed-point passes over
//! the CFG — liveness (backward, may), definite assignment (forward,
//! must, intersection at joins), and maybe-assignment (forward, may,
//! union). The type/linearity checker consults all three to decide which
//! row a block expects and to phrase "never assigned" vs. "assigned on
//! some paths" diagnostics precisely.

use crate::cfg::vars::{expr_uses, stmt_vars};
use crate::cfg::{BasicBlock, BbId, Cfg};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct AnalysisResults {
    pub live_before: HashMap<BbId, HashSet<String>>,
    pub ass_before: HashMap<BbId, HashSet<String>>,
    pub maybe_ass_before: HashMap<BbId, HashSet<String>>,
}

impl AnalysisResults {
    /// A variable that is in `maybe_ass_before` but not `ass_before`:
    /// assigned along some incoming paths but not all, distinguishing
    /// never-assigned from assigned-on-some-paths.
    pub fn is_partially_assigned(&self, bb: BbId, name: &str) -> bool {
        self.maybe_ass_before.get(&bb).is_some_and(|s| s.contains(name))
            && !self.ass_before.get(&bb).is_some_and(|s| s.contains(name))
    }
}

/// Per-block `(gen, kill)` for liveness and `defs` (the set of names
/// unconditionally assigned somewhere in the block) for the assignment
/// analyses — a basic block has no internal branching, so every name it
/// assigns is assigned on every path through it.
struct BlockFacts {
    r#gen: HashSet<String>,
    defs: HashSet<String>,
}

fn block_facts(bb: &BasicBlock) -> BlockFacts {
    let mut defined_so_far = HashSet::new();
    let mut r#gen = HashSet::new();
    for stmt in &bb.statements {
        let (defs, uses) = stmt_vars(stmt);
        for u in uses {
            if !defined_so_far.contains(&u) {
                r#gen.insert(u);
            }
        }
        defined_so_far.extend(defs);
    }
    if let Some(pred) = &bb.branch_pred {
        let mut uses = HashSet::new();
        expr_uses(pred, &mut uses);
        for u in uses {
            if !defined_so_far.contains(&u) {
                r#gen.insert(u);
            }
        }
    }
    BlockFacts {
        r#gen,
        defs: defined_so_far,
    }
}

/// Runs all three analyses over `cfg`. `params` are the function's formal
/// parameters, definitely (and maybe-) assigned before the entry block.
/// `return_arity` seeds the exit block's liveness with `%ret_0..%ret_{k-1}`
/// (spec §4.1: the exit block "uses" its return slots even though no
/// statement in it reads them), so liveness propagates the return
/// obligation backwards to whichever block assigns each `%ret_N`.
pub fn run(cfg: &Cfg, params: &[String], return_arity: usize) -> AnalysisResults {
    let mut facts: HashMap<BbId, BlockFacts> = cfg.blocks().map(|bb| (bb.id, block_facts(bb))).collect();
    if let Some(exit_facts) = facts.get_mut(&cfg.exit) {
        exit_facts.r#gen = (0..return_arity).map(|i| format!("%ret_{i}")).collect();
    }

    let live_before = liveness(cfg, &facts);
    let ass_before = definite_assignment(cfg, &facts, params);
    let maybe_ass_before = maybe_assignment(cfg, &facts, params);

    AnalysisResults {
        live_before,
        ass_before,
        maybe_ass_before,
    }
}

fn liveness(cfg: &Cfg, facts: &HashMap<BbId, BlockFacts>) -> HashMap<BbId, HashSet<String>> {
    let mut live_before: HashMap<BbId, HashSet<String>> =
        cfg.blocks().map(|bb| (bb.id, HashSet::new())).collect();

    let mut queue: VecDeque<BbId> = cfg.blocks().map(|bb| bb.id).collect();
    let mut in_queue: HashSet<BbId> = queue.iter().copied().collect();

    while let Some(id) = queue.pop_front() {
        in_queue.remove(&id);
        let bb = cfg.bb(id);
        let f = &facts[&id];

        let mut live_after: HashSet<String> = HashSet::new();
        for succ in &bb.successors {
            live_after.extend(live_before[succ].iter().cloned());
        }

        let mut new_before = f.r#gen.clone();
        for v in &live_after {
            if !f.defs.contains(v) {
                new_before.insert(v.clone());
            }
        }

        if new_before != live_before[&id] {
            live_before.insert(id, new_before);
            for pred in &bb.predecessors {
                if in_queue.insert(*pred) {
                    queue.push_back(*pred);
                }
            }
        }
    }

    live_before
}

fn definite_assignment(
    cfg: &Cfg,
    facts: &HashMap<BbId, BlockFacts>,
    params: &[String],
) -> HashMap<BbId, HashSet<String>> {
    forward_assignment_analysis(cfg, facts, params, true)
}

fn maybe_assignment(
    cfg: &Cfg,
    facts: &HashMap<BbId, BlockFacts>,
    params: &[String],
) -> HashMap<BbId, HashSet<String>> {
    forward_assignment_analysis(cfg, facts, params, false)
}

/// Shared driver for the definite- and maybe-assignment passes: both are
/// forward fixed points over `ass_after[bb] = ass_before[bb] ∪ defs[bb]`,
/// differing only in how they combine multiple predecessors at a join
/// (`intersect` for "must", `union` for "may").
fn forward_assignment_analysis(
    cfg: &Cfg,
    facts: &HashMap<BbId, BlockFacts>,
    params: &[String],
    intersect_at_joins: bool,
) -> HashMap<BbId, HashSet<String>> {
    let seed: HashSet<String> = params.iter().cloned().collect();
    let mut before: HashMap<BbId, HashSet<String>> = HashMap::new();
    let mut after: HashMap<BbId, HashSet<String>> = HashMap::new();
    for bb in cfg.blocks() {
        before.insert(bb.id, HashSet::new());
        after.insert(bb.id, HashSet::new());
    }
    before.insert(cfg.entry, seed.clone());

    let mut queue: VecDeque<BbId> = cfg.blocks().map(|bb| bb.id).collect();
    let mut in_queue: HashSet<BbId> = queue.iter().copied().collect();

    while let Some(id) = queue.pop_front() {
        in_queue.remove(&id);
        let bb = cfg.bb(id);

        let new_before = if id == cfg.entry {
            seed.clone()
        } else if bb.predecessors.is_empty() {
            // Unreachable block: its facts are never consulted by the
            // checker, which only visits blocks reachable from entry.
            HashSet::new()
        } else {
            let mut preds = bb.predecessors.iter();
            let first = preds.next().unwrap();
            let mut acc = after[first].clone();
            for p in preds {
                if intersect_at_joins {
                    acc = acc.intersection(&after[p]).cloned().collect();
                } else {
                    acc.extend(after[p].iter().cloned());
                }
            }
            acc
        };

        let f = &facts[&id];
        let mut new_after = new_before.clone();
        new_after.extend(f.defs.iter().cloned());

        let before_changed = before[&id] != new_before;
        let after_changed = after[&id] != new_after;
        before.insert(id, new_before);
        after.insert(id, new_after);

        if before_changed || after_changed {
            for succ in &bb.successors {
                if in_queue.insert(*succ) {
                    queue.push_back(*succ);
                }
            }
        }
    }

    before
}

#[cfg(test)]
mod analyses_tests {
    use super::*;
    use crate::cfg::builder::build;
    use guppy_core::ast::builder::*;

    #[test]
    fn liveness_excludes_variables_dead_after_last_use() {
        let body = vec![
            assign(0, target_name(0, "x"), int(0, 1)),
            assign(1, target_name(1, "y"), name(1, "x")),
            return_stmt(2, Some(name(2, "y"))),
        ];
        let result = build(&body, 1);
        let analyses = run(&result.cfg, &[], 1);
        // `x` is dead before the `return` block since its only use is in
        // assigning `y`.
        let exit_live = &analyses.live_before[&result.cfg.exit];
        assert!(!exit_live.contains("x"));
    }

    #[test]
    fn exit_liveness_is_seeded_with_the_return_slots() {
        let body = vec![return_stmt(0, Some(name(0, "x")))];
        let result = build(&body, 1);
        let analyses = run(&result.cfg, &["x".to_string()], 1);
        assert!(analyses.live_before[&result.cfg.exit].contains("%ret_0"));
        // Propagates backward: the entry block (which assigns `%ret_0`
        // from the param `x`) must see `x` live before it.
        assert!(analyses.live_before[&result.cfg.entry].contains("x"));
    }

    #[test]
    fn definite_assignment_requires_all_branches_to_assign() {
        let body = vec![
            if_stmt(
                0,
                name(0, "cond"),
                vec![assign(1, target_name(1, "x"), int(1, 1))],
                vec![],
            ),
            return_stmt(2, None),
        ];
        let result = build(&body, 0);
        let analyses = run(&result.cfg, &["cond".to_string()], 0);
        assert!(!analyses.ass_before[&result.cfg.exit].contains("x"));
        assert!(analyses.maybe_ass_before[&result.cfg.exit].contains("x"));
        assert!(analyses.is_partially_assigned(result.cfg.exit, "x"));
    }

    #[test]
    fn params_are_definitely_assigned_at_entry() {
        let body = vec![return_stmt(0, None)];
        let result = build(&body, 0);
        let analyses = run(&result.cfg, &["p".to_string()], 0);
        assert!(analyses.ass_before[&result.cfg.entry].contains("p"));
    }
}
