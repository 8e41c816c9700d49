//! TAC optimization passes.
//!
//! Four idempotent passes, applied in order by [`optimize`]: constant
//! folding, common-subexpression elimination, strength reduction, and
//! dead-code elimination. Every pass preserves the relative order of the
//! instructions it keeps, never touches label targets, and never removes
//! a `call`.

use crate::tac::{is_numeric_literal, is_temp_name, Tac, TacOp};

/// Runs all passes in order.
pub fn optimize(code: Vec<Tac>) -> Vec<Tac> {
    let code = constant_folding(code);
    let code = common_subexpression_elimination(code);
    let code = strength_reduction(code);
    dead_code_elimination(code)
}

/// Evaluates operations whose operands are known integer literals.
///
/// Lowering materializes every literal into its own temporary, so folding
/// alone would never see two literal operands. The pass therefore first
/// propagates literal-valued temporaries into arithmetic operands: a temp
/// with exactly one defining instruction, that being an assignment of an
/// integer literal, holds that literal on every execution. Propagation
/// and folding repeat until nothing changes, which also makes the pass
/// idempotent. A literal division by zero is left untouched; the semantic
/// analyzer has already rejected the program that contains one.
pub fn constant_folding(mut code: Vec<Tac>) -> Vec<Tac> {
    loop {
        let literals = literal_temps(&code);
        let mut changed = false;

        for tac in &mut code {
            if !(tac.op.is_binary() || tac.op == TacOp::Neg) {
                continue;
            }

            for arg in [&mut tac.arg1, &mut tac.arg2] {
                if let Some(operand) = arg {
                    if let Some(literal) = literals.get(operand.as_str()) {
                        *operand = literal.clone();
                        changed = true;
                    }
                }
            }

            if tac.op == TacOp::Neg {
                if let Some(value) = literal_value(&tac.arg1) {
                    tac.op = TacOp::Assign;
                    tac.arg1 = Some(value.wrapping_neg().to_string());
                    changed = true;
                }
                continue;
            }

            let (lhs, rhs) = match (literal_value(&tac.arg1), literal_value(&tac.arg2)) {
                (Some(l), Some(r)) => (l, r),
                _ => continue,
            };
            let folded = match tac.op {
                TacOp::Add => lhs.wrapping_add(rhs),
                TacOp::Sub => lhs.wrapping_sub(rhs),
                TacOp::Mul => lhs.wrapping_mul(rhs),
                TacOp::Div => {
                    if rhs == 0 {
                        continue;
                    }
                    lhs.wrapping_div(rhs)
                }
                TacOp::Less => (lhs < rhs) as i64,
                TacOp::Greater => (lhs > rhs) as i64,
                TacOp::Eq => (lhs == rhs) as i64,
                TacOp::Neq => (lhs != rhs) as i64,
                TacOp::LessEq => (lhs <= rhs) as i64,
                TacOp::GreaterEq => (lhs >= rhs) as i64,
                _ => unreachable!(),
            };
            tac.op = TacOp::Assign;
            tac.arg1 = Some(folded.to_string());
            tac.arg2 = None;
            changed = true;
        }

        if !changed {
            return code;
        }
    }
}

/// Temps that provably hold one integer literal: a single defining
/// instruction that assigns a literal.
fn literal_temps(code: &[Tac]) -> std::collections::HashMap<String, String> {
    use std::collections::HashMap;

    let mut def_counts: HashMap<&str, usize> = HashMap::new();
    for tac in code {
        if tac.op == TacOp::Label {
            continue;
        }
        if let Some(result) = &tac.result {
            if is_temp_name(result) {
                *def_counts.entry(result).or_insert(0) += 1;
            }
        }
    }

    let mut literals = HashMap::new();
    for tac in code {
        if tac.op != TacOp::Assign {
            continue;
        }
        if let (Some(result), Some(arg1)) = (&tac.result, &tac.arg1) {
            if is_temp_name(result)
                && is_numeric_literal(arg1)
                && def_counts.get(result.as_str()) == Some(&1)
            {
                literals.insert(result.clone(), arg1.clone());
            }
        }
    }
    literals
}

/// Replaces a recomputation of an already-available expression with a copy
/// of the earlier result.
///
/// Availability is tracked per basic block: the set resets at every label,
/// jump, branch, and call, so no expression survives into code that can be
/// reached from elsewhere. Redefining an operand also invalidates every
/// expression that read it.
pub fn common_subexpression_elimination(mut code: Vec<Tac>) -> Vec<Tac> {
    // (op, arg1, arg2, result) of arithmetic instructions seen in the
    // current block
    let mut available: Vec<(TacOp, String, String, String)> = Vec::new();

    for tac in &mut code {
        match tac.op {
            TacOp::Label | TacOp::If | TacOp::Goto | TacOp::Call => {
                available.clear();
                continue;
            }
            _ => {}
        }

        if matches!(tac.op, TacOp::Add | TacOp::Sub | TacOp::Mul | TacOp::Div) {
            let arg1 = tac.arg1.clone().unwrap_or_default();
            let arg2 = tac.arg2.clone().unwrap_or_default();

            let hit = available
                .iter()
                .find(|(op, a1, a2, _)| *op == tac.op && *a1 == arg1 && *a2 == arg2)
                .map(|(_, _, _, prev_result)| prev_result.clone());

            // The write to `result` kills stale expressions before the new
            // one is recorded.
            kill_mentions(&mut available, &tac.result);

            if let Some(prev_result) = hit {
                tac.op = TacOp::Assign;
                tac.arg1 = Some(prev_result);
                tac.arg2 = None;
            } else if let Some(result) = tac.result.clone() {
                available.push((tac.op, arg1, arg2, result));
            }
        } else {
            kill_mentions(&mut available, &tac.result);
        }
    }

    code
}

/// Drops every available expression that read or produced `result`.
fn kill_mentions(available: &mut Vec<(TacOp, String, String, String)>, result: &Option<String>) {
    if let Some(result) = result {
        available.retain(|(_, a1, a2, prev)| a1 != result && a2 != result && prev != result);
    }
}

/// Rewrites multiplication by two as a self-addition: `x * 2` and `2 * x`
/// both become `x + x`.
pub fn strength_reduction(mut code: Vec<Tac>) -> Vec<Tac> {
    for tac in &mut code {
        if tac.op != TacOp::Mul {
            continue;
        }
        let arg1_is_two = tac.arg1.as_deref() == Some("2");
        let arg2_is_two = tac.arg2.as_deref() == Some("2");

        if arg2_is_two {
            tac.op = TacOp::Add;
            tac.arg2 = tac.arg1.clone();
        } else if arg1_is_two {
            // Swap through a copy so the surviving operand is duplicated,
            // not the literal.
            let kept = tac.arg2.clone();
            tac.op = TacOp::Add;
            tac.arg1 = kept.clone();
            tac.arg2 = kept;
        }
    }
    code
}

/// Removes assignments into temporaries that no later (or earlier)
/// instruction reads. Only plain `Assign` into a `tN` is eligible; user
/// variables, labels, branches, and calls always survive.
///
/// Removing one dead temp can orphan the temp feeding it, so the scan
/// repeats until a pass removes nothing; that fixpoint is what makes the
/// pass idempotent.
pub fn dead_code_elimination(mut code: Vec<Tac>) -> Vec<Tac> {
    loop {
        let mut used: Vec<String> = Vec::new();
        for tac in &code {
            for arg in [&tac.arg1, &tac.arg2] {
                if let Some(arg) = arg {
                    if is_temp_name(arg) && !used.contains(arg) {
                        used.push(arg.clone());
                    }
                }
            }
        }

        let before = code.len();
        code.retain(|tac| {
            if tac.op != TacOp::Assign {
                return true;
            }
            match &tac.result {
                Some(result) if is_temp_name(result) => used.contains(result),
                _ => true,
            }
        });

        if code.len() == before {
            return code;
        }
    }
}

fn literal_value(operand: &Option<String>) -> Option<i64> {
    let operand = operand.as_deref()?;
    if is_numeric_literal(operand) {
        operand.parse().ok()
    } else {
        None
    }
}
