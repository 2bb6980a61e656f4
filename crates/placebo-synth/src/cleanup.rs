//! Post-synthesis normalization: drop redundant no-ops, then give locals
//! canonical type-prefixed names in first-use order.

use placebo_ir::{Body, Instruction, Local, LocalId, PrimitiveKind, Type};

pub fn cleanup(body: &mut Body) {
    eliminate_nops(body);
    standardize_locals(body);
}

/// Remove every no-op that has a successor. Branches and trap bounds that
/// pointed at a removed no-op now point at the next surviving instruction.
pub fn eliminate_nops(body: &mut Body) {
    let len = body.instructions.len();
    // remap[i]: new index of instruction i, or of the next survivor after it.
    let mut remap = Vec::with_capacity(len + 1);
    let mut kept = 0;
    for (idx, instruction) in body.instructions.iter().enumerate() {
        remap.push(kept);
        if !matches!(instruction, Instruction::Nop) || idx + 1 == len {
            kept += 1;
        }
    }
    remap.push(kept);
    if kept == len {
        return;
    }

    let old = std::mem::take(&mut body.instructions);
    body.instructions = old
        .into_iter()
        .enumerate()
        .filter(|(idx, instruction)| !matches!(instruction, Instruction::Nop) || idx + 1 == len)
        .map(|(_, mut instruction)| {
            if let Some(target) = instruction.branch_target_mut() {
                *target = remap.get(*target).copied().unwrap_or(kept);
            }
            instruction
        })
        .collect();
    for trap in &mut body.traps {
        for bound in [&mut trap.begin, &mut trap.end, &mut trap.handler] {
            *bound = remap.get(*bound).copied().unwrap_or(kept);
        }
    }
}

/// Drop unused locals, renumber the rest by first appearance and rename
/// them `<prefix><n>` with one counter per prefix.
pub fn standardize_locals(body: &mut Body) {
    let mut mapping: Vec<Option<LocalId>> = vec![None; body.locals.len()];
    let mut locals: Vec<Local> = Vec::new();
    for instruction in &body.instructions {
        for id in instruction.locals() {
            let Some(slot) = mapping.get_mut(id.index()) else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(LocalId(locals.len() as u32));
                locals.push(body.locals[id.index()].clone());
            }
        }
    }

    let mut counters = [0usize; 9];
    for local in &mut locals {
        let (prefix, slot) = prefix(&local.ty);
        local.name = format!("{prefix}{}", counters[slot]);
        counters[slot] += 1;
    }

    for instruction in &mut body.instructions {
        instruction.for_each_local_mut(|id| {
            if let Some(Some(new)) = mapping.get(id.index()) {
                *id = *new;
            }
        });
    }
    body.locals = locals;
}

fn prefix(ty: &Type) -> (char, usize) {
    match ty {
        Type::Reference(_) | Type::Array { .. } => ('r', 0),
        Type::Primitive(kind) => match kind {
            PrimitiveKind::Boolean => ('z', 1),
            PrimitiveKind::Byte => ('b', 2),
            PrimitiveKind::Char => ('c', 3),
            PrimitiveKind::Short => ('s', 4),
            PrimitiveKind::Int => ('i', 5),
            PrimitiveKind::Long => ('l', 6),
            PrimitiveKind::Float => ('f', 7),
            PrimitiveKind::Double => ('d', 8),
        },
    }
}
