//! Pass 1: stable topological sort, scope by scope.
//!
//! Construction order is already mostly topological (a node can only
//! reference ids that already exist), but later passes relink nodes and can
//! leave a scope's sibling order merely "consistent", not minimal. This pass
//! re-sorts each scope's direct children so that an `Input`/`Memory`-role
//! dependency on a sibling always precedes its consumer, breaking ties by
//! original position (a stable sort, so unrelated nodes never reorder for
//! no reason).

use crate::error::Result;
use crate::ir::{Ir, NodeId};

pub fn reorder_operations(ir: &mut Ir) -> Result<()> {
    let scopes = collect_scopes(ir);
    for scope in scopes {
        sort_children(ir, scope)?;
    }
    Ok(())
}

fn collect_scopes(ir: &Ir) -> Vec<NodeId> {
    ir.iter().filter(|id| ir.node(*id).has_children()).collect()
}

fn sort_children(ir: &mut Ir, scope: NodeId) -> Result<()> {
    let children = ir.children(scope);
    let position: std::collections::HashMap<NodeId, usize> =
        children.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut sorted = Vec::with_capacity(children.len());
    let mut placed: std::collections::HashSet<NodeId> = std::collections::HashSet::new();
    let mut remaining: std::collections::VecDeque<NodeId> = children.iter().copied().collect();

    // Simple stable Kahn's algorithm: repeatedly take the earliest-positioned
    // child whose sibling dependencies are already placed.
    while !remaining.is_empty() {
        let mut progressed = false;
        let candidates: Vec<NodeId> = remaining.iter().copied().collect();
        for id in candidates {
            let ready = ir
                .node(id)
                .args
                .arguments()
                .filter(|(_, n)| position.contains_key(n))
                .all(|(_, n)| placed.contains(&n) || n == id);
            if ready {
                sorted.push(id);
                placed.insert(id);
                remaining.retain(|x| *x != id);
                progressed = true;
                break;
            }
        }
        if !progressed {
            // Residual cycle (shouldn't occur for a well-formed graph): fall
            // back to original order for whatever is left.
            sorted.extend(remaining.drain(..));
            break;
        }
    }

    for (before, after) in children.iter().zip(sorted.iter()) {
        if before != after {
            relink(ir, scope, &sorted)?;
            return Ok(());
        }
    }
    Ok(())
}

fn relink(ir: &mut Ir, scope: NodeId, order: &[NodeId]) -> Result<()> {
    for id in order {
        ir.move_node_to(*id, scope, None)?;
    }
    Ok(())
}
