use rustc_hash::{FxHashMap, FxHashSet};
use sf_core::{Actor, ProcessDocument, Step};
use tracing::trace;

/// Actors in swimlane order.
///
/// Depth-first from the start step along `flows` (successors in flow order),
/// each step visited once; an actor takes its place the first time one of its
/// steps is reached. Actors the walk never reaches follow in `actors` order.
/// Step references to unknown actors are ignored.
#[must_use]
pub fn swimlane_order(doc: &ProcessDocument) -> Vec<&Actor> {
    let mut actors_by_id: FxHashMap<&str, &Actor> = FxHashMap::default();
    for actor in &doc.actors {
        actors_by_id.entry(actor.id.as_str()).or_insert(actor);
    }
    let mut steps_by_id: FxHashMap<&str, &Step> = FxHashMap::default();
    for step in &doc.steps {
        steps_by_id.entry(step.id.as_str()).or_insert(step);
    }
    let mut successors: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for flow in &doc.flows {
        successors
            .entry(flow.from.as_str())
            .or_default()
            .push(flow.to.as_str());
    }

    let mut order = Vec::with_capacity(doc.actors.len());
    let mut placed: FxHashSet<&str> = FxHashSet::default();

    if let Some(start) = doc.start_step() {
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut stack = vec![start.id.as_str()];

        while let Some(step_id) = stack.pop() {
            if !visited.insert(step_id) {
                continue;
            }
            if let Some(step) = steps_by_id.get(step_id)
                && let Some(actor) = actors_by_id.get(step.actor_id.as_str())
                && placed.insert(actor.id.as_str())
            {
                trace!(actor = %actor.id, via = step_id, "swimlane reached");
                order.push(*actor);
            }
            if let Some(next) = successors.get(step_id) {
                // Reversed so the first flow out of a step is walked first.
                stack.extend(next.iter().rev().copied());
            }
        }
    }

    for actor in &doc.actors {
        if placed.insert(actor.id.as_str()) {
            trace!(actor = %actor.id, "swimlane appended in document order");
            order.push(actor);
        }
    }
    order
}
