//! Co-placement bundles.
//!
//! Services joined by `runsWith` must land on the same node. A bundle is a
//! connected component of the symmetric closure of `runsWith`, restricted to
//! one workload's services. Each bundle is scheduled atomically and
//! replicated across as many distinct zones as its most-replicated member
//! demands.

use std::collections::BTreeSet;

use sizer_core::types::{Service, ServiceId, Workload};

use crate::service;

/// All bundles of a workload, in input order of their first member.
pub fn bundles(workload: &Workload, services: &[Service]) -> Vec<Vec<ServiceId>> {
    let mut grouped: BTreeSet<ServiceId> = BTreeSet::new();
    let mut out = Vec::new();
    for &sid in &workload.services {
        if grouped.contains(&sid) {
            continue;
        }
        let component = bundle_containing(sid, workload, services);
        grouped.extend(component.iter().copied());
        out.push(component);
    }
    out
}

/// The bundle containing `seed`: every service reachable from it over
/// `runsWith` edges in either direction, ordered by the workload's input
/// order.
pub fn bundle_containing(seed: ServiceId, workload: &Workload, services: &[Service]) -> Vec<ServiceId> {
    let members = &workload.services;
    let mut visited: BTreeSet<ServiceId> = BTreeSet::new();
    let mut stack = vec![seed];
    visited.insert(seed);

    while let Some(current) = stack.pop() {
        for &other in members {
            if !visited.contains(&other) && linked(current, other, services) {
                visited.insert(other);
                stack.push(other);
            }
        }
    }

    let mut component: Vec<ServiceId> = visited.into_iter().collect();
    component.sort_by_key(|id| members.iter().position(|m| m == id));
    component
}

/// True when `a` and `b` are joined by `runsWith` in either direction.
fn linked(a: ServiceId, b: ServiceId, services: &[Service]) -> bool {
    let (Some(sa), Some(sb)) = (service(services, a), service(services, b)) else {
        return false;
    };
    sa.runs_with.contains(&b) || sb.runs_with.contains(&a)
}
