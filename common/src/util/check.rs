//! Independent verification of a finished forest against its graph.

use crate::db::cost::Cost;
use crate::db::graph::SteinerGraph;
use crate::db::indices::{EdgeId, PairId};
use rayon::prelude::*;
use std::collections::HashSet;

const COST_TOLERANCE: f64 = 1e-6;

struct Dsu {
    parent: Vec<u32>,
}

impl Dsu {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grand = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra as usize] = rb;
        }
    }
}

fn disconnected_pairs<C: Cost>(
    graph: &SteinerGraph<C>,
    edges: &[EdgeId],
    skip: Option<usize>,
) -> Vec<PairId> {
    let mut dsu = Dsu::new(graph.num_nodes());
    for (i, &id) in edges.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        let e = graph.edge(id);
        dsu.union(e.u.0, e.v.0);
    }
    graph
        .pairs()
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_trivial() && dsu.find(p.s.0) != dsu.find(p.t.0))
        .map(|(i, _)| PairId::new(i))
        .collect()
}

pub fn check_connectivity<C: Cost>(graph: &SteinerGraph<C>, edges: &[EdgeId]) -> Result<(), String> {
    let open = disconnected_pairs(graph, edges, None);
    if open.is_empty() {
        Ok(())
    } else {
        Err(format!("{} pair(s) left open: {:?}", open.len(), open))
    }
}

pub fn check_minimality<C: Cost>(graph: &SteinerGraph<C>, edges: &[EdgeId]) -> Result<(), String> {
    let redundant: Vec<EdgeId> = (0..edges.len())
        .into_par_iter()
        .filter(|&i| disconnected_pairs(graph, edges, Some(i)).is_empty())
        .map(|i| edges[i])
        .collect();

    if redundant.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} redundant edge(s) in forest: {:?}",
            redundant.len(),
            redundant
        ))
    }
}

fn check_edges<C: Cost>(
    graph: &SteinerGraph<C>,
    edges: &[EdgeId],
    reported_cost: C,
) -> Result<(), String> {
    let mut seen = HashSet::with_capacity(edges.len());
    for &id in edges {
        if id.index() >= graph.num_edges() {
            return Err(format!("forest references unknown edge {:?}", id));
        }
        if !seen.insert(id) {
            return Err(format!("edge {:?} appears twice in forest", id));
        }
    }

    let actual: f64 = edges.iter().map(|&id| graph.edge(id).cost.to_f64()).sum();
    let reported = reported_cost.to_f64();
    if (actual - reported).abs() > COST_TOLERANCE * actual.abs().max(1.0) {
        return Err(format!(
            "reported cost {} does not match edge sum {}",
            reported, actual
        ));
    }
    Ok(())
}

pub fn run<C: Cost>(graph: &SteinerGraph<C>, edges: &[EdgeId], reported_cost: C) -> Result<(), String> {
    log::info!("Starting Forest Verification ({} edges)", edges.len());

    check_edges(graph, edges, reported_cost).inspect_err(|e| {
        log::error!("\x1b[31mFAIL\x1b[0m: Malformed forest");
        log::error!("{}", e);
    })?;

    let (opens_result, minimal_result) = rayon::join(
        || check_connectivity(graph, edges),
        || check_minimality(graph, edges),
    );

    let mut msgs = Vec::new();

    match opens_result {
        Err(e) => {
            log::error!("\x1b[31mFAIL\x1b[0m: Open Pair (Disconnected) Detected");
            log::error!("{}", e);
            msgs.push(e);
        }
        Ok(_) => log::info!("\x1b[32mPASS\x1b[0m: All terminal pairs are connected."),
    }

    match minimal_result {
        Err(e) => {
            log::error!("\x1b[31mFAIL\x1b[0m: Redundant Edges Detected");
            log::error!("{}", e);
            msgs.push(e);
        }
        Ok(_) => log::info!("\x1b[32mPASS\x1b[0m: Every edge is required by some pair."),
    }

    if msgs.is_empty() {
        log::info!("\x1b[32mSUCCESS\x1b[0m: VALID FOREST");
        Ok(())
    } else {
        log::error!(
            "\x1b[31mFAILURE\x1b[0m: INVALID FOREST ({} Errors)",
            msgs.len()
        );
        Err(msgs.join("; "))
    }
}
