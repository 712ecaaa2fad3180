//! Dynamic partition of the routing graph into growing components.
//!
//! Components live in an arena addressed by their representative node.
//! Dual values use a virtual clock: an active component's value is its
//! frozen base plus the clock time elapsed since it last changed status,
//! so one growth step is O(1) instead of touching every active component.

use eda_common::db::cost::Dual;
use eda_common::db::graph::TerminalPair;
use eda_common::db::indices::{ComponentId, NodeId, PairId};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("nodes {0:?} and {1:?} already share a component")]
    RedundantUnion(NodeId, NodeId),
}

/// Plain union-find over integer arrays: union by size, path halving.
#[derive(Clone, Debug)]
pub struct DisjointSet {
    parent: Vec<u32>,
    size: Vec<u32>,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
            size: vec![1; n],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    #[inline(always)]
    pub fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grand = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    /// Read-only lookup. Depth stays logarithmic under union by size, so
    /// concurrent readers can call this without compressing paths.
    #[inline(always)]
    pub fn root(&self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            x = self.parent[x as usize];
        }
        x
    }

    pub fn size(&self, root: u32) -> u32 {
        self.size[root as usize]
    }

    /// Returns `(kept_root, absorbed_root)`, or `None` if already joined.
    pub fn union(&mut self, a: u32, b: u32) -> Option<(u32, u32)> {
        let mut ra = self.find(a);
        let mut rb = self.find(b);
        if ra == rb {
            return None;
        }
        if self.size[ra as usize] < self.size[rb as usize] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb as usize] = ra;
        self.size[ra as usize] += self.size[rb as usize];
        Some((ra, rb))
    }
}

#[derive(Clone, Debug)]
struct ComponentData<D> {
    base: D,
    since: D,
    active: bool,
    // Unsatisfied pairs with exactly one endpoint inside. Spanning pairs are
    // counted twice between a merge and their `mark_satisfied` call.
    open: u32,
    // Pair endpoints inside this component; satisfied entries are dropped
    // lazily on merge.
    pairs: Vec<PairId>,
}

pub struct ComponentRegistry<D: Dual> {
    sets: DisjointSet,
    data: Vec<ComponentData<D>>,
    pairs: Vec<TerminalPair>,
    satisfied: Vec<bool>,
    clock: D,
    num_active: usize,
    num_components: usize,
}

impl<D: Dual> ComponentRegistry<D> {
    pub fn new(num_nodes: usize, pairs: &[TerminalPair]) -> Self {
        let mut data: Vec<ComponentData<D>> = (0..num_nodes)
            .map(|_| ComponentData {
                base: D::zero(),
                since: D::zero(),
                active: false,
                open: 0,
                pairs: Vec::new(),
            })
            .collect();

        let mut satisfied = vec![false; pairs.len()];
        for (i, p) in pairs.iter().enumerate() {
            if p.is_trivial() {
                satisfied[i] = true;
                continue;
            }
            for node in [p.s, p.t] {
                let d = &mut data[node.index()];
                d.pairs.push(PairId::new(i));
                d.open += 1;
            }
        }

        let mut num_active = 0;
        for d in &mut data {
            d.active = d.open > 0;
            if d.active {
                num_active += 1;
            }
        }

        Self {
            sets: DisjointSet::new(num_nodes),
            data,
            pairs: pairs.to_vec(),
            satisfied,
            clock: D::zero(),
            num_active,
            num_components: num_nodes,
        }
    }

    pub fn find(&mut self, node: NodeId) -> ComponentId {
        ComponentId(self.sets.find(node.0))
    }

    pub fn root(&self, node: NodeId) -> ComponentId {
        ComponentId(self.sets.root(node.0))
    }

    pub fn same_component(&mut self, a: NodeId, b: NodeId) -> bool {
        self.find(a) == self.find(b)
    }

    #[inline(always)]
    pub fn is_active(&self, component: ComponentId) -> bool {
        self.data[component.index()].active
    }

    pub fn dual(&self, component: ComponentId) -> D {
        let d = &self.data[component.index()];
        if d.active {
            d.base + (self.clock - d.since)
        } else {
            d.base
        }
    }

    pub fn component_size(&self, component: ComponentId) -> usize {
        self.sets.size(component.0) as usize
    }

    pub fn active_count(&self) -> usize {
        self.num_active
    }

    pub fn component_count(&self) -> usize {
        self.num_components
    }

    pub fn clock(&self) -> D {
        self.clock
    }

    /// Raises every active component's dual value by `delta`.
    pub fn grow(&mut self, delta: D) {
        self.clock = self.clock + delta;
    }

    pub fn is_satisfied(&self, pair: PairId) -> bool {
        self.satisfied[pair.index()]
    }

    pub fn unsatisfied_pairs(&self) -> Vec<PairId> {
        self.satisfied
            .iter()
            .enumerate()
            .filter(|(_, s)| !**s)
            .map(|(i, _)| PairId::new(i))
            .collect()
    }

    /// Unsatisfied pairs with one endpoint in each of the two components.
    pub fn spanning_pairs(&mut self, a: NodeId, b: NodeId) -> Vec<PairId> {
        let ra = self.sets.find(a.0);
        let rb = self.sets.find(b.0);
        if ra == rb {
            return Vec::new();
        }
        let (small, other) = if self.data[ra as usize].pairs.len() <= self.data[rb as usize].pairs.len() {
            (ra, rb)
        } else {
            (rb, ra)
        };

        let mut spanning = Vec::new();
        for &pid in &self.data[small as usize].pairs {
            if self.satisfied[pid.index()] {
                continue;
            }
            let p = self.pairs[pid.index()];
            let rs = self.sets.root(p.s.0);
            let rt = self.sets.root(p.t.0);
            if (rs == small && rt == other) || (rs == other && rt == small) {
                spanning.push(pid);
            }
        }
        spanning.sort_unstable();
        spanning.dedup();
        spanning
    }

    pub fn union(&mut self, a: NodeId, b: NodeId) -> Result<ComponentId, RegistryError> {
        let (keep, gone) = self
            .sets
            .union(a.0, b.0)
            .ok_or(RegistryError::RedundantUnion(a, b))?;

        let keep_dual = self.dual(ComponentId(keep));
        let gone_dual = self.dual(ComponentId(gone));
        let keep_active = self.data[keep as usize].active;
        let gone_active = self.data[gone as usize].active;

        let merged_dual = match (keep_active, gone_active) {
            (true, true) => {
                let (k, g) = (keep_dual.to_f64(), gone_dual.to_f64());
                debug_assert!(
                    (k - g).abs() <= 1e-6 * k.abs().max(1.0),
                    "active components grew unevenly: {} vs {}",
                    k,
                    g
                );
                keep_dual
            }
            (true, false) => keep_dual,
            (false, true) => gone_dual,
            (false, false) => {
                if keep_dual >= gone_dual {
                    keep_dual
                } else {
                    gone_dual
                }
            }
        };

        let absorbed = std::mem::take(&mut self.data[gone as usize].pairs);
        let absorbed_open = self.data[gone as usize].open;
        self.set_active(gone, false);
        self.data[gone as usize].open = 0;

        let satisfied = &self.satisfied;
        let kept = &mut self.data[keep as usize];
        kept.pairs.retain(|p| !satisfied[p.index()]);
        kept.pairs
            .extend(absorbed.into_iter().filter(|p| !satisfied[p.index()]));
        kept.open += absorbed_open;
        kept.base = merged_dual;
        kept.since = self.clock;

        let active = kept.open > 0;
        self.set_active(keep, active);
        self.num_components -= 1;

        Ok(ComponentId(keep))
    }

    /// Records that both endpoints of `pair` now share a component.
    pub fn mark_satisfied(&mut self, pair: PairId) {
        if self.satisfied[pair.index()] {
            return;
        }
        let p = self.pairs[pair.index()];
        let root = self.sets.find(p.s.0);
        debug_assert_eq!(root, self.sets.find(p.t.0), "pair endpoints not merged");

        self.satisfied[pair.index()] = true;
        let d = &mut self.data[root as usize];
        d.open = d.open.saturating_sub(2);
        let active = d.open > 0;
        self.set_active(root, active);
    }

    fn set_active(&mut self, root: u32, active: bool) {
        let clock = self.clock;
        let d = &mut self.data[root as usize];
        if d.active == active {
            return;
        }
        if d.active {
            // Freeze the value accumulated so far.
            d.base = d.base + (clock - d.since);
            self.num_active -= 1;
        } else {
            self.num_active += 1;
        }
        d.since = clock;
        d.active = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eda_common::db::cost::Dyadic;

    fn pair(s: u32, t: u32) -> TerminalPair {
        TerminalPair {
            s: NodeId(s),
            t: NodeId(t),
        }
    }

    #[test]
    fn disjoint_set_union_by_size() {
        let mut ds = DisjointSet::new(5);
        assert_eq!(ds.union(0, 1), Some((0, 1)));
        assert_eq!(ds.union(2, 0), Some((0, 2)));
        assert_eq!(ds.union(1, 2), None);
        assert_eq!(ds.root(2), 0);
        assert_eq!(ds.size(0), 3);
        assert_eq!(ds.len(), 5);
    }

    #[test]
    fn terminals_start_active_and_others_inactive() {
        let reg: ComponentRegistry<Dyadic> = ComponentRegistry::new(4, &[pair(0, 3), pair(2, 2)]);
        assert!(reg.is_active(ComponentId(0)));
        assert!(reg.is_active(ComponentId(3)));
        assert!(!reg.is_active(ComponentId(1)));
        assert!(!reg.is_active(ComponentId(2)));
        assert_eq!(reg.active_count(), 2);
        assert!(reg.is_satisfied(PairId(1)));
        assert_eq!(reg.unsatisfied_pairs(), vec![PairId(0)]);
    }

    #[test]
    fn union_with_inactive_keeps_active_dual() {
        let mut reg: ComponentRegistry<Dyadic> = ComponentRegistry::new(3, &[pair(0, 2)]);
        reg.grow(Dyadic::from_int(2));
        assert_eq!(reg.dual(ComponentId(0)), Dyadic::from_int(2));
        assert_eq!(reg.dual(ComponentId(1)), Dyadic::zero());

        let root = reg.union(NodeId(1), NodeId(0)).unwrap();
        assert!(reg.is_active(root));
        assert_eq!(reg.dual(root), Dyadic::from_int(2));
        assert_eq!(reg.component_size(root), 2);

        reg.grow(Dyadic::from_int(1));
        assert_eq!(reg.dual(root), Dyadic::from_int(3));
        assert_eq!(reg.component_count(), 2);
    }

    #[test]
    fn satisfying_last_pair_deactivates_and_freezes() {
        let mut reg: ComponentRegistry<Dyadic> = ComponentRegistry::new(2, &[pair(0, 1)]);
        reg.grow(Dyadic::from_int(1).half());

        let spanning = reg.spanning_pairs(NodeId(0), NodeId(1));
        assert_eq!(spanning, vec![PairId(0)]);

        let root = reg.union(NodeId(0), NodeId(1)).unwrap();
        assert!(reg.is_active(root));
        reg.mark_satisfied(PairId(0));
        assert!(!reg.is_active(root));
        assert_eq!(reg.active_count(), 0);

        reg.grow(Dyadic::from_int(5));
        assert_eq!(reg.dual(root), Dyadic::from_int(1).half());
    }

    #[test]
    fn redundant_union_is_reported() {
        let mut reg: ComponentRegistry<f64> = ComponentRegistry::new(3, &[]);
        reg.union(NodeId(0), NodeId(1)).unwrap();
        assert_eq!(
            reg.union(NodeId(1), NodeId(0)),
            Err(RegistryError::RedundantUnion(NodeId(1), NodeId(0)))
        );
        assert_eq!(reg.component_count(), 2);
    }

    #[test]
    fn component_stays_active_while_other_pair_open() {
        let mut reg: ComponentRegistry<f64> =
            ComponentRegistry::new(4, &[pair(0, 1), pair(0, 3)]);
        let spanning = reg.spanning_pairs(NodeId(0), NodeId(1));
        assert_eq!(spanning, vec![PairId(0)]);
        let root = reg.union(NodeId(0), NodeId(1)).unwrap();
        reg.mark_satisfied(PairId(0));
        assert!(reg.is_active(root));
        assert!(reg.is_active(reg.root(NodeId(3))));
        assert_eq!(reg.active_count(), 2);
    }
}
