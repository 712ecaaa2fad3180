use crate::db::instance::{GridInstance, PinPair};
use crate::geom::coord::GridCoord;
use crate::util::config::GridConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

pub fn generate_random_instance(
    grid: &GridConfig,
    num_pairs: usize,
    obstacle_ratio: f64,
    seed: Option<u64>,
) -> GridInstance {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let width = grid.width.max(1);
    let height = grid.height.max(1);
    let layers = grid.layers.max(1);

    let mut instance = GridInstance::new(width, height, layers);
    instance.name = format!("random_{}x{}x{}", width, height, layers);
    instance.wire_cost = grid.wire_cost;
    instance.via_cost = grid.via_cost;
    instance.diagonals = grid.diagonals;
    instance.diagonal_cost = grid.diagonal_cost;

    let ratio = obstacle_ratio.clamp(0.0, 0.9);
    let total = instance.num_cells();

    log::info!(
        "Generating Grid Instance: {}x{}x{}, {} pairs (Obstacles: {:.0}%)",
        width,
        height,
        layers,
        num_pairs,
        ratio * 100.0
    );

    // Pins live on the bottom layer, like cell pins on M1.
    let mut pins = HashSet::new();
    for _ in 0..num_pairs {
        let source = GridCoord::new(rng.gen_range(0..width), rng.gen_range(0..height), 0);
        let sink = GridCoord::new(rng.gen_range(0..width), rng.gen_range(0..height), 0);
        pins.insert(source);
        pins.insert(sink);
        instance.pairs.push(PinPair { source, sink });
    }

    let target = ((total as f64) * ratio) as usize;
    let mut blocked = HashSet::new();
    let mut attempts = 0;
    while blocked.len() < target && attempts < target * 4 + 16 {
        attempts += 1;
        let c = GridCoord::new(
            rng.gen_range(0..width),
            rng.gen_range(0..height),
            rng.gen_range(0..layers),
        );
        if !pins.contains(&c) {
            blocked.insert(c);
        }
    }

    let mut obstacles: Vec<GridCoord> = blocked.into_iter().collect();
    obstacles.sort();
    instance.obstacles = obstacles;
    instance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_generation_is_reproducible() {
        let grid = GridConfig::default();
        let a = generate_random_instance(&grid, 5, 0.1, Some(7));
        let b = generate_random_instance(&grid, 5, 0.1, Some(7));
        assert_eq!(a, b);
        assert_eq!(a.pairs.len(), 5);
    }

    #[test]
    fn obstacles_never_cover_pins() {
        let grid = GridConfig {
            width: 6,
            height: 6,
            layers: 1,
            ..GridConfig::default()
        };
        let inst = generate_random_instance(&grid, 4, 0.5, Some(42));
        for p in &inst.pairs {
            assert!(!inst.obstacles.contains(&p.source));
            assert!(!inst.obstacles.contains(&p.sink));
        }
        assert!(inst.obstacles.iter().all(|c| c.x < 6 && c.y < 6 && c.z == 0));
    }
}
