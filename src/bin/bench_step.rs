use std::time::Instant;

use sparse_life::batch::{random_soup, soup_rng};
use sparse_life::topology::BoundaryPolicy;
use sparse_life::{RuleDefinition, Simulation};

fn bench_soup(size: i64, density: f64, iterations: u64, policy: BoundaryPolicy) -> (f64, usize) {
    let rule = RuleDefinition::life();
    let soup = random_soup(size, size, density, &mut soup_rng(0x5EED_1234_ABCD_EF01, 0));
    let mut sim = Simulation::with_grid(&rule, policy, soup);

    let start = Instant::now();
    sim.step_n(iterations);
    let duration = start.elapsed();

    (duration.as_secs_f64() * 1000.0, sim.population())
}

fn main() {
    let scales: &[(i64, u64)] = &[(64, 500), (128, 300), (256, 200), (512, 100), (1024, 50)];

    println!(
        "{:<10} {:<10} {:>8} {:>12} {:>10} {:>10}",
        "Soup", "Topology", "Iters", "Total(ms)", "Avg(ms)", "Pop"
    );
    println!("{}", "-".repeat(66));

    for &(size, iters) in scales {
        for (label, policy) in [
            ("plane", BoundaryPolicy::Infinite),
            (
                "torus",
                BoundaryPolicy::Toroidal {
                    width: size,
                    height: size,
                },
            ),
        ] {
            let (total_ms, pop) = bench_soup(size, 0.42, iters, policy);
            println!(
                "{:<10} {:<10} {:>8} {:>12.1} {:>10.4} {:>10}",
                format!("{size}x{size}"),
                label,
                iters,
                total_ms,
                total_ms / iters as f64,
                pop
            );
        }
    }
}
