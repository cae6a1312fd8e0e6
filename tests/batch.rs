use sparse_life::batch::{
    AgarReport, BatchConfig, BatchResult, GeneascopyReport, Workload, run_batch,
};
use sparse_life::engine::State;
use sparse_life::rule::{FnTransition, Neighbourhood, RuleDefinition};
use sparse_life::topology::BoundaryPolicy;

fn geneascopy(rule: &RuleDefinition, config: &BatchConfig) -> GeneascopyReport {
    match run_batch(rule, config, Workload::Geneascopy).unwrap() {
        BatchResult::Geneascopy(report) => report,
        other => panic!("unexpected result {other:?}"),
    }
}

fn agar(rule: &RuleDefinition, config: &BatchConfig) -> AgarReport {
    match run_batch(rule, config, Workload::Agar).unwrap() {
        BatchResult::Agar(report) => report,
        other => panic!("unexpected result {other:?}"),
    }
}

/// Every cell takes its left neighbour's state, so a torus soup rotates
/// forever.
fn shift_rule() -> RuleDefinition {
    RuleDefinition::custom(
        "Shift",
        2,
        vec![Neighbourhood::from_offsets(&[(0, -1)])],
        FnTransition(|_phase: usize, n: &[State], _current: State| -> State { n[0] }),
    )
    .unwrap()
}

#[test]
fn geneascopy_is_independent_of_thread_count() {
    let rule = RuleDefinition::life();
    let base = BatchConfig::default()
        .seed(42)
        .soups(12)
        .generations(40)
        .soup_size(10);
    let single = geneascopy(&rule, &base.clone().thread_count(1));
    let multi = geneascopy(&rule, &base.thread_count(4));
    assert_eq!(single.to_csv(), multi.to_csv());
    assert_eq!(single.mean_population.len(), 40);
    assert!(single.mean_population[0] > 0.0);
    assert!(single.to_csv().starts_with("Generations,Population\n0,"));
}

#[test]
fn geneascopy_seed_changes_the_curve() {
    let rule = RuleDefinition::life();
    let config = BatchConfig::default()
        .soups(6)
        .generations(10)
        .thread_count(2);
    let a = geneascopy(&rule, &config.clone().seed(1));
    let b = geneascopy(&rule, &config.seed(2));
    assert_eq!(a.seed, 1);
    assert_ne!(a.mean_population, b.mean_population);
}

#[test]
fn agar_is_independent_of_thread_count() {
    let rule = shift_rule();
    let base = BatchConfig::default()
        .seed(7)
        .soups(8)
        .policy(BoundaryPolicy::Toroidal {
            width: 6,
            height: 4,
        });
    let single = agar(&rule, &base.clone().thread_count(1));
    let multi = agar(&rule, &base.thread_count(3));
    assert_eq!(single, multi);
}

#[test]
fn rotating_soups_are_recorded_as_agars() {
    let rule = shift_rule();
    let config = BatchConfig::default()
        .seed(3)
        .soups(5)
        .thread_count(2)
        .policy(BoundaryPolicy::Toroidal {
            width: 6,
            height: 4,
        });
    let report = agar(&rule, &config);
    assert_eq!(report.unresolved, 0);
    assert!(!report.records.is_empty());
    let counted: usize = report.counts.values().sum();
    assert!(counted <= 5);
    assert!(report.records.len() <= counted);
    for record in &report.records {
        // A rotating torus never has a transient.
        assert_eq!(record.pre_period, 0);
        assert!(record.period > 1 && 6 % record.period == 0);
        assert!(record.rle.starts_with("x = 6, y = 4, rule = Shift\n"));
        assert!(record.predecessor_rle.ends_with("!\n"));
        assert_eq!(record.signature.len() as u64, record.period);
    }
    assert!(report.summary().contains("found in total"));
}

#[test]
fn agar_defaults_to_a_torus_of_the_soup_size() {
    let rule = shift_rule();
    let config = BatchConfig::default()
        .seed(11)
        .soups(2)
        .soup_size(5)
        .thread_count(1);
    let report = agar(&rule, &config);
    for record in &report.records {
        assert!(record.rle.starts_with("x = 5, y = 5, rule = Shift\n"));
    }
}
