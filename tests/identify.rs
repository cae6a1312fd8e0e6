use sparse_life::engine::{Coord, SparseGrid, State};
use sparse_life::identify::{IdentificationResult, Orientation, PatternKind, identify};
use sparse_life::rule::{FnTransition, Neighbourhood, RuleDefinition};
use sparse_life::topology::BoundaryPolicy;

fn grid(cells: &[Coord]) -> SparseGrid {
    cells.iter().map(|&c| (c, 1)).collect()
}

fn identify_any(rule: &RuleDefinition, cells: &[Coord]) -> IdentificationResult {
    identify(
        rule,
        &grid(cells),
        PatternKind::Any,
        0,
        BoundaryPolicy::Infinite,
    )
}

#[test]
fn block_is_a_still_life() {
    let rule = RuleDefinition::life();
    let result = identify_any(&rule, &[(0, 0), (0, 1), (1, 0), (1, 1)]);
    assert_eq!(result, IdentificationResult::StillLife);
    assert_eq!(result.to_string(), "Still Life");
}

#[test]
fn blinker_is_a_period_two_oscillator() {
    let rule = RuleDefinition::life();
    assert_eq!(
        identify_any(&rule, &[(1, 0), (1, 1), (1, 2)]),
        IdentificationResult::Oscillator { period: 2 }
    );
}

#[test]
fn glider_is_a_diagonal_spaceship() {
    let rule = RuleDefinition::life();
    let result = identify_any(&rule, &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]);
    assert_eq!(
        result,
        IdentificationResult::Spaceship {
            dx: 1,
            dy: 1,
            period: 4,
            orientation: Orientation::Diagonal,
        }
    );
    assert_eq!(result.to_string(), "Diagonal 1c/4 Spaceship");
}

#[test]
fn lightweight_spaceship_is_orthogonal() {
    let rule = RuleDefinition::life();
    let lwss = [
        (0, 1),
        (0, 4),
        (1, 0),
        (2, 0),
        (2, 4),
        (3, 0),
        (3, 1),
        (3, 2),
        (3, 3),
    ];
    let result = identify(
        &rule,
        &grid(&lwss),
        PatternKind::StillLifeOscillatorSpaceship,
        0,
        BoundaryPolicy::Infinite,
    );
    assert_eq!(
        result,
        IdentificationResult::Spaceship {
            dx: 2,
            dy: 0,
            period: 4,
            orientation: Orientation::Orthogonal,
        }
    );
    assert_eq!(result.to_string(), "Orthogonal 2c/4 Spaceship");
}

#[test]
fn emitter_is_a_gun() {
    // Every cell copies its left neighbour, so a single cell grows a ray
    // while the starting cell stays put.
    let emitter = FnTransition(|_phase: usize, n: &[State], current: State| -> State {
        (current == 1 || n[0] == 1) as State
    });
    let rule = RuleDefinition::custom(
        "Emitter",
        2,
        vec![Neighbourhood::from_offsets(&[(0, -1)])],
        emitter,
    )
    .unwrap();
    let result = identify_any(&rule, &[(0, 0)]);
    assert_eq!(result, IdentificationResult::Gun { period: 1 });
    assert_eq!(result.to_string(), "Period 1 Gun");

    let gun_only = identify(
        &rule,
        &grid(&[(0, 0)]),
        PatternKind::Gun,
        0,
        BoundaryPolicy::Infinite,
    );
    assert_eq!(gun_only, IdentificationResult::Gun { period: 1 });
}

#[test]
fn rule_ninety_cell_replicates() {
    let xor = FnTransition(|_phase: usize, n: &[State], _current: State| -> State { n[0] ^ n[1] });
    let rule = RuleDefinition::custom(
        "Rule 90",
        2,
        vec![Neighbourhood::from_offsets(&[(0, -1), (0, 1)])],
        xor,
    )
    .unwrap();
    let result = identify_any(&rule, &[(0, 0)]);
    assert_eq!(
        result,
        IdentificationResult::Replicator {
            dx: 1,
            dy: 0,
            period: 1,
            orientation: Orientation::Orthogonal,
        }
    );
    assert_eq!(result.to_string(), "Orthogonal 1c/1 Replicator");
}

#[test]
fn restricted_kind_skips_other_matches() {
    let rule = RuleDefinition::life();
    // A glider never grows, so the gun test cannot succeed.
    let result = identify(
        &rule,
        &grid(&[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]),
        PatternKind::Gun,
        0,
        BoundaryPolicy::Infinite,
    );
    assert_eq!(result, IdentificationResult::Failed);
}

#[test]
fn spaceship_on_a_torus_is_seen_before_it_wraps() {
    let rule = RuleDefinition::life();
    let result = identify(
        &rule,
        &grid(&[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]),
        PatternKind::Any,
        0,
        BoundaryPolicy::Toroidal {
            width: 10,
            height: 10,
        },
    );
    assert!(matches!(
        result,
        IdentificationResult::Spaceship { period: 4, .. }
    ));
}
