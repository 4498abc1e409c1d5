use contagion::{run_batch, Parameters, Simulation, SnapshotRecorder};

fn parameters() -> Parameters {
    Parameters {
        population_size: 200,
        initial_infected: 4,
        infection_probability: 0.2,
        incubation_days: 2,
        recovery_days: 4,
        death_probability: 0.05,
        household_size: 4,
        contact_degree: 4.0,
        max_days: 30,
        ..Parameters::default()
    }
}

fn snapshot_json(seed: u64) -> Vec<String> {
    let mut simulation = Simulation::new(parameters(), seed).unwrap();
    let mut recorder = SnapshotRecorder::new();
    simulation.run(&mut recorder).unwrap();
    recorder
        .snapshots
        .iter()
        .map(|snapshot| snapshot.to_json().unwrap())
        .collect()
}

#[test]
fn same_seed_same_snapshots() {
    assert_eq!(snapshot_json(12345), snapshot_json(12345));
}

#[test]
fn different_seeds_differ() {
    assert_ne!(snapshot_json(1), snapshot_json(2));
}

#[test]
fn batch_replicates_match_single_runs() {
    let seeds = [10, 11, 12];
    let batch = run_batch(&parameters(), seeds).unwrap();
    for (summary, seed) in batch.iter().zip(seeds) {
        let mut simulation = Simulation::new(parameters(), seed).unwrap();
        let single = simulation.run(&mut contagion::snapshot::NoopObserver).unwrap();
        assert_eq!(*summary, single);
        assert_eq!(summary.to_json().unwrap(), single.to_json().unwrap());
    }
}
