//! End-to-end scenarios: obfuscate, execute on the simulator, compare.

use std::io::Write;

use obfusq_adapter_sim::SimulatorBackend;
use obfusq_core::{
    EquivalenceLibrary, Obfuscator, ObfuscatorConfig, ObfuscationError, Strategy,
    injection_passes,
};
use obfusq_eval::{DEFAULT_SHOTS, Validator};
use obfusq_hal::Backend;
use obfusq_ir::{Circuit, ClbitId, Instruction, QubitId};

const ACCURACY_THRESHOLD: f64 = 95.0;
const OBFUSCATION_SEEDS: [u64; 8] = [1, 2, 3, 5, 8, 13, 21, 34];

#[tokio::test]
async fn bell_padding_scenario() {
    let circuit = Circuit::bell().unwrap();
    let mut obfuscator = Obfuscator::new(Strategy::Padding).with_seed(17);
    let result = obfuscator.obfuscate(&circuit).unwrap();

    let ops = result.circuit.instructions();
    let n = ops.len();
    assert_eq!(ops[n - 2], Instruction::measure(QubitId(0), ClbitId(0)));
    assert_eq!(ops[n - 1], Instruction::measure(QubitId(1), ClbitId(1)));
    assert!(ops.iter().filter(|i| !i.is_measure()).count() > 2);

    let backend = SimulatorBackend::with_seed(3);
    let counts = backend
        .execute(&result.circuit, DEFAULT_SHOTS)
        .await
        .unwrap()
        .counts;
    assert_eq!(counts.total_shots(), u64::from(DEFAULT_SHOTS));
    assert!(counts.iter().all(|(bits, _)| bits == "00" || bits == "11"));
    assert!(counts.get("00") > 0 && counts.get("11") > 0);
}

#[tokio::test]
async fn obfuscated_programs_keep_their_distribution() {
    let programs = [
        Circuit::bell().unwrap(),
        Circuit::ghz(3).unwrap(),
        Circuit::ghz(4).unwrap(),
    ];

    for program in &programs {
        for strategy in Strategy::ALL {
            let mut passed = 0;
            let mut total_accuracy = 0.0;

            for seed in OBFUSCATION_SEEDS {
                let obfuscated = Obfuscator::new(strategy)
                    .with_seed(seed)
                    .obfuscate(program)
                    .unwrap()
                    .circuit;
                let validator = Validator::new(SimulatorBackend::with_seed(seed + 100))
                    .with_shots(DEFAULT_SHOTS)
                    .with_trials(3);
                let report = validator.compare(program, &obfuscated).await.unwrap();

                total_accuracy += report.accuracy;
                if report.passes(ACCURACY_THRESHOLD) {
                    passed += 1;
                }
            }

            let mean = total_accuracy / OBFUSCATION_SEEDS.len() as f64;
            assert_eq!(
                passed,
                OBFUSCATION_SEEDS.len(),
                "{strategy} on {} passed {passed}/{} seeds (mean {mean:.1}%)",
                program.name(),
                OBFUSCATION_SEEDS.len()
            );
        }
    }
}

#[test]
fn observed_passes_match_the_formula() {
    // A single one-qubit pair makes every pass exactly two instructions.
    let library = EquivalenceLibrary::from_yaml("injections: [x]").unwrap();

    for n in 0..=12_usize {
        let mut circuit = Circuit::with_size("chain", 1, 1);
        for _ in 0..n {
            circuit.h(QubitId(0)).unwrap();
        }
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();

        let out = Obfuscator::new(Strategy::Segmented)
            .with_seed(n as u64)
            .with_library(library.clone().into())
            .unwrap()
            .obfuscate(&circuit)
            .unwrap();

        let body = out.circuit.num_ops() - 1;
        assert_eq!((body - n) / 2, injection_passes(n), "n = {n}");
    }
}

#[test]
fn segmented_uses_the_full_register() {
    let library = EquivalenceLibrary::from_yaml("injections: [ccx]").unwrap();
    let mut circuit = Circuit::with_size("wide", 3, 0);
    circuit.x(QubitId(0)).unwrap();

    let out = Obfuscator::new(Strategy::Segmented)
        .with_seed(0)
        .with_library(library.into())
        .unwrap()
        .obfuscate(&circuit)
        .unwrap();

    // One pass, one ccx pair per qubit.
    assert_eq!(out.circuit.num_ops(), 1 + 3 * 2);
    let ccx = &out.circuit.instructions()[1];
    assert_eq!(ccx.name(), "ccx");
    let mut qubits = ccx.qubits.clone();
    qubits.sort();
    qubits.dedup();
    assert_eq!(qubits.len(), 3);
}

#[test]
fn config_file_with_custom_library() {
    let dir = tempfile::tempdir().unwrap();

    let mut library = std::fs::File::create(dir.path().join("library.yaml")).unwrap();
    writeln!(
        library,
        "rules:\n  - target: h\n    alternatives:\n      - [s, sx, s]"
    )
    .unwrap();

    let config_path = dir.path().join("obfusq.yaml");
    std::fs::write(
        &config_path,
        "strategy: cloaked\nseed: 4\nlibrary: library.yaml\n",
    )
    .unwrap();

    let config = ObfuscatorConfig::from_file(&config_path).unwrap();
    assert_eq!(config.library, Some(dir.path().join("library.yaml")));

    let mut obfuscator = Obfuscator::from_config(&config).unwrap();
    assert_eq!(obfuscator.library().rules().len(), 1);

    let mut circuit = Circuit::with_size("h", 1, 0);
    circuit.h(QubitId(0)).unwrap();
    let out = obfuscator.obfuscate(&circuit).unwrap();
    let names: Vec<_> = out.circuit.instructions().iter().map(|i| i.name()).collect();
    assert_eq!(names, ["s", "sx", "s"]);
}

#[test]
fn malformed_library_fails_before_rewriting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "rules:\n  - target: x\n    alternatives:\n      - [cx]\n").unwrap();

    let config = ObfuscatorConfig {
        library: Some(path),
        ..ObfuscatorConfig::default()
    };
    assert!(matches!(
        Obfuscator::from_config(&config),
        Err(ObfuscationError::ArityMismatch { .. })
    ));
}
