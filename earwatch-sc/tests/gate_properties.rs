use earwatch_core::SAMPLES_PER_BLOCK;
use earwatch_sc::EnergyGate;
use proptest::prelude::*;

#[test]
fn test_full_scale_block_is_transmitted() {
    let gate = EnergyGate::default();
    let positive = vec![i16::MAX; SAMPLES_PER_BLOCK];
    let alternating: Vec<i16> = (0..SAMPLES_PER_BLOCK)
        .map(|i| if i % 2 == 0 { 32767 } else { -32767 })
        .collect();

    assert!(EnergyGate::measure(&positive) > gate.threshold());
    assert!(gate.decide(&positive));
    assert!(gate.decide(&alternating));
}

proptest! {
    #[test]
    fn test_zero_blocks_never_pass(len in 0usize..10_000, threshold in 0.001f64..32767.0) {
        let gate = EnergyGate::new(threshold);
        prop_assert!(!gate.decide(&vec![0i16; len]));
    }

    #[test]
    fn test_energy_bounded_by_peak(samples in prop::collection::vec(any::<i16>(), 1..4096)) {
        let energy = EnergyGate::measure(&samples);
        let peak = samples.iter().map(|&s| (s as f64).abs()).fold(0.0, f64::max);
        prop_assert!(energy >= 0.0);
        prop_assert!(energy <= peak + 1e-9);
    }

    #[test]
    fn test_decision_matches_measure(samples in prop::collection::vec(any::<i16>(), 0..2048), threshold in 0.0f64..20000.0) {
        let decision = EnergyGate::new(threshold).evaluate(&samples);
        prop_assert_eq!(decision.energy, EnergyGate::measure(&samples));
        prop_assert_eq!(decision.transmit, decision.energy >= threshold);
    }
}
