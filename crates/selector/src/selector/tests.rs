use super::*;

#[test]
fn test_default_thresholds() {
    let selector = TacticalModelSelector::default();
    assert_eq!(selector.choose(40.0), ModelChoice::Ensemble);
    assert_eq!(selector.choose(25.0), ModelChoice::Ensemble);
    assert_eq!(selector.choose(24.9), ModelChoice::Hets);
    assert_eq!(selector.choose(10.0), ModelChoice::Hets);
    assert_eq!(selector.choose(9.9), ModelChoice::Snaive);
    assert_eq!(selector.choose(2.5), ModelChoice::Snaive);
    assert_eq!(selector.choose(2.4), ModelChoice::Trivial);
    assert_eq!(selector.choose(0.3), ModelChoice::Trivial);
    assert_eq!(selector.choose(0.0), ModelChoice::Trivial);
}

#[test]
fn test_low_demand_separates_snaive_from_trivial() {
    let add = 3.0;
    let lenient = TacticalModelSelector::new(SelectionConfig {
        low_demand: 1.0,
        ..SelectionConfig::default()
    });
    let strict = TacticalModelSelector::new(SelectionConfig {
        low_demand: 5.0,
        ..SelectionConfig::default()
    });
    assert_eq!(lenient.choose(add), ModelChoice::Snaive);
    assert_eq!(strict.choose(add), ModelChoice::Trivial);
}

#[test]
fn test_custom_thresholds() {
    let selector = TacticalModelSelector::new(SelectionConfig {
        high_demand: 100.0,
        medium_demand: 50.0,
        low_demand: 5.0,
    });
    assert_eq!(selector.choose(60.0), ModelChoice::Hets);
    assert_eq!(selector.choose(100.0), ModelChoice::Ensemble);
    assert_eq!(selector.choose(30.0), ModelChoice::Snaive);
    assert_eq!(selector.choose(4.9), ModelChoice::Trivial);
    assert_eq!(selector.config().low_demand, 5.0);
}

#[test]
fn test_fallback_chains() {
    let selector = TacticalModelSelector::default();
    assert_eq!(
        selector.fallback_chain(ModelChoice::Ensemble),
        vec![ModelChoice::Hets, ModelChoice::Snaive]
    );
    assert_eq!(selector.fallback_chain(ModelChoice::Hets), vec![ModelChoice::Snaive]);
    assert_eq!(selector.fallback_chain(ModelChoice::Trend), vec![ModelChoice::Snaive]);
    assert!(selector.fallback_chain(ModelChoice::Snaive).is_empty());
    assert!(selector.fallback_chain(ModelChoice::Trivial).is_empty());
}

#[test]
fn test_fallback_chain_only_simplifies() {
    let selector = TacticalModelSelector::default();
    for choice in [
        ModelChoice::Trivial,
        ModelChoice::Snaive,
        ModelChoice::Trend,
        ModelChoice::Hets,
        ModelChoice::Ensemble,
    ] {
        let chain = selector.fallback_chain(choice);
        assert!(!chain.contains(&choice));
        assert!(chain.last().map_or(true, |last| *last == ModelChoice::Snaive));
    }
}
