use i2em::types::FLOOR_DB;
use i2em::core::MAX_SERIES_TERMS;
use i2em::{crosspol, solve_crosspol, CorrelationType, Diagnostic, I2emError, IntegratorSettings, Permittivity, SolverConfig, SurfaceParameters};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn surface(rms: f64) -> SurfaceParameters {
    SurfaceParameters::new(rms, 0.1, CorrelationType::Exponential, 1.0)
}

#[test]
fn test_crosspol_flat_entry_point() {
    init_logging();

    let vh = crosspol(3.0, 0.01, 0.1, 30.0, 11.3, 1.5, 1, 1.0, true).expect("cross-pol");
    println!("Exponential 3 GHz 30°: VH {:.2} dB", vh);
    assert!(vh.is_finite());
    assert!(vh > -60.0 && vh < 0.0);

    let gaussian = crosspol(3.0, 0.01, 0.1, 30.0, 11.3, 1.5, 2, 1.0, false).expect("cross-pol");
    assert!(gaussian.is_finite());
}

#[test]
fn test_crosspol_grows_with_roughness() {
    init_logging();

    let config = SolverConfig::default();
    let er = Permittivity::new(11.3, 1.5);
    let mut previous = f64::NEG_INFINITY;
    for rms in [0.0025, 0.01, 0.02] {
        let result = solve_crosspol(&surface(rms), 3.0, 30.0, er, true, &config).unwrap();
        assert!(result.sigma0_vh_db > previous, "σ = {}: {} dB", rms, result.sigma0_vh_db);
        previous = result.sigma0_vh_db;
    }
}

#[test]
fn test_vanishing_roughness_reaches_floor() {
    init_logging();

    let result = solve_crosspol(
        &surface(1e-13),
        3.0,
        30.0,
        Permittivity::new(11.3, 1.5),
        true,
        &SolverConfig::default(),
    )
    .unwrap();
    assert_eq!(result.sigma0_vh_db, FLOOR_DB);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_power_scale_is_exact_in_db() {
    init_logging();

    let er = Permittivity::new(11.3, 1.5);
    let base = SolverConfig::default();
    let one = solve_crosspol(&surface(0.01), 3.0, 30.0, er, true, &base).unwrap();
    let two = solve_crosspol(&surface(0.01), 3.0, 30.0, er, true, &base.with_vh_power_scale(2.0)).unwrap();
    let shift = two.sigma0_vh_db - one.sigma0_vh_db;
    assert!((shift - 10.0 * 2f64.log10()).abs() < 1e-9, "shift {}", shift);
}

#[test]
fn test_small_budget_returns_finite_estimate() {
    init_logging();

    let config = SolverConfig::default().with_integrator(IntegratorSettings {
        max_evaluations: 60,
        relative_tolerance: 1e-10,
        absolute_tolerance: 0.0,
    });
    let result = solve_crosspol(&surface(0.01), 3.0, 30.0, Permittivity::new(11.3, 1.5), true, &config).unwrap();
    assert!(result.sigma0_vh_db.is_finite());
    assert!(result.integration.evaluations <= 60);
    assert!(matches!(
        result.diagnostics.first(),
        Some(Diagnostic::IntegrationIncomplete { .. })
    ));
}

#[test]
fn test_crosspol_rejects_flat_surface() {
    init_logging();

    assert!(matches!(
        crosspol(3.0, 0.0, 0.1, 30.0, 11.3, 1.5, 1, 1.0, true),
        Err(I2emError::Domain(_))
    ));
}

fn budget(max_evaluations: usize) -> SolverConfig {
    SolverConfig::default().with_integrator(IntegratorSettings {
        max_evaluations,
        relative_tolerance: 1e-4,
        absolute_tolerance: 0.0,
    })
}

#[test]
fn test_power_law_crosspol() {
    init_logging();

    let surface = SurfaceParameters::new(0.01, 0.1, CorrelationType::PowerLaw, 1.5);
    let result = solve_crosspol(&surface, 3.0, 30.0, Permittivity::new(11.3, 1.5), true, &SolverConfig::default()).unwrap();
    println!("Power-law 3 GHz 30°: VH {:.2} dB in {} evaluations", result.sigma0_vh_db, result.integration.evaluations);
    assert!(result.sigma0_vh_db > -60.0 && result.sigma0_vh_db < 0.0);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn test_x_exponential_crosspol_follows_exponential_at_unit_shape() {
    init_logging();

    // Same budget, so both runs refine the same regions
    let config = budget(153);
    let er = Permittivity::new(11.3, 1.5);
    let expo = solve_crosspol(&surface(0.01), 3.0, 30.0, er, true, &config).unwrap();
    let xexp = SurfaceParameters::new(0.01, 0.1, CorrelationType::XExponential, 1.0);
    let xexp = solve_crosspol(&xexp, 3.0, 30.0, er, true, &config).unwrap();
    assert!(
        (xexp.sigma0_vh_db - expo.sigma0_vh_db).abs() < 0.01,
        "x-exponential {} dB vs exponential {} dB",
        xexp.sigma0_vh_db,
        expo.sigma0_vh_db
    );

    let slow = SurfaceParameters::new(0.01, 0.1, CorrelationType::XExponential, 0.5);
    let slow = solve_crosspol(&slow, 3.0, 30.0, er, true, &config).unwrap();
    assert!(slow.sigma0_vh_db.is_finite() && slow.sigma0_vh_db > -80.0);
}

#[test]
fn test_capped_series_is_reported() {
    init_logging();

    // ks ≈ 12.6 needs more spectral terms than the cap allows
    let rough = SurfaceParameters::new(0.06, 0.05, CorrelationType::Gaussian, 1.0);
    let result = solve_crosspol(&rough, 10.0, 30.0, Permittivity::new(11.3, 1.5), true, &budget(153)).unwrap();
    assert_eq!(result.terms, MAX_SERIES_TERMS);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::SeriesTruncated { .. })));
}
