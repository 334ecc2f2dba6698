use i2em::{backscatter, bistatic_backscatter, solve_copol, I2emError, Permittivity, RadarGeometry, SolverConfig, SurfaceParameters, CorrelationType};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_backscatter_is_finite_for_all_families() {
    init_logging();

    for code in 1..=4 {
        for theta in [0.0, 15.0, 30.0, 45.0, 60.0, 75.0] {
            let (vv, hh) = backscatter(5.3, 0.01, 0.08, theta, 15.0, 2.0, code, 1.5)
                .expect("Valid inputs must not fail");
            assert!(vv.is_finite() && hh.is_finite(), "code {} at {}°: {} / {}", code, theta, vv, hh);
            assert!(vv > -300.0, "code {} at {}° hit the floor", code, theta);
        }
    }
}

#[test]
fn test_monostatic_symmetry() {
    init_logging();

    for (fr, rms, l, theta, er) in [
        (1.26, 0.005, 0.05, 20.0, (8.0, 1.0)),
        (3.0, 0.0025, 0.10, 30.0, (11.3, 1.5)),
        (5.3, 0.02, 0.15, 45.0, (20.0, 4.0)),
        (9.6, 0.004, 0.03, 60.0, (4.5, 0.2)),
    ] {
        for code in [1, 2] {
            let mono = backscatter(fr, rms, l, theta, er.0, er.1, code, 1.0).expect("monostatic");
            let bi = bistatic_backscatter(fr, rms, l, theta, theta, 180.0, er.0, er.1, code, 1.0)
                .expect("bistatic");
            assert_eq!(mono, bi);
        }
    }
}

#[test]
fn test_vv_exceeds_hh_off_nadir() {
    init_logging();

    let (vv, hh) = backscatter(3.0, 0.01, 0.1, 30.0, 11.3, 1.5, 2, 1.0).unwrap();
    println!("Gaussian 3 GHz 30°: VV {:.2} dB, HH {:.2} dB", vv, hh);
    assert!(vv > hh);

    let (vv, hh) = backscatter(3.0, 0.01, 0.1, 0.0, 11.3, 1.5, 2, 1.0).unwrap();
    assert!((vv - hh).abs() < 1e-6, "nadir VV {} HH {}", vv, hh);
}

#[test]
fn test_flat_surface_is_domain_error() {
    init_logging();

    assert!(matches!(
        backscatter(3.0, 0.0, 0.1, 30.0, 11.3, 1.5, 2, 1.0),
        Err(I2emError::Domain(_))
    ));
    assert!(matches!(
        backscatter(3.0, 0.01, 0.0, 30.0, 11.3, 1.5, 2, 1.0),
        Err(I2emError::Domain(_))
    ));
    assert!(matches!(
        backscatter(3.0, 0.01, 0.1, 30.0, 11.3, 1.5, 7, 1.0),
        Err(I2emError::Domain(_))
    ));
    assert!(matches!(
        backscatter(3.0, 0.01, 0.1, 30.0, 11.3, 1.5, 3, 0.0),
        Err(I2emError::Domain(_))
    ));
    assert!(matches!(
        backscatter(3.0, 0.01, 0.1, 30.0, 11.3, -1.5, 2, 1.0),
        Err(I2emError::Domain(_))
    ));
    assert!(backscatter(3.0, 0.01, 0.1, 95.0, 11.3, 1.5, 2, 1.0).is_err());
    // x-exponential correlation is only valid up to x = 2
    assert!(matches!(
        backscatter(3.0, 0.01, 0.1, 30.0, 11.3, 1.5, 4, 3.0),
        Err(I2emError::Domain(_))
    ));
}

#[test]
fn test_slowly_decaying_x_exponential() {
    init_logging();

    for shape in [0.3, 0.5, 0.8] {
        let (vv, hh) = backscatter(3.0, 0.01, 0.08, 30.0, 11.3, 1.5, 4, shape).unwrap();
        println!("x-exponential x = {}: VV {:.2} dB, HH {:.2} dB", shape, vv, hh);
        assert!(vv.is_finite() && hh.is_finite());
        assert!(vv > hh);
        assert!(vv > -40.0 && vv < 0.0, "x = {}: VV {} dB", shape, vv);
    }
}

#[test]
fn test_smaller_epsilon_converges() {
    init_logging();

    let er = Permittivity::new(11.3, 1.5);
    let geometry = RadarGeometry::monostatic(3.0, 30.0);
    for surface in [
        SurfaceParameters::new(0.02, 0.1, CorrelationType::Gaussian, 1.0),
        SurfaceParameters::new(0.02, 0.05, CorrelationType::Exponential, 1.0),
    ] {
        let mut previous: Option<(f64, usize, f64, f64)> = None;
        for eps in [1e-4, 1e-6, 1e-8, 1e-10, 1e-12] {
            let config = SolverConfig::default().with_auto_select_epsilon(eps);
            let result = solve_copol(&surface, &geometry, er, &config).unwrap();
            if let Some((coarse_eps, terms, vv, hh)) = previous {
                // Refining eps moves the result by less than the coarser eps
                assert!(result.terms >= terms, "eps {} used fewer terms", eps);
                let dvv = ((result.sigma0_vv - vv) / vv).abs();
                let dhh = ((result.sigma0_hh - hh) / hh).abs();
                assert!(dvv <= coarse_eps, "VV moved {:e} going from eps {:e} to {:e}", dvv, coarse_eps, eps);
                assert!(dhh <= coarse_eps, "HH moved {:e} going from eps {:e} to {:e}", dhh, coarse_eps, eps);
            }
            previous = Some((eps, result.terms, result.sigma0_vv, result.sigma0_hh));
        }
    }
}

#[test]
fn test_rougher_surface_scatters_more_at_oblique_incidence() {
    init_logging();

    let (smooth, _) = backscatter(3.0, 0.0025, 0.1, 40.0, 11.3, 1.5, 1, 1.0).unwrap();
    let (rough, _) = backscatter(3.0, 0.01, 0.1, 40.0, 11.3, 1.5, 1, 1.0).unwrap();
    assert!(rough > smooth);
}
