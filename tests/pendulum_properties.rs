//! End-to-end properties of a pendulum run.

use glam::DVec2;
use pendulum2d::engine::jidoka::JidokaGuard;
use pendulum2d::prelude::*;
use pendulum2d::scenarios::pendulum::exact_period;
use proptest::prelude::*;

#[test]
fn canonical_run_has_600_aligned_samples() {
    let data = simulate(&PendulumConfig::default()).unwrap();
    assert_eq!(data.len(), 600);
    assert!((data.grid.dt() - 1.0 / 60.0).abs() < 1e-15);
    for method in Method::ALL {
        let traj = data.trajectory(method).unwrap();
        assert!(traj.is_aligned(600), "{method} misaligned");
        assert!((traj.phi[0] - 0.8).abs() < f64::EPSILON);
        assert!(traj.phi_dot[0].abs() < f64::EPSILON);
    }
}

#[test]
fn grid_is_strictly_increasing() {
    let data = simulate(&PendulumConfig::default()).unwrap();
    let times = data.grid.times();
    assert!(times[0].abs() < f64::EPSILON);
    assert!(times.windows(2).all(|w| w[1] > w[0]));
    assert!(*times.last().unwrap() < 10.0);
}

#[test]
fn rest_state_stays_at_rest() {
    let attachment = DVec2::new(0.5, 2.0);
    let config = PendulumConfig::builder()
        .phi_0(0.0)
        .phi_dot_0(0.0)
        .length(1.5)
        .attachment(attachment)
        .build();
    let data = simulate(&config).unwrap();
    let rest = attachment + DVec2::new(0.0, -1.5);
    for traj in data.trajectories.values() {
        assert!(traj.phi.iter().all(|&v| v == 0.0));
        assert!(traj.phi_dot.iter().all(|&v| v == 0.0));
        assert!(traj.phi_double_dot.iter().all(|&v| v == 0.0));
        assert!(traj.r.iter().all(|&r| (r - rest).length() < 1e-15));
        assert!(traj.r_dot.iter().all(|v| v.length() < 1e-15));
    }
}

#[test]
fn bob_stays_on_the_circle() {
    let attachment = DVec2::new(-1.0, 0.5);
    let config = PendulumConfig::builder()
        .length(2.0)
        .attachment(attachment)
        .phi_0(2.0)
        .build();
    let data = simulate(&config).unwrap();
    for traj in data.trajectories.values() {
        for r in &traj.r {
            assert!(((*r - attachment).length() - 2.0).abs() < 1e-12);
        }
    }
}

#[test]
fn exact_energy_is_conserved() {
    let config = PendulumConfig::default();
    let traj = simulate_method(&config, Method::Exact).unwrap();
    let drift = JidokaGuard::max_energy_drift(&config, &traj);
    assert!(drift < 1e-6, "drift = {drift:e}");
}

#[test]
fn small_angle_methods_agree() {
    let config = PendulumConfig::small_angle();
    let data = simulate(&config).unwrap();
    let approx = data.trajectory(Method::Approx).unwrap();
    let exact = data.trajectory(Method::Exact).unwrap();
    let worst = approx
        .phi
        .iter()
        .zip(&exact.phi)
        .map(|(a, e)| (a - e).abs())
        .fold(0.0, f64::max);
    assert!(worst < 1e-3, "max divergence {worst:e}");
}

#[test]
fn large_angle_methods_diverge() {
    let data = simulate(&PendulumConfig::large_angle()).unwrap();
    let approx = data.trajectory(Method::Approx).unwrap();
    let exact = data.trajectory(Method::Exact).unwrap();
    let worst = approx
        .phi
        .iter()
        .zip(&exact.phi)
        .map(|(a, e)| (a - e).abs())
        .fold(0.0, f64::max);
    assert!(worst > 0.5, "expected visible divergence, got {worst}");
}

#[test]
fn exact_period_matches_elliptic_integral() {
    // Release at 90°, sample finely and find the first return to phi_0
    let config = PendulumConfig::builder()
        .phi_0(std::f64::consts::FRAC_PI_2)
        .fps(1000)
        .t_max(3.0)
        .build();
    let traj = simulate_method(&config, Method::Exact).unwrap();
    let expected = exact_period(config.omega(), config.phi_0).unwrap();

    // phi_dot changes sign from + to - at the far turning point of each
    // period; the first such crossing is one period in.
    let crossing = traj
        .phi_dot
        .windows(2)
        .position(|w| w[0] > 0.0 && w[1] <= 0.0)
        .unwrap();
    let t = crossing as f64 * config.dt();
    assert!((t - expected).abs() < 2e-3, "t = {t}, expected {expected}");
}

#[test]
fn invalid_parameters_fail_before_computation() {
    let cases = [
        PendulumConfig::builder().length(0.0).build(),
        PendulumConfig::builder().length(-2.0).build(),
        PendulumConfig::builder().g(0.0).build(),
        PendulumConfig::builder().fps(0).build(),
        PendulumConfig::builder().t_max(-1.0).build(),
        PendulumConfig::builder().phi_0(f64::NAN).build(),
    ];
    for config in cases {
        match simulate(&config) {
            Err(SimError::Config { .. }) => {}
            other => panic!("{config:?} gave {other:?}"),
        }
    }
}

#[test]
fn plot_bounds_cover_the_run() {
    let data = simulate(&PendulumConfig::default()).unwrap();
    let bounds = data.plot_bounds();
    assert!(bounds.x.contains(0.0) && bounds.y.contains(0.0));
    for traj in data.trajectories.values() {
        assert!(traj.r.iter().all(|r| bounds.x.contains(r.x) && bounds.y.contains(r.y)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_runs_are_aligned_and_guarded(
        length in 0.2f64..5.0,
        phi_0 in -1.5f64..1.5,
        phi_dot_0 in -2.0f64..2.0,
    ) {
        let config = PendulumConfig::builder()
            .length(length)
            .phi_0(phi_0)
            .phi_dot_0(phi_dot_0)
            .t_max(1.0)
            .build();
        let data = simulate(&config).unwrap();
        prop_assert_eq!(data.len(), 60);
        for traj in data.trajectories.values() {
            prop_assert!(traj.is_aligned(60));
            for r in &traj.r {
                prop_assert!((r.length() - length).abs() < 1e-12 * length.max(1.0));
            }
        }
        let exact = data.trajectory(Method::Exact).unwrap();
        prop_assert!(JidokaGuard::max_energy_drift(&config, exact) < 1e-6);
    }

    #[test]
    fn prop_sample_count(fps in 1u32..240, t_max in 0.05f64..20.0) {
        let config = PendulumConfig::builder().fps(fps).t_max(t_max).build();
        let n = config.sample_count();
        let dt = config.dt();
        prop_assert!(n >= 1);
        // Last sample lies before t_max, the next one would not
        prop_assert!(((n - 1) as f64) * dt < t_max);
        prop_assert!((n as f64) * dt >= t_max * (1.0 - 1e-9));
    }
}
