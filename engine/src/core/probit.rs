//! Inverse of the standard normal CDF, used by signal-detection scoring.

/// Lower bound callers clamp rates to before taking the probit.
pub const RATE_FLOOR: f64 = 0.01;
/// Upper bound callers clamp rates to before taking the probit.
pub const RATE_CEILING: f64 = 0.99;

/// Acklam's rational approximation of the inverse CDF of the standard normal
/// distribution. Relative error is about 1.15e-9 over the open interval (0, 1).
///
/// Callers clamp `p` into `[RATE_FLOOR, RATE_CEILING]` first; the exact
/// boundaries map to the infinities.
pub fn probit(p: f64) -> f64 {
    debug_assert!(
        p > 0.0 && p < 1.0,
        "probit is defined on the open interval (0, 1), got {p}"
    );

    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];

    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }

    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        return (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0);
    }

    if p > P_HIGH {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        return -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0);
    }

    let q = p - 0.5;
    let r = q * q;
    (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
        / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
}

/// Clamp a rate into the probit-safe band.
pub fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return RATE_FLOOR;
    }
    rate.clamp(RATE_FLOOR, RATE_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference Φ(z) by composite Simpson integration of the normal density.
    fn normal_cdf(z: f64) -> f64 {
        let steps = 20_000;
        let h = z.abs() / steps as f64;
        let density = |x: f64| (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt();
        let mut acc = density(0.0) + density(z.abs());
        for i in 1..steps {
            let x = i as f64 * h;
            acc += if i % 2 == 0 { 2.0 } else { 4.0 } * density(x);
        }
        let half_area = acc * h / 3.0;
        if z >= 0.0 {
            0.5 + half_area
        } else {
            0.5 - half_area
        }
    }

    #[test]
    fn probit_round_trips_through_reference_cdf() {
        for p in [0.01, 0.1, 0.5, 0.9, 0.99] {
            let z = probit(p);
            let back = normal_cdf(z);
            assert!(
                (back - p).abs() < 1e-6,
                "Φ(probit({p})) = {back}, expected within 1e-6"
            );
        }
    }

    #[test]
    fn probit_is_odd_around_one_half() {
        assert_eq!(probit(0.5), 0.0);
        for p in [0.01, 0.02, 0.2, 0.35] {
            assert!((probit(p) + probit(1.0 - p)).abs() < 1e-9);
        }
    }

    #[test]
    fn probit_matches_known_quantiles() {
        assert!((probit(0.975) - 1.959_963_984_540_054).abs() < 1e-8);
        assert!((probit(0.01) + 2.326_347_874_040_841).abs() < 1e-8);
    }

    #[test]
    fn clamp_rate_keeps_probit_finite() {
        assert_eq!(clamp_rate(0.0), RATE_FLOOR);
        assert_eq!(clamp_rate(1.0), RATE_CEILING);
        assert_eq!(clamp_rate(f64::NAN), RATE_FLOOR);
        assert!(probit(clamp_rate(1.0)).is_finite());
    }
}
