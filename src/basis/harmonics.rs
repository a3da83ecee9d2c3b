use std::f64::consts::{
    PI,
    SQRT_2,
};


/// Number of real spherical harmonics with `l <= lmax`.
pub fn nharmonics(lmax: usize) -> usize {
    (lmax + 1) * (lmax + 1)
}


/// Position of `Y_lm` in the output of [`rsphar`].
pub fn lm_index(l: usize, m: i32) -> usize {
    ((l * (l + 1)) as isize + m as isize) as usize
}


/// Real spherical harmonics `Y_lm` of the direction of `r` for every `l <= lmax`, stored at
/// `l*(l+1) + m`.
///
/// No Condon-Shortley phase: `Y_1,-1 ∝ y`, `Y_1,0 ∝ z`, `Y_1,1 ∝ x`. At `r = 0` only
/// `Y_00` is non-zero.
///
/// `out` must hold at least `nharmonics(lmax)` values.
pub fn rsphar(r: [f64; 3], lmax: usize, out: &mut [f64]) {
    debug_assert!(out.len() >= nharmonics(lmax), "Output buffer too small for lmax = {}", lmax);

    let rho2 = r[0] * r[0] + r[1] * r[1];
    let rr   = (rho2 + r[2] * r[2]).sqrt();
    if rr <= f64::EPSILON {
        out[.. nharmonics(lmax)].iter_mut().for_each(|v| *v = 0.0);
        out[0] = 1.0 / (4.0 * PI).sqrt();
        return;
    }
    let (cost, sint, phi) = (r[2] / rr, rho2.sqrt() / rr, r[1].atan2(r[0]));

    let mut pmm = 1.0;
    for m in 0 ..= lmax {
        if m > 0 {
            pmm *= (2 * m - 1) as f64 * sint;
        }

        let (cosm, sinm) = ((m as f64 * phi).cos(), (m as f64 * phi).sin());
        let mut plm2 = 0.0;
        let mut plm1 = pmm;

        for l in m ..= lmax {
            let plm = match l - m {
                0 => pmm,
                1 => cost * (2 * m + 1) as f64 * pmm,
                _ => ((2 * l - 1) as f64 * cost * plm1 - (l + m - 1) as f64 * plm2) / (l - m) as f64,
            };
            if l > m {
                plm2 = plm1;
                plm1 = plm;
            }

            let norm = ((2 * l + 1) as f64 / (4.0 * PI) * factorial_ratio(l, m)).sqrt();
            if m == 0 {
                out[lm_index(l, 0)] = norm * plm;
            } else {
                out[lm_index(l,  m as i32)] = SQRT_2 * norm * plm * cosm;
                out[lm_index(l, -(m as i32))] = SQRT_2 * norm * plm * sinm;
            }
        }
    }
}


/// `(l-m)! / (l+m)!`
fn factorial_ratio(l: usize, m: usize) -> f64 {
    ((l - m + 1) ..= (l + m)).fold(1.0, |acc, t| acc / t as f64)
}
