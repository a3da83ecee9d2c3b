use anyhow::ensure;
use ndarray::Zip;

use crate::types::{
    Result,
    Matrix,
    c64,
};


/// Multiply the occupied-virtual response matrix by the energy denominators, in place.
///
/// ```text
/// nm2v[n, m] *= (f_n - f_m') * (1/(ω - (e_m' - e_n)) - 1/(ω + (e_m' - e_n))),  m' = m + vstart
/// ```
///
/// Entries with `n > vstart` and `m < n - vstart` are pairs already counted on the other
/// side of the window and are set to exactly zero afterwards. A vanishing denominator is
/// not guarded, IEEE infinities and NaNs propagate to the unmasked entries.
///
/// * `ksn2e`, `ksn2f`: energies and occupations of all `norbs` states;
/// * `nm2v`: shaped `(nfermi, norbs - vstart)`, exclusively borrowed and overwritten.
pub fn div_eigenenergy(ksn2e: &[f64], ksn2f: &[f64], nfermi: usize, vstart: usize,
                       comega: c64, nm2v: &mut Matrix<c64>) -> Result<()> {
    let norbs = ksn2e.len();
    ensure!(ksn2f.len() == norbs,
        "[SPECTRAL]: Energies and occupations differ in length: {} vs {}.", norbs, ksn2f.len());
    ensure!(vstart <= norbs && nfermi <= norbs,
        "[SPECTRAL]: vstart = {} and nfermi = {} must not exceed norbs = {}.", vstart, nfermi, norbs);
    ensure!(nm2v.shape() == [nfermi, norbs - vstart],
        "[SPECTRAL]: Response matrix should be shaped {:?}, got {:?}.", [nfermi, norbs - vstart], nm2v.shape());

    Zip::indexed(nm2v).par_for_each(|(n, m), v| {
        if n > vstart && m < n - vstart {
            *v = c64::new(0.0, 0.0);
            return;
        }

        let (en, fn_) = (ksn2e[n], ksn2f[n]);
        let (em, fm)  = (ksn2e[m + vstart], ksn2f[m + vstart]);
        let de = em - en;
        *v = *v * (fn_ - fm) * (1.0 / (comega - de) - 1.0 / (comega + de));
    });

    Ok(())
}
