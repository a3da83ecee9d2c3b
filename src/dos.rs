//! Partial density of states of Kohn-Sham states projected on a subset of atomic orbitals.
use std::f64::consts::PI;

use anyhow::ensure;
use rayon::prelude::*;
use ndarray::{
    Array1,
    Array2,
    Array3,
    Array4,
    ArrayView1,
    Axis,
    Zip,
};

use crate::types::{
    Result,
    Vector,
    Matrix,
    c64,
};


/// Eigenvectors and eigenvalues of a (possibly k-point sampled, spin polarized) calculation
/// in a non-orthogonal atomic orbital basis.
#[derive(Debug, Clone)]
pub struct KohnShamStates {
    /// `[kpoint, spin, state, orbital]`
    mo_coeff: Array4<f64>,
    /// `[kpoint, spin, state]`
    ksn2e:    Array3<f64>,
    /// `[orbital, orbital]`
    overlap:  Matrix<f64>,
}


impl KohnShamStates {
    pub fn new(mo_coeff: Array4<f64>, ksn2e: Array3<f64>, overlap: Matrix<f64>) -> Result<Self> {
        let cs = mo_coeff.shape();
        ensure!(ksn2e.shape() == &cs[.. 3],
            "[DOS]: Eigenvalues shaped {:?} do not match coefficients shaped {:?}.", ksn2e.shape(), cs);
        ensure!(overlap.shape() == [cs[3], cs[3]],
            "[DOS]: Overlap matrix should be shaped {:?}, got {:?}.", [cs[3], cs[3]], overlap.shape());
        Ok(Self { mo_coeff, ksn2e, overlap })
    }

    pub fn norbs(&self) -> usize {
        self.overlap.nrows()
    }

    pub fn ksn2e(&self) -> &Array3<f64> {
        &self.ksn2e
    }
}


/// Mulliken-like weight of every state on the masked orbitals, `(mask ∘ c)ᵀ S c`.
pub fn omask2wgts(states: &KohnShamStates, omask: &[f64]) -> Result<Array3<f64>> {
    ensure!(omask.len() == states.norbs(),
        "[DOS]: Orbital mask has {} entries, but there are {} orbitals.", omask.len(), states.norbs());

    let mask = ArrayView1::from(omask);
    let mut ksn2w = Array3::<f64>::zeros(states.ksn2e.raw_dim());
    Zip::from(&mut ksn2w)
        .and(states.mo_coeff.lanes(Axis(3)))
        .par_for_each(|w, c| {
            let sc = states.overlap.dot(&c);
            *w = Zip::from(&mask).and(&c).and(&sc)
                .fold(0.0, |acc, m, ci, sci| acc + m * ci * sci);
        });
    Ok(ksn2w)
}


/// `dos(ω) = -Im Σ_ksn w_ksn / (ω - e_ksn) / (π nkpoints)` at each complex frequency.
pub fn omask_dos(ksn2w: &Array3<f64>, ksn2e: &Array3<f64>, zomegas: &[c64], nkpoints: usize) -> Result<Vector<f64>> {
    ensure!(ksn2w.shape() == ksn2e.shape(),
        "[DOS]: Weights shaped {:?} do not match eigenvalues shaped {:?}.", ksn2w.shape(), ksn2e.shape());
    ensure!(nkpoints > 0, "[DOS]: Number of k-points must be positive.");

    let norm = PI * nkpoints as f64;
    let mut dos = Array1::<f64>::zeros(zomegas.len());
    Zip::from(&mut dos)
        .and(&ArrayView1::from(zomegas))
        .par_for_each(|d, &zw| {
            let s = Zip::from(ksn2w).and(ksn2e)
                .fold(c64::new(0.0, 0.0), |acc, &w, &e| acc + w / (zw - e));
            *d = -s.im / norm;
        });
    Ok(dos)
}


/// DOS projected on the orbitals of the listed atoms, all atoms if `lsoa` is `None`.
///
/// `atom2s` holds `natoms + 1` orbital offsets, the orbitals of atom `a` being
/// `atom2s[a] .. atom2s[a + 1]`.
pub fn lsoa_dos(states: &KohnShamStates, atom2s: &[usize], lsoa: Option<&[usize]>,
                zomegas: &[c64], nkpoints: usize) -> Result<Vector<f64>> {
    ensure!(!atom2s.is_empty() && atom2s.windows(2).all(|w| w[0] <= w[1]),
        "[DOS]: Orbital offsets must be non-empty and non-decreasing.");
    ensure!(atom2s[atom2s.len() - 1] <= states.norbs(),
        "[DOS]: Orbital offsets exceed the number of orbitals {}.", states.norbs());

    let natoms = atom2s.len() - 1;
    let all = (0 .. natoms).collect::<Vec<_>>();
    let lsoa = lsoa.unwrap_or(&all);

    let mut mask = vec![0.0; states.norbs()];
    for &ia in lsoa {
        ensure!(ia < natoms, "[DOS]: Atom index {} out of range, there are {} atoms.", ia, natoms);
        mask[atom2s[ia] .. atom2s[ia + 1]].iter_mut().for_each(|m| *m = 1.0);
    }

    let ksn2w = omask2wgts(states, &mask)?;
    omask_dos(&ksn2w, &states.ksn2e, zomegas, nkpoints)
}


/// DOS resolved by the angular momentum of the orbitals, shaped `[jmax + 1, nomega]`.
pub fn pdos(states: &KohnShamStates, orb2j: &[usize], zomegas: &[c64], nkpoints: usize) -> Result<Matrix<f64>> {
    ensure!(orb2j.len() == states.norbs(),
        "[DOS]: Angular momentum list has {} entries, but there are {} orbitals.", orb2j.len(), states.norbs());

    let jmx = orb2j.iter().copied().max().unwrap_or(0);
    let rows = (0 ..= jmx).into_par_iter()
        .map(|j| {
            let mask = orb2j.iter()
                .map(|&oj| if oj == j { 1.0 } else { 0.0 })
                .collect::<Vec<_>>();
            let ksn2w = omask2wgts(states, &mask)?;
            omask_dos(&ksn2w, &states.ksn2e, zomegas, nkpoints)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut ret = Array2::<f64>::zeros((jmx + 1, zomegas.len()));
    for (mut dst, src) in ret.outer_iter_mut().zip(rows.iter()) {
        dst.assign(src);
    }
    Ok(ret)
}
