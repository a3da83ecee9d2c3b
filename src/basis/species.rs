use std::{
    cell::RefCell,
    ops::Range,
};

use anyhow::ensure;

use crate::{
    types::Result,
    traits::ProductBasis,
    basis::{
        harmonics::{
            rsphar,
            nharmonics,
            lm_index,
        },
        radial::RadialFunction,
    },
};


/// One product function, `radial(r) * Y_lm(r̂)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFunction {
    pub l:      usize,
    pub m:      i32,
    pub radial: RadialFunction,
}


impl ProductFunction {
    pub fn new(l: usize, m: i32, radial: RadialFunction) -> Result<Self> {
        ensure!(m.unsigned_abs() as usize <= l, "[BASIS]: |m| must not exceed l, got l = {}, m = {}.", l, m);
        Ok(Self { l, m, radial })
    }

    /// Isotropic function, `l = m = 0`.
    pub fn s(radial: RadialFunction) -> Self {
        Self { l: 0, m: 0, radial }
    }
}


/// Product functions shared by every atom of one species.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesBasis {
    cutoff:    f64,
    lmax:      usize,
    functions: Vec<ProductFunction>,
}


impl SpeciesBasis {
    /// The cutoff radius defaults to the largest extent of the radial functions.
    pub fn new(functions: Vec<ProductFunction>) -> Result<Self> {
        let cutoff = functions.iter()
            .map(|f| f.radial.extent())
            .fold(0.0, f64::max);
        Self::with_cutoff(functions, cutoff)
    }

    pub fn with_cutoff(functions: Vec<ProductFunction>, cutoff: f64) -> Result<Self> {
        ensure!(!functions.is_empty(), "[BASIS]: A species needs at least one product function.");
        ensure!(cutoff.is_finite() && cutoff > 0.0, "[BASIS]: Invalid cutoff radius: {}.", cutoff);

        let lmax = functions.iter().map(|f| f.l).max().unwrap_or(0);
        Ok(Self { cutoff, lmax, functions })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn nfunctions(&self) -> usize {
        self.functions.len()
    }

    pub fn functions(&self) -> &[ProductFunction] {
        &self.functions
    }

    /// Values of all functions at displacement `r`, zero beyond the cutoff radius.
    pub fn eval(&self, r: [f64; 3], ylm: &mut [f64], out: &mut [f64]) {
        let rr = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
        if rr > self.cutoff {
            out.iter_mut().for_each(|v| *v = 0.0);
            return;
        }

        rsphar(r, self.lmax, ylm);
        for (o, f) in out.iter_mut().zip(self.functions.iter()) {
            *o = f.radial.eval(rr) * ylm[lm_index(f.l, f.m)];
        }
    }
}


/// Atom-centred product basis: species tables, the atom to species map and atom positions.
#[derive(Debug, Clone)]
pub struct AtomicProductBasis {
    species:    Vec<SpeciesBasis>,
    atom2sp:    Vec<usize>,
    atom2coord: Vec<[f64; 3]>,
    atom2start: Vec<usize>,   // natoms + 1 offsets into the product index
}


impl AtomicProductBasis {
    pub fn new(species: Vec<SpeciesBasis>, atom2sp: Vec<usize>, atom2coord: Vec<[f64; 3]>) -> Result<Self> {
        ensure!(atom2sp.len() == atom2coord.len(),
            "[BASIS]: Inconsistent number of atoms: {} species indices but {} coordinates.",
            atom2sp.len(), atom2coord.len());

        for (ia, &sp) in atom2sp.iter().enumerate() {
            ensure!(sp < species.len(),
                "[BASIS]: Atom {} refers to species {}, but only {} species are defined.", ia, sp, species.len());
        }

        let mut atom2start = Vec::with_capacity(atom2sp.len() + 1);
        atom2start.push(0);
        for &sp in atom2sp.iter() {
            let last = atom2start[atom2start.len() - 1];
            atom2start.push(last + species[sp].nfunctions());
        }

        Ok(Self { species, atom2sp, atom2coord, atom2start })
    }

    pub fn atom2sp(&self) -> &[usize] {
        &self.atom2sp
    }

    pub fn species(&self, isp: usize) -> &SpeciesBasis {
        &self.species[isp]
    }
}


thread_local! {
    static YLM_SCRATCH: RefCell<Vec<f64>> = RefCell::new(Vec::new());
}


impl ProductBasis for AtomicProductBasis {
    fn natoms(&self) -> usize {
        self.atom2sp.len()
    }

    fn nprod(&self) -> usize {
        self.atom2start[self.atom2start.len() - 1]
    }

    fn atom_center(&self, iatom: usize) -> [f64; 3] {
        self.atom2coord[iatom]
    }

    fn atom_cutoff(&self, iatom: usize) -> f64 {
        self.species[self.atom2sp[iatom]].cutoff
    }

    fn atom_prod_range(&self, iatom: usize) -> Range<usize> {
        self.atom2start[iatom] .. self.atom2start[iatom + 1]
    }

    fn eval_atom(&self, iatom: usize, r: [f64; 3], out: &mut [f64]) {
        let sp = &self.species[self.atom2sp[iatom]];
        let n = nharmonics(sp.lmax);
        YLM_SCRATCH.with(|ylm| {
            let mut ylm = ylm.borrow_mut();
            if ylm.len() < n {
                ylm.resize(n, 0.0);
            }
            sp.eval(r, &mut ylm[.. n], out);
        });
    }
}
