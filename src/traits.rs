use std::ops::Range;

pub use crate::types::Result;


/// Evaluation service of a localized product basis.
///
/// Product functions are grouped by the atom they are centred on, each atom owning a
/// contiguous range of product indices. A function vanishes beyond the cutoff radius of
/// its atom.
pub trait ProductBasis: Sync {
    fn natoms(&self) -> usize;

    /// Total number of product functions.
    fn nprod(&self) -> usize;

    fn atom_center(&self, iatom: usize) -> [f64; 3];

    fn atom_cutoff(&self, iatom: usize) -> f64;

    fn atom_prod_range(&self, iatom: usize) -> Range<usize>;

    /// Writes the values of all product functions of `iatom` at displacement `r` from the
    /// atom into `out`, whose length equals the length of `atom_prod_range(iatom)`.
    /// Functions with `l > 0` vanish at `r = 0`.
    fn eval_atom(&self, iatom: usize, r: [f64; 3], out: &mut [f64]);

    /// Largest number of product functions found on a single atom.
    fn max_prod_per_atom(&self) -> usize {
        (0 .. self.natoms())
            .map(|ia| self.atom_prod_range(ia).len())
            .max()
            .unwrap_or(0)
    }
}
