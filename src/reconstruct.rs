use std::time;

use anyhow::ensure;
use log::{
    info,
    debug,
};
use ndarray::{
    Array2,
    Array3,
    Axis,
    Zip,
};

use crate::{
    types::{
        Result,
        Cube,
        c64,
    },
    mesh::Mesh,
    traits::ProductBasis,
};


/// Mesh indices along one axis whose coordinates lie within `[center - rc, center + rc]`.
fn support_window(coords: &[f64], center: f64, rc: f64) -> std::ops::Range<usize> {
    let lo = coords.partition_point(|&c| c < center - rc);
    let hi = coords.partition_point(|&c| c <= center + rc);
    lo .. hi.max(lo)
}


/// Evaluate `Σ_μ φ_μ(r) * mu2dn[μ]` at every mesh point, real and imaginary parts apart.
///
/// The mesh is split in x-slabs owned by one worker each; contributions of all atoms whose
/// cutoff sphere reaches a point are summed in double precision and stored in single
/// precision.
pub fn get_spatial_density_parallel<B: ProductBasis + ?Sized>(mu2dn: &[c64], mesh: &Mesh, basis: &B)
    -> Result<(Cube<f32>, Cube<f32>)> {
    ensure!(mu2dn.len() == basis.nprod(),
        "[DENSITY]: Weight vector has {} entries, but the product basis has {} functions.",
        mu2dn.len(), basis.nprod());

    let now = time::Instant::now();
    let [nx, ny, nz] = mesh.shape();
    let (xs, ys, zs) = (mesh.axis(0), mesh.axis(1), mesh.axis(2));
    let nbuf = basis.max_prod_per_atom();

    let mut dn_re = Array3::<f32>::zeros((nx, ny, nz));
    let mut dn_im = Array3::<f32>::zeros((nx, ny, nz));

    Zip::indexed(dn_re.axis_iter_mut(Axis(0)))
        .and(dn_im.axis_iter_mut(Axis(0)))
        .par_for_each(|ix, mut slab_re, mut slab_im| {
            let x = xs[ix];
            let mut acc_re = Array2::<f64>::zeros((ny, nz));
            let mut acc_im = Array2::<f64>::zeros((ny, nz));
            let mut values = vec![0.0; nbuf];

            for ia in 0 .. basis.natoms() {
                let [cx, cy, cz] = basis.atom_center(ia);
                let rc = basis.atom_cutoff(ia);
                let dx = x - cx;
                if dx.abs() > rc {
                    continue;
                }

                let prods = basis.atom_prod_range(ia);
                let weights = &mu2dn[prods.clone()];
                let values = &mut values[.. prods.len()];
                let rc2 = rc * rc;

                for iy in support_window(ys, cy, rc) {
                    let dy = ys[iy] - cy;
                    for iz in support_window(zs, cz, rc) {
                        let dz = zs[iz] - cz;
                        if dx * dx + dy * dy + dz * dz > rc2 {
                            continue;
                        }

                        basis.eval_atom(ia, [dx, dy, dz], values);
                        let (re, im) = values.iter()
                            .zip(weights.iter())
                            .fold((0.0, 0.0), |(re, im), (v, w)| (re + v * w.re, im + v * w.im));
                        acc_re[[iy, iz]] += re;
                        acc_im[[iy, iz]] += im;
                    }
                }
            }

            slab_re.zip_mut_with(&acc_re, |d, &s| *d = s as f32);
            slab_im.zip_mut_with(&acc_im, |d, &s| *d = s as f32);
        });

    debug!("Density summary: sum|re| = {:.6}, sum|im| = {:.6}",
           dn_re.iter().map(|v| v.abs() as f64).sum::<f64>(),
           dn_im.iter().map(|v| v.abs() as f64).sum::<f64>());
    info!("Density reconstructed on {} with {} product functions in {:?}", mesh, mu2dn.len(), now.elapsed());

    Ok((dn_re, dn_im))
}
