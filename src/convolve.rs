use std::sync::Arc;

use anyhow::ensure;
use itertools::iproduct;
use log::debug;
use ndarray::{
    s,
    Array3,
    Axis,
    Zip,
};
use rustfft::{
    Fft,
    FftDirection,
    FftPlanner,
};

use crate::{
    types::{
        Result,
        Cube,
        c64,
    },
    mesh::FftSize,
};


fn dims<T>(a: &Cube<T>) -> [usize; 3] {
    let d = a.raw_dim();
    [d[0], d[1], d[2]]
}


fn check_valid_shapes(kshape: [usize; 3], dshape: [usize; 3], crop: [usize; 3]) -> Result<()> {
    for i in 0 .. 3 {
        ensure!(dshape[i] > 0, "[CONV]: Density grid is empty along axis {}.", i);
        ensure!(kshape[i] >= dshape[i],
            "[CONV]: Kernel grid {:?} must be at least as large as the density grid {:?}.", kshape, dshape);
        ensure!(crop[i] <= kshape[i] - dshape[i] + 1,
            "[CONV]: Crop window {:?} exceeds the valid convolution extent along axis {}.", crop, i);
    }
    Ok(())
}


/// In-place 3D transform, lanes of every axis processed in parallel. Not normalized.
fn fft3(data: &mut Cube<c64>, planner: &mut FftPlanner<f64>, direction: FftDirection) {
    for iaxis in 0 .. 3 {
        let n = data.len_of(Axis(iaxis));
        let fft: Arc<dyn Fft<f64>> = planner.plan_fft(n, direction);

        Zip::from(data.lanes_mut(Axis(iaxis))).par_for_each(|mut lane| {
            let mut buf = lane.to_vec();
            fft.process(&mut buf);
            lane.iter_mut()
                .zip(buf)
                .for_each(|(dst, src)| *dst = src);
        });
    }
}


/// Valid-mode linear convolution of a real kernel with a complex density through FFT,
/// cropped to the first `crop` elements of each axis.
///
/// `out[p] = Σ_q kernel[p + D - 1 - q] * density[q]`, `D` being the density shape. Both
/// operands are zero padded to `fft_size.fit(K + D - 1)` so that the circular product
/// contains the acyclic convolution.
pub fn fftconvolve_valid(kernel: &Cube<f64>, density: &Cube<c64>, crop: [usize; 3], fft_size: FftSize) -> Result<Cube<c64>> {
    let ks = dims(kernel);
    let ds = dims(density);
    check_valid_shapes(ks, ds, crop)?;

    let padded = [0usize, 1, 2].map(|i| fft_size.fit(ks[i] + ds[i] - 1));
    fftconvolve_valid_padded(kernel, density, crop, padded)
}


/// Same as [`fftconvolve_valid`] with an explicit transform length per axis, e.g.
/// [`FftLayout::nffc`](crate::mesh::FftLayout). `padded` must be at least `K + D - 1`.
pub fn fftconvolve_valid_padded(kernel: &Cube<f64>, density: &Cube<c64>, crop: [usize; 3], padded: [usize; 3]) -> Result<Cube<c64>> {
    let ks = dims(kernel);
    let ds = dims(density);
    check_valid_shapes(ks, ds, crop)?;
    for i in 0 .. 3 {
        ensure!(padded[i] >= ks[i] + ds[i] - 1,
            "[CONV]: Transform length {:?} is shorter than the linear convolution extent along axis {}.", padded, i);
    }
    debug!("FFT convolution: kernel {:?}, density {:?}, padded to {:?}", ks, ds, padded);

    let mut a = Array3::<c64>::zeros((padded[0], padded[1], padded[2]));
    a.slice_mut(s![.. ks[0], .. ks[1], .. ks[2]])
        .zip_mut_with(kernel, |dst, &k| *dst = c64::new(k, 0.0));

    let mut b = Array3::<c64>::zeros((padded[0], padded[1], padded[2]));
    b.slice_mut(s![.. ds[0], .. ds[1], .. ds[2]])
        .assign(density);

    let mut planner = FftPlanner::new();
    fft3(&mut a, &mut planner, FftDirection::Forward);
    fft3(&mut b, &mut planner, FftDirection::Forward);

    Zip::from(&mut a).and(&b).par_for_each(|x, &y| *x *= y);
    drop(b);

    fft3(&mut a, &mut planner, FftDirection::Inverse);

    let scale = 1.0 / padded.iter().product::<usize>() as f64;
    let off = ds.map(|n| n - 1);
    Ok(a.slice(s![off[0] .. off[0] + crop[0],
                  off[1] .. off[1] + crop[1],
                  off[2] .. off[2] + crop[2]])
        .mapv(|v| v * scale))
}


/// Direct evaluation of [`fftconvolve_valid`], O(N²). Reference for small grids only.
pub fn direct_convolve_valid(kernel: &Cube<f64>, density: &Cube<c64>, crop: [usize; 3]) -> Result<Cube<c64>> {
    let ks = dims(kernel);
    let ds = dims(density);
    check_valid_shapes(ks, ds, crop)?;

    let mut out = Array3::<c64>::zeros((crop[0], crop[1], crop[2]));
    for (px, py, pz) in iproduct!(0 .. crop[0], 0 .. crop[1], 0 .. crop[2]) {
        let mut acc = c64::new(0.0, 0.0);
        for (qx, qy, qz) in iproduct!(0 .. ds[0], 0 .. ds[1], 0 .. ds[2]) {
            let k = kernel[[px + ds[0] - 1 - qx, py + ds[1] - 1 - qy, pz + ds[2] - 1 - qz]];
            acc += density[[qx, qy, qz]] * k;
        }
        out[[px, py, pz]] = acc;
    }
    Ok(out)
}
