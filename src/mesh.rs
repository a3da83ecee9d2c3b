use std::fmt;

use anyhow::{
    ensure,
    bail,
};
use log::debug;
use serde::{
    Serialize,
    Deserialize,
};

use crate::types::{
    Result,
    Matrix,
    Mat32,
};

/// Absorbs round-off in `(upper - lower) / dr` before taking the floor, e.g. `0.9 / 0.3`.
const STEP_TOLERANCE: f64 = 1E-9;


/// Rectangular region of space, lower and upper bound for each Cartesian axis, in Bohr.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialBox {
    bounds: Mat32<f64>,
}


impl SpatialBox {
    pub fn new(bounds: Mat32<f64>) -> Result<Self> {
        for (i, [lo, hi]) in bounds.iter().enumerate() {
            ensure!(lo.is_finite() && hi.is_finite(),
                "[BOX]: Bounds of axis {} must be finite, got [{}, {}].", i, lo, hi);
            ensure!(lo < hi,
                "[BOX]: Lower bound must be less than upper bound on axis {}, got [{}, {}].", i, lo, hi);
        }
        Ok(Self { bounds })
    }

    /// Build from a 3x2 matrix, first index runs over x, y, z, second over lower and upper.
    pub fn from_matrix(m: &Matrix<f64>) -> Result<Self> {
        ensure!(m.shape() == [3, 2], "[BOX]: Box must be shaped (3, 2), got {:?}.", m.shape());
        Self::new([
            [m[[0, 0]], m[[0, 1]]],
            [m[[1, 0]], m[[1, 1]]],
            [m[[2, 0]], m[[2, 1]]],
        ])
    }

    pub fn bounds(&self) -> &Mat32<f64> {
        &self.bounds
    }

    pub fn lower(&self, iaxis: usize) -> f64 {
        self.bounds[iaxis][0]
    }

    pub fn upper(&self, iaxis: usize) -> f64 {
        self.bounds[iaxis][1]
    }
}


/// Grid step along each Cartesian axis, in Bohr.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpacing([f64; 3]);


impl GridSpacing {
    pub fn new(dr: [f64; 3]) -> Result<Self> {
        for (i, d) in dr.iter().enumerate() {
            ensure!(d.is_finite() && *d > 0.0,
                "[SPACING]: Grid spacing must be positive and finite, got {} on axis {}.", d, i);
        }
        Ok(Self(dr))
    }

    pub fn from_slice(dr: &[f64]) -> Result<Self> {
        match dr {
            [x, y, z] => Self::new([*x, *y, *z]),
            _ => bail!("[SPACING]: Exactly 3 grid spacings are required, got {}.", dr.len()),
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        self.0
    }

    pub fn cell_volume(&self) -> f64 {
        self.0.iter().product()
    }
}


impl std::ops::Index<usize> for GridSpacing {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}


/// Cartesian mesh spanned by a box and a spacing.
///
/// Each axis steps from the lower bound by `dr` up to and including `upper + dr`, thus
/// `n = floor((upper - lower) / dr) + 2` points per axis. The last point may lie beyond
/// the upper bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    axes: [Vec<f64>; 3],
    dr:   GridSpacing,
}


impl Mesh {
    pub fn new(bbox: &SpatialBox, dr: &GridSpacing) -> Self {
        let axes = [0usize, 1, 2].map(|i| {
            Self::axis_points(bbox.lower(i), bbox.upper(i), dr[i])
        });
        Self { axes, dr: *dr }
    }

    fn axis_points(lower: f64, upper: f64, dr: f64) -> Vec<f64> {
        let n = ((upper - lower) / dr + STEP_TOLERANCE).floor() as usize + 2;
        (0 .. n).map(|k| lower + k as f64 * dr).collect()
    }

    pub fn axis(&self, iaxis: usize) -> &[f64] {
        &self.axes[iaxis]
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.axes[0].len(), self.axes[1].len(), self.axes[2].len()]
    }

    pub fn npoints(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn point(&self, idx: [usize; 3]) -> [f64; 3] {
        [self.axes[0][idx[0]], self.axes[1][idx[1]], self.axes[2][idx[2]]]
    }

    pub fn spacing(&self) -> &GridSpacing {
        &self.dr
    }

    pub fn cell_volume(&self) -> f64 {
        self.dr.cell_volume()
    }
}


impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [nx, ny, nz] = self.shape();
        write!(f, "{}x{}x{} mesh", nx, ny, nz)?;
        for (name, ax) in ["x", "y", "z"].iter().zip(self.axes.iter()) {
            if let (Some(first), Some(last)) = (ax.first(), ax.last()) {
                write!(f, ", {} in [{:.4}, {:.4}]", name, first, last)?;
            }
        }
        Ok(())
    }
}


/// Policy choosing the padded transform length of the FFT convolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FftSize {
    /// Smallest 2^a 3^b 5^c not less than the required length.
    #[default]
    Smooth,
    /// Smallest power of two not less than the required length.
    PowerOfTwo,
}


impl FftSize {
    pub fn fit(self, n: usize) -> usize {
        match self {
            FftSize::PowerOfTwo => n.max(1).next_power_of_two(),
            FftSize::Smooth     => (n.max(1) ..).find(|&m| is_smooth(m)).unwrap_or(n),
        }
    }
}


fn is_smooth(mut n: usize) -> bool {
    for p in [2, 3, 5] {
        while n % p == 0 {
            n /= p;
        }
    }
    n == 1
}


/// Integer grid bounds and transform extents of the kernel convolution.
///
/// `id` and `ip` keep the (2, 3) layout: row 0 holds lower bounds and row 1 the upper
/// bounds, one column per axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FftLayout {
    /// `rint(box / dr)`
    pub id:   [[i32; 3]; 2],
    /// `rint((box - dr/2) / dr)`
    pub ip:   [[i32; 3]; 2],
    /// Extent mirrored on each side of the kernel origin.
    pub n1:   [usize; 3],
    /// Kernel grid extent, `2*n1 - 1`.
    pub nffr: [usize; 3],
    /// Padded transform length, at least `nffr + nmesh - 1`.
    pub nffc: [usize; 3],
}


impl FftLayout {
    pub fn new(bbox: &SpatialBox, dr: &GridSpacing, mesh_shape: [usize; 3], fft_size: FftSize) -> Self {
        let mut id = [[0i32; 3]; 2];
        let mut ip = [[0i32; 3]; 2];
        let mut n1 = [0usize; 3];
        let mut nffr = [0usize; 3];
        let mut nffc = [0usize; 3];

        for i in 0 .. 3 {
            for j in 0 .. 2 {
                let b = bbox.bounds()[i][j];
                id[j][i] = (b / dr[i]).round_ties_even() as i32;
                ip[j][i] = ((b - dr[i] / 2.0) / dr[i]).round_ties_even() as i32;
            }

            let span = (id[1][i] - id[0][i]).max(ip[1][i] - ip[0][i]).max(0) as usize;
            n1[i] = (span + 2).max(mesh_shape[i]);
            nffr[i] = 2 * n1[i] - 1;
            nffc[i] = fft_size.fit(nffr[i] + mesh_shape[i] - 1);
        }

        debug!("FFT layout: id = {:?}, ip = {:?}, n1 = {:?}, nffr = {:?}, nffc = {:?}",
               id, ip, n1, nffr, nffc);

        Self { id, ip, n1, nffr, nffc }
    }
}
