use anyhow::ensure;

use crate::types::Result;

/// Relative magnitude below which a Gaussian tail is treated as zero.
const GAUSSIAN_TAIL: f64 = 1E-10;


/// Radial function tabulated on the logarithmic mesh `r_i = rmin * exp(i*h)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRadialTable {
    rmin:     f64,
    rmax:     f64,
    log_step: f64,
    values:   Vec<f64>,
}


impl LogRadialTable {
    pub fn new(rmin: f64, rmax: f64, values: Vec<f64>) -> Result<Self> {
        ensure!(values.len() >= 4, "[RADIAL]: At least 4 tabulated points are needed, got {}.", values.len());
        ensure!(rmin > 0.0 && rmin < rmax && rmax.is_finite(),
            "[RADIAL]: Invalid logarithmic mesh bounds: rmin = {}, rmax = {}.", rmin, rmax);

        let log_step = (rmax / rmin).ln() / (values.len() - 1) as f64;
        Ok(Self { rmin, rmax, log_step, values })
    }

    /// Tabulate `f` on `npoints` logarithmically spaced radii.
    pub fn from_fn(rmin: f64, rmax: f64, npoints: usize, f: impl Fn(f64) -> f64) -> Result<Self> {
        ensure!(npoints >= 4, "[RADIAL]: At least 4 tabulated points are needed, got {}.", npoints);
        ensure!(rmin > 0.0 && rmin < rmax, "[RADIAL]: Invalid logarithmic mesh bounds: rmin = {}, rmax = {}.", rmin, rmax);

        let log_step = (rmax / rmin).ln() / (npoints - 1) as f64;
        let values = (0 .. npoints)
            .map(|i| f(rmin * (i as f64 * log_step).exp()))
            .collect();
        Self::new(rmin, rmax, values)
    }

    pub fn rmax(&self) -> f64 {
        self.rmax
    }

    pub fn radii(&self) -> impl Iterator<Item = f64> + '_ {
        (0 .. self.values.len()).map(move |i| self.rmin * (i as f64 * self.log_step).exp())
    }

    /// Four-point Lagrange interpolation in `ln r`. Constant below `rmin`, zero past `rmax`.
    pub fn eval(&self, r: f64) -> f64 {
        if r <= self.rmin {
            return self.values[0];
        }
        let n = self.values.len();
        let t = (r / self.rmin).ln() / self.log_step;
        if t > (n - 1) as f64 + 1E-9 {
            return 0.0;
        }

        let i = (t.floor() as usize).clamp(1, n - 3);
        let s = t - (i - 1) as f64;
        let f = &self.values[i - 1 .. i + 3];

        let w0 = -(s - 1.0) * (s - 2.0) * (s - 3.0) / 6.0;
        let w1 =  s * (s - 2.0) * (s - 3.0) / 2.0;
        let w2 = -s * (s - 1.0) * (s - 3.0) / 2.0;
        let w3 =  s * (s - 1.0) * (s - 2.0) / 6.0;

        w0 * f[0] + w1 * f[1] + w2 * f[2] + w3 * f[3]
    }
}


#[derive(Debug, Clone, PartialEq)]
pub enum RadialFunction {
    Tabulated(LogRadialTable),
    /// `coeff * exp(-alpha * r^2)`
    Gaussian {
        alpha: f64,
        coeff: f64,
    },
}


impl RadialFunction {
    pub fn eval(&self, r: f64) -> f64 {
        match self {
            Self::Tabulated(table)        => table.eval(r),
            Self::Gaussian { alpha, coeff } => coeff * (-alpha * r * r).exp(),
        }
    }

    /// Radius beyond which the function is negligible.
    pub fn extent(&self) -> f64 {
        match self {
            Self::Tabulated(table)      => table.rmax(),
            Self::Gaussian { alpha, .. } => (-GAUSSIAN_TAIL.ln() / alpha).sqrt(),
        }
    }
}
