use std::time;

use anyhow::{
    ensure,
    Context,
};
use log::{
    info,
    debug,
    warn,
};
use ndarray::{
    Array1,
    Array3,
    Axis as NdAxis,
    Zip,
};

use crate::{
    types::{
        Result,
        Cube,
        Axis,
        c64,
        find_nearest_index,
    },
    mesh::{
        SpatialBox,
        GridSpacing,
        Mesh,
        FftSize,
        FftLayout,
    },
    traits::ProductBasis,
    settings::Settings,
    reconstruct::get_spatial_density_parallel,
    kernel::{
        KernelKind,
        comp_spatial_grid,
    },
    convolve::fftconvolve_valid_padded,
    field::{
        InducedField,
        comp_intensity_efield,
    },
};


/// Real-space density change, induced potential and induced field of a linear-response
/// calculation.
///
/// All quantities are in atomic units. The response tensor `dn` is indexed
/// `[direction, frequency, product]` and is never modified.
///
/// ```ignore
/// let mut spd = SpatialDistribution::new(dn, freq, bbox, basis, &Settings::default())?;
/// spd.get_spatial_density(0.128, Some([1.0, 0.0, 0.0]))?;
/// let field     = spd.comp_induce_field()?;
/// let intensity = spd.comp_intensity_efield(&field);
/// ```
pub struct SpatialDistribution<B: ProductBasis> {
    dn:         Array3<c64>,
    freq:       Vec<f64>,
    bbox:       SpatialBox,
    dr:         GridSpacing,
    mesh:       Mesh,
    basis:      B,
    fft_size:   FftSize,
    eext0:      [f64; 3],
    eext:       [f64; 3],
    iw:         Option<usize>,
    mu2dn:      Option<Array1<c64>>,
    dn_spatial: Option<Cube<c64>>,
}


impl<B: ProductBasis> SpatialDistribution<B> {
    pub fn new(dn: Array3<c64>, freq: Vec<f64>, bbox: SpatialBox, basis: B, settings: &Settings) -> Result<Self> {
        let shape = dn.shape();
        ensure!(shape[0] == 3,
            "[SPATIAL]: Response tensor must hold 3 directions along its first axis, got {}.", shape[0]);
        ensure!(!freq.is_empty(), "[SPATIAL]: Frequency axis is empty.");
        ensure!(shape[1] == freq.len(),
            "[SPATIAL]: Response tensor has {} frequencies, but the frequency axis has {}.", shape[1], freq.len());
        ensure!(shape[2] == basis.nprod(),
            "[SPATIAL]: Response tensor has {} product functions, but the basis has {}.", shape[2], basis.nprod());
        ensure!(freq.windows(2).all(|w| w[0] < w[1]),
            "[SPATIAL]: Frequencies must be strictly increasing.");

        let dr = settings.spacing()?;
        let mesh = Mesh::new(&bbox, &dr);
        info!("Spatial distribution on {}, {} frequencies, {} product functions.", mesh, freq.len(), shape[2]);

        Ok(Self {
            dn,
            freq,
            bbox,
            dr,
            mesh,
            basis,
            fft_size: settings.fft_size,
            eext0: settings.eext,
            eext: settings.eext,
            iw: None,
            mu2dn: None,
            dn_spatial: None,
        })
    }

    /// Build the complex density change on the mesh at the tabulated frequency nearest to
    /// `w0`, for an excitation along `eext` (the configured direction if `None`).
    ///
    /// The previous density, if any, is replaced.
    pub fn get_spatial_density(&mut self, w0: f64, eext: Option<[f64; 3]>) -> Result<&Cube<c64>> {
        ensure!(w0.is_finite(), "[SPATIAL]: Frequency must be finite, got {}.", w0);
        let eext = normalize(eext.unwrap_or(self.eext0))?;

        let (first, last) = (self.freq[0], self.freq[self.freq.len() - 1]);
        if w0 < first || w0 > last {
            warn!("Frequency {} lies outside of the computed range [{}, {}], the nearest one is used.", w0, first, last);
        }
        let iw = find_nearest_index(&self.freq, w0)
            .context("[SPATIAL]: No frequency available.")?;
        info!("Using frequency #{} = {} for w0 = {}, Eext = {:?}", iw, self.freq[iw], w0, eext);

        let slice = self.dn.index_axis(NdAxis(1), iw);
        let mut mu2dn = Array1::<c64>::zeros(slice.len_of(NdAxis(1)));
        for (e, row) in eext.iter().zip(slice.outer_iter()) {
            mu2dn.scaled_add(c64::new(*e, 0.0), &row);
        }

        let (dn_re, dn_im) = get_spatial_density_parallel(
            mu2dn.as_slice().context("[SPATIAL]: Projected weights are not contiguous.")?,
            &self.mesh,
            &self.basis)?;

        let mut dn_spatial = Array3::<c64>::zeros(dn_re.raw_dim());
        Zip::from(&mut dn_spatial)
            .and(&dn_re)
            .and(&dn_im)
            .par_for_each(|d, &re, &im| *d = c64::new(re as f64, im as f64));

        self.eext = eext;
        self.iw = Some(iw);
        self.mu2dn = Some(mu2dn);
        Ok(&*self.dn_spatial.insert(dn_spatial))
    }

    /// Induced potential at every mesh point, the density convolved with `1/|r|`.
    pub fn comp_induce_potential(&self) -> Result<Cube<c64>> {
        let dn = self.require_density()?;
        let now = time::Instant::now();
        let layout = self.layout();

        let kernel = comp_spatial_grid(&self.dr, KernelKind::Potential, &layout, self.mesh.shape());
        let pot = fftconvolve_valid_padded(&kernel.data, dn, self.mesh.shape(), layout.nffc)?;

        info!("Induced potential computed in {:?}", now.elapsed());
        Ok(pot)
    }

    /// Induced electric field, one convolution per Cartesian direction.
    pub fn comp_induce_field(&self) -> Result<InducedField> {
        let dn = self.require_density()?;
        let now = time::Instant::now();
        let layout = self.layout();

        let [ex, ey, ez] = Axis::ALL.map(|axis| {
            debug!("Computing induced field along {}", axis);
            let kernel = comp_spatial_grid(&self.dr, KernelKind::Field(axis), &layout, self.mesh.shape());
            fftconvolve_valid_padded(&kernel.data, dn, self.mesh.shape(), layout.nffc)
        });
        let field = InducedField::new([ex?, ey?, ez?])?;

        info!("Induced field computed in {:?}", now.elapsed());
        Ok(field)
    }

    pub fn comp_intensity_efield(&self, field: &InducedField) -> Cube<f64> {
        comp_intensity_efield(field)
    }

    pub fn layout(&self) -> FftLayout {
        FftLayout::new(&self.bbox, &self.dr, self.mesh.shape(), self.fft_size)
    }

    fn require_density(&self) -> Result<&Cube<c64>> {
        self.dn_spatial.as_ref()
            .context("[SPATIAL]: Density is not available, call get_spatial_density first.")
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn bbox(&self) -> &SpatialBox {
        &self.bbox
    }

    pub fn spacing(&self) -> &GridSpacing {
        &self.dr
    }

    pub fn freq(&self) -> &[f64] {
        &self.freq
    }

    pub fn basis(&self) -> &B {
        &self.basis
    }

    /// Unit excitation direction of the last density, or the configured one before that.
    pub fn eext(&self) -> [f64; 3] {
        self.eext
    }

    /// Index of the frequency used by the last density.
    pub fn frequency_index(&self) -> Option<usize> {
        self.iw
    }

    /// Response projected on the excitation direction, one weight per product function.
    pub fn mu2dn(&self) -> Option<&Array1<c64>> {
        self.mu2dn.as_ref()
    }

    pub fn dn_spatial(&self) -> Option<&Cube<c64>> {
        self.dn_spatial.as_ref()
    }
}


fn normalize(v: [f64; 3]) -> Result<[f64; 3]> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    ensure!(norm.is_finite() && norm > 0.0,
        "[SPATIAL]: Excitation direction must be a finite non-zero vector, got {:?}.", v);
    Ok(v.map(|x| x / norm))
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize() {
        let v = normalize([3.0, 0.0, 4.0]).unwrap();
        assert_relative_eq!(v[0], 0.6);
        assert_relative_eq!(v[2], 0.8);
        assert!(normalize([0.0; 3]).is_err());
        assert!(normalize([f64::NAN, 1.0, 0.0]).is_err());
    }
}
