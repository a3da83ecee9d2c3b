use anyhow::ensure;
use ndarray::{
    Array3,
    Zip,
};

use crate::types::{
    Result,
    Cube,
    Axis,
    c64,
};


/// Induced electric field, one complex grid per Cartesian direction in x, y, z order.
#[derive(Debug, Clone, PartialEq)]
pub struct InducedField {
    components: [Cube<c64>; 3],
}


impl InducedField {
    pub fn new(components: [Cube<c64>; 3]) -> Result<Self> {
        let shape = components[0].shape();
        ensure!(components.iter().all(|c| c.shape() == shape),
            "[FIELD]: Field components must share one shape, got {:?}, {:?} and {:?}.",
            components[0].shape(), components[1].shape(), components[2].shape());
        Ok(Self { components })
    }

    pub fn component(&self, axis: Axis) -> &Cube<c64> {
        &self.components[axis.index()]
    }

    pub fn components(&self) -> &[Cube<c64>; 3] {
        &self.components
    }

    pub fn into_components(self) -> [Cube<c64>; 3] {
        self.components
    }

    pub fn shape(&self) -> &[usize] {
        self.components[0].shape()
    }

    /// See [`comp_intensity_efield`].
    pub fn intensity(&self) -> Cube<f64> {
        comp_intensity_efield(self)
    }
}


/// `Σ_axis Re(E_axis)² + Im(E_axis)²` at every point.
///
/// No frequency factor nor physical prefactor is applied.
pub fn comp_intensity_efield(field: &InducedField) -> Cube<f64> {
    let [ex, ey, ez] = &field.components;
    let mut intensity = Array3::<f64>::zeros(ex.raw_dim());
    Zip::from(&mut intensity)
        .and(ex)
        .and(ey)
        .and(ez)
        .par_for_each(|i, x, y, z| {
            *i = x.re * x.re + y.re * y.re + z.re * z.re
               + x.im * x.im + y.im * y.im + z.im * z.im;
        });
    intensity
}
