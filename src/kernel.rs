use std::f64::consts::PI;

use log::debug;
use ndarray::{
    Array3,
    Zip,
};

use crate::{
    types::{
        Cube,
        Axis,
    },
    mesh::{
        GridSpacing,
        FftLayout,
    },
};


/// Interaction kernel sampled on the enlarged grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKind {
    /// `1/|r|`
    Potential,
    /// `∂/∂x_a (1/|r|) = -x_a/|r|^3`
    Field(Axis),
}


#[derive(Debug, Clone)]
pub struct KernelGrid {
    pub kind:   KernelKind,
    /// Index of the zero displacement along each axis.
    pub origin: [usize; 3],
    pub data:   Cube<f64>,
}


/// Value of `1/|r|` at the origin, averaged over the sphere whose volume equals one cell.
pub fn regularized_origin(dr: &GridSpacing) -> f64 {
    let radius = (3.0 * dr.cell_volume() / (4.0 * PI)).cbrt();
    1.5 / radius
}


/// Sample the kernel on a grid of shape `layout.nffr`.
///
/// The zero displacement sits at `mesh_shape - 1`, so that a valid-mode convolution with a
/// density of shape `mesh_shape` returns the interaction evaluated at the mesh points
/// themselves. The potential kernel uses [`regularized_origin`] at `r = 0`, the field
/// kernels are odd and vanish there.
pub fn comp_spatial_grid(dr: &GridSpacing, kind: KernelKind, layout: &FftLayout, mesh_shape: [usize; 3]) -> KernelGrid {
    let origin = mesh_shape.map(|n| n.saturating_sub(1));
    let shape  = layout.nffr;
    let d      = dr.as_array();
    let v0     = regularized_origin(dr);

    debug!("Building {:?} kernel on {:?} grid, origin at {:?}", kind, shape, origin);

    let mut data = Array3::<f64>::zeros((shape[0], shape[1], shape[2]));
    Zip::indexed(&mut data).par_for_each(|(i, j, k), v| {
        let r = [
            (i as f64 - origin[0] as f64) * d[0],
            (j as f64 - origin[1] as f64) * d[1],
            (k as f64 - origin[2] as f64) * d[2],
        ];
        let r2 = r[0] * r[0] + r[1] * r[1] + r[2] * r[2];

        *v = if (i, j, k) == (origin[0], origin[1], origin[2]) {
            match kind {
                KernelKind::Potential => v0,
                KernelKind::Field(_)  => 0.0,
            }
        } else {
            let rr = r2.sqrt();
            match kind {
                KernelKind::Potential   => 1.0 / rr,
                KernelKind::Field(axis) => -r[axis.index()] / (r2 * rr),
            }
        };
    });

    KernelGrid { kind, origin, data }
}
