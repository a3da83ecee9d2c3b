pub mod types;
pub mod traits;
pub mod settings;
pub mod mesh;
pub mod basis;
pub mod spectral;
pub mod reconstruct;
pub mod kernel;
pub mod convolve;
pub mod field;
pub mod spatial;
pub mod dos;

pub use traits::ProductBasis;

pub use types::{
    Result,
    Axis,
    c64,
};

pub use settings::Settings;

pub use mesh::{
    SpatialBox,
    GridSpacing,
    Mesh,
    FftSize,
    FftLayout,
};

pub use basis::{
    AtomicProductBasis,
    SpeciesBasis,
    ProductFunction,
    RadialFunction,
    LogRadialTable,
};

pub use spectral::div_eigenenergy;
pub use reconstruct::get_spatial_density_parallel;

pub use kernel::{
    KernelKind,
    KernelGrid,
    comp_spatial_grid,
};

pub use convolve::{
    fftconvolve_valid,
    fftconvolve_valid_padded,
    direct_convolve_valid,
};

pub use field::{
    InducedField,
    comp_intensity_efield,
};

pub use spatial::SpatialDistribution;
