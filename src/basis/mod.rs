pub mod harmonics;
pub mod radial;
pub mod species;

pub use radial::{
    RadialFunction,
    LogRadialTable,
};
pub use species::{
    ProductFunction,
    SpeciesBasis,
    AtomicProductBasis,
};
