use std::fmt;

use ndarray::{
    Array1,
    Array2,
    Array3,
};
use num::complex::Complex;
use serde::{
    Serialize,
    Deserialize,
};

pub type Result<T> = anyhow::Result<T>;

pub type Vector<T> = Array1<T>;  // Define this type to use broadcast operations.
pub type Matrix<T> = Array2<T>;
pub type Cube<T>   = Array3<T>;
pub type Mat32<T>  = [[T;2];3];  // 3x2 matrix, lower and upper bounds per axis

#[allow(non_camel_case_types)]
pub type c64 = Complex<f64>;


#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}


impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}


impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(s)
    }
}


/// Index of the element of `arr` closest to `x`. The first one wins on ties.
///
/// Returns `None` for an empty slice or a NaN `x`.
pub fn find_nearest_index(arr: &[f64], x: f64) -> Option<usize> {
    if x.is_nan() {
        return None;
    }
    arr.iter()
        .enumerate()
        .fold(None, |acc: Option<(usize, f64)>, (i, v)| {
            let d = (v - x).abs();
            match acc {
                Some((_, dmin)) if dmin <= d => acc,
                _ => Some((i, d)),
            }
        })
        .map(|(i, _)| i)
}
