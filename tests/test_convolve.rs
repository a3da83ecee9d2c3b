use approx::assert_abs_diff_eq;
use ndarray::Array3;
use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};

use rsfield::{
    c64,
    SpatialBox,
    GridSpacing,
    Mesh,
    FftSize,
    FftLayout,
    KernelKind,
    comp_spatial_grid,
    fftconvolve_valid,
    direct_convolve_valid,
    kernel::regularized_origin,
};


fn random_real(rng: &mut StdRng, shape: (usize, usize, usize)) -> Array3<f64> {
    Array3::from_shape_simple_fn(shape, || rng.gen_range(-1.0 .. 1.0))
}

fn random_complex(rng: &mut StdRng, shape: (usize, usize, usize)) -> Array3<c64> {
    Array3::from_shape_simple_fn(shape, || c64::new(rng.gen_range(-1.0 .. 1.0), rng.gen_range(-1.0 .. 1.0)))
}

fn assert_close(a: &Array3<c64>, b: &Array3<c64>, eps: f64) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_abs_diff_eq!(x.re, y.re, epsilon = eps);
        assert_abs_diff_eq!(x.im, y.im, epsilon = eps);
    }
}


#[test]
fn test_fft_matches_direct() {
    let mut rng = StdRng::seed_from_u64(7);
    let density = random_complex(&mut rng, (4, 4, 4));

    for (kshape, fft_size) in [((7, 7, 7), FftSize::Smooth),
                               ((7, 8, 9), FftSize::PowerOfTwo),
                               ((4, 5, 6), FftSize::Smooth)] {
        let kernel = random_real(&mut rng, kshape);
        let crop = [kshape.0 - 3, kshape.1 - 3, kshape.2 - 3].map(|n| n.min(4));

        let fast = fftconvolve_valid(&kernel, &density, crop, fft_size).unwrap();
        let slow = direct_convolve_valid(&kernel, &density, crop).unwrap();
        assert_close(&fast, &slow, 1E-10);
    }
}


#[test]
fn test_linearity() {
    let mut rng = StdRng::seed_from_u64(42);
    let kernel = random_real(&mut rng, (9, 9, 9));

    for _ in 0 .. 4 {
        let x = random_complex(&mut rng, (5, 5, 5));
        let y = random_complex(&mut rng, (5, 5, 5));
        let a = c64::new(rng.gen_range(-2.0 .. 2.0), rng.gen_range(-2.0 .. 2.0));
        let b = c64::new(rng.gen_range(-2.0 .. 2.0), rng.gen_range(-2.0 .. 2.0));

        let combined = x.mapv(|v| v * a) + y.mapv(|v| v * b);
        let lhs = fftconvolve_valid(&kernel, &combined, [5, 5, 5], FftSize::Smooth).unwrap();
        let cx = fftconvolve_valid(&kernel, &x, [5, 5, 5], FftSize::Smooth).unwrap();
        let cy = fftconvolve_valid(&kernel, &y, [5, 5, 5], FftSize::Smooth).unwrap();
        let rhs = cx.mapv(|v| v * a) + cy.mapv(|v| v * b);

        assert_close(&lhs, &rhs, 1E-9);
    }
}


#[test]
fn test_point_charge_potential() {
    let bbox = SpatialBox::new([[-2.0, 2.0]; 3]).unwrap();
    let dr = GridSpacing::new([1.0; 3]).unwrap();
    let mesh = Mesh::new(&bbox, &dr);
    let shape = mesh.shape();
    let layout = FftLayout::new(&bbox, &dr, shape, FftSize::Smooth);
    let kernel = comp_spatial_grid(&dr, KernelKind::Potential, &layout, shape);

    // unit charge on the mesh point at the origin
    let mut density = Array3::<c64>::zeros((shape[0], shape[1], shape[2]));
    density[[2, 2, 2]] = c64::new(1.0, 0.0);

    let pot = fftconvolve_valid(&kernel.data, &density, shape, FftSize::Smooth).unwrap();
    assert_eq!(pot.shape(), &shape);

    for ((i, j, k), v) in pot.indexed_iter() {
        let p = mesh.point([i, j, k]);
        let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        let expected = if r == 0.0 { regularized_origin(&dr) } else { 1.0 / r };
        assert_abs_diff_eq!(v.re, expected, epsilon = 1E-10);
        assert_abs_diff_eq!(v.im, 0.0, epsilon = 1E-10);
    }
}
