use std::f64::consts::PI;

use approx::{
    assert_abs_diff_eq,
    assert_relative_eq,
};
use ndarray::Array3;

use rsfield::{
    c64,
    Axis,
    Settings,
    SpatialBox,
    FftSize,
    AtomicProductBasis,
    SpeciesBasis,
    ProductFunction,
    RadialFunction,
    SpatialDistribution,
    KernelKind,
    comp_spatial_grid,
    direct_convolve_valid,
};


const ALPHA: f64 = 0.5;


fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn gaussian_s_at_origin() -> AtomicProductBasis {
    let sp = SpeciesBasis::new(vec![
        ProductFunction::s(RadialFunction::Gaussian { alpha: ALPHA, coeff: 1.0 }),
    ]).unwrap();
    AtomicProductBasis::new(vec![sp], vec![0], vec![[0.0; 3]]).unwrap()
}

fn unit_spacing() -> Settings {
    Settings {
        dr: [1.0; 3],
        ..Settings::default()
    }
}

/// Response along x only, `scale[iw]` at frequency `iw`.
fn response(scale: &[f64]) -> Array3<c64> {
    let mut dn = Array3::<c64>::zeros((3, scale.len(), 1));
    for (iw, s) in scale.iter().enumerate() {
        dn[[0, iw, 0]] = c64::new(*s, 0.0);
    }
    dn
}


#[test]
fn test_density_of_single_s_function() {
    init_logger();
    let bbox = SpatialBox::new([[-2.0, 2.0]; 3]).unwrap();
    let mut spd = SpatialDistribution::new(response(&[1.0]), vec![0.1], bbox, gaussian_s_at_origin(), &unit_spacing()).unwrap();

    let dn = spd.get_spatial_density(0.1, Some([1.0, 0.0, 0.0])).unwrap();
    assert_eq!(dn.shape(), &[6, 6, 6]);

    let y00 = 1.0 / (4.0 * PI).sqrt();
    // mesh points are -2, -1, 0, 1, 2, 3 along each axis
    assert_relative_eq!(dn[[2, 2, 2]].re, y00, max_relative = 1E-6);
    assert_relative_eq!(dn[[4, 2, 2]].re, (-ALPHA * 4.0).exp() * y00, max_relative = 1E-6);
    assert_relative_eq!(dn[[3, 3, 2]].re, (-ALPHA * 2.0).exp() * y00, max_relative = 1E-6);
    assert!(dn.iter().all(|v| v.im == 0.0));
}


#[test]
fn test_excitation_direction_and_frequency() {
    init_logger();
    let bbox = SpatialBox::new([[-1.0, 1.0]; 3]).unwrap();
    let mut dn = response(&[1.0, 2.0, 3.0]);
    dn[[1, 1, 0]] = c64::new(0.0, 4.0);
    let mut spd = SpatialDistribution::new(dn, vec![0.1, 0.2, 0.3], bbox, gaussian_s_at_origin(), &unit_spacing()).unwrap();

    assert!(spd.comp_induce_potential().is_err());
    assert!(spd.comp_induce_field().is_err());
    assert!(spd.get_spatial_density(0.2, Some([0.0; 3])).is_err());
    assert!(spd.get_spatial_density(f64::NAN, None).is_err());
    assert!(spd.get_spatial_density(f64::INFINITY, None).is_err());
    assert_eq!(spd.frequency_index(), None);
    assert!(spd.dn_spatial().is_none());

    spd.get_spatial_density(0.24, Some([3.0, 4.0, 0.0])).unwrap();
    assert_eq!(spd.frequency_index(), Some(1));
    assert_relative_eq!(spd.eext()[0], 0.6);
    assert_relative_eq!(spd.eext()[1], 0.8);
    let w = spd.mu2dn().unwrap()[0];
    assert_relative_eq!(w.re, 0.6 * 2.0);
    assert_relative_eq!(w.im, 0.8 * 4.0);

    // outside the frequency axis, the last frequency is used
    spd.get_spatial_density(5.0, Some([1.0, 0.0, 0.0])).unwrap();
    assert_eq!(spd.frequency_index(), Some(2));
    assert_relative_eq!(spd.mu2dn().unwrap()[0].re, 3.0);

    // configured direction, [1, 1, 1] normalized
    spd.get_spatial_density(0.1, None).unwrap();
    assert_relative_eq!(spd.mu2dn().unwrap()[0].re, 1.0 / 3f64.sqrt(), max_relative = 1E-12);
}


#[test]
fn test_invalid_construction() {
    let bbox = SpatialBox::new([[-1.0, 1.0]; 3]).unwrap();
    let basis = gaussian_s_at_origin;
    let settings = unit_spacing();

    assert!(SpatialDistribution::new(response(&[1.0, 1.0]), vec![0.1], bbox, basis(), &settings).is_err());
    assert!(SpatialDistribution::new(response(&[1.0, 1.0]), vec![0.2, 0.1], bbox, basis(), &settings).is_err());
    assert!(SpatialDistribution::new(response(&[]), vec![], bbox, basis(), &settings).is_err());
    assert!(SpatialDistribution::new(Array3::zeros((2, 1, 1)), vec![0.1], bbox, basis(), &settings).is_err());
    assert!(SpatialDistribution::new(Array3::zeros((3, 1, 2)), vec![0.1], bbox, basis(), &settings).is_err());

    let bad = Settings { dr: [1.0, 0.0, 1.0], ..Settings::default() };
    assert!(SpatialDistribution::new(response(&[1.0]), vec![0.1], bbox, basis(), &bad).is_err());
}


#[test]
fn test_potential_matches_direct_convolution() {
    init_logger();
    let bbox = SpatialBox::new([[-2.0, 1.0]; 3]).unwrap();
    for fft_size in [FftSize::Smooth, FftSize::PowerOfTwo] {
        let settings = Settings { fft_size, ..unit_spacing() };
        let mut spd = SpatialDistribution::new(response(&[1.0]), vec![0.1], bbox, gaussian_s_at_origin(), &settings).unwrap();
        let dn = spd.get_spatial_density(0.1, Some([1.0, 0.0, 0.0])).unwrap().clone();

        let pot = spd.comp_induce_potential().unwrap();
        let shape = spd.mesh().shape();
        let kernel = comp_spatial_grid(spd.spacing(), KernelKind::Potential, &spd.layout(), shape);
        let reference = direct_convolve_valid(&kernel.data, &dn, shape).unwrap();

        assert_eq!(pot.shape(), &shape);
        for (a, b) in pot.iter().zip(reference.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1E-10);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1E-10);
        }
    }
}


#[test]
fn test_field_symmetry_and_intensity() {
    init_logger();
    // mesh points -2, -1, 0, 1, 2: the density is symmetric about the middle point
    let bbox = SpatialBox::new([[-2.0, 1.0]; 3]).unwrap();
    let mut spd = SpatialDistribution::new(response(&[1.0]), vec![0.1], bbox, gaussian_s_at_origin(), &unit_spacing()).unwrap();
    spd.get_spatial_density(0.1, Some([1.0, 0.0, 0.0])).unwrap();
    assert_eq!(spd.mesh().shape(), [5, 5, 5]);

    let pot = spd.comp_induce_potential().unwrap();
    let field = spd.comp_induce_field().unwrap();
    let ex = field.component(Axis::X);
    let ez = field.component(Axis::Z);

    for i in 0 .. 5 {
        for j in 0 .. 5 {
            for k in 0 .. 5 {
                let (mi, mk) = (4 - i, 4 - k);
                assert_abs_diff_eq!(ex[[i, j, k]].re, -ex[[mi, j, k]].re, epsilon = 1E-10);
                assert_abs_diff_eq!(ex[[i, j, k]].re,  ex[[i, j, mk]].re, epsilon = 1E-10);
                assert_abs_diff_eq!(ez[[i, j, k]].re, -ez[[i, j, mk]].re, epsilon = 1E-10);
                assert_abs_diff_eq!(pot[[i, j, k]].re, pot[[mi, j, k]].re, epsilon = 1E-10);
                assert_abs_diff_eq!(pot[[i, j, k]].re, pot[[k, i, j]].re, epsilon = 1E-10);
            }
        }
    }
    assert_abs_diff_eq!(ex[[2, 2, 2]].re, 0.0, epsilon = 1E-10);
    // gradient of the potential, decreasing away from a positive density
    assert!(ex[[3, 2, 2]].re < 0.0);
    assert!(ex[[1, 2, 2]].re > 0.0);

    let intensity = spd.comp_intensity_efield(&field);
    assert_eq!(intensity.shape(), &[5, 5, 5]);
    assert!(intensity.iter().all(|&v| v >= 0.0));
    let [fx, fy, fz] = field.components();
    let expected = fx[[3, 1, 2]].norm_sqr() + fy[[3, 1, 2]].norm_sqr() + fz[[3, 1, 2]].norm_sqr();
    assert_relative_eq!(intensity[[3, 1, 2]], expected, max_relative = 1E-12);
}
