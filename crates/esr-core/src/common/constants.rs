//! Physical constants shared across the physics conversions.
//!
//! CODATA 2018 values; kept in one place so the conversion formulas never
//! carry ad hoc per-module literals.

/// Planck constant, J·s.
pub const PLANCK_H: f64 = 6.626_070_15e-34_f64;
/// Reduced Planck constant, J·s.
pub const HBAR: f64 = 1.054_571_817e-34_f64;
/// Bohr magneton, J/T.
pub const BOHR_MAGNETON: f64 = 9.274_010_078_3e-24_f64;
/// Peak-to-peak to FWHM factor for a Lorentzian derivative line.
pub const LORENTZ_PP_TO_FWHM: f64 = 1.732_050_807_568_877_2_f64;
/// Peak-to-peak to FWHM factor for a Gaussian derivative line.
pub const GAUSS_PP_TO_FWHM: f64 = 1.177_f64;
/// Hyperfine conversion factor, MHz per mT per unit g.
pub const HYPERFINE_MHZ_PER_MT: f64 = 28.024_95_f64;
