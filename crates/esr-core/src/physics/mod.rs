//! Pure conversion formulas between spectrum-derived quantities.
//!
//! No state and no spectrum access; external reporting applies these to the
//! scalars extracted from a processed spectrum.

use crate::common::constants::{
    BOHR_MAGNETON, GAUSS_PP_TO_FWHM, HBAR, HYPERFINE_MHZ_PER_MT, LORENTZ_PP_TO_FWHM, PLANCK_H,
};
use crate::domain::{EsrError, EsrResult};

/// g-factor from resonance frequency (Hz) and resonance field (T).
pub fn g_factor(frequency_hz: f64, b0_tesla: f64) -> EsrResult<f64> {
    require_positive("frequency_hz", frequency_hz)?;
    require_positive("b0_tesla", b0_tesla)?;
    Ok(PLANCK_H * frequency_hz / (BOHR_MAGNETON * b0_tesla))
}

/// FWHM of a Lorentzian line from the derivative peak-to-peak width.
pub fn fwhm_from_pp_lorentz(delta_bpp_tesla: f64) -> f64 {
    LORENTZ_PP_TO_FWHM * delta_bpp_tesla
}

/// FWHM of a Gaussian line from the derivative peak-to-peak width.
pub fn fwhm_from_pp_gauss(delta_bpp_tesla: f64) -> f64 {
    GAUSS_PP_TO_FWHM * delta_bpp_tesla
}

/// Hyperfine coupling constant in MHz from line spacing in mT.
pub fn hyperfine_a_mhz_from_spacing(delta_b_mt: f64, g: f64) -> f64 {
    g * HYPERFINE_MHZ_PER_MT * delta_b_mt
}

/// Gyromagnetic ratio in rad/s/T.
pub fn gamma_from_g(g: f64) -> f64 {
    g * BOHR_MAGNETON / HBAR
}

/// Spin–spin relaxation time from a Lorentzian FWHM in tesla.
pub fn t2_from_fwhm_lorentz(fwhm_tesla: f64, g: f64) -> EsrResult<f64> {
    require_positive("fwhm_tesla", fwhm_tesla)?;
    require_positive("g", g)?;
    Ok(1.0 / (gamma_from_g(g) * fwhm_tesla))
}

fn require_positive(name: &str, value: f64) -> EsrResult<()> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(EsrError::InvalidParameter(format!(
            "{name} must be strictly positive and finite, got {value}"
        )));
    }
    Ok(())
}
