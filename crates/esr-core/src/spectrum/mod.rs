//! Canonical in-memory spectrum and its mutating pipeline operations.

use crate::domain::{EsrError, EsrResult};
use crate::numerics::{
    self, PhaseSearchGrid, ProcessingError,
};
use serde::{Deserialize, Serialize};

/// Minimum points a spectrum (or subset) must keep to stay usable.
pub const MIN_SPECTRUM_POINTS: usize = 10;

/// Typed experiment parameters extracted from the file header.
///
/// All values are SI-normalized at extraction time; `None` means unknown, not
/// zero. The free-text fields are caller-populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EsrMeta {
    pub frequency_hz: Option<f64>,
    pub mod_amp_t: Option<f64>,
    pub mw_power_w: Option<f64>,
    pub temperature_k: Option<f64>,
    pub phase_rad: Option<f64>,
    pub instrument: Option<String>,
    pub operator: Option<String>,
    pub notes: Option<String>,
    pub timestamp: Option<String>,
}

/// Baseline estimation strategy for [`EsrSpectrum::baseline`].
#[derive(Debug, Clone, PartialEq)]
pub enum BaselineMethod {
    /// Robust polynomial of the given order over the masked region.
    Poly { order: usize },
    /// Cubic spline; explicit interior knots or adaptive smoothing.
    Spline {
        knots: Option<Vec<f64>>,
        smoothing: Option<f64>,
    },
}

impl BaselineMethod {
    /// Parse a method name with its defaults (`order = 2`, adaptive spline).
    pub fn parse(name: &str) -> EsrResult<Self> {
        match name {
            "poly" => Ok(Self::Poly { order: 2 }),
            "spline" => Ok(Self::Spline {
                knots: None,
                smoothing: None,
            }),
            other => Err(ProcessingError::UnknownBaselineMethod {
                name: other.to_string(),
            }
            .into()),
        }
    }
}

/// Smoothing strategy for [`EsrSpectrum::smooth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingMethod {
    Savgol,
}

impl SmoothingMethod {
    pub fn parse(name: &str) -> EsrResult<Self> {
        match name {
            "savgol" => Ok(Self::Savgol),
            other => Err(ProcessingError::UnknownSmoothingMethod {
                name: other.to_string(),
            }
            .into()),
        }
    }
}

/// Canonical spectrum: field axis in tesla plus the derivative signal.
///
/// Pipeline operations mutate in place and return `&mut Self` so calls chain;
/// the instance exclusively owns its data, so concurrent mutation must be
/// serialized by the caller. The integrated absorption is dropped whenever the
/// derivative signal changes and must be recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct EsrSpectrum {
    field_b: Vec<f64>,
    signal_dabs: Vec<f64>,
    absorption: Option<Vec<f64>>,
    mask: Option<Vec<bool>>,
    meta: EsrMeta,
}

impl EsrSpectrum {
    pub fn new(field_b: Vec<f64>, signal_dabs: Vec<f64>, meta: EsrMeta) -> EsrResult<Self> {
        if field_b.len() != signal_dabs.len() {
            return Err(ProcessingError::LengthMismatch {
                field: field_b.len(),
                signal: signal_dabs.len(),
            }
            .into());
        }
        if field_b.len() < 2 {
            return Err(EsrError::InsufficientData {
                rows: field_b.len(),
                minimum: 2,
            });
        }
        Ok(Self {
            field_b,
            signal_dabs,
            absorption: None,
            mask: None,
            meta,
        })
    }

    pub fn len(&self) -> usize {
        self.field_b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_b.is_empty()
    }

    pub fn field_b(&self) -> &[f64] {
        &self.field_b
    }

    pub fn signal_dabs(&self) -> &[f64] {
        &self.signal_dabs
    }

    pub fn absorption(&self) -> Option<&[f64]> {
        self.absorption.as_deref()
    }

    pub fn mask(&self) -> Option<&[bool]> {
        self.mask.as_deref()
    }

    pub fn meta(&self) -> &EsrMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut EsrMeta {
        &mut self.meta
    }

    /// Select the baseline-fit region for polynomial baselines.
    pub fn set_baseline_mask(&mut self, mask: Option<Vec<bool>>) -> EsrResult<&mut Self> {
        if let Some(selected) = &mask
            && selected.len() != self.len()
        {
            return Err(ProcessingError::MaskLengthMismatch {
                mask: selected.len(),
                data: self.len(),
            }
            .into());
        }
        self.mask = mask;
        Ok(self)
    }

    /// Subtract a fitted baseline from the derivative signal.
    pub fn baseline(&mut self, method: &BaselineMethod) -> EsrResult<&mut Self> {
        let fit = match method {
            BaselineMethod::Poly { order } => numerics::poly_baseline(
                &self.field_b,
                &self.signal_dabs,
                *order,
                self.mask.as_deref(),
            )?,
            BaselineMethod::Spline { knots, smoothing } => numerics::spline_baseline(
                &self.field_b,
                &self.signal_dabs,
                knots.as_deref(),
                *smoothing,
            )?,
        };
        self.replace_signal(fit.corrected);
        Ok(self)
    }

    /// Smooth the derivative signal.
    pub fn smooth(
        &mut self,
        method: SmoothingMethod,
        window: usize,
        polyorder: usize,
    ) -> EsrResult<&mut Self> {
        let smoothed = match method {
            SmoothingMethod::Savgol => {
                numerics::savgol_smooth(&self.signal_dabs, window, polyorder)?
            }
        };
        self.replace_signal(smoothed);
        Ok(self)
    }

    /// Rotate the derivative signal by `delta_rad` in the analytic plane.
    /// The applied angle accumulates in `meta.phase_rad`.
    pub fn phase_correct(&mut self, delta_rad: f64) -> EsrResult<&mut Self> {
        let rotated = numerics::rotate_phase(&self.signal_dabs, delta_rad)?;
        self.replace_signal(rotated);
        self.meta.phase_rad = Some(self.meta.phase_rad.unwrap_or(0.0) + delta_rad);
        Ok(self)
    }

    /// Search the default angle grid and apply the best correction.
    pub fn phase_auto(&mut self) -> EsrResult<&mut Self> {
        let delta = numerics::search_phase(&self.signal_dabs, PhaseSearchGrid::default())?;
        self.phase_correct(delta)
    }

    /// Integrate the derivative into the absorption spectrum.
    pub fn to_absorption(&mut self) -> EsrResult<&mut Self> {
        self.absorption = Some(numerics::integrate_absorption(
            &self.field_b,
            &self.signal_dabs,
        )?);
        Ok(self)
    }

    /// Area under the absorption curve, integrating first if needed.
    pub fn to_area(&mut self, roi: Option<(f64, f64)>) -> EsrResult<f64> {
        if self.absorption.is_none() {
            self.to_absorption()?;
        }
        let absorption = self
            .absorption
            .as_deref()
            .unwrap_or_default();
        Ok(numerics::integrate_area(&self.field_b, absorption, roi)?)
    }

    /// New spectrum restricted to `[bmin, bmax]` inclusive. Metadata is
    /// cloned; mask and absorption do not carry over.
    pub fn subset(&self, bmin: f64, bmax: f64) -> EsrResult<EsrSpectrum> {
        if !(bmin < bmax) || !bmin.is_finite() || !bmax.is_finite() {
            return Err(ProcessingError::InvalidRoi {
                min: bmin,
                max: bmax,
            }
            .into());
        }
        let mut field = Vec::new();
        let mut signal = Vec::new();
        for (index, &b) in self.field_b.iter().enumerate() {
            if b >= bmin && b <= bmax {
                field.push(b);
                signal.push(self.signal_dabs[index]);
            }
        }
        if field.len() < MIN_SPECTRUM_POINTS {
            return Err(EsrError::InsufficientData {
                rows: field.len(),
                minimum: MIN_SPECTRUM_POINTS,
            });
        }
        EsrSpectrum::new(field, signal, self.meta.clone())
    }

    fn replace_signal(&mut self, signal: Vec<f64>) {
        debug_assert_eq!(signal.len(), self.field_b.len());
        self.signal_dabs = signal;
        // Derived data no longer matches the derivative.
        self.absorption = None;
    }
}
