//! Unit conversions between instrument conventions and SI.
//!
//! The field axis is always carried in tesla internally; these helpers convert
//! at the ingestion boundary and back out for display.

use serde::{Deserialize, Serialize};

/// Magnetic-field unit token as it appears in column headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldUnit {
    Tesla,
    Millitesla,
    Gauss,
}

impl FieldUnit {
    /// Factor converting a value in this unit into tesla.
    pub const fn to_tesla_factor(self) -> f64 {
        match self {
            Self::Tesla => 1.0,
            Self::Millitesla => 1.0e-3,
            Self::Gauss => 1.0e-4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tesla => "T",
            Self::Millitesla => "mT",
            Self::Gauss => "G",
        }
    }

    /// Match a bare token (`mT`, `G`, `T`), case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        if trimmed.eq_ignore_ascii_case("mt") {
            Some(Self::Millitesla)
        } else if trimmed.eq_ignore_ascii_case("g") {
            Some(Self::Gauss)
        } else if trimmed.eq_ignore_ascii_case("t") {
            Some(Self::Tesla)
        } else {
            None
        }
    }
}

pub fn mt_to_t(millitesla: f64) -> f64 {
    millitesla * 1.0e-3
}

pub fn t_to_mt(tesla: f64) -> f64 {
    tesla * 1.0e3
}

pub fn gauss_to_t(gauss: f64) -> f64 {
    gauss * 1.0e-4
}

pub fn t_to_gauss(tesla: f64) -> f64 {
    tesla * 1.0e4
}

pub fn ghz_to_hz(gigahertz: f64) -> f64 {
    gigahertz * 1.0e9
}

pub fn hz_to_ghz(hertz: f64) -> f64 {
    hertz / 1.0e9
}

pub fn mw_to_w(milliwatt: f64) -> f64 {
    milliwatt * 1.0e-3
}

pub fn w_to_mw(watt: f64) -> f64 {
    watt * 1.0e3
}

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + 273.15
}
