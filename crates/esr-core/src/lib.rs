//! Core library for ESR spectrometer data: heuristic file ingestion into a
//! canonical spectrum, the numerical processing pipeline operating on it, and
//! the pure physics conversions applied to derived scalars.

pub mod common;
pub mod domain;
pub mod ingest;
pub mod numerics;
pub mod physics;
pub mod spectrum;

pub use common::units::FieldUnit;
pub use domain::{
    CollectingSink, DiagnosticEvent, DiagnosticSink, EsrError, EsrResult, NullSink, UnitSource,
};
pub use ingest::{AxisOverride, AxisResolution, LoadOutcome, load, load_any};
pub use spectrum::{BaselineMethod, EsrMeta, EsrSpectrum, SmoothingMethod};
