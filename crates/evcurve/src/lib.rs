//! Exposure adjustment curves for the toon shader.
//!
//! A user-authored [`AnimationCurve`] remaps scene EV to the EV the shader should use. Every host
//! frame the [`AdjustmentPublisher`] resamples it into a 128-entry lookup table and writes four
//! globals into a [`ShaderGlobals`] sink:
//!
//! ```text
//!   host frame ─▶ AdjustmentPublisher::tick ─▶ resample() ─▶ SampleTable
//!                        │                                      │
//!                        │ HostProbe (recompiling?)             ▼
//!                        └──────────▶ suspend / resume    ShaderGlobals::publish
//!                                                         (_ToonEvAdjustment*)
//! ```
//!
//! The sink is injected, so the same publisher drives an in-memory [`GlobalTable`] in tests and
//! the std140 [`UniformSink`] a renderer uploads from.

pub mod curve;
pub mod globals;
pub mod host;
pub mod publisher;
pub mod resample;
pub mod uniforms;

pub use curve::{AnimationCurve, Curve, Keyframe};
pub use globals::{
    GlobalTable, ShaderGlobals, ShaderValue, EXPOSURE_ADJUSTMENT_ENABLED,
    EXPOSURE_VALUE_ARRAY, EXPOSURE_VALUE_MAX, EXPOSURE_VALUE_MIN,
};
pub use host::{HostFlag, HostProbe, NeverUnsafe};
pub use publisher::{
    AdjustmentMode, AdjustmentPublisher, AdjustmentSettings, Lifecycle, TickOutcome,
};
pub use resample::{resample, SampleTable, ADJUSTMENT_CURVE_PRECISION};
pub use uniforms::{ExposureUniforms, UniformSink};
