//! Lifecycle-driven publisher for the exposure adjustment globals.
//!
//! ```text
//!                 on_activate / tick (host safe)
//!   Uninitialized ─────────────────────────────▶ Active ──┐ tick: resample + publish
//!        ▲  ▲                                      │  ▲    │
//!        │  │ resume (host safe again)     suspend │  └────┘
//!        │  └──────────────── Suspended ◀──────────┘
//!        │                        │
//!        └──── on_deactivate ─────┘ (from any state)
//! ```
//!
//! Suspension forces the enabled flag to 0 immediately so the renderer never keeps applying a
//! curve while the host is rebuilding its pipeline. Resuming only clears the suspension; the next
//! regular tick reallocates and republishes.

use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::globals::{
    ShaderGlobals, ShaderValue, EXPOSURE_ADJUSTMENT_ENABLED, EXPOSURE_VALUE_ARRAY,
    EXPOSURE_VALUE_MAX, EXPOSURE_VALUE_MIN,
};
use crate::host::{HostProbe, NeverUnsafe};
use crate::resample::SampleTable;

/// How the toon shader should adjust exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentMode {
    #[default]
    #[serde(alias = "none")]
    NoAdjustment,
    /// EV changes follow the configured curve.
    #[serde(alias = "curve")]
    CurveAdjustment,
}

/// User-facing configuration, independent of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdjustmentSettings {
    #[serde(default)]
    pub mode: AdjustmentMode,
    #[serde(default)]
    pub enabled: bool,
}

impl AdjustmentSettings {
    pub fn curve(enabled: bool) -> Self {
        Self {
            mode: AdjustmentMode::CurveAdjustment,
            enabled,
        }
    }

    /// Value of the enabled flag published on an active tick.
    pub fn published_flag(&self) -> i32 {
        i32::from(self.enabled && self.mode == AdjustmentMode::CurveAdjustment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// No table allocated and nothing published.
    Uninitialized,
    /// Table allocated; every tick resamples and publishes.
    Active,
    /// Host is in an unsafe window; table released and the enabled flag forced to 0.
    Suspended,
}

/// What a single [`AdjustmentPublisher::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// Host unsafe before first activation; nothing allocated or published.
    Deferred,
    Published,
    /// Not active; published globals left untouched.
    Skipped,
    /// Host entered an unsafe window during this tick.
    Suspended,
    /// Host left an unsafe window; republishing waits for the next tick.
    Resumed,
}

pub struct AdjustmentPublisher<S, H = NeverUnsafe> {
    sink: S,
    host: H,
    settings: AdjustmentSettings,
    lifecycle: Lifecycle,
    table: Option<SampleTable>,
    host_unsafe: bool,
}

impl<S: ShaderGlobals> AdjustmentPublisher<S, NeverUnsafe> {
    /// Publisher for hosts without an unsafe window.
    pub fn without_host(sink: S, settings: AdjustmentSettings) -> Self {
        Self::new(sink, NeverUnsafe, settings)
    }
}

impl<S: ShaderGlobals, H: HostProbe> AdjustmentPublisher<S, H> {
    pub fn new(sink: S, host: H, settings: AdjustmentSettings) -> Self {
        Self {
            sink,
            host,
            settings,
            lifecycle: Lifecycle::Uninitialized,
            table: None,
            host_unsafe: false,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The last computed table, present only while active.
    pub fn table(&self) -> Option<&SampleTable> {
        self.table.as_ref()
    }

    pub fn settings(&self) -> AdjustmentSettings {
        self.settings
    }

    /// Takes effect on the next published tick.
    pub fn set_settings(&mut self, settings: AdjustmentSettings) {
        self.settings = settings;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs one host frame: activates if possible, reacts to the host state, then resamples
    /// `curve` and publishes the four exposure globals.
    ///
    /// The host state is checked before resampling, so a tick that finds the host unsafe
    /// suspends without touching `curve` or publishing a fresh table.
    pub fn tick<C: Curve + ?Sized>(&mut self, curve: &C) -> TickOutcome {
        let host_unsafe = self.host.is_unsafe();

        if self.lifecycle == Lifecycle::Uninitialized {
            if host_unsafe {
                tracing::debug!("host unsafe before initialisation; deferring");
                return TickOutcome::Deferred;
            }
            self.activate();
        }

        if host_unsafe {
            self.host_unsafe = true;
            if self.lifecycle == Lifecycle::Active {
                self.suspend();
                return TickOutcome::Suspended;
            }
        } else if self.host_unsafe {
            self.resume();
            return TickOutcome::Resumed;
        }

        if self.lifecycle != Lifecycle::Active {
            return TickOutcome::Skipped;
        }

        let table = self.table.get_or_insert_with(SampleTable::default);
        table.resample_into(curve);
        let samples = table.samples().to_vec();
        let (min_time, max_time) = (table.min_time(), table.max_time());

        self.sink.publish(EXPOSURE_VALUE_ARRAY, ShaderValue::FloatArray(samples));
        self.sink.publish(EXPOSURE_VALUE_MIN, ShaderValue::Float(min_time));
        self.sink.publish(EXPOSURE_VALUE_MAX, ShaderValue::Float(max_time));
        self.sink.publish(
            EXPOSURE_ADJUSTMENT_ENABLED,
            ShaderValue::Int(self.settings.published_flag()),
        );
        tracing::trace!(min_time, max_time, "published exposure curve");
        TickOutcome::Published
    }

    /// Releases the table and forces the enabled flag to 0.
    ///
    /// Repeated calls republish the disabled flag and are otherwise no-ops.
    pub fn suspend(&mut self) {
        if self.lifecycle == Lifecycle::Active {
            self.table = None;
            self.lifecycle = Lifecycle::Suspended;
            tracing::info!("suspending exposure adjustment");
        }
        self.sink.publish(EXPOSURE_ADJUSTMENT_ENABLED, ShaderValue::Int(0));
    }

    /// Clears a suspension without republishing; the next tick reactivates.
    pub fn resume(&mut self) {
        self.host_unsafe = false;
        if self.lifecycle == Lifecycle::Suspended {
            self.lifecycle = Lifecycle::Uninitialized;
            tracing::info!("exposure adjustment resumed; republishing on next tick");
        }
    }

    /// Host enabled the owning component.
    pub fn on_activate(&mut self) {
        if self.lifecycle != Lifecycle::Uninitialized {
            return;
        }
        if self.host.is_unsafe() {
            tracing::debug!("host unsafe during activation; deferring");
            return;
        }
        self.activate();
    }

    /// Host disabled the owning component; tears everything down.
    pub fn on_deactivate(&mut self) {
        self.suspend();
        self.table = None;
        self.lifecycle = Lifecycle::Uninitialized;
        self.host_unsafe = false;
        tracing::debug!("exposure adjustment deactivated");
    }

    fn activate(&mut self) {
        self.table = Some(SampleTable::default());
        self.lifecycle = Lifecycle::Active;
        self.host_unsafe = self.host.is_unsafe();
        tracing::debug!("exposure adjustment initialised");
    }
}
