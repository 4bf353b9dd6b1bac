use std::thread;
use std::time::Duration;

use evconfig::{EvConfig, HostEvent, HostEventKind};
use evcurve::{
    AdjustmentPublisher, AnimationCurve, GlobalTable, HostFlag, HostProbe, Lifecycle,
    ShaderGlobals, ShaderValue, TickOutcome, UniformSink, EXPOSURE_ADJUSTMENT_ENABLED,
};
use serde::Serialize;

/// Global shader state as the simulated renderer sees it: a readable table plus the uniform
/// block that would be uploaded to the GPU.
#[derive(Debug, Default)]
pub struct HostGlobals {
    table: GlobalTable,
    uniforms: UniformSink,
}

impl HostGlobals {
    pub fn table(&self) -> &GlobalTable {
        &self.table
    }
}

impl ShaderGlobals for HostGlobals {
    fn publish(&mut self, name: &str, value: ShaderValue) {
        self.uniforms.publish(name, value.clone());
        self.table.publish(name, value);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    pub frame: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<HostEventKind>,
    /// `None` while the component is disabled and the host does not tick it.
    pub outcome: Option<TickOutcome>,
    pub lifecycle: Lifecycle,
    pub host_unsafe: bool,
    pub enabled_flag: Option<i32>,
    pub uploaded: bool,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub frames: Vec<FrameRecord>,
    pub uniform_uploads: u32,
    pub globals: GlobalTable,
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationOptions {
    pub frames: u32,
    /// Sleep this long between frames; `None` runs flat out.
    pub pace: Option<Duration>,
}

impl SimulationOptions {
    pub fn from_config(config: &EvConfig) -> Self {
        Self {
            frames: config.host.frames,
            pace: None,
        }
    }
}

/// Drives an [`AdjustmentPublisher`] the way an editor host would: one tick per frame while the
/// component is enabled, with timeline events applied at the start of their frame.
pub struct Simulation {
    publisher: AdjustmentPublisher<HostGlobals, HostFlag>,
    flag: HostFlag,
    curve: AnimationCurve,
    timeline: Vec<HostEvent>,
    cursor: usize,
    component_enabled: bool,
    uniform_uploads: u32,
}

impl Simulation {
    pub fn new(config: &EvConfig) -> Self {
        let flag = HostFlag::new();
        let publisher =
            AdjustmentPublisher::new(HostGlobals::default(), flag.clone(), config.settings());
        Self {
            publisher,
            flag,
            curve: config.curve(),
            timeline: with_implicit_activation(config.timeline()),
            cursor: 0,
            component_enabled: false,
            uniform_uploads: 0,
        }
    }

    pub fn step(&mut self, frame: u32) -> FrameRecord {
        let mut events = Vec::new();
        while let Some(event) = self.timeline.get(self.cursor).copied() {
            if event.frame > frame {
                break;
            }
            self.cursor += 1;
            if event.frame < frame {
                continue;
            }
            self.apply(event.event);
            events.push(event.event);
        }

        let outcome = if self.component_enabled {
            Some(self.publisher.tick(&self.curve))
        } else {
            None
        };
        let uploaded = self.publisher.sink_mut().uniforms.take_dirty();
        if uploaded {
            self.uniform_uploads += 1;
        }

        let table = self.publisher.sink().table();
        FrameRecord {
            frame,
            events,
            outcome,
            lifecycle: self.publisher.lifecycle(),
            host_unsafe: self.publisher.host().is_unsafe(),
            enabled_flag: table.int(EXPOSURE_ADJUSTMENT_ENABLED),
            uploaded,
        }
    }

    pub fn run(mut self, options: SimulationOptions) -> SimulationReport {
        let mut frames = Vec::with_capacity(options.frames as usize);
        for frame in 0..options.frames {
            let record = self.step(frame);
            tracing::debug!(
                frame,
                outcome = ?record.outcome,
                lifecycle = ?record.lifecycle,
                "simulated host frame"
            );
            frames.push(record);
            if let Some(pace) = options.pace {
                thread::sleep(pace);
            }
        }

        let skipped_events = self.timeline.len().saturating_sub(self.cursor);
        if skipped_events > 0 {
            tracing::warn!(
                skipped_events,
                frames = options.frames,
                "timeline events scheduled beyond the simulated frames were not applied"
            );
        }

        SimulationReport {
            frames,
            uniform_uploads: self.uniform_uploads,
            globals: self.publisher.into_sink().table,
        }
    }

    fn apply(&mut self, event: HostEventKind) {
        tracing::debug!(%event, "host event");
        match event {
            HostEventKind::Activate => {
                self.component_enabled = true;
                self.publisher.on_activate();
            }
            HostEventKind::Deactivate => {
                self.component_enabled = false;
                self.publisher.on_deactivate();
            }
            HostEventKind::RecompileBegin => self.flag.begin_recompile(),
            HostEventKind::RecompileEnd => self.flag.end_recompile(),
        }
    }
}

/// Enables the component on frame 0 after any other frame-0 events, unless the timeline
/// already does. Expects `timeline` sorted by frame.
fn with_implicit_activation(mut timeline: Vec<HostEvent>) -> Vec<HostEvent> {
    let frame_zero = timeline.partition_point(|event| event.frame == 0);
    let explicit = timeline[..frame_zero]
        .iter()
        .any(|event| event.event == HostEventKind::Activate);
    if !explicit {
        timeline.insert(
            frame_zero,
            HostEvent {
                frame: 0,
                event: HostEventKind::Activate,
            },
        );
    }
    timeline
}
