use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use evcurve::{
    AdjustmentMode, AdjustmentSettings, AnimationCurve, Curve, Keyframe,
    ADJUSTMENT_CURVE_PRECISION,
};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvConfig {
    pub version: u32,
    #[serde(default)]
    pub exposure: Exposure,
    #[serde(default)]
    pub host: Host,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Exposure {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub mode: AdjustmentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<usize>,
    /// `None` selects the default identity curve; an empty list is a valid, degenerate curve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<KeySpec>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct KeySpec {
    pub time: f32,
    pub value: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_tangent: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_tangent: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Host {
    #[serde(
        default = "default_frame_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub frame_interval: Duration,
    #[serde(default = "default_frames")]
    pub frames: u32,
    #[serde(default)]
    pub events: Vec<HostEvent>,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            frame_interval: default_frame_interval(),
            frames: default_frames(),
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostEvent {
    pub frame: u32,
    pub event: HostEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEventKind {
    Activate,
    Deactivate,
    RecompileBegin,
    RecompileEnd,
}

impl fmt::Display for HostEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::RecompileBegin => "recompile_begin",
            Self::RecompileEnd => "recompile_end",
        };
        f.write_str(label)
    }
}

fn default_frame_interval() -> Duration {
    Duration::from_millis(16)
}

fn default_frames() -> u32 {
    60
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

impl Default for EvConfig {
    fn default() -> Self {
        Self {
            version: 1,
            exposure: Exposure::default(),
            host: Host::default(),
        }
    }
}

impl EvConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: EvConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn settings(&self) -> AdjustmentSettings {
        AdjustmentSettings {
            mode: self.exposure.mode,
            enabled: self.exposure.enabled,
        }
    }

    /// Builds the configured curve; keys without explicit tangents get slopes from their
    /// neighbours.
    pub fn curve(&self) -> AnimationCurve {
        let Some(keys) = &self.exposure.keys else {
            return AnimationCurve::default_exposure();
        };

        let points: Vec<(f32, f32)> = keys.iter().map(|key| (key.time, key.value)).collect();
        let derived = AnimationCurve::from_points(&points);
        let keyframes = keys
            .iter()
            .zip(derived.keys())
            .map(|(spec, base)| {
                Keyframe::with_tangents(
                    spec.time,
                    spec.value,
                    spec.in_tangent.unwrap_or(base.in_tangent),
                    spec.out_tangent.unwrap_or(base.out_tangent),
                )
            })
            .collect();
        AnimationCurve::new(keyframes)
    }

    /// Host events ordered by frame; events on the same frame keep their declared order.
    pub fn timeline(&self) -> Vec<HostEvent> {
        let mut events = self.host.events.clone();
        events.sort_by_key(|event| event.frame);
        events
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if let Some(precision) = self.exposure.precision {
            if precision != ADJUSTMENT_CURVE_PRECISION {
                return Err(ConfigError::Invalid(format!(
                    "exposure.precision must be {ADJUSTMENT_CURVE_PRECISION}, got {precision}"
                )));
            }
        }

        if let Some(keys) = &self.exposure.keys {
            for (index, key) in keys.iter().enumerate() {
                if !key.time.is_finite() || !key.value.is_finite() {
                    return Err(ConfigError::Invalid(format!(
                        "exposure key {index} must have a finite time and value"
                    )));
                }
                let nan_tangent = key.in_tangent.is_some_and(f32::is_nan)
                    || key.out_tangent.is_some_and(f32::is_nan);
                if nan_tangent {
                    return Err(ConfigError::Invalid(format!(
                        "exposure key {index} has a NaN tangent"
                    )));
                }
            }

            if let Some(index) = keys.windows(2).position(|pair| pair[1].time < pair[0].time) {
                return Err(ConfigError::Invalid(format!(
                    "exposure key {} at time {} precedes key {} at time {}; keys must be sorted by time",
                    index + 1,
                    keys[index + 1].time,
                    index,
                    keys[index].time
                )));
            }
        }

        if self.host.frames == 0 {
            return Err(ConfigError::Invalid(
                "host.frames must be greater than zero".into(),
            ));
        }

        for event in &self.host.events {
            if event.frame >= self.host.frames {
                return Err(ConfigError::Invalid(format!(
                    "host event '{}' at frame {} is outside the {} simulated frames",
                    event.event, event.frame, self.host.frames
                )));
            }
        }

        Ok(())
    }
}
