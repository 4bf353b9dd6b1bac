use bytemuck::{Pod, Zeroable};

use crate::globals::{
    ShaderGlobals, ShaderValue, EXPOSURE_ADJUSTMENT_ENABLED, EXPOSURE_VALUE_ARRAY,
    EXPOSURE_VALUE_MAX, EXPOSURE_VALUE_MIN,
};
use crate::resample::ADJUSTMENT_CURVE_PRECISION;

const PACKED_VECTORS: usize = ADJUSTMENT_CURVE_PRECISION / 4;

/// std140 layout of the exposure globals; 128 samples packed four per `vec4`.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExposureUniforms {
    pub values: [[f32; 4]; PACKED_VECTORS],
    pub min: f32,
    pub max: f32,
    pub enabled: i32,
    pub padding: f32,
}

unsafe impl Zeroable for ExposureUniforms {}
unsafe impl Pod for ExposureUniforms {}

impl Default for ExposureUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl ExposureUniforms {
    pub fn sample(&self, index: usize) -> Option<f32> {
        self.values.get(index / 4).map(|packed| packed[index % 4])
    }

    pub fn set_samples(&mut self, samples: &[f32]) {
        let mut source = samples.iter().copied();
        for slot in self.values.iter_mut().flatten() {
            *slot = source.next().unwrap_or(0.0);
        }
    }
}

/// Sink that writes the exposure globals into a uniform block ready for upload.
#[derive(Debug, Default)]
pub struct UniformSink {
    block: ExposureUniforms,
    dirty: bool,
}

impl UniformSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self) -> &ExposureUniforms {
        &self.block
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.block)
    }

    /// Returns whether the block changed since the last call and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl ShaderGlobals for UniformSink {
    fn publish(&mut self, name: &str, value: ShaderValue) {
        match (name, value) {
            (EXPOSURE_ADJUSTMENT_ENABLED, ShaderValue::Int(enabled)) => self.block.enabled = enabled,
            (EXPOSURE_VALUE_ARRAY, ShaderValue::FloatArray(samples)) => {
                if samples.len() > ADJUSTMENT_CURVE_PRECISION {
                    tracing::debug!(
                        len = samples.len(),
                        "truncating exposure array to uniform capacity"
                    );
                }
                self.block.set_samples(&samples);
            }
            (EXPOSURE_VALUE_MIN, ShaderValue::Float(min)) => self.block.min = min,
            (EXPOSURE_VALUE_MAX, ShaderValue::Float(max)) => self.block.max = max,
            (other, value) => {
                tracing::debug!(name = other, ?value, "ignoring unknown shader global");
                return;
            }
        }
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_matches_std140_size() {
        assert_eq!(std::mem::size_of::<ExposureUniforms>(), 528);
        assert_eq!(std::mem::align_of::<ExposureUniforms>(), 16);
        assert_eq!(UniformSink::new().as_bytes().len(), 528);
    }

    #[test]
    fn packs_samples_four_per_vector() {
        let mut sink = UniformSink::new();
        let samples: Vec<f32> = (0..ADJUSTMENT_CURVE_PRECISION).map(|i| i as f32).collect();
        sink.publish(EXPOSURE_VALUE_ARRAY, ShaderValue::FloatArray(samples));
        assert_eq!(sink.block().values[0], [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(sink.block().sample(127), Some(127.0));
        assert_eq!(sink.block().sample(128), None);
    }

    #[test]
    fn short_arrays_zero_fill() {
        let mut sink = UniformSink::new();
        sink.publish(EXPOSURE_VALUE_ARRAY, ShaderValue::FloatArray(vec![9.0; 128]));
        sink.publish(EXPOSURE_VALUE_ARRAY, ShaderValue::FloatArray(vec![1.0, 2.0]));
        assert_eq!(sink.block().values[0], [1.0, 2.0, 0.0, 0.0]);
        assert_eq!(sink.block().sample(100), Some(0.0));
    }

    #[test]
    fn tracks_dirty_state() {
        let mut sink = UniformSink::new();
        assert!(!sink.take_dirty());
        sink.publish(EXPOSURE_ADJUSTMENT_ENABLED, ShaderValue::Int(1));
        sink.publish(EXPOSURE_VALUE_MIN, ShaderValue::Float(-4.0));
        assert!(sink.take_dirty());
        assert!(!sink.take_dirty());
        assert_eq!(sink.block().enabled, 1);
        assert_eq!(sink.block().min, -4.0);
    }

    #[test]
    fn ignores_unknown_keys() {
        let mut sink = UniformSink::new();
        sink.publish("_Unrelated", ShaderValue::Float(3.0));
        sink.publish(EXPOSURE_VALUE_MIN, ShaderValue::Int(3));
        assert!(!sink.take_dirty());
        assert_eq!(*sink.block(), ExposureUniforms::default());
    }
}
