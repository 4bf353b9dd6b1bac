use std::collections::BTreeMap;

use serde::Serialize;

/// Integer flag: 1 while the exposure curve should be applied, 0 otherwise.
pub const EXPOSURE_ADJUSTMENT_ENABLED: &str = "_ToonEvAdjustmentCurve";
/// Float array holding the resampled exposure curve.
pub const EXPOSURE_VALUE_ARRAY: &str = "_ToonEvAdjustmentValueArray";
pub const EXPOSURE_VALUE_MIN: &str = "_ToonEvAdjustmentValueMin";
pub const EXPOSURE_VALUE_MAX: &str = "_ToonEvAdjustmentValueMax";

/// A value stored in the global shader state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ShaderValue {
    Int(i32),
    Float(f32),
    FloatArray(Vec<f32>),
}

/// Process-wide shader state the renderer reads every frame.
pub trait ShaderGlobals {
    fn publish(&mut self, name: &str, value: ShaderValue);
}

impl<T: ShaderGlobals + ?Sized> ShaderGlobals for &mut T {
    fn publish(&mut self, name: &str, value: ShaderValue) {
        (**self).publish(name, value);
    }
}

impl<T: ShaderGlobals + ?Sized> ShaderGlobals for Box<T> {
    fn publish(&mut self, name: &str, value: ShaderValue) {
        (**self).publish(name, value);
    }
}

/// In-memory key/value sink that remembers the latest value per key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GlobalTable {
    values: BTreeMap<String, ShaderValue>,
    publish_count: u64,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ShaderValue> {
        self.values.get(name)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.values.get(name)? {
            ShaderValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.values.get(name)? {
            ShaderValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn float_array(&self, name: &str) -> Option<&[f32]> {
        match self.values.get(name)? {
            ShaderValue::FloatArray(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Total number of writes since creation, including overwrites.
    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ShaderGlobals for GlobalTable {
    fn publish(&mut self, name: &str, value: ShaderValue) {
        self.publish_count = self.publish_count.saturating_add(1);
        self.values.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_latest_value_per_key() {
        let mut table = GlobalTable::new();
        table.publish(EXPOSURE_ADJUSTMENT_ENABLED, ShaderValue::Int(1));
        table.publish(EXPOSURE_ADJUSTMENT_ENABLED, ShaderValue::Int(0));
        table.publish(EXPOSURE_VALUE_MIN, ShaderValue::Float(-2.0));

        assert_eq!(table.int(EXPOSURE_ADJUSTMENT_ENABLED), Some(0));
        assert_eq!(table.float(EXPOSURE_VALUE_MIN), Some(-2.0));
        assert_eq!(table.float(EXPOSURE_ADJUSTMENT_ENABLED), None);
        assert_eq!(table.publish_count(), 3);
    }

    #[test]
    fn publishes_through_mutable_reference() {
        fn write(mut sink: impl ShaderGlobals) {
            sink.publish(EXPOSURE_VALUE_ARRAY, ShaderValue::FloatArray(vec![1.0, 2.0]));
        }

        let mut table = GlobalTable::new();
        write(&mut table);
        assert_eq!(table.float_array(EXPOSURE_VALUE_ARRAY), Some(&[1.0, 2.0][..]));
    }
}
