//! # Property Arrays
//!
//! Named, typed per-element attribute columns. Used to carry particle or
//! voxel attributes over to mesh vertices.

use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// Storage of a property column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyData {
    /// Integer values.
    Int(Vec<i64>),
    /// Floating-point values.
    Float(Vec<f64>),
}

/// A named column of `components` values per element.
///
/// # Example
///
/// ```rust
/// use surface_mesh::PropertyArray;
///
/// let mut temperature = PropertyArray::float("Temperature", 1, 2);
/// temperature.set_f64(1, 0, 300.0);
/// let mapped = temperature.mapped_copy(&[1, 1, 0]);
/// assert_eq!(mapped.len(), 3);
/// assert_eq!(mapped.get_f64(0, 0), 300.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyArray {
    name: String,
    components: usize,
    data: PropertyData,
}

impl PropertyArray {
    /// Creates a zero-initialized floating-point column.
    pub fn float(name: impl Into<String>, components: usize, len: usize) -> Self {
        Self {
            name: name.into(),
            components,
            data: PropertyData::Float(vec![0.0; components * len]),
        }
    }

    /// Creates a zero-initialized integer column.
    pub fn int(name: impl Into<String>, components: usize, len: usize) -> Self {
        Self {
            name: name.into(),
            components,
            data: PropertyData::Int(vec![0; components * len]),
        }
    }

    /// Wraps existing values. Fails if the value count is not a multiple of
    /// the component count.
    pub fn from_data(name: impl Into<String>, components: usize, data: PropertyData) -> Result<Self, MeshError> {
        let raw_len = match &data {
            PropertyData::Int(v) => v.len(),
            PropertyData::Float(v) => v.len(),
        };
        if components == 0 || raw_len % components != 0 {
            return Err(MeshError::invalid_property(format!(
                "{raw_len} values cannot be split into {components} components"
            )));
        }
        Ok(Self {
            name: name.into(),
            components,
            data,
        })
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a copy of this column under a different name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the number of components per element.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        let raw = match &self.data {
            PropertyData::Int(v) => v.len(),
            PropertyData::Float(v) => v.len(),
        };
        raw / self.components.max(1)
    }

    /// Returns true if the column has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true for floating-point columns.
    pub fn is_float(&self) -> bool {
        matches!(self.data, PropertyData::Float(_))
    }

    /// Returns the raw storage.
    pub fn data(&self) -> &PropertyData {
        &self.data
    }

    /// Returns the raw floating-point values, if this is a float column.
    pub fn float_values(&self) -> Option<&[f64]> {
        match &self.data {
            PropertyData::Float(v) => Some(v),
            PropertyData::Int(_) => None,
        }
    }

    /// Returns the raw floating-point values mutably, if this is a float column.
    pub fn float_values_mut(&mut self) -> Option<&mut [f64]> {
        match &mut self.data {
            PropertyData::Float(v) => Some(v),
            PropertyData::Int(_) => None,
        }
    }

    /// Returns one component of one element as f64.
    pub fn get_f64(&self, index: usize, component: usize) -> f64 {
        let i = index * self.components + component;
        match &self.data {
            PropertyData::Int(v) => v[i] as f64,
            PropertyData::Float(v) => v[i],
        }
    }

    /// Sets one component of one element (rounded for integer columns).
    pub fn set_f64(&mut self, index: usize, component: usize, value: f64) {
        let i = index * self.components + component;
        match &mut self.data {
            PropertyData::Int(v) => v[i] = value.round() as i64,
            PropertyData::Float(v) => v[i] = value,
        }
    }

    /// Builds a new column whose element `i` is element `map[i]` of this one.
    pub fn mapped_copy(&self, map: &[usize]) -> Self {
        let c = self.components;
        let data = match &self.data {
            PropertyData::Int(v) => PropertyData::Int(
                map.iter()
                    .flat_map(|&src| v[src * c..(src + 1) * c].iter().copied())
                    .collect(),
            ),
            PropertyData::Float(v) => PropertyData::Float(
                map.iter()
                    .flat_map(|&src| v[src * c..(src + 1) * c].iter().copied())
                    .collect(),
            ),
        };
        Self {
            name: self.name.clone(),
            components: c,
            data,
        }
    }

    /// Overwrites element `dst` with the values of element `src`.
    pub fn copy_element(&mut self, src: usize, dst: usize) {
        let c = self.components;
        match &mut self.data {
            PropertyData::Int(v) => v.copy_within(src * c..(src + 1) * c, dst * c),
            PropertyData::Float(v) => v.copy_within(src * c..(src + 1) * c, dst * c),
        }
    }

    /// Appends one zero-valued element.
    pub fn push_zero(&mut self) {
        let c = self.components;
        match &mut self.data {
            PropertyData::Int(v) => v.extend(std::iter::repeat(0).take(c)),
            PropertyData::Float(v) => v.extend(std::iter::repeat(0.0).take(c)),
        }
    }

    /// Keeps only the elements for which `keep` is true.
    pub fn retain(&mut self, keep: &[bool]) {
        let c = self.components;
        fn filter<T: Copy>(v: &[T], keep: &[bool], c: usize) -> Vec<T> {
            v.chunks(c)
                .zip(keep)
                .filter(|(_, &k)| k)
                .flat_map(|(chunk, _)| chunk.iter().copied())
                .collect()
        }
        self.data = match &self.data {
            PropertyData::Int(v) => PropertyData::Int(filter(v, keep, c)),
            PropertyData::Float(v) => PropertyData::Float(filter(v, keep, c)),
        };
    }
}
