//! SafeTensors reading and writing.
//!
//! Checkpoints and pre-extracted dataset splits share one on-disk format.
//! Float tensors of any width are read back as `f32`; integer tensors are
//! read back as `i64` so class indices survive exactly.

use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// A named tensor loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTensor {
    /// Dimension sizes
    pub shape: Vec<usize>,
    /// Row-major data
    pub data: TensorData,
}

/// Tensor payload, as written or as read back.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    /// 32-bit float tensor
    F32(Vec<f32>),
    /// 64-bit integer tensor
    I64(Vec<i64>),
}

impl TensorData {
    fn dtype(&self) -> Dtype {
        match self {
            Self::F32(_) => Dtype::F32,
            Self::I64(_) => Dtype::I64,
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            Self::F32(v) => bytemuck::cast_slice(v),
            Self::I64(v) => bytemuck::cast_slice(v),
        }
    }

    /// Values as `f32`; integers are converted.
    pub fn into_f32(self) -> Vec<f32> {
        match self {
            Self::F32(v) => v,
            Self::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        }
    }
}

/// Load every tensor in a SafeTensors file.
pub fn read_tensors(path: impl AsRef<Path>) -> Result<HashMap<String, LoadedTensor>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| Error::io(format!("reading SafeTensors file: {}", path.display()), e))?;

    let tensors = SafeTensors::deserialize(&bytes).map_err(|e| Error::Serialization {
        message: format!("invalid SafeTensors file {}: {e}", path.display()),
    })?;

    let mut out = HashMap::new();
    for name in tensors.names() {
        let tensor = tensors.tensor(name).map_err(|e| Error::Serialization {
            message: format!("failed to read tensor '{name}': {e}"),
        })?;
        let data = decode(tensor.dtype(), tensor.data())
            .ok_or_else(|| Error::Serialization {
                message: format!("tensor '{name}' has unsupported dtype {:?}", tensor.dtype()),
            })?;
        out.insert(name.to_string(), LoadedTensor { shape: tensor.shape().to_vec(), data });
    }

    Ok(out)
}

// Buffers are copied out with `pod_collect_to_vec` since tensor data inside
// the file is not guaranteed to be aligned for the element type.
fn decode(dtype: Dtype, raw: &[u8]) -> Option<TensorData> {
    let data = match dtype {
        Dtype::F32 => TensorData::F32(bytemuck::pod_collect_to_vec::<u8, f32>(raw)),
        Dtype::F64 => TensorData::F32(
            bytemuck::pod_collect_to_vec::<u8, f64>(raw).into_iter().map(|v| v as f32).collect(),
        ),
        Dtype::F16 => TensorData::F32(
            bytemuck::pod_collect_to_vec::<u8, u16>(raw)
                .into_iter()
                .map(|h| half::f16::from_bits(h).to_f32())
                .collect(),
        ),
        Dtype::BF16 => TensorData::F32(
            bytemuck::pod_collect_to_vec::<u8, u16>(raw)
                .into_iter()
                .map(|b| half::bf16::from_bits(b).to_f32())
                .collect(),
        ),
        Dtype::I64 => TensorData::I64(bytemuck::pod_collect_to_vec::<u8, i64>(raw)),
        Dtype::I32 => TensorData::I64(
            bytemuck::pod_collect_to_vec::<u8, i32>(raw).into_iter().map(i64::from).collect(),
        ),
        Dtype::U8 => TensorData::I64(raw.iter().map(|&v| i64::from(v)).collect()),
        _ => return None,
    };
    Some(data)
}

/// Write named tensors to a SafeTensors file, creating parent directories.
pub fn write_tensors(
    path: impl AsRef<Path>,
    tensors: &[(String, Vec<usize>, TensorData)],
) -> Result<()> {
    let path = path.as_ref();

    let mut views = Vec::with_capacity(tensors.len());
    for (name, shape, data) in tensors {
        let view = TensorView::new(data.dtype(), shape.clone(), data.bytes()).map_err(|e| {
            Error::Serialization { message: format!("invalid tensor '{name}': {e}") }
        })?;
        views.push((name.as_str(), view));
    }

    let bytes = safetensors::serialize(views, None).map_err(|e| Error::Serialization {
        message: format!("SafeTensors serialization failed: {e}"),
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::io(format!("creating directory: {}", parent.display()), e))?;
    }
    std::fs::write(path, bytes)
        .map_err(|e| Error::io(format!("writing SafeTensors file: {}", path.display()), e))
}
