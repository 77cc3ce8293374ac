// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input.rs - 信号输入
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use thiserror::Error;

#[cfg(feature = "features_file")]
mod features_file;
#[cfg(feature = "features_file")]
pub use self::features_file::{FeaturesFileInput, FeaturesFileInputError, parse_features};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignalError {
  #[error("Signal read out of bounds: offset {offset} + length {length} > total {total}")]
  OutOfBounds {
    offset: usize,
    length: usize,
    total: usize,
  },
}

/// 推理引擎消费的原始输入缓冲区
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
  features: Box<[f32]>,
}

impl From<Vec<f32>> for Signal {
  fn from(features: Vec<f32>) -> Self {
    Self {
      features: features.into_boxed_slice(),
    }
  }
}

impl Signal {
  pub fn total_length(&self) -> usize {
    self.features.len()
  }

  /// 从 `offset` 开始拷贝 `out.len()` 个样本
  pub fn get_data(&self, offset: usize, out: &mut [f32]) -> Result<(), SignalError> {
    let end = offset
      .checked_add(out.len())
      .filter(|end| *end <= self.features.len())
      .ok_or(SignalError::OutOfBounds {
        offset,
        length: out.len(),
        total: self.features.len(),
      })?;
    out.copy_from_slice(&self.features[offset..end]);
    Ok(())
  }
}
