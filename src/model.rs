// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 模型描述与推理引擎边界
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::{Signal, SignalError};
use crate::result::InferenceResult;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DescriptorError {
  #[error("异常检测类型 {0} 为保留值")]
  ReservedAnomalyKind(u8),
  #[error("未知的异常检测类型: {0}")]
  UnknownAnomalyKind(u8),
  #[error("标签数量不匹配: label_count = {label_count}, categories = {categories}")]
  LabelCountMismatch { label_count: usize, categories: usize },
}

/// 异常检测类型，数值与推理引擎保持一致，不可重新编号
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum AnomalyKind {
  #[default]
  None = 0,
  Scalar = 1,
  // 2 保留
  Visual = 3,
}

impl AnomalyKind {
  pub fn is_present(self) -> bool {
    self != AnomalyKind::None
  }
}

impl TryFrom<u8> for AnomalyKind {
  type Error = DescriptorError;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(AnomalyKind::None),
      1 => Ok(AnomalyKind::Scalar),
      2 => Err(DescriptorError::ReservedAnomalyKind(value)),
      3 => Ok(AnomalyKind::Visual),
      _ => Err(DescriptorError::UnknownAnomalyKind(value)),
    }
  }
}

impl From<AnomalyKind> for u8 {
  fn from(kind: AnomalyKind) -> Self {
    kind as u8
  }
}

/// Impulse 的静态描述，启动时构造一次，之后只以引用传递
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub project_id: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deploy_version: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  pub label_count: usize,
  pub categories: Vec<String>,
  #[serde(default)]
  pub object_detection_count: usize,
  #[serde(default)]
  pub has_anomaly: AnomalyKind,
  /// DSP 输入帧长度；缺省时不检查信号长度
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dsp_input_frame_size: Option<usize>,
}

impl ModelDescriptor {
  pub fn validate(&self) -> Result<(), DescriptorError> {
    if self.categories.len() != self.label_count {
      return Err(DescriptorError::LabelCountMismatch {
        label_count: self.label_count,
        categories: self.categories.len(),
      });
    }
    Ok(())
  }

  pub fn is_object_detection(&self) -> bool {
    self.object_detection_count > 0
  }
}

/// 推理引擎返回码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ImpulseStatus {
  Ok,
  ShapesDontMatch,
  Canceled,
  TfliteError,
  DspError,
  TfliteArenaAllocFailed,
  AllocFailed,
  Other(i32),
}

impl From<i32> for ImpulseStatus {
  fn from(code: i32) -> Self {
    match code {
      0 => ImpulseStatus::Ok,
      -1 => ImpulseStatus::ShapesDontMatch,
      -2 => ImpulseStatus::Canceled,
      -3 => ImpulseStatus::TfliteError,
      -5 => ImpulseStatus::DspError,
      -6 => ImpulseStatus::TfliteArenaAllocFailed,
      -8 => ImpulseStatus::AllocFailed,
      other => ImpulseStatus::Other(other),
    }
  }
}

impl From<ImpulseStatus> for i32 {
  fn from(status: ImpulseStatus) -> Self {
    match status {
      ImpulseStatus::Ok => 0,
      ImpulseStatus::ShapesDontMatch => -1,
      ImpulseStatus::Canceled => -2,
      ImpulseStatus::TfliteError => -3,
      ImpulseStatus::DspError => -5,
      ImpulseStatus::TfliteArenaAllocFailed => -6,
      ImpulseStatus::AllocFailed => -8,
      ImpulseStatus::Other(code) => code,
    }
  }
}

impl fmt::Display for ImpulseStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", i32::from(*self))
  }
}

#[derive(Error, Debug)]
pub enum ImpulseError {
  #[error("推理引擎返回错误码: {0}")]
  Status(ImpulseStatus),
  #[error("信号读取错误: {0}")]
  Signal(#[from] SignalError),
}

impl ImpulseError {
  pub fn status(&self) -> ImpulseStatus {
    match self {
      ImpulseError::Status(status) => *status,
      ImpulseError::Signal(_) => ImpulseStatus::DspError,
    }
  }
}

/// 推理引擎入口
pub trait Impulse {
  fn descriptor(&self) -> &ModelDescriptor;
  fn process(&self, signal: &Signal, debug: bool) -> Result<InferenceResult, ImpulseError>;
}

impl<T: Impulse + ?Sized> Impulse for Box<T> {
  fn descriptor(&self) -> &ModelDescriptor {
    (**self).descriptor()
  }

  fn process(&self, signal: &Signal, debug: bool) -> Result<InferenceResult, ImpulseError> {
    (**self).process(signal, debug)
  }
}

#[cfg(feature = "model_recorded")]
mod recorded;
#[cfg(feature = "model_recorded")]
pub use self::recorded::{RecordedImpulse, RecordedImpulseBuilder, RecordedImpulseError};
