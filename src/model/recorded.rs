// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/recorded.rs - 回放式推理引擎
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::Signal,
  model::{DescriptorError, Impulse, ImpulseError, ImpulseStatus, ModelDescriptor},
  result::InferenceResult,
};

/// 每次从信号读取的样本数
const SIGNAL_CHUNK_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum RecordedImpulseError {
  #[error("模型路径必须使用 {} 方案", RecordedImpulseBuilder::SCHEME)]
  SchemeMismatch,
  #[error("模型文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("模型文件解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("模型描述无效: {0}")]
  DescriptorError(#[from] DescriptorError),
}

#[derive(Debug, Deserialize)]
struct RecordedFile {
  descriptor: ModelDescriptor,
  #[serde(default)]
  result: InferenceResult,
  #[serde(default = "ok_status")]
  status: ImpulseStatus,
}

fn ok_status() -> ImpulseStatus {
  ImpulseStatus::Ok
}

/// 以录制好的结果代替真实推理的引擎，读取信号的方式与真实引擎一致
#[derive(Debug, Clone)]
pub struct RecordedImpulse {
  descriptor: ModelDescriptor,
  result: InferenceResult,
  status: ImpulseStatus,
}

impl RecordedImpulse {
  pub fn new(descriptor: ModelDescriptor, result: InferenceResult) -> Self {
    Self {
      descriptor,
      result,
      status: ImpulseStatus::Ok,
    }
  }

  pub fn with_status(mut self, status: ImpulseStatus) -> Self {
    self.status = status;
    self
  }
}

pub struct RecordedImpulseBuilder {
  model_path: String,
}

impl FromUrlWithScheme for RecordedImpulseBuilder {
  const SCHEME: &'static str = "impulse";
}

impl FromUrl for RecordedImpulseBuilder {
  type Error = RecordedImpulseError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(RecordedImpulseError::SchemeMismatch);
    }

    Ok(RecordedImpulseBuilder {
      model_path: url.path().to_string(),
    })
  }
}

impl RecordedImpulseBuilder {
  pub fn build(self) -> Result<RecordedImpulse, RecordedImpulseError> {
    info!("加载模型文件: {}", self.model_path);
    let data = std::fs::read_to_string(&self.model_path)?;
    let file: RecordedFile = serde_json::from_str(&data)?;
    file.descriptor.validate()?;

    let descriptor = &file.descriptor;
    debug!(
      "模型: {:?}, 标签数量: {}, 检测类别数量: {}, 异常检测: {:?}",
      descriptor.name, descriptor.label_count, descriptor.object_detection_count,
      descriptor.has_anomaly
    );
    if file.result.classification.len() != descriptor.label_count {
      warn!(
        "录制结果的分类数量 {} 与标签数量 {} 不一致",
        file.result.classification.len(),
        descriptor.label_count
      );
    }
    info!("模型加载完成");

    Ok(RecordedImpulse {
      descriptor: file.descriptor,
      result: file.result,
      status: file.status,
    })
  }
}

impl Impulse for RecordedImpulse {
  fn descriptor(&self) -> &ModelDescriptor {
    &self.descriptor
  }

  fn process(&self, signal: &Signal, debug: bool) -> Result<InferenceResult, ImpulseError> {
    if self.status != ImpulseStatus::Ok {
      return Err(ImpulseError::Status(self.status));
    }

    let total = signal.total_length();
    if let Some(expected) = self.descriptor.dsp_input_frame_size {
      if total != expected {
        error!("信号长度不匹配: 期望 {}, 实际 {}", expected, total);
        return Err(ImpulseError::Status(ImpulseStatus::ShapesDontMatch));
      }
    }

    let mut buffer = [0f32; SIGNAL_CHUNK_SIZE];
    let mut offset = 0;
    while offset < total {
      let length = SIGNAL_CHUNK_SIZE.min(total - offset);
      signal.get_data(offset, &mut buffer[..length])?;
      offset += length;
    }

    if debug {
      debug!("读取信号 {} 个样本", total);
      debug!("推理结果: {:?}", self.result);
    }

    Ok(self.result.clone())
  }
}
