// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 输出定义
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use crate::model::{ImpulseStatus, ModelDescriptor};
use crate::result::InferenceResult;
use crate::{FromUrl, FromUrlWithScheme};
use thiserror::Error;
use url::Url;

pub trait Render<Descriptor, Output>: Sized {
  type Error;
  fn render_result(&self, descriptor: &Descriptor, result: &Output) -> Result<(), Self::Error>;

  /// 推理调用返回后、渲染结果前调用
  fn render_status(
    &self,
    _descriptor: &Descriptor,
    _status: ImpulseStatus,
  ) -> Result<(), Self::Error> {
    Ok(())
  }
}

impl<D, R, T: Render<D, R>> Render<D, R> for &T {
  type Error = T::Error;

  fn render_result(&self, descriptor: &D, result: &R) -> Result<(), Self::Error> {
    (**self).render_result(descriptor, result)
  }

  fn render_status(&self, descriptor: &D, status: ImpulseStatus) -> Result<(), Self::Error> {
    (**self).render_status(descriptor, status)
  }
}

mod reporter;
pub use self::reporter::{LINE_END, ReportOptionError, ReportPolicy, Reporter, SEPARATOR_WIDTH};

mod console;
pub use self::console::{ConsoleOutput, StreamOutput, StreamOutputError};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("文本流输出错误: {0}")]
  StreamOutputError(#[from] StreamOutputError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  Console(ConsoleOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() == ConsoleOutput::SCHEME {
      let output = ConsoleOutput::from_url(url)?;
      return Ok(OutputWrapper::Console(output));
    }
    #[cfg(feature = "directory_record")]
    if url.scheme() == DirectoryRecordOutput::SCHEME {
      let output = DirectoryRecordOutput::from_url(url)?;
      return Ok(OutputWrapper::DirectoryRecordOutput(output));
    }
    Err(OutputError::SchemeMismatch)
  }
}

impl Render<ModelDescriptor, InferenceResult> for OutputWrapper {
  type Error = OutputError;

  fn render_result(
    &self,
    descriptor: &ModelDescriptor,
    result: &InferenceResult,
  ) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Console(output) => output
        .render_result(descriptor, result)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .render_result(descriptor, result)
        .map_err(OutputError::from),
    }
  }

  fn render_status(
    &self,
    descriptor: &ModelDescriptor,
    status: ImpulseStatus,
  ) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Console(output) => output
        .render_status(descriptor, status)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .render_status(descriptor, status)
        .map_err(OutputError::from),
    }
  }
}
