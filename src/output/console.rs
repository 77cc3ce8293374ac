// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/console.rs - 控制台/串口文本输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{ImpulseStatus, ModelDescriptor},
  output::{LINE_END, Render, ReportOptionError, Reporter},
  result::InferenceResult,
};

#[derive(Error, Debug)]
pub enum StreamOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("未知的输出流: {0}")]
  UnknownStream(String),
  #[error("报告参数错误: {0}")]
  ReportOptionError(#[from] ReportOptionError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 把报告写入单一文本流；同一个流上的写入由内部锁串行化
pub struct StreamOutput<W> {
  reporter: Reporter,
  stream: Mutex<W>,
}

pub type ConsoleOutput = StreamOutput<Box<dyn Write + Send>>;

impl<W: Write> StreamOutput<W> {
  pub fn new(stream: W, reporter: Reporter) -> Self {
    Self {
      reporter,
      stream: Mutex::new(stream),
    }
  }

  pub fn reporter(&self) -> &Reporter {
    &self.reporter
  }

  pub fn into_inner(self) -> W {
    self
      .stream
      .into_inner()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn with_stream<T>(
    &self,
    f: impl FnOnce(&mut W) -> std::io::Result<T>,
  ) -> Result<T, StreamOutputError> {
    let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(f(&mut *stream)?)
  }
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = StreamOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(StreamOutputError::SchemeMismatch);
    }

    let stream: Box<dyn Write + Send> = match url.path().trim_start_matches('/') {
      "" | "stdout" => Box::new(std::io::stdout()),
      "stderr" => Box::new(std::io::stderr()),
      other => return Err(StreamOutputError::UnknownStream(other.to_string())),
    };

    Ok(StreamOutput::new(stream, Reporter::from_url_query(url)?))
  }
}

impl<W: Write> Render<ModelDescriptor, InferenceResult> for StreamOutput<W> {
  type Error = StreamOutputError;

  fn render_result(
    &self,
    descriptor: &ModelDescriptor,
    result: &InferenceResult,
  ) -> Result<(), Self::Error> {
    self.with_stream(|stream| self.reporter.write_report(stream, result, descriptor))
  }

  fn render_status(
    &self,
    descriptor: &ModelDescriptor,
    status: ImpulseStatus,
  ) -> Result<(), Self::Error> {
    self.with_stream(|stream| {
      match descriptor.project_id {
        Some(project) => write!(
          stream,
          "process_impulse for project {} returned: {}{LINE_END}",
          project, status
        )?,
        None => write!(stream, "process_impulse returned: {}{LINE_END}", status)?,
      }
      stream.flush()
    })
  }
}
