// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, error};

use crate::{
  FromUrl, FromUrlWithScheme,
  model::ModelDescriptor,
  output::{Render, ReportOptionError, Reporter},
  result::InferenceResult,
};

use super::reporter::parse_switch;

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("报告参数错误: {0}")]
  ReportOptionError(#[from] ReportOptionError),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

#[derive(Serialize)]
struct Record<'a> {
  timestamp: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  project_id: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  name: Option<&'a str>,
  result: &'a InferenceResult,
}

/// 每次推理在 `目录/年/月/日/` 下写入文本报告，以及可选的 JSON 记录
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  reporter: Reporter,
  json: bool,
  frame_counters: Arc<Mutex<u16>>,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        uri.scheme()
      );
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let json = match uri.query_pairs().find(|(k, _)| k == "json") {
      Some((key, value)) => parse_switch(&key, &value)?,
      None => true,
    };

    // json 参数由本输出处理，其余交给报告器
    let mut report_url = uri.clone();
    report_url
      .query_pairs_mut()
      .clear()
      .extend_pairs(uri.query_pairs().filter(|(k, _)| k != "json"));

    Ok(DirectoryRecordOutput::new(
      PathBuf::from(uri.path()),
      Reporter::from_url_query(&report_url)?,
    )
    .with_json(json))
  }
}

impl DirectoryRecordOutput {
  pub fn new(directory: impl Into<PathBuf>, reporter: Reporter) -> Self {
    Self {
      directory: directory.into(),
      reporter,
      json: true,
      frame_counters: Arc::new(Mutex::new(0)),
    }
  }

  pub fn with_json(mut self, json: bool) -> Self {
    self.json = json;
    self
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn frame_id(&self) -> u16 {
    let mut counter = self
      .frame_counters
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    let id = counter.wrapping_add(1);
    *counter = id;
    id
  }

  fn frame_stem(&self, now: &DateTime<Utc>) -> Result<PathBuf, DirectoryRecordOutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!(
      "{}-{:04X}",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }
}

impl Render<ModelDescriptor, InferenceResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(
    &self,
    descriptor: &ModelDescriptor,
    result: &InferenceResult,
  ) -> Result<(), Self::Error> {
    let now = Utc::now();
    let stem = self.frame_stem(&now)?;

    let report_path = stem.with_extension("txt");
    std::fs::write(&report_path, self.reporter.report(result, descriptor))?;
    debug!("报告已写入: {}", report_path.display());

    if self.json {
      let record = Record {
        timestamp: now,
        project_id: descriptor.project_id,
        name: descriptor.name.as_deref(),
        result,
      };
      let record_path = stem.with_extension("json");
      std::fs::write(&record_path, serde_json::to_vec_pretty(&record)?)?;
      debug!("记录已写入: {}", record_path.display());
    }

    Ok(())
  }
}
