// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/features_file.rs - 原始特征文件输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::Signal};

#[derive(Error, Debug)]
pub enum FeaturesFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Invalid feature #{index}: '{token}'")]
  InvalidFeature { index: usize, token: String },
}

/// 从文本文件读取的原始特征，格式与 Studio 导出的 "Raw features" 相同：
/// 逗号或空白分隔的浮点数，图像数据则为 `0x` 开头的打包 RGB 像素值
pub struct FeaturesFileInput {
  signal: Option<Signal>,
}

impl FromUrlWithScheme for FeaturesFileInput {
  const SCHEME: &'static str = "features";
}

impl FromUrl for FeaturesFileInput {
  type Error = FeaturesFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(FeaturesFileInputError::SchemaMismatch);
    }

    let text = std::fs::read_to_string(url.path())?;
    let features = parse_features(&text)?;
    debug!("读取 {} 个特征: {}", features.len(), url.path());

    Ok(FeaturesFileInput {
      signal: Some(Signal::from(features)),
    })
  }
}

impl FeaturesFileInput {
  pub fn into_signal(mut self) -> Signal {
    self.signal.take().unwrap_or_default()
  }
}

impl Iterator for FeaturesFileInput {
  type Item = Signal;

  fn next(&mut self) -> Option<Self::Item> {
    self.signal.take()
  }
}

pub fn parse_features(text: &str) -> Result<Vec<f32>, FeaturesFileInputError> {
  text
    .split(|c: char| c == ',' || c.is_whitespace())
    .filter(|token| !token.is_empty())
    .enumerate()
    .map(|(index, token)| {
      parse_feature(token).ok_or_else(|| FeaturesFileInputError::InvalidFeature {
        index,
        token: token.to_string(),
      })
    })
    .collect()
}

fn parse_feature(token: &str) -> Option<f32> {
  match token
    .strip_prefix("0x")
    .or_else(|| token.strip_prefix("0X"))
  {
    Some(hex) => u32::from_str_radix(hex, 16).ok().map(|v| v as f32),
    None => token.parse().ok(),
  }
}
