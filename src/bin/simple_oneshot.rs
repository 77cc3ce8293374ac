// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/simple_oneshot.rs - 单次推理并打印报告
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use anyhow::Result;
use clap::Parser;
use url::Url;

use shanan_report::{
  FromUrl,
  input::FeaturesFileInput,
  model::RecordedImpulseBuilder,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};
use tracing::info;

/// Shanan 推理结果报告
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// Impulse 模型路径，如 impulse:///path/to/impulse.json
  #[arg(long, value_name = "MODEL")]
  pub impulse: Url,
  /// 原始特征输入，如 features:///path/to/features.txt
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，如 console:stdout?policy=count 或 folder:///var/log/impulse
  #[arg(long, value_name = "OUTPUT", default_value = "console:stdout")]
  pub output: Url,
  /// 推理时打印调试信息
  #[arg(long)]
  pub debug: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.impulse);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = FeaturesFileInput::from_url(&args.input)?;
  let impulse = RecordedImpulseBuilder::from_url(&args.impulse)?.build()?;
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask::default()
    .with_debug(args.debug)
    .run_task(input, impulse, output)?;

  Ok(())
}
