// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/multi_impulse.rs - 合并部署的多 impulse 推理
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use anyhow::{Result, bail};
use clap::Parser;
use url::Url;

use shanan_report::{
  FromUrl,
  input::{FeaturesFileInput, Signal},
  model::{RecordedImpulse, RecordedImpulseBuilder},
  output::OutputWrapper,
  task::{MultiImpulseTask, Task},
};
use tracing::info;

/// 依次运行多个 impulse，每个 impulse 对应一个输入
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// Impulse 模型路径，可重复，顺序与 --input 一一对应
  #[arg(long, value_name = "MODEL", required = true)]
  pub impulse: Vec<Url>,
  /// 原始特征输入，可重复
  #[arg(long, value_name = "SOURCE", required = true)]
  pub input: Vec<Url>,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT", default_value = "console:stdout?separator")]
  pub output: Url,
  /// 推理时打印调试信息
  #[arg(long)]
  pub debug: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  if args.impulse.len() != args.input.len() {
    bail!(
      "impulse 数量 ({}) 与输入数量 ({}) 不一致",
      args.impulse.len(),
      args.input.len()
    );
  }

  let impulses = args
    .impulse
    .iter()
    .map(|url| -> Result<RecordedImpulse> {
      info!("模型文件路径: {}", url);
      Ok(RecordedImpulseBuilder::from_url(url)?.build()?)
    })
    .collect::<Result<Vec<RecordedImpulse>>>()?;
  let signals = args
    .input
    .iter()
    .map(|url| -> Result<Signal> {
      info!("输入来源: {}", url);
      Ok(FeaturesFileInput::from_url(url)?.into_signal())
    })
    .collect::<Result<Vec<Signal>>>()?;
  let output = OutputWrapper::from_url(&args.output)?;
  info!("输出路径: {}", args.output);

  MultiImpulseTask::default()
    .with_debug(args.debug)
    .run_task(signals.into_iter(), impulses, output)?;

  Ok(())
}
