// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 推理与报告任务
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

use tracing::{error, info, warn};

use crate::{
  input::Signal,
  model::{Impulse, ImpulseStatus, ModelDescriptor},
  output::Render,
  result::InferenceResult,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 一次推理加一次报告；推理失败只记录返回码，不作为任务错误
fn run_cycle<M, O, RE>(
  signal: &Signal,
  impulse: &M,
  output: &O,
  debug: bool,
) -> Result<ImpulseStatus, RE>
where
  M: Impulse,
  O: Render<ModelDescriptor, InferenceResult, Error = RE>,
{
  let descriptor = impulse.descriptor();
  let now = std::time::Instant::now();
  let outcome = impulse.process(signal, debug);
  let elapsed = now.elapsed();

  let status = match &outcome {
    Ok(_) => ImpulseStatus::Ok,
    Err(e) => e.status(),
  };
  info!("推理完成，耗时: {:.2?}，返回码: {}", elapsed, status);
  output.render_status(descriptor, status)?;

  match outcome {
    Ok(result) => {
      output.render_result(descriptor, &result)?;
      info!("渲染完成");
    }
    Err(e) => error!("推理失败，跳过报告: {}", e),
  }

  Ok(status)
}

#[derive(Default, Debug)]
pub struct OneShotTask {
  debug: bool,
}

impl OneShotTask {
  pub fn with_debug(mut self, debug: bool) -> Self {
    self.debug = debug;
    self
  }
}

impl<I, M, O, RE> Task<I, M, O> for OneShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Signal>,
  M: Impulse,
  O: Render<ModelDescriptor, InferenceResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let signal = input.next().ok_or_else(|| anyhow::anyhow!("没有输入信号"))?;
    info!("输入信号获取成功，长度 {}，开始推理...", signal.total_length());
    run_cycle(&signal, &model, &output, self.debug)?;
    Ok(())
  }
}

/// 合并部署中的多个 impulse 依次推理，每个 impulse 消费一个输入信号
#[derive(Default, Debug)]
pub struct MultiImpulseTask {
  debug: bool,
}

impl MultiImpulseTask {
  pub fn with_debug(mut self, debug: bool) -> Self {
    self.debug = debug;
    self
  }
}

impl<I, M, O, RE> Task<I, Vec<M>, O> for MultiImpulseTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Signal>,
  M: Impulse,
  O: Render<ModelDescriptor, InferenceResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, models: Vec<M>, output: O) -> Result<(), Self::Error> {
    info!("开始任务，共 {} 个 impulse", models.len());
    let mut failed = 0usize;
    for (index, impulse) in models.iter().enumerate() {
      let Some(signal) = input.next() else {
        warn!("第 {} 个 impulse 没有输入信号，提前结束", index);
        break;
      };
      info!(
        "处理第 {} 个 impulse (project {:?})",
        index,
        impulse.descriptor().project_id
      );
      if run_cycle(&signal, impulse, &output, self.debug)? != ImpulseStatus::Ok {
        failed += 1;
      }
    }

    if failed > 0 {
      warn!("{} 个 impulse 推理失败", failed);
    }
    info!("任务完成，退出");
    Ok(())
  }
}
