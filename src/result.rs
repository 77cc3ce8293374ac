// 该文件是 Shanan （山南西风） 项目的一部分。
// src/result.rs - 推理结果定义
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

use serde::{Deserialize, Serialize};

/// 各阶段耗时（毫秒）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
  pub dsp: i32,
  pub classification: i32,
  pub anomaly: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationScore {
  pub value: f32,
}

/// 检测框，`value == 0` 表示该槽位没有目标
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
  pub label: String,
  pub value: f32,
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl BoundingBox {
  pub fn is_present(&self) -> bool {
    self.value != 0.0
  }
}

#[cfg(feature = "visual_anomaly")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualAdResult {
  pub mean_value: f32,
  pub max_value: f32,
}

/// 单次推理的输出，由推理引擎填充，报告器只读
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceResult {
  pub timing: Timing,
  pub classification: Vec<ClassificationScore>,
  pub bounding_boxes: Vec<BoundingBox>,
  /// 显式的检测框数量；缺省时取 `bounding_boxes.len()`
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bounding_boxes_count: Option<u32>,
  pub anomaly: f32,
  #[cfg(feature = "visual_anomaly")]
  pub visual_ad_count: u32,
  #[cfg(feature = "visual_anomaly")]
  pub visual_ad_grid_cells: Vec<BoundingBox>,
  #[cfg(feature = "visual_anomaly")]
  pub visual_ad_result: VisualAdResult,
}

impl InferenceResult {
  pub fn bounding_boxes_count(&self) -> usize {
    self
      .bounding_boxes_count
      .map(|count| count as usize)
      .unwrap_or(self.bounding_boxes.len())
  }

  /// 前 `count` 个检测框，超出实际长度时截断
  pub fn active_bounding_boxes(&self, count: usize) -> &[BoundingBox] {
    &self.bounding_boxes[..count.min(self.bounding_boxes.len())]
  }

  #[cfg(feature = "visual_anomaly")]
  pub fn active_grid_cells(&self) -> &[BoundingBox] {
    let count = (self.visual_ad_count as usize).min(self.visual_ad_grid_cells.len());
    &self.visual_ad_grid_cells[..count]
  }
}
