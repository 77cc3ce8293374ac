// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/reporter.rs - 推理结果文本报告
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;
use url::Url;

#[cfg(feature = "visual_anomaly")]
use crate::model::AnomalyKind;
use crate::model::ModelDescriptor;
use crate::result::{BoundingBox, InferenceResult};

/// 下游工具按行解析，行尾必须与设备串口输出一致
pub const LINE_END: &str = "\r\n";
pub const SEPARATOR_WIDTH: usize = 40;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReportOptionError {
  #[error("未知的报告策略: {0}")]
  UnknownPolicy(String),
  #[error("无效的开关值 {key}={value}")]
  InvalidSwitch { key: String, value: String },
}

/// 选择检测框报告还是分类报告的依据
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportPolicy {
  /// 结果中有检测框时报告检测框
  CountDriven,
  /// 模型有检测类别时报告检测框，即使没有任何检测框
  #[default]
  DescriptorDriven,
}

impl FromStr for ReportPolicy {
  type Err = ReportOptionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "count" => Ok(ReportPolicy::CountDriven),
      "descriptor" => Ok(ReportPolicy::DescriptorDriven),
      other => Err(ReportOptionError::UnknownPolicy(other.to_string())),
    }
  }
}

impl fmt::Display for ReportPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReportPolicy::CountDriven => write!(f, "count"),
      ReportPolicy::DescriptorDriven => write!(f, "descriptor"),
    }
  }
}

enum Body<'a> {
  Detections(&'a [BoundingBox]),
  Classification,
}

/// 无状态的报告器，同样的输入总是得到同样的文本
#[derive(Debug, Clone)]
pub struct Reporter {
  policy: ReportPolicy,
  separator: bool,
  #[cfg(feature = "visual_anomaly")]
  visual_anomaly: bool,
}

impl Default for Reporter {
  fn default() -> Self {
    Self::new(ReportPolicy::default())
  }
}

impl Reporter {
  pub fn new(policy: ReportPolicy) -> Self {
    Self {
      policy,
      separator: false,
      #[cfg(feature = "visual_anomaly")]
      visual_anomaly: true,
    }
  }

  pub fn with_separator(mut self, separator: bool) -> Self {
    self.separator = separator;
    self
  }

  /// 链接的引擎不支持视觉异常检测时关闭
  #[cfg(feature = "visual_anomaly")]
  pub fn with_visual_anomaly(mut self, enabled: bool) -> Self {
    self.visual_anomaly = enabled;
    self
  }

  pub fn policy(&self) -> ReportPolicy {
    self.policy
  }

  /// 从 URL 查询参数构造：`policy=count|descriptor`、`separator`、`visual=off`
  pub fn from_url_query(url: &Url) -> Result<Self, ReportOptionError> {
    let mut reporter = Reporter::default();
    for (key, value) in url.query_pairs() {
      match &*key {
        "policy" => reporter.policy = value.parse()?,
        "separator" => reporter.separator = parse_switch(&key, &value)?,
        #[cfg(feature = "visual_anomaly")]
        "visual" => reporter.visual_anomaly = parse_switch(&key, &value)?,
        _ => warn!("忽略未知的报告参数: {}={}", key, value),
      }
    }
    Ok(reporter)
  }

  pub fn report(&self, result: &InferenceResult, model: &ModelDescriptor) -> String {
    let mut text = String::new();
    // 写入 String 不会失败
    let _ = self.render_to(&mut text, result, model);
    text
  }

  pub fn write_report<W: std::io::Write>(
    &self,
    stream: &mut W,
    result: &InferenceResult,
    model: &ModelDescriptor,
  ) -> std::io::Result<()> {
    stream.write_all(self.report(result, model).as_bytes())?;
    stream.flush()
  }

  fn select<'a>(&self, result: &'a InferenceResult, model: &ModelDescriptor) -> Body<'a> {
    match self.policy {
      ReportPolicy::CountDriven => match result.bounding_boxes_count() {
        0 => Body::Classification,
        count => Body::Detections(result.active_bounding_boxes(count)),
      },
      ReportPolicy::DescriptorDriven if model.is_object_detection() => {
        Body::Detections(result.active_bounding_boxes(model.object_detection_count))
      }
      ReportPolicy::DescriptorDriven => Body::Classification,
    }
  }

  #[cfg(feature = "visual_anomaly")]
  fn renders_visual_anomaly(&self, model: &ModelDescriptor) -> bool {
    self.visual_anomaly && model.has_anomaly == AnomalyKind::Visual
  }

  #[cfg(not(feature = "visual_anomaly"))]
  fn renders_visual_anomaly(&self, _model: &ModelDescriptor) -> bool {
    false
  }

  fn render_to<W: fmt::Write>(
    &self,
    out: &mut W,
    result: &InferenceResult,
    model: &ModelDescriptor,
  ) -> fmt::Result {
    write!(
      out,
      "Timing: DSP {} ms, inference {} ms, anomaly {} ms{LINE_END}",
      result.timing.dsp, result.timing.classification, result.timing.anomaly
    )?;

    match self.select(result, model) {
      Body::Detections(boxes) => {
        write!(out, "Object detection bounding boxes:{LINE_END}")?;
        render_boxes(out, boxes)?;
      }
      Body::Classification => {
        write!(out, "Predictions:{LINE_END}")?;
        for (category, score) in model
          .categories
          .iter()
          .zip(&result.classification)
          .take(model.label_count)
        {
          write!(out, "  {}: {}{LINE_END}", category, Printf(score.value, 5))?;
        }
      }
    }

    // 视觉异常输出时不再打印标量分数
    if model.has_anomaly.is_present() && !self.renders_visual_anomaly(model) {
      write!(out, "Anomaly prediction: {}{LINE_END}", Printf(result.anomaly, 3))?;
    }

    #[cfg(feature = "visual_anomaly")]
    if self.renders_visual_anomaly(model) {
      write!(out, "Visual anomalies:{LINE_END}")?;
      render_boxes(out, result.active_grid_cells())?;
      write!(
        out,
        "Visual anomaly values: Mean : {} Max : {}{LINE_END}",
        Printf(result.visual_ad_result.mean_value, 3),
        Printf(result.visual_ad_result.max_value, 3)
      )?;
    }

    if self.separator {
      write!(out, "{}{LINE_END}", "-".repeat(SEPARATOR_WIDTH))?;
    }

    Ok(())
  }
}

/// 按 C `printf("%.Nf")` 的写法输出浮点数，非有限值为 `nan`/`inf`/`-inf`
struct Printf(f32, usize);

impl fmt::Display for Printf {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Printf(value, precision) = *self;
    if value.is_nan() {
      f.write_str(if value.is_sign_negative() { "-nan" } else { "nan" })
    } else if value.is_infinite() {
      f.write_str(if value.is_sign_negative() { "-inf" } else { "inf" })
    } else {
      write!(f, "{:.*}", precision, value)
    }
  }
}

pub(crate) fn parse_switch(key: &str, value: &str) -> Result<bool, ReportOptionError> {
  match value {
    "" | "on" | "true" | "1" => Ok(true),
    "off" | "false" | "0" => Ok(false),
    _ => Err(ReportOptionError::InvalidSwitch {
      key: key.to_string(),
      value: value.to_string(),
    }),
  }
}

fn render_boxes<W: fmt::Write>(out: &mut W, boxes: &[BoundingBox]) -> fmt::Result {
  for bb in boxes.iter().filter(|bb| bb.is_present()) {
    write!(
      out,
      "  {} ({}) [ x: {}, y: {}, width: {}, height: {} ]{LINE_END}",
      bb.label,
      Printf(bb.value, 6),
      bb.x,
      bb.y,
      bb.width,
      bb.height
    )?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::AnomalyKind;
  use crate::result::{ClassificationScore, Timing};

  fn classifier(anomaly: AnomalyKind) -> ModelDescriptor {
    ModelDescriptor {
      label_count: 2,
      categories: vec!["cat".into(), "dog".into()],
      has_anomaly: anomaly,
      ..Default::default()
    }
  }

  fn detector(classes: usize) -> ModelDescriptor {
    ModelDescriptor {
      label_count: classes,
      categories: (0..classes).map(|i| format!("class{i}")).collect(),
      object_detection_count: classes,
      ..Default::default()
    }
  }

  fn scores(values: &[f32]) -> Vec<ClassificationScore> {
    values
      .iter()
      .map(|&value| ClassificationScore { value })
      .collect()
  }

  fn person() -> BoundingBox {
    BoundingBox {
      label: "person".into(),
      value: 0.8,
      x: 10,
      y: 20,
      width: 30,
      height: 40,
    }
  }

  #[test]
  fn classification_report_matches_device_output() {
    let result = InferenceResult {
      timing: Timing {
        dsp: 3,
        classification: 12,
        anomaly: 0,
      },
      classification: scores(&[0.1, 0.9]),
      ..Default::default()
    };
    let text = Reporter::default().report(&result, &classifier(AnomalyKind::None));
    assert_eq!(
      text,
      "Timing: DSP 3 ms, inference 12 ms, anomaly 0 ms\r\n\
       Predictions:\r\n  cat: 0.10000\r\n  dog: 0.90000\r\n"
    );
  }

  #[test]
  fn zero_confidence_boxes_are_skipped() {
    let result = InferenceResult {
      bounding_boxes: vec![
        person(),
        BoundingBox {
          label: "ghost".into(),
          ..Default::default()
        },
      ],
      ..Default::default()
    };
    let text = Reporter::default().report(&result, &detector(2));
    assert!(text.contains("  person (0.800000) [ x: 10, y: 20, width: 30, height: 40 ]\r\n"));
    assert!(!text.contains("ghost"));
    assert!(!text.contains("Predictions:"));
  }

  #[test]
  fn descriptor_policy_prints_header_without_detections() {
    let text = Reporter::new(ReportPolicy::DescriptorDriven)
      .report(&InferenceResult::default(), &detector(1));
    assert!(text.ends_with("Object detection bounding boxes:\r\n"));
  }

  #[test]
  fn count_policy_falls_back_to_classification_without_detections() {
    let result = InferenceResult {
      classification: scores(&[1.0]),
      ..Default::default()
    };
    let text = Reporter::new(ReportPolicy::CountDriven).report(&result, &detector(1));
    assert!(!text.contains("Object detection"));
    assert!(text.contains("Predictions:\r\n  class0: 1.00000\r\n"));
  }

  #[test]
  fn count_policy_honours_explicit_count() {
    let mut second = person();
    second.label = "bike".into();
    let result = InferenceResult {
      bounding_boxes: vec![person(), second],
      bounding_boxes_count: Some(1),
      ..Default::default()
    };
    let text = Reporter::new(ReportPolicy::CountDriven).report(&result, &classifier(AnomalyKind::None));
    assert!(text.contains("person"));
    assert!(!text.contains("bike"));
  }

  #[test]
  fn descriptor_policy_limits_boxes_to_class_count() {
    let mut second = person();
    second.label = "bike".into();
    let result = InferenceResult {
      bounding_boxes: vec![person(), second],
      ..Default::default()
    };
    let text = Reporter::new(ReportPolicy::DescriptorDriven).report(&result, &detector(1));
    assert!(!text.contains("bike"));
  }

  #[test]
  fn scalar_anomaly_is_printed_with_three_decimals() {
    let result = InferenceResult {
      classification: scores(&[0.5, 0.5]),
      anomaly: 1.23456,
      ..Default::default()
    };
    let text = Reporter::default().report(&result, &classifier(AnomalyKind::Scalar));
    assert!(text.ends_with("Anomaly prediction: 1.235\r\n"));
    let text = Reporter::default().report(&result, &classifier(AnomalyKind::None));
    assert!(!text.contains("Anomaly prediction"));
  }

  #[test]
  fn empty_categories_print_header_only() {
    let model = ModelDescriptor::default();
    let text = Reporter::default().report(&InferenceResult::default(), &model);
    assert!(text.ends_with("Predictions:\r\n"));
  }

  #[test]
  fn separator_closes_the_report() {
    let text = Reporter::default()
      .with_separator(true)
      .report(&InferenceResult::default(), &ModelDescriptor::default());
    assert!(text.ends_with(&format!("{}\r\n", "-".repeat(SEPARATOR_WIDTH))));
  }

  #[cfg(feature = "visual_anomaly")]
  #[test]
  fn visual_anomaly_replaces_scalar_line() {
    use crate::result::VisualAdResult;

    let result = InferenceResult {
      classification: scores(&[0.5, 0.5]),
      anomaly: 9.0,
      visual_ad_count: 0,
      visual_ad_result: VisualAdResult {
        mean_value: 0.2,
        max_value: 0.5,
      },
      ..Default::default()
    };
    let text = Reporter::default().report(&result, &classifier(AnomalyKind::Visual));
    assert!(!text.contains("Anomaly prediction"));
    assert!(text.ends_with(
      "Visual anomalies:\r\nVisual anomaly values: Mean : 0.200 Max : 0.500\r\n"
    ));
  }

  #[cfg(feature = "visual_anomaly")]
  #[test]
  fn visual_grid_cells_skip_empty_slots() {
    let result = InferenceResult {
      visual_ad_count: 2,
      visual_ad_grid_cells: vec![person(), BoundingBox::default(), person()],
      ..Default::default()
    };
    let text = Reporter::default().report(&result, &classifier(AnomalyKind::Visual));
    assert_eq!(text.matches("person").count(), 1);
  }

  #[cfg(feature = "visual_anomaly")]
  #[test]
  fn disabled_visual_capability_falls_back_to_scalar() {
    let result = InferenceResult {
      anomaly: 0.5,
      ..Default::default()
    };
    let text = Reporter::default()
      .with_visual_anomaly(false)
      .report(&result, &classifier(AnomalyKind::Visual));
    assert!(!text.contains("Visual anomalies"));
    assert!(text.contains("Anomaly prediction: 0.500\r\n"));
  }

  #[test]
  fn scalar_anomaly_follows_detections_under_both_policies() {
    let model = ModelDescriptor {
      has_anomaly: AnomalyKind::Scalar,
      ..detector(1)
    };
    let result = InferenceResult {
      bounding_boxes: vec![person()],
      anomaly: 0.5,
      ..Default::default()
    };
    for policy in [ReportPolicy::CountDriven, ReportPolicy::DescriptorDriven] {
      let text = Reporter::new(policy).report(&result, &model);
      assert!(
        text.ends_with(
          "Object detection bounding boxes:\r\n\
           \x20 person (0.800000) [ x: 10, y: 20, width: 30, height: 40 ]\r\n\
           Anomaly prediction: 0.500\r\n"
        ),
        "policy {policy}: {text:?}"
      );
      assert_eq!(text.matches("Anomaly prediction").count(), 1);
    }
  }

  #[cfg(feature = "visual_anomaly")]
  #[test]
  fn visual_section_follows_detections() {
    use crate::result::VisualAdResult;

    let model = ModelDescriptor {
      has_anomaly: AnomalyKind::Visual,
      ..detector(1)
    };
    let mut cell = person();
    cell.label = "anomaly".into();
    let result = InferenceResult {
      bounding_boxes: vec![person()],
      anomaly: 3.0,
      visual_ad_count: 1,
      visual_ad_grid_cells: vec![cell],
      visual_ad_result: VisualAdResult {
        mean_value: 0.25,
        max_value: 0.75,
      },
      ..Default::default()
    };
    for policy in [ReportPolicy::CountDriven, ReportPolicy::DescriptorDriven] {
      let text = Reporter::new(policy).report(&result, &model);
      assert!(text.ends_with(
        "Object detection bounding boxes:\r\n\
         \x20 person (0.800000) [ x: 10, y: 20, width: 30, height: 40 ]\r\n\
         Visual anomalies:\r\n\
         \x20 anomaly (0.800000) [ x: 10, y: 20, width: 30, height: 40 ]\r\n\
         Visual anomaly values: Mean : 0.250 Max : 0.750\r\n"
      ));
      assert!(!text.contains("Anomaly prediction"));
    }
  }

  #[cfg(feature = "visual_anomaly")]
  #[test]
  fn visual_switch_is_read_from_query() {
    let url = Url::parse("console:stdout?visual=off").unwrap();
    assert!(!Reporter::from_url_query(&url).unwrap().visual_anomaly);

    let url = Url::parse("console:stdout?visual=maybe").unwrap();
    assert_eq!(
      Reporter::from_url_query(&url).unwrap_err(),
      ReportOptionError::InvalidSwitch {
        key: "visual".into(),
        value: "maybe".into()
      }
    );
  }

  #[test]
  fn non_finite_values_print_like_printf() {
    let result = InferenceResult {
      classification: vec![
        ClassificationScore { value: f32::NAN },
        ClassificationScore {
          value: f32::INFINITY,
        },
      ],
      anomaly: f32::NEG_INFINITY,
      ..Default::default()
    };
    let text = Reporter::default().report(&result, &classifier(AnomalyKind::Scalar));
    assert!(text.ends_with("  cat: nan\r\n  dog: inf\r\nAnomaly prediction: -inf\r\n"));
  }

  #[test]
  fn options_are_read_from_query() {
    let url = Url::parse("console:stdout?policy=count&separator").unwrap();
    let reporter = Reporter::from_url_query(&url).unwrap();
    assert_eq!(reporter.policy(), ReportPolicy::CountDriven);
    assert!(reporter.separator);

    let url = Url::parse("console:stdout?policy=boxes").unwrap();
    assert_eq!(
      Reporter::from_url_query(&url).unwrap_err(),
      ReportOptionError::UnknownPolicy("boxes".into())
    );
  }
}
