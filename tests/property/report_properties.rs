use proptest::prelude::*;
use shanan_report::model::{AnomalyKind, ModelDescriptor};
use shanan_report::output::{ReportPolicy, Reporter};
use shanan_report::result::{BoundingBox, ClassificationScore, InferenceResult};

fn policy() -> impl Strategy<Value = ReportPolicy> {
  prop_oneof![
    Just(ReportPolicy::CountDriven),
    Just(ReportPolicy::DescriptorDriven)
  ]
}

fn anomaly() -> impl Strategy<Value = AnomalyKind> {
  prop_oneof![
    Just(AnomalyKind::None),
    Just(AnomalyKind::Scalar),
    Just(AnomalyKind::Visual)
  ]
}

fn bounding_box() -> impl Strategy<Value = BoundingBox> {
  (
    "[a-z]{3,8}",
    prop_oneof![Just(0.0f32), 0.01f32..1.0],
    0u32..1000,
    0u32..1000,
    0u32..1000,
    0u32..1000,
  )
    .prop_map(|(label, value, x, y, width, height)| BoundingBox {
      label,
      value,
      x,
      y,
      width,
      height,
    })
}

fn classifier(values: &[f32], has_anomaly: AnomalyKind) -> (ModelDescriptor, InferenceResult) {
  let descriptor = ModelDescriptor {
    label_count: values.len(),
    categories: (0..values.len()).map(|i| format!("label{i}")).collect(),
    has_anomaly,
    ..Default::default()
  };
  let result = InferenceResult {
    classification: values
      .iter()
      .map(|&value| ClassificationScore { value })
      .collect(),
    anomaly: 0.5,
    ..Default::default()
  };
  (descriptor, result)
}

proptest! {
  #[test]
  fn absent_boxes_never_rendered(
    boxes in prop::collection::vec(bounding_box(), 0..8),
    policy in policy(),
  ) {
    let descriptor = ModelDescriptor {
      object_detection_count: boxes.len(),
      ..Default::default()
    };
    let result = InferenceResult {
      bounding_boxes: boxes.clone(),
      ..Default::default()
    };
    let text = Reporter::new(policy).report(&result, &descriptor);
    let box_lines = text.lines().filter(|l| l.contains("[ x: ")).count();
    let present = boxes.iter().filter(|b| b.value != 0.0).count();
    prop_assert_eq!(box_lines, present);
  }

  #[test]
  fn classification_renders_one_line_per_label(
    values in prop::collection::vec(0.0f32..1.0, 0..12),
    policy in policy(),
  ) {
    let (descriptor, result) = classifier(&values, AnomalyKind::None);
    let text = Reporter::new(policy).report(&result, &descriptor);
    let rows: Vec<&str> = text
      .lines()
      .skip_while(|l| *l != "Predictions:")
      .skip(1)
      .collect();
    prop_assert_eq!(rows.len(), values.len());
    for (i, (row, value)) in rows.iter().zip(&values).enumerate() {
      let expected = format!("  label{}: {:.5}", i, value);
      prop_assert_eq!(*row, expected.as_str());
    }
  }

  #[test]
  fn branches_are_mutually_exclusive(
    boxes in prop::collection::vec(bounding_box(), 0..4),
    classes in 0usize..4,
    policy in policy(),
  ) {
    let descriptor = ModelDescriptor {
      label_count: 1,
      categories: vec!["only".into()],
      object_detection_count: classes,
      ..Default::default()
    };
    let result = InferenceResult {
      classification: vec![ClassificationScore { value: 1.0 }],
      bounding_boxes: boxes,
      ..Default::default()
    };
    let text = Reporter::new(policy).report(&result, &descriptor);
    let detections = text.contains("Object detection bounding boxes:");
    let predictions = text.contains("Predictions:");
    prop_assert!(detections != predictions);
  }

  #[test]
  fn anomaly_line_follows_anomaly_kind(
    kind in anomaly(),
    policy in policy(),
    boxes in prop::collection::vec(bounding_box(), 0..4),
    detection in any::<bool>(),
  ) {
    let (mut descriptor, mut result) = classifier(&[0.5], kind);
    if detection {
      descriptor.object_detection_count = 1;
      result.bounding_boxes = boxes;
    }
    let text = Reporter::new(policy).report(&result, &descriptor);
    let lines = text.matches("Anomaly prediction: 0.500\r\n").count();
    let expected = match kind {
      AnomalyKind::None => 0,
      AnomalyKind::Scalar => 1,
      AnomalyKind::Visual if cfg!(feature = "visual_anomaly") => 0,
      AnomalyKind::Visual => 1,
    };
    prop_assert_eq!(lines, expected);
  }

  #[test]
  fn report_is_idempotent(
    values in prop::collection::vec(0.0f32..1.0, 0..6),
    boxes in prop::collection::vec(bounding_box(), 0..6),
    kind in anomaly(),
    policy in policy(),
    separator in any::<bool>(),
  ) {
    let (descriptor, mut result) = classifier(&values, kind);
    result.bounding_boxes = boxes;
    let reporter = Reporter::new(policy).with_separator(separator);
    prop_assert_eq!(
      reporter.report(&result, &descriptor),
      reporter.report(&result, &descriptor)
    );
  }
}
