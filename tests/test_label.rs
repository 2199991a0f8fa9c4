//! 建筑类别注册表的集成测试。
//!
//! 覆盖内容：
//! - 类别编号、名称与颜色的全表映射
//! - 未知编号与未知名称的错误
//! - 原始检测结果到建筑类别的解析

mod common;

use common::*;
use weilou::label::{BuildingLabel, CLASS_NUM, LabelError, WithLabel};
use weilou::model::DetectResult;

#[test]
fn test_label_table_roundtrip() {
  let expected = [
    (0, "undamagedcommercialbuilding", [0, 0, 255]),
    (1, "undamagedresidentialbuilding", [0, 255, 0]),
    (2, "damagedresidentialbuilding", [128, 128, 128]),
    (3, "damagedcommercialbuilding", [255, 0, 0]),
  ];
  assert_eq!(expected.len(), CLASS_NUM);

  for (id, name, color) in expected {
    let label = BuildingLabel::try_from_label_id(id).unwrap();
    assert_eq!(label.to_label_id(), id);
    assert_eq!(label.to_label_str(), name);
    assert_eq!(label.label_color(), color);
    assert_eq!(BuildingLabel::try_from_label_str(name).unwrap(), label);
  }
}

#[test]
fn test_unknown_label_id() {
  let err = BuildingLabel::try_from_label_id(99).unwrap_err();
  assert_eq!(err, LabelError::UnknownId(99));
}

#[test]
fn test_unknown_label_name() {
  let err = BuildingLabel::try_from_label_str("pagoda").unwrap_err();
  assert_eq!(err, LabelError::UnknownName("pagoda".to_string()));
}

#[test]
fn test_resolve_labels() {
  let result = DetectResult {
    items: vec![
      make_item(1, 0.9, [10.0, 10.0, 50.0, 50.0]),
      make_item(3, 0.3, [100.0, 100.0, 200.0, 180.0]),
    ]
    .into_boxed_slice(),
  };

  let resolved = result.resolve_labels::<BuildingLabel>().unwrap();
  assert_eq!(resolved.len(), 2);
  assert_eq!(
    resolved.items[0].kind,
    BuildingLabel::UndamagedResidentialBuilding
  );
  assert_eq!(
    resolved.items[1].kind,
    BuildingLabel::DamagedCommercialBuilding
  );
  // 分数与边框原样保留
  assert_eq!(resolved.items[0].score, 0.9);
  assert_eq!(resolved.items[1].bbox, [100.0, 100.0, 200.0, 180.0]);
}

#[test]
fn test_resolve_labels_unknown_id() {
  let result = DetectResult {
    items: vec![make_item(42, 0.8, [0.0, 0.0, 10.0, 10.0])].into_boxed_slice(),
  };

  let err = result.resolve_labels::<BuildingLabel>().unwrap_err();
  assert_eq!(err, LabelError::UnknownId(42));
}
