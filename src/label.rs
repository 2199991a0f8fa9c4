// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/label.rs - 建筑受损类别与颜色注册表
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

use thiserror::Error;

use crate::model::{DetectItem, DetectResult};

/// 模型训练时的类别数，构建模型时与输出形状校验。
pub const CLASS_NUM: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
  #[error("未知类别编号: {0}")]
  UnknownId(u32),
  #[error("未知类别名称: {0}")]
  UnknownName(String),
}

/// 类别标签的通用接口：编号、名称与标注颜色之间的固定映射。
///
/// 编号与名称的查找都可能失败，失败必须显式暴露而不是悄悄吞掉。
pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn to_label_id(&self) -> u32;
  /// 标注颜色三元组，按配置原样存储，直接涂在 BGR 工作帧上。
  fn label_color(&self) -> [u8; 3];
  fn try_from_label_id(id: u32) -> Result<Self, LabelError>;
  fn try_from_label_str(name: &str) -> Result<Self, LabelError>;
}

/// 建筑受损检测的四个类别，编号与数据集的 .yaml 顺序一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingLabel {
  UndamagedCommercialBuilding,
  UndamagedResidentialBuilding,
  DamagedResidentialBuilding,
  DamagedCommercialBuilding,
}

impl WithLabel for BuildingLabel {
  fn to_label_str(&self) -> String {
    match self {
      BuildingLabel::UndamagedCommercialBuilding => "undamagedcommercialbuilding",
      BuildingLabel::UndamagedResidentialBuilding => "undamagedresidentialbuilding",
      BuildingLabel::DamagedResidentialBuilding => "damagedresidentialbuilding",
      BuildingLabel::DamagedCommercialBuilding => "damagedcommercialbuilding",
    }
    .to_string()
  }

  fn to_label_id(&self) -> u32 {
    match self {
      BuildingLabel::UndamagedCommercialBuilding => 0,
      BuildingLabel::UndamagedResidentialBuilding => 1,
      BuildingLabel::DamagedResidentialBuilding => 2,
      BuildingLabel::DamagedCommercialBuilding => 3,
    }
  }

  fn label_color(&self) -> [u8; 3] {
    match self {
      BuildingLabel::UndamagedCommercialBuilding => [0, 0, 255],
      BuildingLabel::UndamagedResidentialBuilding => [0, 255, 0],
      BuildingLabel::DamagedResidentialBuilding => [128, 128, 128],
      BuildingLabel::DamagedCommercialBuilding => [255, 0, 0],
    }
  }

  fn try_from_label_id(id: u32) -> Result<Self, LabelError> {
    match id {
      0 => Ok(BuildingLabel::UndamagedCommercialBuilding),
      1 => Ok(BuildingLabel::UndamagedResidentialBuilding),
      2 => Ok(BuildingLabel::DamagedResidentialBuilding),
      3 => Ok(BuildingLabel::DamagedCommercialBuilding),
      _ => Err(LabelError::UnknownId(id)),
    }
  }

  fn try_from_label_str(name: &str) -> Result<Self, LabelError> {
    match name {
      "undamagedcommercialbuilding" => Ok(BuildingLabel::UndamagedCommercialBuilding),
      "undamagedresidentialbuilding" => Ok(BuildingLabel::UndamagedResidentialBuilding),
      "damagedresidentialbuilding" => Ok(BuildingLabel::DamagedResidentialBuilding),
      "damagedcommercialbuilding" => Ok(BuildingLabel::DamagedCommercialBuilding),
      _ => Err(LabelError::UnknownName(name.to_string())),
    }
  }
}

impl DetectResult<u32> {
  /// 将模型产出的原始类别编号解析为注册表条目。
  /// 任何一个编号不在注册表内都会使整次解析失败。
  pub fn resolve_labels<T: WithLabel>(&self) -> Result<DetectResult<T>, LabelError> {
    let mut items = Vec::with_capacity(self.items.len());
    for item in self.items.iter() {
      items.push(DetectItem {
        kind: T::try_from_label_id(item.kind)?,
        score: item.score,
        bbox: item.bbox,
      });
    }

    Ok(DetectResult {
      items: items.into_boxed_slice(),
    })
  }
}
