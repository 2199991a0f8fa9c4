// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/model.rs - 模型接口与检测结果
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

/// 固定的推理调用配置。
///
/// 阈值不是可调参数：置信度 0.25 与 NMS 0.5 是页面的既定行为，
/// `save`/`save_txt`/`line_thickness` 控制推理调用自身的记录副作用。
#[derive(Debug, Clone)]
pub struct DetectOptions {
  /// 置信度阈值
  pub confidence: f32,
  /// NMS IOU 阈值
  pub iou: f32,
  /// 记录输入副本
  pub save: bool,
  /// 记录原始检测文本
  pub save_txt: bool,
  /// 记录副本上勾画边框的线宽
  pub line_thickness: u32,
}

impl Default for DetectOptions {
  fn default() -> Self {
    Self {
      confidence: 0.25,
      iou: 0.5,
      save: true,
      save_txt: true,
      line_thickness: 1,
    }
  }
}

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&mut self, input: &Self::Input, options: &DetectOptions)
  -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem<T> {
  pub kind: T,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，缩放后图像的像素坐标
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectResult<T> {
  pub items: Box<[DetectItem<T>]>,
}

impl<T> DetectResult<T> {
  pub fn empty() -> Self {
    Self {
      items: Box::new([]),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

pub mod yolov8;
pub use self::yolov8::{Yolov8, Yolov8Builder, Yolov8Error};
