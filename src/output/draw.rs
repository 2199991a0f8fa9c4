// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{ImageBuffer, Rgb};
use imageproc::drawing::draw_text_mut;
use thiserror::Error;

use crate::frame::BgrFrame;
use crate::label::WithLabel;
use crate::model::DetectResult;
use crate::output::Render;

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_TEXT_OFFSET: i32 = 10; // 标签相对边框上沿的偏移
const BORDER_THICKNESS: i32 = 2;
const BRIGHTNESS_THRESHOLD: f32 = 382.5; // 255 * 3 / 2

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("读取字体文件错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("无效的字体文件: {0}")]
  FontError(#[from] ab_glyph::InvalidFont),
}

/// 在 BGR 帧上绘制边框与标签。颜色表按 BGR 约定给出，
/// 直接写入帧数据，无需转换。
#[derive(Debug)]
pub struct Draw {
  font_size: f32,
  font: FontArc,
}

impl Draw {
  pub fn new(font: FontArc) -> Self {
    Self {
      font_size: LABEL_FONT_SIZE,
      font,
    }
  }

  /// 从字体文件构建。字体缺失或损坏视为配置错误，由调用方决定是否致命。
  pub fn from_font_file(path: impl AsRef<Path>) -> Result<Self, DrawError> {
    let font_data = std::fs::read(path)?;
    let font = FontArc::try_from_vec(font_data)?;
    Ok(Self::new(font))
  }

  pub fn draw_detections<const W: u32, const H: u32, T: WithLabel>(
    &self,
    frame: &mut BgrFrame<W, H>,
    result: &DetectResult<T>,
  ) {
    for item in result.items.iter() {
      let color = item.kind.label_color();
      draw_border(frame, &item.bbox, color);

      // 标签文本置于边框上方，亮色边框配黑字，暗色配白字
      let label = label_text(&item.kind, item.score);
      let (label_x, label_y) = label_anchor(&item.bbox);
      let mut image: ImageBuffer<Rgb<u8>, &mut [u8]> =
        ImageBuffer::from_raw(W, H, frame.as_mut()).expect("帧缓冲尺寸与图像不匹配");
      draw_text_mut(
        &mut image,
        text_color_for(color),
        label_x,
        label_y,
        PxScale::from(self.font_size),
        &self.font,
        &label,
      );
    }
  }
}

impl<const W: u32, const H: u32, T: WithLabel> Render<BgrFrame<W, H>, DetectResult<T>> for Draw {
  type Error = std::convert::Infallible;

  fn render_result(
    &self,
    frame: &mut BgrFrame<W, H>,
    result: &DetectResult<T>,
  ) -> Result<(), Self::Error> {
    self.draw_detections(frame, result);
    Ok(())
  }
}

/// 在帧上绘制一个矩形边框，bbox 为像素坐标 [x_min, y_min, x_max, y_max]。
/// 坐标先裁剪到帧边界，退化的边框直接跳过。
pub fn draw_border<const W: u32, const H: u32>(
  frame: &mut BgrFrame<W, H>,
  bbox: &[f32; 4],
  color: [u8; 3],
) {
  let mut image: ImageBuffer<Rgb<u8>, &mut [u8]> =
    ImageBuffer::from_raw(W, H, frame.as_mut()).expect("帧缓冲尺寸与图像不匹配");
  let (w, h) = (W as i32, H as i32);

  let mut x_min = bbox[0].floor() as i32;
  let mut y_min = bbox[1].floor() as i32;
  let mut x_max = bbox[2].ceil() as i32;
  let mut y_max = bbox[3].ceil() as i32;

  x_min = x_min.clamp(0, w - 1);
  y_min = y_min.clamp(0, h - 1);
  x_max = x_max.clamp(0, w - 1);
  y_max = y_max.clamp(0, h - 1);

  if x_min >= x_max || y_min >= y_max {
    return;
  }

  // 绘制边框（加粗为 2 像素）
  for thickness in 0..BORDER_THICKNESS {
    let x_min_t = (x_min + thickness).min(w - 1);
    let y_min_t = (y_min + thickness).min(h - 1);
    let x_max_t = (x_max - thickness).max(0);
    let y_max_t = (y_max - thickness).max(0);

    for x in x_min_t..=x_max_t {
      *image.get_pixel_mut(x as u32, y_min_t as u32) = Rgb(color);
      *image.get_pixel_mut(x as u32, y_max_t as u32) = Rgb(color);
    }
    for y in y_min_t..=y_max_t {
      *image.get_pixel_mut(x_min_t as u32, y as u32) = Rgb(color);
      *image.get_pixel_mut(x_max_t as u32, y as u32) = Rgb(color);
    }
  }
}

pub fn label_text<T: WithLabel>(kind: &T, score: f32) -> String {
  format!("{} {:.2}", kind.to_label_str(), score)
}

/// 根据边框颜色明度选择标签文本颜色。
pub fn text_color_for(color: [u8; 3]) -> Rgb<u8> {
  let brightness: f32 = color.iter().map(|&c| c as f32).sum();
  if brightness > BRIGHTNESS_THRESHOLD {
    Rgb([0u8, 0u8, 0u8])
  } else {
    Rgb([255u8, 255u8, 255u8])
  }
}

/// 标签锚点：边框左上角上方，越界时贴到图像顶部。
pub fn label_anchor(bbox: &[f32; 4]) -> (i32, i32) {
  let x = bbox[0].floor() as i32;
  let y = (bbox[1].floor() as i32 - LABEL_TEXT_OFFSET).max(0);
  (x, y)
}
