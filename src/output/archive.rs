// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/output/archive.rs - 检测记录归档
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

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{Datelike, Utc};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::warn;

use crate::frame::BgrFrame;
use crate::label::CLASS_NUM;
use crate::model::{DetectOptions, DetectResult};

#[derive(Error, Debug)]
pub enum ArchiveError {
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 将每次推理的输入副本与检测记录写入按日期分层的目录。
/// 图像副本带细线边框，文本记录使用类别编号。
pub struct ArchiveSink {
  directory: PathBuf,
  colors: Vec<Rgb<u8>>,
  frame_counters: Arc<Mutex<u16>>,
}

impl ArchiveSink {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    // 每个类别一种颜色，按类别编号取模选取
    let colors: Vec<Rgb<u8>> = (0..CLASS_NUM)
      .map(|i| {
        let hue = (i as f32 / CLASS_NUM as f32) * 360.0;
        Self::hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();

    Self {
      directory: directory.into(),
      colors,
      frame_counters: Arc::new(Mutex::new(0)),
    }
  }

  /// HSV 转 RGB
  fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
      (c, x, 0.0)
    } else if h < 120.0 {
      (x, c, 0.0)
    } else if h < 180.0 {
      (0.0, c, x)
    } else if h < 240.0 {
      (0.0, x, c)
    } else if h < 300.0 {
      (x, 0.0, c)
    } else {
      (c, 0.0, x)
    };

    Rgb([
      ((r + m) * 255.0) as u8,
      ((g + m) * 255.0) as u8,
      ((b + m) * 255.0) as u8,
    ])
  }

  fn frame_id(&self) -> u16 {
    let mut counter = self.frame_counters.lock().unwrap();
    let id = counter.wrapping_add(1);
    *counter = id;
    id
  }

  fn frame_path(&self) -> Result<PathBuf, ArchiveError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  pub fn record<const W: u32, const H: u32>(
    &self,
    frame: &BgrFrame<W, H>,
    result: &DetectResult<u32>,
    options: &DetectOptions,
  ) -> Result<(), ArchiveError> {
    let path = self.frame_path()?;
    warn!("保存检测记录: {}", path.display());

    if options.save {
      let mut image = frame.to_rgb().to_image();
      self.draw_outlines(&mut image, result, options.line_thickness);
      image.save(&path)?;
    }

    if options.save_txt && !result.is_empty() {
      let records: Vec<String> = result
        .items
        .iter()
        .map(|item| {
          format!(
            "{}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}",
            item.kind, item.score, item.bbox[0], item.bbox[1], item.bbox[2], item.bbox[3]
          )
        })
        .collect();
      std::fs::write(path.with_extension("txt"), records.join("\n"))?;
    }

    Ok(())
  }

  fn draw_outlines(&self, image: &mut RgbImage, result: &DetectResult<u32>, line_thickness: u32) {
    for item in result.items.iter() {
      let color = self.colors[item.kind as usize % self.colors.len()];

      let x = item.bbox[0].floor() as i32;
      let y = item.bbox[1].floor() as i32;
      let width = (item.bbox[2] - item.bbox[0]).ceil() as i32;
      let height = (item.bbox[3] - item.bbox[1]).ceil() as i32;

      for t in 0..line_thickness as i32 {
        let width_t = width - 2 * t;
        let height_t = height - 2 * t;
        if width_t <= 0 || height_t <= 0 {
          break;
        }
        let rect = Rect::at(x + t, y + t).of_size(width_t as u32, height_t as u32);
        draw_hollow_rect_mut(image, rect, color);
      }
    }
  }
}
