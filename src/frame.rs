// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/frame.rs - 显示/推理两种通道顺序的帧定义
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

use image::{DynamicImage, RgbImage, imageops::FilterType};

const CHANNELS: usize = 3;

/// 显示顺序（RGB）的交错像素帧。
///
/// 上传的图像经 `from_image` 强制缩放到 W×H，不保留纵横比。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame<const W: u32, const H: u32> {
  data: Box<[u8]>,
}

/// 推理顺序（BGR）的交错像素帧，模型调用与标注绘制都在该表示上进行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrFrame<const W: u32, const H: u32> {
  data: Box<[u8]>,
}

fn frame_len<const W: u32, const H: u32>() -> usize {
  CHANNELS * W as usize * H as usize
}

/// 交换每个像素的第 0 与第 2 通道。RGB 与 BGR 互换使用同一个操作。
fn swap_channels(data: &mut [u8]) {
  for pixel in data.chunks_exact_mut(CHANNELS) {
    pixel.swap(0, 2);
  }
}

impl<const W: u32, const H: u32> From<Vec<u8>> for RgbFrame<W, H> {
  fn from(data: Vec<u8>) -> Self {
    if data.len() != frame_len::<W, H>() {
      panic!(
        "数据长度不匹配: 期望长度 {}, 实际长度 {}",
        frame_len::<W, H>(),
        data.len()
      );
    }

    Self {
      data: data.into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> Default for RgbFrame<W, H> {
  fn default() -> Self {
    Self {
      data: vec![0u8; frame_len::<W, H>()].into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> RgbFrame<W, H> {
  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn channels(&self) -> usize {
    CHANNELS
  }

  /// 从任意尺寸的解码图像构造帧：强制缩放到 W×H。
  /// 纵横比不保留，变形是既定行为。
  pub fn from_image(image: &DynamicImage) -> Self {
    let resized = image.resize_exact(W, H, FilterType::CatmullRom);
    Self {
      data: resized.to_rgb8().into_raw().into_boxed_slice(),
    }
  }

  pub fn to_image(&self) -> RgbImage {
    RgbImage::from_raw(W, H, self.data.to_vec()).expect("帧长度与图像尺寸不匹配")
  }

  /// 转换到推理顺序。与 `BgrFrame::to_rgb` 互逆。
  pub fn to_bgr(&self) -> BgrFrame<W, H> {
    let mut data = self.data.clone();
    swap_channels(&mut data);
    BgrFrame { data }
  }
}

impl<const W: u32, const H: u32> AsRef<[u8]> for RgbFrame<W, H> {
  fn as_ref(&self) -> &[u8] {
    &self.data
  }
}

impl<const W: u32, const H: u32> AsMut<[u8]> for RgbFrame<W, H> {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> From<Vec<u8>> for BgrFrame<W, H> {
  fn from(data: Vec<u8>) -> Self {
    if data.len() != frame_len::<W, H>() {
      panic!(
        "数据长度不匹配: 期望长度 {}, 实际长度 {}",
        frame_len::<W, H>(),
        data.len()
      );
    }

    Self {
      data: data.into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> Default for BgrFrame<W, H> {
  fn default() -> Self {
    Self {
      data: vec![0u8; frame_len::<W, H>()].into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> BgrFrame<W, H> {
  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn channels(&self) -> usize {
    CHANNELS
  }

  /// 转换回显示顺序。与 `RgbFrame::to_bgr` 互逆。
  pub fn to_rgb(&self) -> RgbFrame<W, H> {
    let mut data = self.data.clone();
    swap_channels(&mut data);
    RgbFrame { data }
  }
}

impl<const W: u32, const H: u32> AsRef<[u8]> for BgrFrame<W, H> {
  fn as_ref(&self) -> &[u8] {
    &self.data
  }
}

impl<const W: u32, const H: u32> AsMut<[u8]> for BgrFrame<W, H> {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}
