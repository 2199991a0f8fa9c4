// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/pipeline.rs - 检测流水线
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

use image::{DynamicImage, RgbImage};
use tracing::{debug, info};

use crate::frame::{BgrFrame, RgbFrame};
use crate::label::BuildingLabel;
use crate::model::{DetectOptions, DetectResult, Model};
use crate::output::Render;

/// 检测分辨率。输入图像统一缩放到该尺寸后推理，不保持纵横比。
pub const DETECT_WIDTH: u32 = 512;
pub const DETECT_HEIGHT: u32 = 512;

/// 从上传图像到标注图像的完整流程：缩放、推理、类别解析、绘制。
pub struct Pipeline<M, R> {
  model: M,
  render: R,
  options: DetectOptions,
}

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>, Output = DetectResult<u32>, Error = ME>,
  R: Render<BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>, DetectResult<BuildingLabel>, Error = RE>,
> Pipeline<M, R>
{
  pub fn new(model: M, render: R) -> Self {
    Self {
      model,
      render,
      options: DetectOptions::default(),
    }
  }

  pub fn options(mut self, options: DetectOptions) -> Self {
    self.options = options;
    self
  }

  /// 只检测，不绘制。返回解析为建筑类别后的结果。
  pub fn detect_image(
    &mut self,
    image: &DynamicImage,
  ) -> anyhow::Result<DetectResult<BuildingLabel>> {
    let frame = RgbFrame::<DETECT_WIDTH, DETECT_HEIGHT>::from_image(image).to_bgr();
    self.detect_frame(&frame)
  }

  /// 检测并在缩放后的图像上绘制边框与标签，返回标注图像。
  pub fn annotate_image(&mut self, image: &DynamicImage) -> anyhow::Result<RgbImage> {
    debug!(
      "缩放输入图像: {}x{} -> {}x{}",
      image.width(),
      image.height(),
      DETECT_WIDTH,
      DETECT_HEIGHT
    );
    let mut frame = RgbFrame::<DETECT_WIDTH, DETECT_HEIGHT>::from_image(image).to_bgr();

    let result = self.detect_frame(&frame)?;
    self.render.render_result(&mut frame, &result)?;

    Ok(frame.to_rgb().to_image())
  }

  fn detect_frame(
    &mut self,
    frame: &BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>,
  ) -> anyhow::Result<DetectResult<BuildingLabel>> {
    let now = std::time::Instant::now();
    let result = self.model.infer(frame, &self.options)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    let result = result.resolve_labels::<BuildingLabel>()?;
    info!("检测到 {} 个目标", result.len());

    Ok(result)
  }
}
