// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/bin/simple_oneshot.rs - 单张图片推理
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

use anyhow::Result;
use clap::Parser;
use image::ImageReader;
use tracing::info;

use weilou::model::Yolov8Builder;
use weilou::output::Draw;
use weilou::pipeline::{DETECT_HEIGHT, DETECT_WIDTH, Pipeline};

/// Weilou 单张图片推理
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// YOLOv8 ONNX 模型文件路径
  #[arg(long, value_name = "MODEL")]
  pub model: PathBuf,
  /// 标签字体文件路径
  #[arg(long, default_value = "assets/DejaVuSans.ttf", value_name = "FONT")]
  pub font: PathBuf,
  /// 输入图片路径
  #[arg(long, value_name = "SOURCE")]
  pub input: PathBuf,
  /// 输出图片路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: PathBuf,
  /// 检测记录目录
  #[cfg(feature = "archive")]
  #[arg(long, value_name = "DIR")]
  pub record_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model.display());
  info!("输入图片: {}", args.input.display());
  info!("输出图片: {}", args.output.display());

  let image = ImageReader::open(&args.input)?.decode()?;

  let draw = Draw::from_font_file(&args.font)?;
  let builder = Yolov8Builder::new(&args.model);
  #[cfg(feature = "archive")]
  let builder = match &args.record_dir {
    Some(directory) => builder.archive_to(directory),
    None => builder,
  };
  let model = builder.build::<DETECT_WIDTH, DETECT_HEIGHT>()?;

  let mut pipeline = Pipeline::new(model, draw);

  info!("开始推理...");
  let now = std::time::Instant::now();
  let annotated = pipeline.annotate_image(&image)?;
  info!("推理完成，耗时: {:.2?}", now.elapsed());

  if let Some(parent) = args.output.parent() {
    if !parent.as_os_str().is_empty() && !parent.exists() {
      std::fs::create_dir_all(parent)?;
    }
  }
  annotated.save(&args.output)?;
  info!("标注图像已保存: {}", args.output.display());

  Ok(())
}
