// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use weilou::model::Yolov8Builder;
use weilou::output::Draw;
use weilou::pipeline::{DETECT_HEIGHT, DETECT_WIDTH, Pipeline};
use weilou::web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型文件路径: {}", args.model.display());
  info!("字体文件路径: {}", args.font.display());
  info!("监听地址: {}", args.listen);
  #[cfg(feature = "archive")]
  info!("检测记录目录: {}", args.record_dir.display());

  // 字体与模型任一缺失都在启动阶段失败
  let draw = Draw::from_font_file(&args.font)?;

  let builder = Yolov8Builder::new(&args.model);
  #[cfg(feature = "archive")]
  let builder = builder.archive_to(&args.record_dir);
  let model = builder.build::<DETECT_WIDTH, DETECT_HEIGHT>()?;

  let pipeline = Pipeline::new(model, draw);
  let state = Arc::new(AppState::new(pipeline));

  weilou::web::serve(args.listen, state).await?;

  Ok(())
}
