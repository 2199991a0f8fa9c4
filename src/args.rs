// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Weilou 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// YOLOv8 ONNX 模型文件路径
  #[arg(long, value_name = "FILE")]
  pub model: PathBuf,

  /// 标签字体文件路径
  #[arg(long, default_value = "assets/DejaVuSans.ttf", value_name = "FILE")]
  pub font: PathBuf,

  /// HTTP 服务监听地址
  #[arg(long, default_value = "0.0.0.0:8080", value_name = "ADDR")]
  pub listen: SocketAddr,

  /// 检测记录目录
  #[cfg(feature = "archive")]
  #[arg(long, default_value = "runs/detect", value_name = "DIR")]
  pub record_dir: PathBuf,
}
