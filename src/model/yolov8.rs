// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/model/yolov8.rs - YOLOv8 ONNX 模型
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

use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::{inputs, value::Tensor};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::frame::BgrFrame;
use crate::label::CLASS_NUM;
use crate::model::{DetectItem, DetectOptions, DetectResult, Model};
#[cfg(feature = "archive")]
use crate::output::{ArchiveError, ArchiveSink};

const YOLOV8_NUM_INPUTS: usize = 1;
const YOLOV8_NUM_OUTPUTS: usize = 1;
const YOLOV8_DEFAULT_INPUT_NAME: &str = "images";

#[derive(Error, Debug)]
pub enum Yolov8Error {
  #[error("模型文件不存在: {}", .0.display())]
  ModelNotFound(PathBuf),
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(#[from] ort::Error),
  #[cfg(feature = "archive")]
  #[error("记录输出错误: {0}")]
  ArchiveError(#[from] ArchiveError),
}

impl Yolov8Error {
  pub fn invalid(msg: impl Into<String>) -> Self {
    Yolov8Error::ModelInvalid(msg.into())
  }
}

/// YOLOv8 模型构建器。`build` 在启动阶段完成全部校验：
/// 文件存在、输入输出数量、以及一次预热推理对输出形状与类别数的检查。
pub struct Yolov8Builder {
  model_path: PathBuf,
  intra_threads: usize,
  #[cfg(feature = "archive")]
  archive_dir: Option<PathBuf>,
}

impl Yolov8Builder {
  pub fn new(model_path: impl Into<PathBuf>) -> Self {
    Self {
      model_path: model_path.into(),
      intra_threads: 4,
      #[cfg(feature = "archive")]
      archive_dir: None,
    }
  }

  pub fn intra_threads(mut self, intra_threads: usize) -> Self {
    self.intra_threads = intra_threads;
    self
  }

  /// 启用推理调用的记录副作用，副本与原始检测文本写入该目录。
  #[cfg(feature = "archive")]
  pub fn archive_to(mut self, directory: impl Into<PathBuf>) -> Self {
    self.archive_dir = Some(directory.into());
    self
  }

  pub fn build<const W: u32, const H: u32>(self) -> Result<Yolov8<W, H>, Yolov8Error> {
    info!("加载模型文件: {}", self.model_path.display());
    if !self.model_path.exists() {
      error!("模型文件不存在: {}", self.model_path.display());
      return Err(Yolov8Error::ModelNotFound(self.model_path));
    }
    debug!(
      "模型文件大小: {:.2} MB",
      std::fs::metadata(&self.model_path)?.len() as f64 / (1024.0 * 1024.0)
    );

    info!("创建 ONNX Runtime 会话");
    let session = Session::builder()?
      .with_optimization_level(GraphOptimizationLevel::Level3)?
      .with_intra_threads(self.intra_threads)?
      .commit_from_file(&self.model_path)?;

    let num_inputs = session.inputs.len();
    let num_outputs = session.outputs.len();

    if num_inputs != YOLOV8_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        YOLOV8_NUM_INPUTS, num_inputs
      );
      return Err(Yolov8Error::invalid(format!(
        "预期模型输入数量为 {}, 实际为 {}",
        YOLOV8_NUM_INPUTS, num_inputs
      )));
    }

    if num_outputs != YOLOV8_NUM_OUTPUTS {
      error!(
        "预期模型输出数量为 {}, 实际为 {}",
        YOLOV8_NUM_OUTPUTS, num_outputs
      );
      return Err(Yolov8Error::invalid(format!(
        "预期模型输出数量为 {}, 实际为 {}",
        YOLOV8_NUM_OUTPUTS, num_outputs
      )));
    }

    debug!("模型输入数量: {}", num_inputs);
    debug!("模型输出数量: {}", num_outputs);

    let input_name = session
      .inputs
      .first()
      .map(|input| input.name.clone())
      .unwrap_or_else(|| YOLOV8_DEFAULT_INPUT_NAME.to_string());
    debug!("模型输入名称: {}", input_name);

    let mut model = Yolov8 {
      session,
      input_name,
      #[cfg(feature = "archive")]
      archive: self.archive_dir.map(ArchiveSink::new),
    };

    // 预热一次：触发内核编译，同时在启动阶段校验输出形状与注册表类别数
    info!("预热模型并校验输出形状");
    let warmup_options = DetectOptions {
      save: false,
      save_txt: false,
      ..DetectOptions::default()
    };
    model.infer(&BgrFrame::<W, H>::default(), &warmup_options)?;
    info!("模型加载完成");

    Ok(model)
  }
}

/// YOLOv8 检测模型，输入为 W×H 的 BGR 帧。
pub struct Yolov8<const W: u32, const H: u32> {
  session: Session,
  input_name: String,
  #[cfg(feature = "archive")]
  archive: Option<ArchiveSink>,
}

impl<const W: u32, const H: u32> Model for Yolov8<W, H> {
  type Input = BgrFrame<W, H>;
  type Output = DetectResult<u32>;
  type Error = Yolov8Error;

  fn infer(
    &mut self,
    input: &Self::Input,
    options: &DetectOptions,
  ) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入");
    let tensor = Tensor::from_array(([1usize, 3, H as usize, W as usize], preprocess(input)))?;

    debug!("执行模型推理");
    let model_inputs = inputs![&self.input_name => tensor];
    let outputs = self.session.run(model_inputs)?;

    debug!("获取模型输出");
    let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
    if shape.len() != 3 || shape[0] != 1 {
      error!("预期输出形状为 [1, 属性, 锚点], 实际为 {:?}", shape);
      return Err(Yolov8Error::invalid(format!(
        "预期输出形状为 [1, 属性, 锚点], 实际为 {:?}",
        shape
      )));
    }

    let num_attrs = shape[1] as usize;
    let num_anchors = shape[2] as usize;
    if num_attrs != 4 + CLASS_NUM {
      error!("预期输出属性数量为 {}, 实际为 {}", 4 + CLASS_NUM, num_attrs);
      return Err(Yolov8Error::invalid(format!(
        "预期输出属性数量为 {}, 实际为 {}",
        4 + CLASS_NUM,
        num_attrs
      )));
    }

    let candidates = decode_output(
      data,
      num_attrs,
      num_anchors,
      options.confidence,
      W as f32,
      H as f32,
    );
    debug!("置信度筛选后剩余 {} 个候选", candidates.len());

    let items = nms(candidates, options.iou);
    debug!("检测到 {} 个物体", items.len());

    let result = DetectResult {
      items: items.into_boxed_slice(),
    };

    #[cfg(feature = "archive")]
    if options.save || options.save_txt {
      if let Some(archive) = &self.archive {
        archive.record(input, &result, options)?;
      }
    }

    Ok(result)
  }
}

/// 将 BGR 帧转换为模型输入张量（NCHW、RGB、[0,1]）。
/// 权重按 RGB 训练，这里同时完成通道反转与归一化。
pub fn preprocess<const W: u32, const H: u32>(frame: &BgrFrame<W, H>) -> Vec<f32> {
  let data = frame.as_ref();
  let plane = W as usize * H as usize;
  let mut tensor = vec![0f32; 3 * plane];

  for (i, pixel) in data.chunks_exact(3).enumerate() {
    tensor[i] = pixel[2] as f32 / 255.0;
    tensor[plane + i] = pixel[1] as f32 / 255.0;
    tensor[2 * plane + i] = pixel[0] as f32 / 255.0;
  }

  tensor
}

/// 解码转置输出 [1, 4+类别数, 锚点数]：
/// 逐锚点取最高类别分，过置信度阈值后把 cxcywh 转为 xyxy 并裁剪到图像边界。
pub fn decode_output(
  data: &[f32],
  num_attrs: usize,
  num_anchors: usize,
  confidence: f32,
  width: f32,
  height: f32,
) -> Vec<DetectItem<u32>> {
  let num_classes = num_attrs - 4;
  let mut items = Vec::new();

  for i in 0..num_anchors {
    let (score, class_id) = {
      let mut score = f32::MIN;
      let mut class_id = 0usize;
      for c in 0..num_classes {
        let s = data[(4 + c) * num_anchors + i];
        if s > score {
          score = s;
          class_id = c;
        }
      }
      (score, class_id as u32)
    };

    if score < confidence {
      continue;
    }

    let cx = data[i];
    let cy = data[num_anchors + i];
    let w = data[2 * num_anchors + i];
    let h = data[3 * num_anchors + i];

    let x_min = (cx - w / 2.0).clamp(0.0, width);
    let y_min = (cy - h / 2.0).clamp(0.0, height);
    let x_max = (cx + w / 2.0).clamp(0.0, width);
    let y_max = (cy + h / 2.0).clamp(0.0, height);

    items.push(DetectItem {
      kind: class_id,
      score,
      bbox: [x_min, y_min, x_max, y_max],
    });
  }

  items
}

/// 逐类别的非极大值抑制。
pub fn nms(mut items: Vec<DetectItem<u32>>, iou_threshold: f32) -> Vec<DetectItem<u32>> {
  // 按置信度降序排序
  items.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());

  let mut result = Vec::new();
  while !items.is_empty() {
    let best = items.remove(0);
    items.retain(|item| item.kind != best.kind || iou(&best.bbox, &item.bbox) < iou_threshold);
    result.push(best);
  }

  result
}

/// 计算两个 xyxy 边界框的 IoU。
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]) * (a[3] - a[1]);
  let area_b = (b[2] - b[0]) * (b[3] - b[1]);
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}
