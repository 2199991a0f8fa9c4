use std::sync::{Arc, Mutex};

use ab_glyph::FontArc;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use weilou::frame::BgrFrame;
use weilou::model::{DetectItem, DetectOptions, DetectResult, Model};
use weilou::output::Render;
use weilou::pipeline::{DETECT_HEIGHT, DETECT_WIDTH};

/// 返回预设检测项的模型替身，不依赖任何模型文件。
/// 每次调用收到的推理选项会被记录下来。
pub struct StubModel {
  items: Vec<DetectItem<u32>>,
  pub options_seen: Arc<Mutex<Vec<DetectOptions>>>,
}

impl StubModel {
  pub fn new(items: Vec<DetectItem<u32>>) -> Self {
    Self {
      items,
      options_seen: Arc::new(Mutex::new(Vec::new())),
    }
  }

  pub fn empty() -> Self {
    Self::new(Vec::new())
  }
}

impl Model for StubModel {
  type Input = BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>;
  type Output = DetectResult<u32>;
  type Error = std::convert::Infallible;

  fn infer(
    &mut self,
    _input: &Self::Input,
    options: &DetectOptions,
  ) -> Result<Self::Output, Self::Error> {
    self.options_seen.lock().unwrap().push(options.clone());
    Ok(DetectResult {
      items: self.items.clone().into_boxed_slice(),
    })
  }
}

/// 记录每次渲染收到的检测数量，不改动帧内容。
#[derive(Clone, Default)]
pub struct CountingRender {
  pub seen: Arc<Mutex<Vec<usize>>>,
}

impl<T> Render<BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>, DetectResult<T>> for CountingRender {
  type Error = std::convert::Infallible;

  fn render_result(
    &self,
    _frame: &mut BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>,
    result: &DetectResult<T>,
  ) -> Result<(), Self::Error> {
    self.seen.lock().unwrap().push(result.items.len());
    Ok(())
  }
}

pub fn make_item(kind: u32, score: f32, bbox: [f32; 4]) -> DetectItem<u32> {
  DetectItem { kind, score, bbox }
}

/// 内嵌的测试字体（DejaVu Sans），测试不读取磁盘上的字体文件。
pub fn test_font() -> FontArc {
  FontArc::try_from_slice(include_bytes!("DejaVuSans.ttf")).expect("无法解析内嵌测试字体")
}

/// 生成带渐变的确定性测试图像。
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
  let image = RgbImage::from_fn(width, height, |x, y| {
    Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
  });
  DynamicImage::ImageRgb8(image)
}

/// 生成 PNG 编码的测试图像字节。
pub fn test_png_bytes(width: u32, height: u32) -> Vec<u8> {
  let mut buffer = std::io::Cursor::new(Vec::new());
  gradient_image(width, height)
    .write_to(&mut buffer, ImageFormat::Png)
    .expect("无法编码测试图像");
  buffer.into_inner()
}
