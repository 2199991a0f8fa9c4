//! 绘制模块的集成测试。
//!
//! 覆盖内容：
//! - 标签文本与颜色选择的纯函数
//! - 边框绘制的像素级检查（厚度、裁剪、退化边框）
//! - 内嵌字体下完整渲染路径（边框 + 标签文本）的端到端检查
//! - BGR 帧上按约定写入颜色后的显示效果
//! - 字体文件缺失时的错误

mod common;

use image::Rgb;

use common::*;
use weilou::frame::BgrFrame;
use weilou::label::{BuildingLabel, WithLabel};
use weilou::model::{DetectItem, DetectResult};
use weilou::output::{DrawError, Render};
use weilou::output::draw::{Draw, draw_border, label_anchor, label_text, text_color_for};

fn pixel_at<const W: u32, const H: u32>(frame: &BgrFrame<W, H>, x: u32, y: u32) -> [u8; 3] {
  let index = ((y * W + x) * 3) as usize;
  let data = frame.as_ref();
  [data[index], data[index + 1], data[index + 2]]
}

#[test]
fn test_text_color_follows_brightness() {
  // 暗色边框配白字
  assert_eq!(text_color_for([0, 0, 255]), Rgb([255, 255, 255]));
  assert_eq!(text_color_for([0, 255, 0]), Rgb([255, 255, 255]));
  assert_eq!(text_color_for([255, 0, 0]), Rgb([255, 255, 255]));
  // 灰色 (128, 128, 128) 明度和为 384，超过阈值，配黑字
  assert_eq!(text_color_for([128, 128, 128]), Rgb([0, 0, 0]));
}

#[test]
fn test_text_color_threshold_boundary() {
  // 明度和 382 不超过 382.5，仍为白字；383 则为黑字
  assert_eq!(text_color_for([127, 127, 128]), Rgb([255, 255, 255]));
  assert_eq!(text_color_for([127, 128, 128]), Rgb([0, 0, 0]));
}

#[test]
fn test_label_text_format() {
  let label = BuildingLabel::try_from_label_id(2).unwrap();
  assert_eq!(label_text(&label, 0.25), "damagedresidentialbuilding 0.25");
  assert_eq!(label_text(&label, 0.947), "damagedresidentialbuilding 0.95");
  assert_eq!(label_text(&label, 0.5), "damagedresidentialbuilding 0.50");
}

#[test]
fn test_label_anchor_above_border() {
  assert_eq!(label_anchor(&[40.0, 100.0, 80.0, 140.0]), (40, 90));
}

#[test]
fn test_label_anchor_clamped_to_top() {
  // 边框贴近顶部时锚点不越界
  assert_eq!(label_anchor(&[40.0, 3.0, 80.0, 140.0]), (40, 0));
}

#[test]
fn test_draw_border_two_pixels_thick() {
  let mut frame = BgrFrame::<32, 32>::default();
  draw_border(&mut frame, &[4.0, 4.0, 20.0, 20.0], [0, 255, 0]);

  // 1. 外圈与内圈均被着色
  assert_eq!(pixel_at(&frame, 4, 4), [0, 255, 0]);
  assert_eq!(pixel_at(&frame, 20, 20), [0, 255, 0]);
  assert_eq!(pixel_at(&frame, 12, 4), [0, 255, 0]);
  assert_eq!(pixel_at(&frame, 5, 5), [0, 255, 0]);
  assert_eq!(pixel_at(&frame, 12, 5), [0, 255, 0]);

  // 2. 边框以外与边框内部保持原样
  assert_eq!(pixel_at(&frame, 3, 3), [0, 0, 0]);
  assert_eq!(pixel_at(&frame, 6, 6), [0, 0, 0]);
  assert_eq!(pixel_at(&frame, 12, 12), [0, 0, 0]);
}

#[test]
fn test_draw_border_clips_to_frame() {
  let mut frame = BgrFrame::<32, 32>::default();
  draw_border(&mut frame, &[-5000.0, -5000.0, 5000.0, 5000.0], [10, 20, 30]);

  assert_eq!(pixel_at(&frame, 0, 0), [10, 20, 30]);
  assert_eq!(pixel_at(&frame, 31, 15), [10, 20, 30]);
  assert_eq!(pixel_at(&frame, 0, 31), [10, 20, 30]);
  assert_eq!(pixel_at(&frame, 16, 16), [0, 0, 0]);
}

#[test]
fn test_draw_border_skips_degenerate_bbox() {
  let mut frame = BgrFrame::<32, 32>::default();
  draw_border(&mut frame, &[10.0, 10.0, 10.0, 30.0], [0, 255, 0]);
  assert!(frame.as_ref().iter().all(|&byte| byte == 0));
}

#[test]
fn test_bgr_color_displays_as_red() {
  // 类别 0 的颜色 (0, 0, 255) 按 BGR 写入帧，显示时为红色
  let mut frame = BgrFrame::<32, 32>::default();
  let color = BuildingLabel::try_from_label_id(0).unwrap().label_color();
  draw_border(&mut frame, &[8.0, 8.0, 24.0, 24.0], color);

  let displayed = frame.to_rgb().to_image();
  assert_eq!(displayed.get_pixel(8, 8), &Rgb([255, 0, 0]));
}

#[test]
fn test_render_result_draws_borders_and_labels() {
  let draw = Draw::new(test_font());
  let mut frame = BgrFrame::<128, 128>::default();
  let result = DetectResult {
    items: vec![
      DetectItem {
        kind: BuildingLabel::UndamagedResidentialBuilding,
        score: 0.9,
        bbox: [20.0, 40.0, 100.0, 100.0],
      },
      DetectItem {
        kind: BuildingLabel::DamagedCommercialBuilding,
        score: 0.3,
        bbox: [30.0, 80.0, 90.0, 120.0],
      },
    ]
    .into_boxed_slice(),
  };

  draw.render_result(&mut frame, &result).unwrap();

  // 1. 两个边框按各自类别颜色绘制。上沿可能与标签文本重叠，断言取下半部
  assert_eq!(pixel_at(&frame, 20, 60), [0, 255, 0]);
  assert_eq!(pixel_at(&frame, 21, 60), [0, 255, 0]);
  assert_eq!(pixel_at(&frame, 100, 60), [0, 255, 0]);
  assert_eq!(pixel_at(&frame, 60, 99), [0, 255, 0]);
  assert_eq!(pixel_at(&frame, 60, 100), [0, 255, 0]);
  assert_eq!(pixel_at(&frame, 30, 110), [255, 0, 0]);
  assert_eq!(pixel_at(&frame, 90, 110), [255, 0, 0]);
  assert_eq!(pixel_at(&frame, 60, 120), [255, 0, 0]);

  // 2. 第一个框的白色标签写在边框上方，文本区留下非零像素
  let label_band_painted = (25..40).any(|y| (0..128).any(|x| pixel_at(&frame, x, y) != [0, 0, 0]));
  assert!(label_band_painted);

  // 3. 边框内部与标签以外的区域保持原样
  assert_eq!(pixel_at(&frame, 60, 60), [0, 0, 0]);
}

#[test]
fn test_from_font_file_missing() {
  let err = Draw::from_font_file("/no/such/font.ttf").unwrap_err();
  assert!(matches!(err, DrawError::IoError(_)));
}
