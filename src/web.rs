// 该文件是 Weilou （危楼百尺） 项目的一部分。
// src/web.rs - Web 界面与检测接口
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
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::frame::BgrFrame;
use crate::label::BuildingLabel;
use crate::model::{DetectResult, Model};
use crate::output::Render;
use crate::pipeline::{DETECT_HEIGHT, DETECT_WIDTH, Pipeline};

/// 请求体大小上限，足够容纳常见照片。
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// 推理状态。模型推理需要独占访问，放在异步互斥锁后面，
/// 上传请求按到达顺序排队。
pub struct AppState<M, R> {
  pipeline: Mutex<Pipeline<M, R>>,
}

impl<M, R> AppState<M, R> {
  pub fn new(pipeline: Pipeline<M, R>) -> Self {
    Self {
      pipeline: Mutex::new(pipeline),
    }
  }
}

pub fn router<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>, Output = DetectResult<u32>, Error = ME>
    + Send
    + 'static,
  R: Render<BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>, DetectResult<BuildingLabel>, Error = RE>
    + Send
    + 'static,
>(
  state: Arc<AppState<M, R>>,
) -> Router {
  Router::new()
    .route("/", get(index))
    .route("/api/detect", post(detect::<ME, RE, M, R>))
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .with_state(state)
}

pub async fn serve<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>, Output = DetectResult<u32>, Error = ME>
    + Send
    + 'static,
  R: Render<BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>, DetectResult<BuildingLabel>, Error = RE>
    + Send
    + 'static,
>(
  listen: SocketAddr,
  state: Arc<AppState<M, R>>,
) -> anyhow::Result<()> {
  let app = router(state);
  let listener = tokio::net::TcpListener::bind(listen).await?;
  info!("监听地址: http://{}", listen);
  axum::serve(listener, app).await?;
  Ok(())
}

async fn index() -> Html<&'static str> {
  Html(INDEX_HTML)
}

async fn detect<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>, Output = DetectResult<u32>, Error = ME>
    + Send
    + 'static,
  R: Render<BgrFrame<DETECT_WIDTH, DETECT_HEIGHT>, DetectResult<BuildingLabel>, Error = RE>
    + Send
    + 'static,
>(
  State(state): State<Arc<AppState<M, R>>>,
  body: Bytes,
) -> Response {
  let image = match image::load_from_memory(&body) {
    Ok(image) => image,
    Err(err) => {
      error!("无法解码上传的图像: {}", err);
      return (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": format!("invalid image: {err}") })),
      )
        .into_response();
    }
  };

  info!(
    "收到检测请求: {}x{}, {} 字节",
    image.width(),
    image.height(),
    body.len()
  );

  let annotated = {
    let mut pipeline = state.pipeline.lock().await;
    pipeline.annotate_image(&image)
  };

  let annotated = match annotated {
    Ok(annotated) => annotated,
    Err(err) => {
      error!("检测失败: {:#}", err);
      return (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("detection failed: {err:#}") })),
      )
        .into_response();
    }
  };

  let mut buffer = std::io::Cursor::new(Vec::new());
  if let Err(err) = annotated.write_to(&mut buffer, image::ImageFormat::Png) {
    error!("无法编码输出图像: {}", err);
    return (
      StatusCode::INTERNAL_SERVER_ERROR,
      Json(json!({ "error": format!("encoding failed: {err}") })),
    )
      .into_response();
  }

  (
    StatusCode::OK,
    [(header::CONTENT_TYPE, "image/png")],
    buffer.into_inner(),
  )
    .into_response()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Object Detection with YOLOv8</title>
<style>
  body { max-width: 46rem; margin: 0 auto; padding: 2rem 1rem; font-family: sans-serif; }
  p { margin: 10px auto; text-align: justify; font-size: 20px; }
  img { max-width: 100%; display: block; margin: 0 auto; }
  figure { margin: 1rem 0; }
  figcaption { text-align: center; color: #555; font-size: 14px; margin-top: 4px; }
  button { font-size: 16px; padding: 6px 16px; }
  .hidden { display: none; }
  #error { color: #b00020; }
</style>
</head>
<body>
<h1>Object Detection with YOLOv8</h1>
<p>🚀Welcome to the introduction page of our project! In this project, we will be exploring the YOLO (You Only Look Once) algorithm. YOLO is known for its ability to detect objects in an image in a single pass, making it a highly efficient and accurate object detection algorithm.🎯</p>
<p>The latest version of YOLO, YOLOv8, released in January 2023 by Ultralytics, has introduced several modifications that have further improved its performance. 🌟</p>

<p><label for="file">Choose an image...</label></p>
<input id="file" type="file" accept=".jpg,.jpeg,.png">

<figure id="uploaded-figure" class="hidden">
  <img id="uploaded-image" alt="Uploaded Image">
  <figcaption>Uploaded Image</figcaption>
</figure>

<p><button id="detect" disabled>Detect Objects</button></p>

<figure id="output-figure" class="hidden">
  <img id="output-image" alt="Output Image">
  <figcaption>Output Image</figcaption>
</figure>

<p id="error" class="hidden"></p>

<script>
const fileInput = document.getElementById("file");
const detectButton = document.getElementById("detect");
const uploadedFigure = document.getElementById("uploaded-figure");
const uploadedImage = document.getElementById("uploaded-image");
const outputFigure = document.getElementById("output-figure");
const outputImage = document.getElementById("output-image");
const errorBox = document.getElementById("error");

fileInput.addEventListener("change", () => {
  const file = fileInput.files[0];
  if (!file) {
    detectButton.disabled = true;
    return;
  }
  uploadedImage.src = URL.createObjectURL(file);
  uploadedFigure.classList.remove("hidden");
  outputFigure.classList.add("hidden");
  errorBox.classList.add("hidden");
  detectButton.disabled = false;
});

detectButton.addEventListener("click", async () => {
  const file = fileInput.files[0];
  if (!file) {
    return;
  }
  detectButton.disabled = true;
  errorBox.classList.add("hidden");
  try {
    const response = await fetch("/api/detect", { method: "POST", body: file });
    if (!response.ok) {
      const detail = await response.json().catch(() => ({ error: response.statusText }));
      throw new Error(detail.error);
    }
    const blob = await response.blob();
    outputImage.src = URL.createObjectURL(blob);
    outputFigure.classList.remove("hidden");
  } catch (err) {
    errorBox.textContent = err.message;
    errorBox.classList.remove("hidden");
  } finally {
    detectButton.disabled = false;
  }
});
</script>
</body>
</html>
"#;
