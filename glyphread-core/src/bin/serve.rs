use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use glyphread_core::consts::*;
use glyphread_core::inference::yolo::YoloConfigBuilder;
use glyphread_core::{OnnxDetector, ServerConfig, serve};

#[derive(Parser)]
#[command(name = "serve")]
#[command(about = "Glyph detection HTTP service")]
struct Args {
    #[arg(long, env = "GLYPHREAD_HOST", default_value = DEFAULT_HOST, help = "Interface to bind")]
    host: String,

    #[arg(
        short,
        long,
        env = "GLYPHREAD_PORT",
        default_value_t = DEFAULT_PORT,
        help = "Port to bind"
    )]
    port: u16,

    #[arg(
        short,
        long,
        env = "GLYPHREAD_MODEL",
        default_value = DEFAULT_MODEL_PATH,
        help = "YOLO ONNX export to load at startup"
    )]
    model: PathBuf,

    #[arg(
        short,
        long,
        env = "GLYPHREAD_LABELS",
        help = "Labels file, one per line (default: names stored in the model)"
    )]
    labels: Option<PathBuf>,

    #[arg(long, default_value_t = PROBA_THRESHOLD, help = "Confidence threshold")]
    conf: f32,

    #[arg(long, default_value_t = NMS_IOU_THRESHOLD, help = "NMS IoU threshold")]
    iou: f32,

    #[arg(long, default_value_t = REQUIRED_SIZE, help = "Model input size")]
    imgsz: usize,

    #[arg(long, default_value_t = MAX_DETECTIONS, help = "Maximum detections per image")]
    max_det: usize,

    #[arg(
        long,
        env = "GLYPHREAD_MAX_UPLOAD_BYTES",
        default_value_t = MAX_UPLOAD_BYTES,
        help = "Largest accepted request body"
    )]
    max_upload_bytes: usize,

    #[arg(long, help = "Emit logs as JSON")]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let yolo_config = YoloConfigBuilder::default()
        .input_size(args.imgsz)
        .proba_threshold(args.conf)
        .iou_threshold(args.iou)
        .max_detections(args.max_det)
        .build()?;

    // Fails before binding when the model is missing or unusable
    let detector = OnnxDetector::load(&args.model, args.labels.as_deref(), yolo_config)
        .with_context(|| format!("load detector from {}", args.model.display()))?;

    let server_config = ServerConfig {
        host: args.host,
        port: args.port,
        max_upload_bytes: args.max_upload_bytes,
    };
    info!("Starting glyph detection service on {}", server_config.addr());

    serve(server_config, Arc::new(detector)).await?;

    info!("Server stopped");
    Ok(())
}
