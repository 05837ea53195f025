use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use bytes::Bytes;
use image::DynamicImage;
use snafu::ResultExt;
use tracing::*;
use uuid::Uuid;

use crate::{
    consts::IMAGE_FIELD,
    reading::DetectionResponse,
    server::{error::*, state::AppState},
};

/// POST /detect - read the glyphs of an uploaded image left to right
///
/// Expects `multipart/form-data` with the image bytes in the `image` field.
///
/// # Errors
/// - 400: no `image` field, malformed body, or bytes that are not an image
/// - 413: body above the upload limit
/// - 500: detector failure
#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn detect_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectionResponse>, ApiError> {
    detect(state, multipart)
        .await
        .map(Json)
        .inspect_err(ApiError::log)
}

async fn detect(
    state: AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<DetectionResponse, ApiError> {
    // A request that is not multipart carries no image field either.
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!(%rejection, "Request body is not multipart");
            return MissingImageSnafu.fail();
        }
    };

    let bytes = read_image_field(&mut multipart).await?;
    debug!(bytes = bytes.len(), "Received upload");

    let detector = state.detector.clone();
    let span = Span::current();
    let sets = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();

        let image = decode_color_image(&bytes)?;
        debug!(width = image.width(), height = image.height(), "Decoded upload");

        detector
            .detect(std::slice::from_ref(&image))
            .context(DetectionSnafu)
    })
    .await
    .context(WorkerSnafu)??;

    let response = DetectionResponse::from_sets(sets).context(DetectionSnafu)?;
    info!(
        predictions = response.predictions.len(),
        text = %response.detected_text,
        "Detection complete"
    );

    Ok(response)
}

/// Bytes of the first `image` field; other fields are skipped.
async fn read_image_field(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await.context(MultipartSnafu)? {
        if field.name() == Some(IMAGE_FIELD) {
            return field.bytes().await.context(MultipartSnafu);
        }
    }

    MissingImageSnafu.fail()
}

/// Decodes any supported format into a 3-channel RGB image, dropping alpha.
pub fn decode_color_image(bytes: &[u8]) -> Result<DynamicImage, ApiError> {
    let image = image::load_from_memory(bytes).context(DecodeSnafu)?;

    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}
