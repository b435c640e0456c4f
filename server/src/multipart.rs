//! Collects a multipart body into a [`RawForm`].

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use menage_intake::{RawForm, UploadedFile};

use crate::error::AppError;

/// An over-limit body surfaces as a read error partway through the stream.
fn multipart_error(context: &str, err: &MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(error = %err, "Multipart body over the size limit");
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(format!("{context}: {err}"))
    }
}

/// Read every named part. Parts carrying a filename (even an empty one) are
/// files, the rest are text fields. The first value of a repeated name wins.
pub async fn collect_form(mut multipart: Multipart) -> Result<RawForm, AppError> {
    let mut form = RawForm::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("malformed multipart body", &e))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let filename = field.file_name().map(str::to_owned);

        match filename {
            Some(filename) => {
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(&format!("failed to read {name}"), &e))?;
                form.files
                    .entry(name)
                    .or_insert_with(|| UploadedFile::new(filename, content.to_vec()));
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(&format!("failed to read {name}"), &e))?;
                form.fields.entry(name).or_insert(value);
            }
        }
    }

    tracing::debug!(
        fields = form.fields.len(),
        files = form.files.len(),
        "Multipart body collected"
    );
    Ok(form)
}
