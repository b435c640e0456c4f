//! Request handlers.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect, Response};
use askama::Template;
use menage_intake::{IntakeError, parse_sid};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;
use crate::multipart::collect_form;
use crate::views::{FormPage, SubmissionsPage};

#[derive(Debug, Deserialize)]
pub struct FormQuery {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThankYouQuery {
    pub sid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub token: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<FormQuery>,
) -> Result<Html<String>, AppError> {
    let flash = query.error.filter(|message| !message.is_empty());
    Ok(Html(FormPage::new(&state.schema, flash).render()?))
}

pub async fn submit(State(state): State<AppState>, multipart: Multipart) -> Result<Response, AppError> {
    let form = collect_form(multipart).await?;
    let processor = state.processor.clone();

    let outcome = tokio::task::spawn_blocking(move || processor.process(form))
        .await
        .map_err(|e| AppError::Internal(format!("submission task failed: {e}")))?;

    match outcome {
        Ok(id) => Ok(Redirect::to(&format!("/thank-you?sid={id}")).into_response()),
        Err(IntakeError::Validation(report)) => {
            let message = report.to_string();
            Ok(Redirect::to(&format!("/?error={}", urlencoding::encode(&message))).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn thank_you(Query(query): Query<ThankYouQuery>) -> Result<Html<String>, AppError> {
    Ok(Html(SubmissionsPage::thank_you(query.sid.as_deref()).render()?))
}

pub async fn uploaded_file(
    State(state): State<AppState>,
    Path((sid, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let id = parse_sid(&sid).ok_or(AppError::NotFound)?;
    let path = state
        .uploads
        .resolve(id, &filename)
        .ok_or(AppError::NotFound)?;

    let content = tokio::fs::read(&path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Stored upload unreadable");
        AppError::NotFound
    })?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, mime.to_string())], content).into_response())
}

pub async fn admin(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Html<String>, AppError> {
    let access = state
        .gate
        .authorize(query.token.as_deref())
        .ok_or(AppError::Forbidden)?;

    let reader = state.reader.clone();
    let submissions = tokio::task::spawn_blocking(move || reader.list_recent(&access))
        .await
        .map_err(|e| AppError::Internal(format!("admin listing task failed: {e}")))??;

    let page = SubmissionsPage::listing(&state.schema, &submissions);
    Ok(Html(page.render()?))
}

pub async fn healthz() -> &'static str {
    "ok"
}
