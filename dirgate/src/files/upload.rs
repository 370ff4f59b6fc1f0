//! Multipart Upload Persistence

use std::path::{Component, Path};

use actix_multipart::Multipart;
use actix_web::{mime::Mime, web::Bytes, web::BytesMut};
use futures_util::TryStreamExt;

use crate::error::ServeError;

/// Default limit on the total size of one upload request.
pub const DEFAULT_UPLOAD_LIMIT: usize = 100 * 1024 * 1024;

/// One uploaded file taken out of a multipart request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedPart {
    pub field_name: String,
    pub filename: String,
    pub content_type: Option<Mime>,
    pub body: Bytes,
}

/// Buffer every file part of a multipart body, in the order received.
///
/// Fields without a filename are plain form values and are skipped. The
/// combined size of all parts may not exceed `limit` bytes.
pub async fn collect_parts(
    mut payload: Multipart,
    limit: usize,
) -> Result<Vec<UploadedPart>, ServeError> {
    let mut parts = Vec::new();
    let mut total = 0usize;
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|err| ServeError::InvalidUpload(err.to_string()))?
    {
        let Some(cd) = field.content_disposition() else {
            continue;
        };
        let Some(filename) = cd.get_filename().map(str::to_owned) else {
            continue;
        };
        let field_name = cd.get_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().cloned();

        let mut body = BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|err| ServeError::InvalidUpload(err.to_string()))?
        {
            total += chunk.len();
            if total > limit {
                return Err(ServeError::UploadTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        parts.push(UploadedPart {
            field_name,
            filename,
            content_type,
            body: body.freeze(),
        });
    }
    Ok(parts)
}

/// Reduce a client supplied filename to a single plain path component.
fn sanitize_filename(filename: &str) -> Result<&str, ServeError> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains('\0') => Ok(name),
        _ => Err(ServeError::InvalidUpload(format!(
            "unusable filename {filename:?}"
        ))),
    }
}

/// Write each part as the full contents of `destination/filename`.
///
/// `destination` must already be vetted by the path resolver; containment is
/// not checked again here, but an existing symlink at a target name is
/// refused. Parts are written in order and existing files are overwritten. The first failure aborts the remaining parts, and files that
/// were already written stay on disk.
pub async fn receive(destination: &Path, parts: &[UploadedPart]) -> Result<usize, ServeError> {
    let mut written = 0;
    for part in parts {
        let name = sanitize_filename(&part.filename)?;
        let path = destination.join(name);
        // writes follow links, which could land outside the served root
        let linked = tokio::fs::symlink_metadata(&path)
            .await
            .is_ok_and(|meta| meta.file_type().is_symlink());
        if linked {
            log::warn!("refusing upload over symlink {path:?}");
            return Err(ServeError::PathEscape);
        }
        tokio::fs::write(&path, &part.body)
            .await
            .map_err(|source| ServeError::Write {
                path: path.clone(),
                source,
            })?;
        log::info!(
            "wrote upload {path:?} from field {:?} ({} bytes)",
            part.field_name,
            part.body.len()
        );
        written += 1;
    }
    Ok(written)
}
