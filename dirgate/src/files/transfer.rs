//! Chunked File Download

use std::{
    io,
    path::{Path, PathBuf},
    pin::Pin,
    task::{Context, Poll},
};

use actix_web::{
    HttpResponse,
    http::header::{
        Charset, ContentDisposition, ContentType, DispositionParam, DispositionType,
        ExtendedValue,
    },
    web::Bytes,
};
use futures_core::Stream;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::error::ServeError;

/// Default number of bytes read per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Single-pass stream of file chunks.
///
/// Owns the open file handle. The handle is released at end of file, on the
/// first read error, or when the stream is dropped before completion (for
/// example because the client went away).
pub struct FileChunks {
    inner: ReaderStream<File>,
    path: PathBuf,
    sent: u64,
    done: bool,
}

impl FileChunks {
    fn new(file: File, path: PathBuf, chunk_size: usize) -> Self {
        Self {
            inner: ReaderStream::with_capacity(file, chunk_size),
            path,
            sent: 0,
            done: false,
        }
    }
}

impl Stream for FileChunks {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(err))) => {
                // reader stream drops the file on error, stop polling it
                this.done = true;
                log::error!("read of {:?} failed after {} bytes: {err}", this.path, this.sent);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.done = true;
                log::info!("sent {:?} ({} bytes)", this.path, this.sent);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for FileChunks {
    fn drop(&mut self) {
        if !self.done {
            log::debug!("transfer of {:?} aborted after {} bytes", self.path, self.sent);
        }
    }
}

/// File prepared for download as an attachment.
pub struct FileTransfer {
    pub source: PathBuf,
    pub download_filename: String,
    pub chunks: FileChunks,
}

impl FileTransfer {
    /// Content-Disposition forcing a download under [`Self::download_filename`].
    pub fn content_disposition(&self) -> ContentDisposition {
        let name = self.download_filename.clone();
        // plain parameter must be printable ascii to form a valid header value
        let fallback: String = name
            .chars()
            .map(|c| match c.is_ascii() && !c.is_ascii_control() {
                true => c,
                false => '_',
            })
            .collect();
        let mut parameters = Vec::with_capacity(2);
        if fallback == name {
            parameters.push(DispositionParam::Filename(name));
        } else {
            parameters.push(DispositionParam::Filename(fallback));
            parameters.push(DispositionParam::FilenameExt(ExtendedValue {
                charset: Charset::Ext("UTF-8".to_owned()),
                language_tag: None,
                value: name.into_bytes(),
            }));
        }
        ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters,
        }
    }

    /// Stream the file as a forced octet-stream download.
    pub fn into_response(self) -> HttpResponse {
        HttpResponse::Ok()
            .insert_header(ContentType::octet_stream())
            .insert_header(self.content_disposition())
            .streaming(self.chunks)
    }
}

/// Derive the download name from the last segment of the request URI path.
///
/// Falls back to the file name on disk when the URI ends in a separator.
pub fn download_filename(uri_path: &str, source: &Path) -> String {
    let segment = uri_path.rsplit('/').next().unwrap_or_default();
    let name = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_owned());
    match name.is_empty() {
        false => name,
        true => source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Open `path` for a chunked download.
///
/// Anything other than an existing regular file is reported as not found.
pub async fn open(
    path: &Path,
    download_filename: String,
    chunk_size: usize,
) -> Result<FileTransfer, ServeError> {
    let file = File::open(path).await?;
    let meta = file.metadata().await?;
    if !meta.is_file() {
        return Err(ServeError::NotFound);
    }
    log::debug!("opened {path:?} for download ({} bytes)", meta.len());
    Ok(FileTransfer {
        source: path.to_path_buf(),
        download_filename,
        chunks: FileChunks::new(file, path.to_path_buf(), chunk_size.max(1)),
    })
}
