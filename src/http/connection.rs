use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::config::UploadConfig;
use crate::http::buffer::LineBuffer;
use crate::http::error::{ErrorKind, ParseError};
use crate::http::multipart::{locate_boundary_declaration, locate_filename};
use crate::http::parser::try_parse_start_line;
use crate::http::request::ParsedRequest;
use crate::http::response::Response;
use crate::http::upload::stream_body;
use crate::http::writer::ResponseWriter;

/// Path that accepts multipart image uploads.
pub const UPLOAD_PATH: &str = "image-upload";

const UPLOAD_FORM: &str = "<!DOCTYPE html>\n<html><body>\n\
<form action=\"/image-upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
<input type=\"file\" name=\"image\">\n<input type=\"submit\" value=\"Upload\">\n\
</form>\n</body></html>\n";

pub struct Connection<S> {
    stream: S,
    buffer: LineBuffer,
    request: Option<ParsedRequest>,
    state: ConnectionState,
    upload_dir: PathBuf,
}

pub enum ConnectionState {
    Reading,
    Processing,
    Uploading,
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, uploads: &UploadConfig) -> Self {
        Self {
            stream,
            buffer: LineBuffer::with_capacity(uploads.max_line),
            request: None,
            state: ConnectionState::Reading,
            upload_dir: uploads.dir.clone(),
        }
    }

    pub fn request(&self) -> Option<&ParsedRequest> {
        self.request.as_ref()
    }

    /// True when nothing from a previous request is left behind.
    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty() && self.request.is_none()
    }

    /// Drops the parsed request and any buffered bytes.
    pub fn reset(&mut self) {
        self.request = None;
        self.buffer.clear();
        self.state = ConnectionState::Reading;
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await {
                        Ok(Some(req)) => {
                            debug!(
                                method = %req.method,
                                path = %req.path,
                                params = ?req.params,
                                "request parsed"
                            );
                            self.request = Some(req);
                            ConnectionState::Processing
                        }
                        Ok(None) => ConnectionState::Closed,
                        Err(e) => self.on_error(&e),
                    };
                }

                ConnectionState::Processing => {
                    self.state = match self.request.as_ref() {
                        Some(req) if req.is_method("POST") && req.path == UPLOAD_PATH => {
                            ConnectionState::Uploading
                        }
                        Some(req) if req.is_method("GET") && req.path.is_empty() => {
                            ConnectionState::Writing(ResponseWriter::new(&Response::html(UPLOAD_FORM)))
                        }
                        Some(_) => ConnectionState::Writing(ResponseWriter::new(&Response::not_found())),
                        None => ConnectionState::Reading,
                    };
                }

                ConnectionState::Uploading => {
                    self.state = match self.receive_upload().await {
                        Ok(_) => ConnectionState::Writing(ResponseWriter::new(&Response::see_other("/"))),
                        Err(e @ ParseError::Sink { .. }) => {
                            warn!(error = %e, "failed to store upload");
                            ConnectionState::Writing(ResponseWriter::new(&Response::internal_error()))
                        }
                        Err(e) => self.on_error(&e),
                    };
                }

                ConnectionState::Writing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    self.reset();
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads until a full request line is buffered.
    ///
    /// `Ok(None)` means the peer closed the connection before sending anything.
    pub async fn read_request(&mut self) -> Result<Option<ParsedRequest>, ParseError> {
        loop {
            match try_parse_start_line(&mut self.buffer) {
                Ok(request) => return Ok(Some(request)),
                Err(ParseError::Incomplete) => {}
                Err(e) => return Err(e),
            }

            if self.buffer.refill(&mut self.stream).await? == 0 {
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(ParseError::Closed)
                };
            }
        }
    }

    /// Receives a multipart upload into the upload directory and returns the stored path.
    ///
    /// A partially written file is removed when the upload fails.
    pub async fn receive_upload(&mut self) -> Result<PathBuf, ParseError> {
        let boundary = locate_boundary_declaration(&mut self.buffer, &mut self.stream).await?;
        let filename = locate_filename(&mut self.buffer, &mut self.stream, &boundary).await?;

        let target = upload_target(&self.upload_dir, &filename)?;
        let mut file = tokio::fs::File::create(&target)
            .await
            .map_err(ParseError::sink)?;

        match stream_body(&mut self.buffer, &mut self.stream, &boundary, &mut file).await {
            Ok(written) => {
                info!(file = %target.display(), bytes = written, "upload stored");
                Ok(target)
            }
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(&target).await {
                    warn!(file = %target.display(), error = %remove_err, "failed to remove partial upload");
                }
                Err(e)
            }
        }
    }

    fn on_error(&self, e: &ParseError) -> ConnectionState {
        match e.kind() {
            ErrorKind::Malformed | ErrorKind::ResourceExhausted => {
                warn!(error = %e, "rejecting request");
                ConnectionState::Writing(ResponseWriter::new(&Response::bad_request()))
            }
            ErrorKind::Abandoned | ErrorKind::NotReady => {
                debug!(error = %e, "request abandoned");
                ConnectionState::Closed
            }
        }
    }
}

/// Joins the final component of a client-supplied filename onto `dir`.
fn upload_target(dir: &Path, filename: &str) -> Result<PathBuf, ParseError> {
    let name = Path::new(filename)
        .file_name()
        .ok_or_else(|| ParseError::malformed_part_header(format!("unusable filename {filename:?}")))?;
    Ok(dir.join(name))
}
