//! Request plumbing shared by both backends.
//!
//! The backends differ only in how their `reqwest::Client` is built; the
//! status mapping and body streaming are identical and live here.

use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, trace};

use super::error::RequestError;

/// Issues a `HEAD` and maps the status to an existence answer.
///
/// 200 means the identifier exists, 404 means it does not, and anything else
/// is an error carrying the status.
#[instrument(level = "trace", skip(client))]
pub(crate) async fn probe(client: &Client, url: &str) -> Result<bool, RequestError> {
    let response = client
        .head(url)
        .send()
        .await
        .map_err(|e| RequestError::transport(url, e))?;

    match response.status() {
        StatusCode::OK => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        status => Err(RequestError::http_status(url, status.as_u16())),
    }
}

/// Issues a `GET` and streams a 200 body into `sink`, returning bytes written.
///
/// For any other status the body is not read and the sink is left untouched.
#[instrument(level = "trace", skip(client, sink))]
pub(crate) async fn fetch_into(
    client: &Client,
    url: &str,
    id: &str,
    sink: &mut (dyn AsyncWrite + Unpin + Send),
) -> Result<u64, RequestError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| RequestError::transport(url, e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(RequestError::http_status(url, status.as_u16()));
    }

    let mut writer = BufWriter::new(sink);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| RequestError::transport(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| RequestError::io(id, e))?;
        bytes_written += chunk.len() as u64;
        trace!(chunk = chunk.len(), total = bytes_written, "chunk written");
    }

    writer.flush().await.map_err(|e| RequestError::io(id, e))?;

    debug!(bytes = bytes_written, "payload streamed");
    Ok(bytes_written)
}
