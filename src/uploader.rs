use crate::chunk::{serialize_chunk, ChunkSource};
use log::{debug, info, warn};
use std::convert::Infallible;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Block size for feeding the request body. The transport is free to frame
/// the chunked encoding however it likes; this only bounds how much is
/// handed over per write.
const UPLOAD_BLOCK_SIZE: usize = 2048;

#[derive(Debug, Error)]
pub enum UploadError {
    /// The serializer produced the wrong number of bytes. This is a defect in
    /// the chunk source (wrong dimensions), not a transient condition.
    #[error("serialized chunk is {actual} bytes, expected {expected}")]
    SizeMismatch { actual: usize, expected: usize },
    #[error("chunk color lookup failed at ({x}, {y}, {z})")]
    Source {
        x: usize,
        y: usize,
        z: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("server unreachable")]
    Unreachable(#[source] reqwest::Error),
    #[error("upload stream failed")]
    Transport(#[source] reqwest::Error),
}

/// Sends serialized chunk color data to a map server, one POST per chunk.
pub struct Uploader {
    base_url: String,
    client: reqwest::Client,
}

impl Uploader {
    pub fn new(server_host: &str) -> Uploader { Self::with_port(server_host, 80) }

    pub fn with_port(server_host: &str, server_port: u16) -> Uploader {
        Uploader {
            base_url: format!("http://{}:{}", server_host, server_port),
            client: reqwest::Client::new(),
        }
    }

    /// Serialize and upload one chunk as a single background task.
    ///
    /// The handle resolves with `Ok(())` only after the full buffer has been
    /// written and the request finished; serialization and transport errors
    /// fail the task and are never retried. The response status is not
    /// inspected. Concurrent sends are independent, including sends for the
    /// same coordinates, which the endpoint may observe in either order.
    pub fn send_chunk_data<S>(&self, chunk: S) -> JoinHandle<Result<(), UploadError>>
    where
        S: ChunkSource + Send + Sync + 'static,
    {
        let url = format!(
            "{}/api/set-chunk?x={}&z={}",
            self.base_url,
            chunk.chunk_x(),
            chunk.chunk_z()
        );
        let client = self.client.clone();

        tokio::spawn(async move {
            let result = upload(&client, &url, &chunk).await;
            if let Err(e) = &result {
                warn!("upload to {} failed: {}", url, e);
            }
            result
        })
    }

    /// Transport-level probe of the base address. Any HTTP response counts as
    /// reachable, whatever its status.
    pub async fn check_reachable(&self) -> bool {
        match self.client.get(&self.base_url).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!("probe of {} failed: {}", self.base_url, e);
                false
            }
        }
    }
}

async fn upload<S: ChunkSource>(
    client: &reqwest::Client,
    url: &str,
    chunk: &S,
) -> Result<(), UploadError> {
    let data = serialize_chunk(chunk)?;
    debug!("uploading {} bytes to {}", data.len(), url);

    let blocks: Vec<Result<Vec<u8>, Infallible>> =
        data.chunks(UPLOAD_BLOCK_SIZE).map(|block| Ok(block.to_vec())).collect();

    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .body(reqwest::Body::wrap_stream(futures::stream::iter(blocks)))
        .send()
        .await
        .map_err(|e| {
            if e.is_connect() {
                UploadError::Unreachable(e)
            } else {
                UploadError::Transport(e)
            }
        })?;

    info!("chunk upload to {} done, status {}", url, response.status());
    Ok(())
}
