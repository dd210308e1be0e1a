//! Downloading a source archive over HTTP.

use std::path::Path;

use reqwest::StatusCode;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::BuildError;

/// Stream the body of `url` into `dest`, returning the number of bytes written.
///
/// Anything other than `200 OK` fails with the status text. The request and
/// every chunk of the body race against `cancel`.
pub async fn download(url: &str, dest: &Path, cancel: &CancellationToken) -> Result<u64, BuildError> {
  info!(url = %url, "fetching source archive");

  let failed = |message: String| BuildError::SourceFetchFailed {
    url: url.to_string(),
    message,
  };

  let request = reqwest::get(url);
  let mut response = tokio::select! {
    biased;
    _ = cancel.cancelled() => return Err(BuildError::Cancelled),
    response = request => response.map_err(|e| failed(e.to_string()))?,
  };

  if response.status() != StatusCode::OK {
    return Err(failed(response.status().to_string()));
  }

  let mut file = fs::File::create(dest).await?;
  let mut written = 0u64;
  loop {
    let chunk = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(BuildError::Cancelled),
      chunk = response.chunk() => chunk.map_err(|e| failed(e.to_string()))?,
    };
    let Some(chunk) = chunk else { break };
    file.write_all(&chunk).await?;
    written += chunk.len() as u64;
  }
  file.flush().await?;
  file.sync_all().await?;

  debug!(path = %dest.display(), size = written, "download complete");
  Ok(written)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::io::AsyncReadExt;
  use tokio::net::TcpListener;

  /// Answer a single request with `status` and `body`, returning the base URL.
  async fn serve_once(status: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = [0u8; 4096];
      let _ = socket.read(&mut buf).await;
      let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
      );
      socket.write_all(head.as_bytes()).await.unwrap();
      socket.write_all(&body).await.unwrap();
      socket.shutdown().await.unwrap();
    });
    format!("http://{}", addr)
  }

  #[tokio::test]
  async fn writes_body_to_dest() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve_once("200 OK", b"archive bytes".to_vec()).await;
    let dest = dir.path().join("src.zip");

    let n = download(&format!("{}/a.zip", base), &dest, &CancellationToken::new())
      .await
      .unwrap();

    assert_eq!(n, 13);
    assert_eq!(std::fs::read(&dest).unwrap(), b"archive bytes");
  }

  #[tokio::test]
  async fn non_200_is_source_fetch_failed() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve_once("404 Not Found", Vec::new()).await;

    let err = download(&format!("{}/a.zip", base), &dir.path().join("a.zip"), &CancellationToken::new())
      .await
      .unwrap_err();

    assert_eq!(err.kind(), crate::ErrorKind::SourceFetchFailed);
    assert!(err.to_string().contains("404 Not Found"), "{err}");
  }

  #[tokio::test]
  async fn cancelled_before_request() {
    let dir = tempfile::tempdir().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let err = download("http://127.0.0.1:9/a.zip", &dir.path().join("a.zip"), &token)
      .await
      .unwrap_err();
    assert!(matches!(err, BuildError::Cancelled));
  }
}
