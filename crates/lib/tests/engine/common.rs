//! Shared fixtures for engine integration tests.

use std::io::Write;
use std::path::Path;

use repro_lib::build::{OutputSink, Settings};
use repro_lib::config::{Config, Parameters, Product, Tool, Version};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const WRITE_HI: &str = "echo hi > \"$BIN_PATH\"";

pub fn tool() -> Tool {
  Tool::new("repro", "0.0.0-test", "integration")
}

pub fn product() -> Product {
  Product {
    name: "lockbox".to_string(),
    version: Version::parse("1.2.3"),
    revision: "cabba9e".to_string(),
    revision_time: "2022-07-04T11:33:33Z".to_string(),
    ..Default::default()
  }
}

pub fn parameters(instructions: &str) -> Parameters {
  Parameters {
    go_version: "1.18".to_string(),
    os: "linux".to_string(),
    arch: "amd64".to_string(),
    instructions: instructions.to_string(),
    ..Default::default()
  }
}

pub fn config(root: &Path, instructions: &str) -> Config {
  Config::new(product(), parameters(instructions), root, tool()).unwrap()
}

pub fn quiet() -> Settings {
  Settings::builder().output(OutputSink::Null).build()
}

/// A zip laid out like a repository host's source archive: every file under
/// one `<prefix>/` directory.
pub fn source_zip(prefix: &str, files: &[(&str, &str)]) -> Vec<u8> {
  let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
  let options = zip::write::SimpleFileOptions::default();
  zip.add_directory(format!("{}/", prefix), options).unwrap();
  for (name, contents) in files {
    zip.start_file(format!("{}/{}", prefix, name), options).unwrap();
    zip.write_all(contents.as_bytes()).unwrap();
  }
  zip.finish().unwrap().into_inner()
}

/// Serve `body` to every request for `path`; anything else is a 404.
/// Returns the base URL.
pub async fn serve(path: &'static str, body: Vec<u8>) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    loop {
      let Ok((mut socket, _)) = listener.accept().await else {
        return;
      };
      let body = body.clone();
      tokio::spawn(async move {
        let mut buf = vec![0u8; 8192];
        let n = socket.read(&mut buf).await.unwrap_or(0);
        let request = String::from_utf8_lossy(&buf[..n]);
        let requested = request.split_whitespace().nth(1).unwrap_or("");
        let (status, body) = if requested == path {
          ("200 OK", body)
        } else {
          ("404 Not Found", Vec::new())
        };
        let head = format!(
          "HTTP/1.1 {}\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
          status,
          body.len()
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(&body).await;
        let _ = socket.shutdown().await;
      });
    }
  });
  format!("http://{}", addr)
}
