use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

const OCR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("text extraction timed out")]
    Timeout,
    #[error("failed to run tesseract: {0}")]
    Launch(#[from] std::io::Error),
    #[error("tesseract failed: {0}")]
    Engine(String),
}

/// Reads printed text out of a retrieved image. Empty output is a valid
/// result, not an error.
#[async_trait]
pub trait Ocr: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<String, OcrError>;
}

pub struct TesseractOcr;

impl TesseractOcr {
    pub fn new() -> Self {
        Self
    }

    pub async fn test_availability() -> bool {
        match Command::new("tesseract").arg("--version").output().await {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .unwrap_or("unknown")
                    .to_string();
                info!("tesseract is available: {}", version);
                true
            }
            Ok(_) => {
                warn!("tesseract command failed");
                false
            }
            Err(e) => {
                warn!("tesseract not found: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl Ocr for TesseractOcr {
    async fn recognize(&self, image: &Path) -> Result<String, OcrError> {
        let output = tokio::time::timeout(
            OCR_TIMEOUT,
            Command::new("tesseract").arg(image).arg("stdout").output(),
        )
        .await
        .map_err(|_| OcrError::Timeout)??;

        if !output.status.success() {
            return Err(OcrError::Engine(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
