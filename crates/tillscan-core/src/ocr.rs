//! Text extraction from receipt images
//!
//! The shipped engine shells out to `tesseract`, feeding the image on stdin
//! and reading text from stdout. Two page-segmentation passes run
//! concurrently; the primary pass is kept only when it contains the
//! configured anchor phrase, otherwise the fallback pass wins.
//!
//! Extraction never fails from the caller's point of view: a missing binary,
//! a crash, or a timeout is logged and yields empty text, which the field
//! extractor turns into sentinels.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, warn};

use crate::config::OcrConfig;
use crate::error::{Error, Result};

/// Anything that can turn image bytes into text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text; failures produce an empty string
    async fn extract(&self, image: &[u8]) -> String;
}

/// Tesseract CLI engine
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: String,
    language: String,
    primary_psm: u8,
    fallback_psm: u8,
    preferred_anchor: String,
    timeout: Duration,
}

impl TesseractEngine {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            language: config.language.clone(),
            primary_psm: config.primary_psm,
            fallback_psm: config.fallback_psm,
            preferred_anchor: config.preferred_anchor.clone(),
            timeout: config.timeout,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run one `tesseract stdin stdout --psm N -l LANG` pass
    async fn run_pass(&self, image: &[u8], psm: u8) -> Result<String> {
        let psm_arg = psm.to_string();
        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "--psm", &psm_arg, "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Ocr(format!("failed to run {}: {}", self.command, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Ocr("tesseract stdin unavailable".into()))?;

        let feed = async move {
            let result = stdin.write_all(image).await;
            drop(stdin);
            result
        };

        let run = async { tokio::join!(feed, child.wait_with_output()) };
        let (fed, output) = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| Error::Ocr(format!("psm {} pass timed out", psm)))?;

        // The process may exit before consuming all input; its status decides
        if let Err(e) = fed {
            debug!(psm, error = %e, "tesseract closed stdin early");
        }

        let output = output?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!(
                "{} failed (exit {}): {}",
                self.command,
                output.status.code().unwrap_or(-1),
                stderr.trim(),
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        debug!(psm, chars = text.chars().count(), "OCR pass finished");
        Ok(text)
    }

    async fn pass_or_empty(&self, image: &[u8], psm: u8) -> String {
        match self.run_pass(image, psm).await {
            Ok(text) => text,
            Err(e) => {
                error!(psm, error = %e, "OCR pass failed");
                String::new()
            }
        }
    }
}

#[async_trait]
impl TextExtractor for TesseractEngine {
    async fn extract(&self, image: &[u8]) -> String {
        if image.is_empty() {
            warn!("Empty image, skipping OCR");
            return String::new();
        }

        let (primary, fallback) = tokio::join!(
            self.pass_or_empty(image, self.primary_psm),
            self.pass_or_empty(image, self.fallback_psm)
        );
        select_pass(primary, fallback, &self.preferred_anchor)
    }
}

/// Keep the primary pass when it contains `anchor`, else the fallback pass
pub fn select_pass(primary: String, fallback: String, anchor: &str) -> String {
    if primary.contains(anchor) {
        primary
    } else {
        fallback
    }
}

/// Engine that returns the same text for every image
///
/// Used by tests and for exercising the pipeline without tesseract installed.
#[derive(Debug, Clone, Default)]
pub struct FixedTextEngine {
    text: String,
}

impl FixedTextEngine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl TextExtractor for FixedTextEngine {
    async fn extract(&self, _image: &[u8]) -> String {
        self.text.clone()
    }
}

/// Concrete OCR engine enum
#[derive(Debug, Clone)]
pub enum OcrEngine {
    Tesseract(TesseractEngine),
    Fixed(FixedTextEngine),
    /// OCR turned off in config; every image yields empty text
    Disabled,
}

impl OcrEngine {
    pub fn from_config(config: &OcrConfig) -> Self {
        if config.enabled {
            OcrEngine::Tesseract(TesseractEngine::from_config(config))
        } else {
            OcrEngine::Disabled
        }
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        OcrEngine::Fixed(FixedTextEngine::new(text))
    }

    /// Short engine name for display
    pub fn name(&self) -> &'static str {
        match self {
            OcrEngine::Tesseract(_) => "tesseract",
            OcrEngine::Fixed(_) => "fixed",
            OcrEngine::Disabled => "disabled",
        }
    }
}

#[async_trait]
impl TextExtractor for OcrEngine {
    async fn extract(&self, image: &[u8]) -> String {
        match self {
            OcrEngine::Tesseract(e) => e.extract(image).await,
            OcrEngine::Fixed(e) => e.extract(image).await,
            OcrEngine::Disabled => {
                warn!("OCR disabled, image yields no text");
                String::new()
            }
        }
    }
}
