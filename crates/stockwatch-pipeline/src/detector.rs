//! Detector adapters
//!
//! The classification model runs outside this process. Two transports are
//! supported: a local command that prints detections on stdout, and an HTTP
//! inference endpoint. Both must answer with a JSON array of
//! `{"class": <name>, "confidence": <0..1>}` objects.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use stockwatch_core::config::LayeredConfig;
use stockwatch_core::error::{Result, StockwatchError};
use stockwatch_core::models::Detection;
use stockwatch_core::ports::Detector;

/// Runs an external program once per image.
///
/// The program is invoked as `<program> [args..] <image-path> <threshold>` and
/// must exit with status 0 after writing the detections to stdout.
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    label: String,
}

impl CommandDetector {
    /// Build from a whitespace-separated command line
    pub fn from_command_line(command_line: &str, timeout: Duration) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| StockwatchError::ConfigInvalid {
            key: "detector_command".to_string(),
            reason: "command is empty".to_string(),
        })?;
        let args: Vec<String> = parts.collect();

        Ok(Self {
            label: format!("command:{program}"),
            program,
            args,
            timeout,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl Detector for CommandDetector {
    async fn detect(&self, image: &Path, threshold: f32) -> Result<Vec<Detection>> {
        let image_label = image.display().to_string();

        tracing::debug!(
            program = %self.program,
            image = %image_label,
            threshold,
            "Running detector command"
        );

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .arg(image)
            .arg(threshold.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StockwatchError::DetectorUnavailable {
                    reason: format!("'{}' not found", self.program),
                    remediation: "Set detector_command to an installed program".to_string(),
                });
            }
            Ok(Err(e)) => {
                return Err(StockwatchError::DetectorFailed {
                    image: image_label,
                    reason: format!("failed to run '{}': {}", self.program, e),
                });
            }
            Err(_) => {
                return Err(StockwatchError::DetectorFailed {
                    image: image_label,
                    reason: format!("timed out after {}s", self.timeout.as_secs_f32()),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StockwatchError::DetectorFailed {
                image: image_label,
                reason: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        parse_detections(&output.stdout).map_err(|reason| StockwatchError::DetectorFailed {
            image: image_label,
            reason,
        })
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Posts each image to an inference server
pub struct HttpDetector {
    /// Endpoint receiving the multipart upload (e.g., "http://localhost:8000/detect")
    url: String,

    client: reqwest::Client,
}

impl HttpDetector {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StockwatchError::DetectorUnavailable {
                reason: format!("Failed to build HTTP client: {}", e),
                remediation: "Check the TLS configuration of this host".to_string(),
            })?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Detector for HttpDetector {
    async fn detect(&self, image: &Path, threshold: f32) -> Result<Vec<Detection>> {
        let image_label = image.display().to_string();
        let failed = |reason: String| StockwatchError::DetectorFailed {
            image: image_label.clone(),
            reason,
        };

        let bytes = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")
            .map_err(|e| failed(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("conf", threshold.to_string());

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StockwatchError::DetectorUnavailable {
                reason: format!("Failed to reach detector at {}: {}", self.url, e),
                remediation: "Ensure the inference server is running".to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(failed(format!("detector API error ({}): {}", status, error_text)));
        }

        let body = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        parse_detections(&body).map_err(failed)
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// Decode the detector's JSON answer
pub fn parse_detections(raw: &[u8]) -> std::result::Result<Vec<Detection>, String> {
    serde_json::from_slice::<Vec<Detection>>(raw)
        .map_err(|e| format!("malformed detector output: {}", e))
}

/// Pick the detector configured in `config`. A command takes precedence over
/// a URL; having neither is a startup error.
pub fn detector_from_config(config: &LayeredConfig) -> Result<Arc<dyn Detector>> {
    let timeout = Duration::from_secs(config.detector_timeout_secs.value);

    if let Some(command) = &config.detector_command.value {
        return Ok(Arc::new(CommandDetector::from_command_line(command, timeout)?));
    }

    if let Some(url) = &config.detector_url.value {
        return Ok(Arc::new(HttpDetector::new(url.clone(), timeout)?));
    }

    Err(StockwatchError::DetectorUnavailable {
        reason: "no detector configured".to_string(),
        remediation: "Set STOCKWATCH_DETECTOR_COMMAND or STOCKWATCH_DETECTOR_URL, \
                      or pass --detector-command / --detector-url"
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockwatch_core::config::ConfigSource;

    #[test]
    fn test_parse_detections() {
        let raw = br#"[{"class": "empty", "confidence": 0.81}, {"class": "product", "confidence": 0.4}]"#;
        let detections = parse_detections(raw).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class_name, "empty");
        assert!((detections[0].confidence - 0.81).abs() < 1e-6);
    }

    #[test]
    fn test_parse_detections_empty_and_malformed() {
        assert!(parse_detections(b"[]").unwrap().is_empty());
        assert!(parse_detections(b"not json").is_err());
        assert!(parse_detections(br#"{"class": "empty"}"#).is_err());
    }

    #[test]
    fn test_command_line_split() {
        let detector =
            CommandDetector::from_command_line("python3  detect.py --model best.pt", Duration::from_secs(5))
                .unwrap();
        assert_eq!(detector.program(), "python3");
        assert_eq!(detector.args(), ["detect.py", "--model", "best.pt"]);
        assert_eq!(detector.name(), "command:python3");
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandDetector::from_command_line("   ", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_detector_from_config() {
        let mut config = LayeredConfig::with_defaults();
        assert!(matches!(
            detector_from_config(&config),
            Err(StockwatchError::DetectorUnavailable { .. })
        ));

        config
            .detector_url
            .update(Some("http://localhost:8000/detect".to_string()), ConfigSource::Environment);
        assert_eq!(
            detector_from_config(&config).unwrap().name(),
            "http://localhost:8000/detect"
        );

        config
            .detector_command
            .update(Some("detect-shelf".to_string()), ConfigSource::Cli);
        assert_eq!(detector_from_config(&config).unwrap().name(), "command:detect-shelf");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_detector_reads_stdout() {
        // Command lines are whitespace split, so build the shell call directly
        let detector = CommandDetector {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"echo '[{"class":"empty","confidence":0.9}]'"#.to_string(),
                "detector".to_string(),
            ],
            timeout: Duration::from_secs(5),
            label: "command:sh".to_string(),
        };

        let detections = detector.detect(Path::new("frame.jpg"), 0.5).await.unwrap();
        assert_eq!(detections, vec![Detection::new("empty", 0.9)]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_detector_failure_status() {
        let detector = CommandDetector::from_command_line("false", Duration::from_secs(5)).unwrap();
        let err = detector.detect(Path::new("frame.jpg"), 0.5).await.unwrap_err();
        assert!(matches!(err, StockwatchError::DetectorFailed { .. }));
    }

    #[tokio::test]
    async fn test_command_detector_missing_program() {
        let detector = CommandDetector::from_command_line(
            "stockwatch-no-such-detector-binary",
            Duration::from_secs(5),
        )
        .unwrap();
        let err = detector.detect(Path::new("frame.jpg"), 0.5).await.unwrap_err();
        assert!(matches!(err, StockwatchError::DetectorUnavailable { .. }));
    }
}
