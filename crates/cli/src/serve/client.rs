//! Blocking HTTP client for the external forecaster.
//!
//! The forecaster expects a multipart submission `{file, period,
//! interval}` and answers with a JSON body. ureq v3 does not bundle
//! multipart support, so the body is constructed manually. Calls are
//! synchronous; handlers wrap them in `spawn_blocking`.

use std::path::Path;
use std::time::Duration;

/// Fixed multipart boundary for upstream submissions.
const BOUNDARY: &str = "demandcast-boundary-a1b2c3d4";

/// A transport-level failure talking to the forecaster.
///
/// HTTP error statuses from the forecaster are NOT errors here -- they
/// come back as an [`UpstreamReply`] so the handler can wrap the
/// upstream body into the failure envelope.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RelayError {
    #[error("could not read upload: {0}")]
    Upload(#[from] std::io::Error),
    #[error("forecast service unreachable: {0}")]
    Transport(String),
    #[error("could not parse forecast service response: {0}")]
    BadResponse(String),
}

/// The forecaster's answer: status code plus JSON body, both forwarded
/// to the client unchanged.
#[derive(Debug)]
pub(crate) struct UpstreamReply {
    pub(crate) status: u16,
    pub(crate) body: serde_json::Value,
}

impl UpstreamReply {
    pub(crate) fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client for the external forecaster endpoint.
#[derive(Clone)]
pub(crate) struct ForecastClient {
    url: String,
    timeout: Duration,
}

impl ForecastClient {
    pub(crate) fn new(url: String, timeout: Duration) -> Self {
        Self { url, timeout }
    }

    /// Forward an uploaded CSV to the forecaster. Blocking; the ceiling
    /// on the whole call is the configured timeout.
    pub(crate) fn forecast(
        &self,
        csv_path: &Path,
        filename: &str,
        period: &str,
        interval: &str,
    ) -> Result<UpstreamReply, RelayError> {
        let csv_bytes = std::fs::read(csv_path)?;
        let body = build_multipart(filename, &csv_bytes, period, interval);
        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);

        // Non-2xx statuses must come back as responses, not errors, so
        // the relay can propagate them verbatim.
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(self.timeout))
            .build()
            .new_agent();

        let response = agent
            .post(&self.url)
            .header("Content-Type", &content_type)
            .send(&body)
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_json::<serde_json::Value>()
            .map_err(|e| RelayError::BadResponse(e.to_string()))?;

        Ok(UpstreamReply { status, body })
    }
}

/// Make a client-supplied filename safe to interpolate into a
/// `Content-Disposition` header: quotes and CR/LF would otherwise let
/// an upload name inject headers or extra parts into the upstream
/// submission, and a name containing the boundary would truncate it.
fn escape_header_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '"' { '_' } else { c })
        .collect();
    let cleaned = cleaned.replace(BOUNDARY, "_");
    if cleaned.is_empty() {
        "upload.csv".to_string()
    } else {
        cleaned
    }
}

/// Build the multipart body: the CSV file plus the two string-encoded
/// parameters, exactly the request shape the forecaster expects.
fn build_multipart(filename: &str, csv_bytes: &[u8], period: &str, interval: &str) -> Vec<u8> {
    let filename = escape_header_filename(filename);
    let mut body: Vec<u8> = Vec::new();

    // Part 1: CSV file
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(csv_bytes);
    body.extend_from_slice(b"\r\n");

    // Parts 2-3: parameters, forwarded as strings unchanged
    for (name, value) in [("period", period), ("interval", interval)] {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    // Closing boundary
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_body_carries_file_and_parameters() {
        let body = build_multipart("sales data.csv", b"date,quantity\n2023-01-01,10\n", "7", "0.9");
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with(&format!("--{BOUNDARY}\r\n")));
        assert!(text.contains("name=\"file\"; filename=\"sales data.csv\""));
        assert!(text.contains("Content-Type: text/csv"));
        assert!(text.contains("date,quantity\n2023-01-01,10\n"));
        assert!(text.contains("name=\"period\"\r\n\r\n7\r\n"));
        assert!(text.contains("name=\"interval\"\r\n\r\n0.9\r\n"));
        assert!(text.ends_with(&format!("--{BOUNDARY}--\r\n")));
    }

    #[test]
    fn hostile_filename_cannot_inject_headers_or_parts() {
        let name = format!(
            "a\"\r\nX-Evil: 1\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"period\"\r\n\r\n999\r\n"
        );
        let body = build_multipart(&name, b"date,quantity\n", "7", "0.9");
        let text = String::from_utf8(body).unwrap();

        // the hostile text must not become a header line or a new part
        assert!(!text.contains("\r\nX-Evil"));
        assert_eq!(text.matches("name=\"period\"").count(), 1);
        assert!(text.contains("name=\"period\"\r\n\r\n7\r\n"));
        assert_eq!(text.matches(&format!("--{BOUNDARY}")).count(), 4);
        // the filename value must stay on one header line with balanced quotes
        let disposition = text
            .lines()
            .find(|l| l.contains("filename="))
            .unwrap();
        assert_eq!(disposition.matches('"').count(), 4);
    }

    #[test]
    fn escaped_filename_never_collapses_to_empty() {
        assert_eq!(escape_header_filename("\r\n"), "upload.csv");
        assert_eq!(escape_header_filename("report.csv"), "report.csv");
    }
}
