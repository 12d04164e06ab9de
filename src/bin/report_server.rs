//! Report Server
//!
//! Serves the report and re-runs the whole pipeline on every request, so the
//! sidebar controls act like widgets.
//! Run with: cargo run --bin report_server

use anyhow::{Context, Result};
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;

use urban_butcher::config::ReportConfig;
use urban_butcher::filter::Controls;
use urban_butcher::logging::{self, obj, v_str, Domain};
use urban_butcher::pipeline;
use urban_butcher::remote;
use urban_butcher::render::RenderOptions;

fn main() -> Result<()> {
    let cfg = ReportConfig::from_env()?;

    // Reference data is fetched once up front; requests only read the cache.
    let runtime = tokio::runtime::Runtime::new().context("cannot start runtime")?;
    runtime.block_on(remote::ensure_reference_data(&cfg))?;
    drop(runtime);

    let listener = TcpListener::bind(format!("127.0.0.1:{}", cfg.port))
        .with_context(|| format!("cannot bind port {}", cfg.port))?;

    println!("Report server running at http://localhost:{}", cfg.port);
    println!();
    println!("Endpoints:");
    println!("  GET /?animal=1&plant=1&impact=Emissions&slide=2 - Report with controls");
    println!("  GET /api/spec    - Report sections and chart specs as JSON");
    println!("  GET /api/health  - Health check");
    println!();
    logging::info(Domain::System, "server_started", obj(&[("port", json!(cfg.port))]));

    for stream in listener.incoming() {
        let mut stream = match stream {
            Ok(s) => s,
            Err(_) => continue,
        };

        let buf_reader = BufReader::new(&stream);
        let request = match buf_reader.lines().next() {
            Some(Ok(line)) => line,
            _ => continue,
        };

        let (status, content_type, body) = respond(&cfg, &request);
        logging::debug(
            Domain::System,
            "request",
            obj(&[("line", v_str(&request)), ("status", v_str(status))]),
        );

        let response = format!(
            "HTTP/1.1 {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        );

        let _ = stream.write_all(response.as_bytes());
    }
    Ok(())
}

/// Route one request line, e.g. `GET /?slide=2 HTTP/1.1`.
fn respond(cfg: &ReportConfig, request: &str) -> (&'static str, &'static str, String) {
    let mut parts = request.split_whitespace();
    let (method, target) = match (parts.next(), parts.next()) {
        (Some(m), Some(t)) => (m, t),
        _ => return ("400 BAD REQUEST", "text/plain", "Bad Request".to_string()),
    };
    if method != "GET" {
        return ("405 METHOD NOT ALLOWED", "text/plain", "Method Not Allowed".to_string());
    }
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let controls = Controls::from_query(query);

    match path {
        "/" | "/index.html" => match pipeline::run(cfg, &controls, &RenderOptions::interactive("/")) {
            Ok(rendered) => ("200 OK", "text/html; charset=utf-8", rendered.html),
            Err(err) => error_page(&err),
        },
        "/api/spec" => match pipeline::run(cfg, &controls, &RenderOptions::interactive("/")) {
            Ok(rendered) => {
                let body = json!({
                    "controls": controls,
                    "report": rendered.report,
                    "datasets": rendered.manifests,
                });
                ("200 OK", "application/json", body.to_string())
            }
            Err(err) => (
                "500 INTERNAL SERVER ERROR",
                "application/json",
                json!({"error": format!("{:#}", err)}).to_string(),
            ),
        },
        "/api/health" => ("200 OK", "application/json", r#"{"status":"ok"}"#.to_string()),
        _ => ("404 NOT FOUND", "text/plain", "Not Found".to_string()),
    }
}

fn error_page(err: &anyhow::Error) -> (&'static str, &'static str, String) {
    let msg = urban_butcher::render::escape_html(&format!("{:#}", err));
    (
        "500 INTERNAL SERVER ERROR",
        "text/html; charset=utf-8",
        format!("<!DOCTYPE html><html><body><h1>Report failed</h1><pre>{}</pre></body></html>", msg),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn health_and_unknown_routes() {
        let dir = TempDir::new().unwrap();
        let cfg = ReportConfig::for_data_dir(dir.path());
        assert_eq!(respond(&cfg, "GET /api/health HTTP/1.1").0, "200 OK");
        assert_eq!(respond(&cfg, "GET /nope HTTP/1.1").0, "404 NOT FOUND");
        assert_eq!(respond(&cfg, "POST / HTTP/1.1").0, "405 METHOD NOT ALLOWED");
    }

    #[test]
    fn missing_data_is_a_server_error() {
        let dir = TempDir::new().unwrap();
        let cfg = ReportConfig::for_data_dir(dir.path());
        let (status, content_type, body) = respond(&cfg, "GET /?slide=2 HTTP/1.1");
        assert_eq!(status, "500 INTERNAL SERVER ERROR");
        assert!(content_type.starts_with("text/html"));
        assert!(body.contains("Report failed"));
    }
}
