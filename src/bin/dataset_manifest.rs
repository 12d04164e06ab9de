use serde_json::json;
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use urban_butcher::config::ReportConfig;
use urban_butcher::data::{build_manifest, default_manifest_path, validate_schema};
use urban_butcher::pipeline::dataset_inputs;

/// Writes `<file>.manifest.json` next to every input dataset.
///
/// Exit codes: 1 unreadable file, 2 schema mismatch, 3 manifest failed, 4 write failed.
fn main() {
    let cfg = match ReportConfig::from_env() {
        Ok(c) => c,
        Err(err) => {
            eprintln!("config error: {:#}", err);
            std::process::exit(1);
        }
    };
    let now_ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    for (path, expected) in dataset_inputs(&cfg) {
        let schema = match validate_schema(&path, expected) {
            Ok(s) => s,
            Err(err) => {
                eprintln!("schema check failed: {:#}", err);
                std::process::exit(1);
            }
        };

        if !schema.ok {
            eprintln!("{}: schema mismatch: {}", path.display(), schema.message);
            eprintln!("expected columns: {:?}", expected);
            std::process::exit(2);
        }

        let manifest = match build_manifest(&path, expected, now_ts) {
            Ok(m) => m,
            Err(err) => {
                eprintln!("manifest failed: {:#}", err);
                std::process::exit(3);
            }
        };

        let out_path = default_manifest_path(&path);
        let payload = json!({
            "manifest": manifest,
            "schema": schema,
        });
        let written = serde_json::to_string_pretty(&payload)
            .map_err(anyhow::Error::from)
            .and_then(|text| fs::write(&out_path, text).map_err(anyhow::Error::from));
        if let Err(err) = written {
            eprintln!("failed to write {}: {}", out_path.display(), err);
            std::process::exit(4);
        }
        println!("wrote manifest {}", out_path.display());
    }
}
