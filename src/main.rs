use anyhow::{Context, Result};
use serde_json::json;

use urban_butcher::config::ReportConfig;
use urban_butcher::filter::Controls;
use urban_butcher::logging::{self, obj, v_str, Domain};
use urban_butcher::pipeline;
use urban_butcher::remote;
use urban_butcher::render::RenderOptions;

const USAGE: &str = "usage: urban-butcher [--animal] [--plant] [--impact emissions,land-use,water-use] [--slide 1..4]";

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = ReportConfig::from_env()?;
    let controls = Controls::from_args(std::env::args().skip(1)).context(USAGE)?;

    remote::ensure_reference_data(&cfg).await?;

    let rendered = pipeline::run(&cfg, &controls, &RenderOptions::default())?;

    if let Some(parent) = cfg.out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(&cfg.out_path, &rendered.html)
        .with_context(|| format!("cannot write {}", cfg.out_path.display()))?;

    logging::info(
        Domain::Render,
        "report_written",
        obj(&[
            ("path", v_str(&cfg.out_path.display().to_string())),
            ("bytes", json!(rendered.html.len())),
            ("sections", json!(rendered.report.sections.len())),
        ]),
    );
    println!("wrote {}", cfg.out_path.display());
    Ok(())
}
