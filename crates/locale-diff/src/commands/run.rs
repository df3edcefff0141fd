use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::load_config;
use crate::utils::inputs::FsJobSource;
use camino::Utf8PathBuf;
use colored::Colorize;
use ld_extract::{
    append_ci_output, run_extraction, BuildGate, BuildMarker, PatchServiceVersions, RunOutcome,
};
use miette::Result;

/// Environment variable naming the CI step-output file.
pub const CI_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

pub struct RunExtractionArgs {
    pub config_path: Option<String>,
    pub output_dir: Option<String>,
    pub force: bool,
}

pub async fn run_locale_extraction(args: RunExtractionArgs) -> Result<()> {
    let mut config = load_config(args.config_path.as_deref().map(camino::Utf8Path::new))?;
    if let Some(output_dir) = args.output_dir {
        config.output_dir = Utf8PathBuf::from(output_dir);
    }
    let locales = config.locale_pair()?;

    let versions = PatchServiceVersions::new(&config.version_url, &config.product, &config.region)
        .map_err(CliError::from)?;
    let gate = BuildGate::new(
        BuildMarker::new(config.build_marker.clone()),
        &versions,
        args.force,
    );

    println_pad!(
        "{} {} {} {}",
        "🌐 Comparing".bright_blue().bold(),
        locales.a.to_string().bright_cyan().bold(),
        "with".bright_blue().bold(),
        locales.b.to_string().bright_cyan().bold()
    );

    let jobs = FsJobSource::new(&config);
    let outcome = run_extraction(&gate, &jobs, config.pipeline_config(locales))
        .await
        .map_err(CliError::from)?;

    match outcome {
        RunOutcome::UpToDate { build } => {
            println_pad!(
                "{} {}",
                "✅ Already up to date with build".bright_green().bold(),
                build.bright_white().bold()
            );
        }
        RunOutcome::Completed { report, summary } => {
            println_pad!(
                "{} {}",
                "🏷️ Build:".bright_green(),
                report.build.bright_white().bold()
            );
            println_pad!(
                "{} {}",
                "📦 Extracted:".bright_green(),
                summary.extracted.len().to_string().bright_white().bold()
            );
            if !summary.failed.is_empty() {
                println_pad!(
                    "{} {}",
                    "⚠️ Failed:".bright_yellow(),
                    summary.failed.len().to_string().bright_white().bold()
                );
                for (_, message) in &summary.failed {
                    println_pad!("   {} {}", "•".bright_yellow(), message.dimmed());
                }
            }
            println_pad!(
                "{} {}",
                "📁 Output:".bright_yellow(),
                config.output_dir.as_str().bright_white().bold()
            );

            if let Some(path) = std::env::var_os(CI_OUTPUT_ENV) {
                let path = Utf8PathBuf::from(path.to_string_lossy().into_owned());
                if let Err(source) = append_ci_output(&path, &report).await {
                    return Err(CliError::CiOutput { path, source }.into());
                }
            }
        }
    }

    Ok(())
}
