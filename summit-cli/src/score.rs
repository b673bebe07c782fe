//! Score command implementation for the summit CLI.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use summit_core::{Layer, Peak};
use summit_data::pageviews::{DEFAULT_BASE_URL, HttpPageviewSource};
use summit_data::{read_snapshot, write_snapshot};
use summit_scorer::{StressConfig, StressPipeline, StressReport};

use crate::{
    ARG_BUFFER_RADIUS, ARG_FETCH_PAGE_VIEWS, ARG_INPUT, ARG_OUTPUT, ARG_PAGEVIEWS_BASE_URL,
    ARG_SCORING_CONFIG, CliError, ENV_INPUT, ENV_OUTPUT, fs,
};

/// CLI arguments for the `score` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Score every peak in a snapshot document. Protected areas, \
                 route segments and webcams in the snapshot are joined to \
                 each peak's buffer, usage signals are normalised and \
                 weighted, and the protection threshold is subtracted. The \
                 augmented snapshot is written to the output path and a run \
                 summary is printed as JSON.",
    about = "Compute stress scores for a snapshot"
)]
#[ortho_config(prefix = "SUMMIT")]
pub(crate) struct ScoreArgs {
    /// Path to the input snapshot document.
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Path the scored snapshot is written to.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// JSON file holding the scoring configuration.
    #[arg(long = ARG_SCORING_CONFIG, value_name = "path")]
    #[serde(default)]
    pub(crate) scoring_config: Option<Utf8PathBuf>,
    /// Override the peak buffer radius, in metres.
    #[arg(long = ARG_BUFFER_RADIUS, value_name = "metres")]
    #[serde(default)]
    pub(crate) buffer_radius_meters: Option<f64>,
    /// Look up missing page-view counts before scoring.
    #[arg(
        long = ARG_FETCH_PAGE_VIEWS,
        value_name = "bool",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) fetch_page_views: Option<bool>,
    /// Base URL of the page-view REST API; implies page-view lookups.
    #[arg(long = ARG_PAGEVIEWS_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) pageviews_base_url: Option<String>,
}

impl ScoreArgs {
    pub(crate) fn into_config(self) -> Result<ScoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreConfig::try_from(merged)
    }
}

/// Resolved `score` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) output: Utf8PathBuf,
    pub(crate) scoring_config: Option<Utf8PathBuf>,
    pub(crate) buffer_radius_meters: Option<f64>,
    /// Page-view API base URL when lookups are enabled.
    pub(crate) pageviews_base_url: Option<String>,
}

impl ScoreConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.input, ARG_INPUT)?;
        if let Some(path) = &self.scoring_config {
            Self::require_existing(path, ARG_SCORING_CONFIG)?;
        }
        Self::require_writable_target(&self.output, ARG_OUTPUT)
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// The output may be absent, but must not be a directory.
    fn require_writable_target(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match fs::file_is_file(path) {
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Ok(true) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load the scoring configuration and apply command-line overrides.
    pub(crate) fn stress_config(&self) -> Result<StressConfig, CliError> {
        let mut config = match &self.scoring_config {
            Some(path) => load_stress_config(path)?,
            None => StressConfig::default(),
        };
        if let Some(radius) = self.buffer_radius_meters {
            config.buffer_radius_meters = radius;
        }
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<ScoreArgs> for ScoreConfig {
    type Error = CliError;

    fn try_from(args: ScoreArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_INPUT,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_OUTPUT,
        })?;
        let pageviews_base_url = match (args.fetch_page_views, args.pageviews_base_url) {
            (Some(false), _) => None,
            (_, Some(base_url)) => Some(base_url),
            (Some(true), None) => Some(DEFAULT_BASE_URL.to_owned()),
            (None, None) => None,
        };
        Ok(Self {
            input,
            output,
            scoring_config: args.scoring_config,
            buffer_radius_meters: args.buffer_radius_meters,
            pageviews_base_url,
        })
    }
}

/// Fills in missing page-view counts before a run.
pub(crate) trait ViewCountFetcher {
    fn fill_view_counts(&self, base_url: &str, peaks: &mut Layer<Peak>)
    -> Result<usize, CliError>;
}

pub(crate) struct HttpViewCountFetcher;

impl ViewCountFetcher for HttpViewCountFetcher {
    fn fill_view_counts(
        &self,
        base_url: &str,
        peaks: &mut Layer<Peak>,
    ) -> Result<usize, CliError> {
        let source =
            HttpPageviewSource::new(base_url).map_err(|source| CliError::BuildPageviewSource {
                base_url: base_url.to_owned(),
                source,
            })?;
        Ok(source.fetch_view_counts(peaks))
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_score_with(args, &HttpViewCountFetcher, &mut stdout)
}

pub(crate) fn run_score_with(
    args: ScoreArgs,
    fetcher: &dyn ViewCountFetcher,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_score_config(args)?;
    let report = execute_score(&config, fetcher)?;
    write_summary(writer, &config, &report)
}

fn resolve_score_config(args: ScoreArgs) -> Result<ScoreConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn execute_score(
    config: &ScoreConfig,
    fetcher: &dyn ViewCountFetcher,
) -> Result<StressReport, CliError> {
    let pipeline = StressPipeline::new(config.stress_config()?)?;
    let mut snapshot = read_snapshot(&config.input)?;
    if let Some(base_url) = &config.pageviews_base_url {
        let filled = fetcher.fill_view_counts(base_url, &mut snapshot.peaks)?;
        log::info!("filled {filled} page-view counts from {base_url}");
    }
    let (scored, report) = pipeline.run(snapshot)?;
    write_snapshot(&config.output, &scored)?;
    Ok(report)
}

/// Loads a JSON-encoded [`StressConfig`] from disk.
pub(crate) fn load_stress_config(path: &Utf8Path) -> Result<StressConfig, CliError> {
    let text = fs::read_utf8(path).map_err(|source| CliError::ReadScoringConfig {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::ParseScoringConfig {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    output: &'a Utf8Path,
    scored: usize,
    unscored: usize,
    filtered: usize,
    metric_projection: Option<String>,
}

fn write_summary(
    writer: &mut dyn Write,
    config: &ScoreConfig,
    report: &StressReport,
) -> Result<(), CliError> {
    let summary = RunSummary {
        output: &config.output,
        scored: report.scored,
        unscored: report.unscored,
        filtered: report.filtered,
        metric_projection: report.metric_projection.map(|crs| crs.to_string()),
    };
    let payload = serde_json::to_string_pretty(&summary).map_err(CliError::SerialiseSummary)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteSummary)?;
    writer.write_all(b"\n").map_err(CliError::WriteSummary)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ScoreConfig, CliError> {
    let merged = ScoreArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ScoreConfig::try_from(merged)
}
