use anyhow::{bail, Context, Result};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod adapter;
pub mod colormaps;
pub mod composite;
pub mod dataset;
pub mod decode;
pub mod discovery;
pub mod distribute;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod progress;

pub use adapter::{Adapter, FileReport, MissingPolicy, OutputDirs, ShardReport};
pub use colormaps::{load_colormap_file, named_colormap, ClassKey, ClassTable};
pub use composite::{compose, write_pair, ContrastivePair, PairPaths, WriteOutcome};
pub use dataset::Dataset;
pub use decode::{decode_all, decode_class_mask, BinaryMask, LabelKind, LabelMask};
pub use distribute::{run_sharded, split_chunks, split_round_robin, RunReport};
pub use error::ConvertError;
pub use filter::AreaFilter;
pub use manifest::{build_manifest, Manifest};

pub const PAIRS_DIR: &str = "ContrastivePairs";
pub const BINMASK_DIR: &str = "ContrastivePairs_binmask";

#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum area fraction a class region must exceed.
    pub min_fraction: f64,
    pub num_threads: usize,
    pub save_binmask: bool,
    pub missing: MissingPolicy,
    /// Cache COCO / ADE20K file lists in the output directory.
    pub cache_lists: bool,
}

pub fn default_config() -> Config {
    Config {
        min_fraction: filter::DEFAULT_MIN_FRACTION,
        num_threads: num_cpus::get().max(1),
        save_binmask: false,
        missing: MissingPolicy::Skip,
        cache_lists: true,
    }
}

/// One dataset to convert and the root it was given as.
#[derive(Debug, Clone)]
pub struct Job {
    pub dataset: Dataset,
    pub root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Params {
    pub jobs: Vec<Job>,
    pub output_dir: PathBuf,
    /// Class table override, applied to every job.
    pub colormap: Option<PathBuf>,
    pub config: Config,
}

/// Summary of one converted dataset.
#[derive(Debug)]
pub struct JobSummary {
    pub dataset: Dataset,
    pub report: RunReport,
    pub manifest: Option<Manifest>,
}

/// Output and binmask directories for `dataset` under `output_dir`.
pub fn output_dirs(output_dir: &Path, dataset: Dataset, save_binmask: bool) -> OutputDirs {
    let sub = dataset.output_subdir();
    OutputDirs {
        pairs: output_dir.join(PAIRS_DIR).join(sub),
        binmasks: save_binmask.then(|| output_dir.join(BINMASK_DIR).join(sub)),
    }
}

/// Convert an already-resolved worklist. This is the core entry point:
/// split the files into shards, run the adapters and join them.
pub fn convert_worklist(adapter: Adapter, files: &[PathBuf], num_threads: usize) -> RunReport {
    let dataset = adapter.dataset();
    let shards = if dataset.round_robin() {
        split_round_robin(files, num_threads)
    } else {
        split_chunks(files, num_threads)
    };
    let progress = Arc::new(progress::Progress::new(
        dataset.to_string(),
        files.len(),
        dataset.progress_every(),
    ));
    run_sharded(Arc::new(adapter), shards, progress)
}

fn run_job(job: &Job, output_dir: &Path, table: Option<&ClassTable>, config: &Config) -> Result<JobSummary> {
    let Job { dataset, root } = job;
    let dataset = *dataset;
    info!("[{}] Attempt to use dataset path: {:?}", dataset, root);

    let dirs = output_dirs(output_dir, dataset, config.save_binmask);
    fs::create_dir_all(&dirs.pairs).with_context(|| format!("creating {:?}", dirs.pairs))?;
    info!("[{}] Output path: {:?}", dataset, dirs.pairs);
    if let Some(bin) = &dirs.binmasks {
        fs::create_dir_all(bin).with_context(|| format!("creating {:?}", bin))?;
        info!("[{}] Binary masks will be saved to: {:?}", dataset, bin);
    }

    let cache_dir = output_dir.join(PAIRS_DIR);
    let worklist = discovery::resolve(dataset, root, config.cache_lists.then_some(cache_dir.as_path()))
        .with_context(|| format!("resolving {} root {:?}", dataset, root))?;
    info!("[{}] In total {} input files.", dataset, worklist.files.len());

    let mut adapter = Adapter::new(dataset, &worklist.root, dirs.clone())
        .with_filter(AreaFilter::new(config.min_fraction)?)
        .with_policy(config.missing);
    if let Some(table) = table {
        adapter = adapter.with_table(table.clone());
    }

    let report = convert_worklist(adapter, &worklist.files, config.num_threads);
    info!(
        "[{}] {} files done, {} pairs written, {} already present.",
        dataset,
        report.files_completed(),
        report.pairs_written(),
        report.pairs_skipped()
    );
    for (path, reason) in report.failed() {
        warn!("[{}] skipped {:?}: {}", dataset, path, reason);
    }
    if !report.is_clean() {
        for e in report.aborted() {
            error!("[{}] {}", dataset, e);
        }
        return Ok(JobSummary {
            dataset,
            report,
            manifest: None,
        });
    }

    let manifest = build_manifest(&dirs.pairs, dataset.output_subdir(), dataset.extension())?;
    let manifest_path = output_dir.join(PAIRS_DIR).join(dataset.manifest_name());
    info!("[{}] Writing {} pairs to {:?}.", dataset, manifest.len(), manifest_path);
    manifest.write(&manifest_path)?;
    Ok(JobSummary {
        dataset,
        report,
        manifest: Some(manifest),
    })
}

/// Run every job in `params`. Fails after all jobs ran if any worker was
/// stopped early.
pub fn process(params: Params) -> Result<Vec<JobSummary>> {
    let Params {
        jobs,
        output_dir,
        colormap,
        config,
    } = params;
    if jobs.is_empty() {
        bail!("no dataset selected");
    }
    info!("Using {} worker threads", config.num_threads);
    let table = colormap
        .as_deref()
        .map(load_colormap_file)
        .transpose()
        .context("loading colormap")?;

    let mut summaries = Vec::with_capacity(jobs.len());
    for job in &jobs {
        summaries.push(run_job(job, &output_dir, table.as_ref(), &config)?);
    }
    let stopped: Vec<String> = summaries
        .iter()
        .filter(|s| !s.report.is_clean())
        .map(|s| s.dataset.to_string())
        .collect();
    if !stopped.is_empty() {
        bail!("workers stopped early for: {}", stopped.join(", "));
    }
    Ok(summaries)
}
