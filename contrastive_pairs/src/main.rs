// CLI entry for contrastive_pairs
use anyhow::{bail, Result};
use clap::{ArgAction, Parser, ValueHint};
use contrastive_pairs::{default_config, process, Config, Dataset, Job, MissingPolicy, Params};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "contrastive_pairs",
    version,
    about = "Generate anchor/Nanchor pairs from VOC2012, COCO-Stuff, ADE20K and Cityscapes labels"
)]
struct Cli {
    /// VOC root (a folder containing VOCdevkit/VOC2012, or VOC2012 itself)
    #[arg(long = "voc12", value_hint = ValueHint::DirPath)]
    voc12: Option<PathBuf>,
    /// Use SegmentationClassAug gray labels for VOC2012
    #[arg(long = "aug", action = ArgAction::SetTrue)]
    aug: bool,
    /// COCO root containing train2017 and stuffthingmaps_trainval2017
    #[arg(long = "coco", value_hint = ValueHint::DirPath)]
    coco: Option<PathBuf>,
    /// ADE20K root containing images/ADE/training
    #[arg(long = "ade", value_hint = ValueHint::DirPath)]
    ade: Option<PathBuf>,
    /// Cityscapes root containing gtFine and leftImg8bit
    #[arg(long = "city", value_hint = ValueHint::DirPath)]
    city: Option<PathBuf>,

    /// Output directory
    #[arg(long = "output-dir", alias = "output_dir", default_value = ".", value_hint = ValueHint::DirPath)]
    output_dir: PathBuf,
    /// Also save binary masks and their complements
    #[arg(long = "save-binmask", alias = "save_binmask", action = ArgAction::SetTrue)]
    save_binmask: bool,

    /// Minimum area fraction a class must exceed
    #[arg(long = "threshold")]
    threshold: Option<f64>,
    /// Number of worker threads
    #[arg(long = "threads")]
    threads: Option<usize>,
    /// Class table override (`R,G,B`, `#RRGGBB` or `N` per line)
    #[arg(long = "colormap", value_hint = ValueHint::FilePath)]
    colormap: Option<PathBuf>,
    /// Stop a worker at the first missing or unreadable companion file
    #[arg(long = "abort-on-missing", action = ArgAction::SetTrue)]
    abort_on_missing: bool,
    /// Always rescan COCO / ADE20K instead of reusing cached file lists
    #[arg(long = "no-cache", action = ArgAction::SetTrue)]
    no_cache: bool,
}

fn build_config(cli: &Cli) -> Config {
    let mut cfg = default_config();
    if let Some(v) = cli.threshold { cfg.min_fraction = v; }
    if let Some(v) = cli.threads { cfg.num_threads = v.max(1); }
    if cli.save_binmask { cfg.save_binmask = true; }
    if cli.abort_on_missing { cfg.missing = MissingPolicy::Abort; }
    if cli.no_cache { cfg.cache_lists = false; }
    cfg
}

fn build_jobs(cli: &Cli) -> Vec<Job> {
    let candidates = [
        (cli.voc12.as_ref(), Dataset::Voc { augmented: cli.aug }),
        (cli.coco.as_ref(), Dataset::CocoStuff),
        (cli.ade.as_ref(), Dataset::Ade20k),
        (cli.city.as_ref(), Dataset::Cityscapes),
    ];
    candidates
        .into_iter()
        .filter_map(|(root, dataset)| root.map(|r| Job { dataset, root: r.clone() }))
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let jobs = build_jobs(&cli);
    if jobs.is_empty() {
        bail!("select at least one dataset with --voc12, --coco, --ade or --city");
    }
    if cli.aug && cli.voc12.is_none() {
        log::warn!("--aug has no effect without --voc12");
    }
    let params = Params {
        jobs,
        output_dir: cli.output_dir.clone(),
        colormap: cli.colormap.clone(),
        config: build_config(&cli),
    };
    for summary in process(params)? {
        let pairs = summary.manifest.as_ref().map_or(0, |m| m.len());
        println!("{}: {} pairs", summary.dataset, pairs);
    }
    Ok(())
}
