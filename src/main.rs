use clap::{Parser, Subcommand};
use post_thumb::content::{self, ContentItem};
use post_thumb::output::{self, ArtifactEntry, ResolvedItem};
use post_thumb::thumbnail::ThumbnailResolver;
use post_thumb::{cache, config, naming};
use rayon::prelude::*;
use std::path::PathBuf;

/// Target box shared by the commands that produce thumbnails.
#[derive(clap::Args, Clone, Copy)]
struct SizeArgs {
    /// Target width in pixels
    #[arg(long)]
    width: u32,

    /// Target height in pixels (defaults to the width)
    #[arg(long)]
    height: Option<u32>,

    /// Fit inside the box instead of filling it and cropping the overflow
    #[arg(long)]
    no_crop: bool,
}

#[derive(Parser)]
#[command(name = "post-thumb")]
#[command(about = "Thumbnails for blog posts, generated on first use")]
#[command(long_about = "\
Thumbnails for blog posts, generated on first use

Picks the image that represents a post and returns a URL for a copy of it
at the requested size. Copies are written next to the source image and
reused on every later request.

Source selection (first available wins):
  1. Featured image     (--featured, or `featured_image` in a manifest)
  2. First <img> in the post body (HTML, or Markdown for .md files)
  3. Fallback URL       (--fallback)

Only images on our own site and below storage.base_url are resized.
Anything else is returned unchanged.

Run 'post-thumb gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Log every resolution to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the thumbnail for one post file (.html or .md)
    Resolve {
        content_file: PathBuf,
        #[command(flatten)]
        size: SizeArgs,
        /// Featured image URL for the post
        #[arg(long)]
        featured: Option<String>,
        /// URL to use when the post has no image
        #[arg(long)]
        fallback: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Resolve thumbnails for every post in a JSON manifest
    Batch {
        manifest: PathBuf,
        #[command(flatten)]
        size: SizeArgs,
        /// URL to use for posts without an image
        #[arg(long)]
        fallback: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the thumbnail file name for an image path or URL
    Name {
        image: String,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: Option<u32>,
    },
    /// List generated thumbnails below the storage root
    Artifacts {
        /// Only thumbnails older than their source image
        #[arg(long)]
        stale: bool,
        /// Delete the listed thumbnails
        #[arg(long)]
        purge: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Command::Resolve {
            content_file,
            size,
            featured,
            fallback,
            json,
        } => {
            let site_config = config::load_config(&cli.config)?;
            let resolver = ThumbnailResolver::from_site_config(&site_config);
            let crop = site_config.thumbnails.crop && !size.no_crop;

            let mut item = ContentItem::from_file(&content_file)?;
            if let Some(featured) = featured {
                item = item.with_featured_image(featured);
            }
            let resolved = resolver.resolve_thumbnail(
                &item,
                size.width,
                size.height,
                crop,
                fallback.as_deref(),
            );
            let result = ResolvedItem {
                id: item.id,
                resolved,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::print_resolution(&result);
            }
        }
        Command::Batch {
            manifest,
            size,
            fallback,
            json,
        } => {
            let site_config = config::load_config(&cli.config)?;
            let resolver = ThumbnailResolver::from_site_config(&site_config);
            let crop = site_config.thumbnails.crop && !size.no_crop;

            let items = content::load_manifest(&manifest)?;
            let results: Vec<ResolvedItem> = items
                .par_iter()
                .map(|item| ResolvedItem {
                    id: item.id.clone(),
                    resolved: resolver.resolve_thumbnail(
                        item,
                        size.width,
                        size.height,
                        crop,
                        fallback.as_deref(),
                    ),
                })
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                output::print_batch(&results);
            }
        }
        Command::Name {
            image,
            width,
            height,
        } => {
            println!(
                "{}",
                naming::thumbnail_name(&image, width, height.unwrap_or(width))
            );
        }
        Command::Artifacts { stale, purge } => {
            let site_config = config::load_config(&cli.config)?;
            let root = PathBuf::from(&site_config.storage.base_path);

            let mut entries = Vec::new();
            for artifact in cache::find_artifacts(&root)? {
                let is_stale = cache::is_stale(&artifact)?;
                if stale && !is_stale {
                    continue;
                }
                entries.push(ArtifactEntry {
                    artifact,
                    stale: is_stale,
                });
            }
            output::print_artifacts(&entries, &root);

            if purge {
                let artifacts: Vec<_> = entries.into_iter().map(|e| e.artifact).collect();
                let removed = cache::purge(&artifacts)?;
                println!("{}", output::format_purge(removed));
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Minimal stderr sink for the library's `log` records.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level().as_str().to_lowercase(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Warnings always; per-request debug records with `--verbose`.
fn init_logger(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        });
    }
}
