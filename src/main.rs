#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use hullprint::batch::DEFAULT_CHUNK_SIZE;
use hullprint::fetch::DEFAULT_PROXY_PATH;
use hullprint::parse::{self, PageSize};
use hullprint::{
    BatchProcessor, Branding, BrochureOptions, Composer, Export, ProxySource, SheetLayout,
};

#[derive(Parser)]
#[command(name = "hullprint", version, about = "Spec sheet and brochure PDFs for yacht listings")]
struct Cli {
    /// num parallel threads for image processing (default number of CPUs)
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,

    /// suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// origin of the image proxy
    #[arg(long, global = true, default_value = "http://localhost:3000")]
    proxy: String,

    /// path of the image proxy endpoint
    #[arg(long, global = true, default_value = DEFAULT_PROXY_PATH)]
    proxy_path: String,

    /// images fetched at once
    #[arg(long, global = true, default_value_t = DEFAULT_CHUNK_SIZE)]
    concurrency: usize,

    /// logo drawn in the page header instead of the company name
    #[arg(long, global = true)]
    logo_url: Option<String>,

    /// page size
    #[arg(long, global = true, default_value = "a4")]
    pagesize: PageSize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// export one listing as a spec sheet
    Sheet {
        /// listing JSON file
        listing: PathBuf,

        /// output PDF path or dir (default named after the listing), "-" for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// leading photos left out of the gallery
        #[arg(long, default_value_t = 2)]
        gallery_skip: usize,
    },
    /// compose a brochure from many listings
    Brochure {
        /// JSON array of brochure entries
        entries: PathBuf,

        /// output PDF path or dir (default dated file name), "-" for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// entries to include, in order (e.g. "3,1-2"); sold listings are always left out
        #[arg(short, long)]
        select: Option<String>,

        /// banner title on the first page
        #[arg(long, default_value = "Nova Yachts")]
        title: String,

        /// banner subtitle on the first page
        #[arg(long, default_value = "Collection")]
        subtitle: String,
    },
    /// generate shell completions
    Completions {
        /// shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let quiet = cli.quiet;

    match &cli.command {
        Commands::Sheet {
            listing,
            output,
            gallery_skip,
        } => {
            let listing = parse::load_listing(listing)?;
            if !quiet {
                eprintln!(
                    "Composing spec sheet for {} ({} photos)",
                    listing.name,
                    1 + listing.other_photos.len()
                );
            }
            let layout = SheetLayout {
                gallery_skip: *gallery_skip,
                ..SheetLayout::default()
            };
            let composer = composer(&cli)?;
            let export = runtime()?.block_on(composer.export_spec_sheet(&listing, &layout))?;
            write_export(&export, output.as_deref(), quiet)?;
        }
        Commands::Brochure {
            entries,
            output,
            select,
            title,
            subtitle,
        } => {
            let entries = parse::load_entries(entries)?;
            let entries = parse::select_entries(entries, select.as_deref())?;
            if !quiet {
                eprintln!("Composing brochure of {} listings", entries.len());
            }
            let options = BrochureOptions {
                title: title.clone(),
                subtitle: subtitle.clone(),
                ..BrochureOptions::default()
            };
            let composer = composer(&cli)?;
            let export = runtime()?.block_on(composer.export_brochure(&entries, &options))?;
            write_export(&export, output.as_deref(), quiet)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "hullprint",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn composer(cli: &Cli) -> Result<Composer<ProxySource>> {
    let source = ProxySource::new(&cli.proxy, &cli.proxy_path).context("Failed to set up image proxy")?;
    let processor = BatchProcessor::new(source).with_chunk_size(cli.concurrency);
    let branding = Branding {
        logo_url: cli.logo_url.clone(),
        ..Branding::default()
    };
    Ok(Composer::new(processor)
        .with_branding(branding)
        .with_page_size(cli.pagesize))
}

/// fetches run concurrently on one thread; decoding goes to the rayon pool
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// write to `output`: a file, a dir to put the suggested name in, or stdout
fn write_export(export: &Export, output: Option<&Path>, quiet: bool) -> Result<()> {
    let path = match output {
        Some(p) if p.as_os_str() == "-" => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&export.bytes).context("Failed to write to stdout")?;
            stdout.flush()?;
            return Ok(());
        }
        Some(p) if p.is_dir() => p.join(&export.file_name),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(&export.file_name),
    };
    std::fs::write(&path, &export.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    if !quiet {
        eprintln!("Wrote {} ({} KB)", path.display(), export.bytes.len() / 1024);
    }
    Ok(())
}
