use clap::{Args, Parser, Subcommand, ValueEnum};
use snapdoc::platform::FileDownloader;
use snapdoc::source::{self, PageSource};
use snapdoc::{report_filename, Document, ExportConfig, Exporter, Theme};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snapdoc", version, about = "Capture a rendered page region into a PDF report")]
struct Cli {
    /// JSON config file; missing fields use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a region of a page as a one-page PDF
    Export(ExportArgs),
    /// Capture a region as JPEG without assembling a document
    Capture(CaptureArgs),
}

#[derive(Args)]
struct PageArgs {
    /// HTML file or http(s) URL
    #[arg(long)]
    source: String,
    /// Id of the element to capture
    #[arg(long, default_value = "report-content")]
    target: String,
    /// Force a theme instead of the one the page declares
    #[arg(long, value_enum)]
    theme: Option<ThemeArg>,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    page: PageArgs,
    /// Directory the PDF is saved into
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Output filename (defaults to the configured report name)
    #[arg(long, conflicts_with = "industry")]
    filename: Option<String>,
    /// Name the file after an industry, e.g. FinHealth_Analysis_Retail.pdf
    #[arg(long)]
    industry: Option<String>,
}

#[derive(Args)]
struct CaptureArgs {
    #[command(flatten)]
    page: PageArgs,
    /// Write the JPEG to this path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Print the capture as a data: URL
    #[arg(long)]
    data_url: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(t: ThemeArg) -> Self {
        match t {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

async fn load_page(page: &PageArgs, config: &ExportConfig) -> anyhow::Result<Document> {
    let src = PageSource::parse(&page.source);
    let cfg = config.clone();
    let mut doc = tokio::task::spawn_blocking(move || source::load_document(&src, &cfg)).await??;
    if let Some(theme) = page.theme {
        doc.set_theme(theme.into());
    }
    Ok(doc)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ExportConfig::from_json_file(path)?,
        None => ExportConfig::default(),
    };

    match cli.command {
        Command::Export(args) => {
            let doc = load_page(&args.page, &config).await?;
            let filename = match (&args.filename, &args.industry) {
                (Some(f), _) => f.clone(),
                (None, Some(industry)) => report_filename(industry),
                (None, None) => config.default_filename.clone(),
            };
            let exporter = Exporter::new(
                doc.into_shared(),
                config,
                Arc::new(FileDownloader::new(&args.out_dir)),
            )?;
            let outcome = exporter.export(&args.page.target, &filename).await;
            println!("{}", serde_json::to_string(&outcome)?);
            if !outcome.success {
                eprintln!("{}", outcome.user_message());
                std::process::exit(1);
            }
        }
        Command::Capture(args) => {
            let doc = load_page(&args.page, &config).await?;
            let downloader = Arc::new(snapdoc::platform::MemoryDownloader::new());
            let exporter = Exporter::new(doc.into_shared(), config, downloader)?;
            let capture = exporter.capture(&args.page.target).await?;
            if let Some(path) = &args.output {
                std::fs::write(path, &capture.data)?;
                eprintln!("wrote {}x{} capture to {}", capture.width, capture.height, path.display());
            }
            if args.data_url || args.output.is_none() {
                println!("{}", capture.data_url());
            }
        }
    }
    Ok(())
}
