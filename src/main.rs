use clap::{Parser, Subcommand};
use docnav::host::WikiHost;
use docnav::outline::{HeadingRange, TocOptions, build_outline};
use docnav::store::RenderRequest;
use docnav::types::RenderMode;
use docnav::wiki::FsWiki;
use docnav::{config, naming, output};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "docnav")]
#[command(about = "Book-like previous/toc/next navigation for wiki pages")]
#[command(long_about = "\
Book-like previous/toc/next navigation for wiki pages

Pages are markdown files under pages/; the path is the page id
(pages/book/intro.md → book:intro). A page joins a chain with a
navigation directive:

  <- previous ^ toc ^ next ->
  << previous|Back ^ book:start ^ next|Onwards >>

and a table of contents page lists the chain with:

  <doctoc start=intro,includeheadings=1-2,numbers=1>

Wiki layout:

  wiki/
  ├── config.toml          # Optional (run 'docnav gen-config')
  ├── pages/               # Page sources
  └── meta/                # Navigation metadata, written on render

Logging is controlled with RUST_LOG (default: info).")]
#[command(version = version_string())]
struct Cli {
    /// Wiki root directory
    #[arg(long, default_value = ".", global = true)]
    wiki: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one page and store its navigation metadata
    Render {
        /// Page id, e.g. book:intro
        page: String,
        /// Preview unsaved text from this file ('-' for stdin) instead of
        /// the stored source; nothing is written to the wiki
        #[arg(long, value_name = "FILE")]
        preview: Option<PathBuf>,
        /// Write the HTML document here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Render every page into a static site
    Build {
        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// Walk a chain from a page and print its outline
    Outline {
        /// First page of the chain
        start: String,
        /// Heading levels to include, e.g. 1-2
        #[arg(long, value_name = "N-M")]
        include_headings: Option<String>,
        /// Number the outline entries
        #[arg(long)]
        numbers: bool,
        /// Use first headings as page titles
        #[arg(long)]
        use_heading: bool,
        /// List only headings, not the pages themselves
        #[arg(long)]
        hide_page_links: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render { page, preview, out } => {
            let mut wiki = FsWiki::open(&cli.wiki)?;
            let page = naming::clean_id(&page, &wiki.config().ids);
            let rendered = match preview {
                Some(path) => {
                    let source = read_preview_source(&path)?;
                    wiki.preview(&page, &source)
                }
                None => wiki.render(&page)?,
            };
            output::print_warnings(&rendered.warnings);
            let document = wiki.document(&rendered);
            match out {
                Some(path) => std::fs::write(path, document)?,
                None => println!("{document}"),
            }
        }
        Command::Build { output: dir } => {
            let mut wiki = FsWiki::open(&cli.wiki)?;
            println!("==> Building {} → {}", cli.wiki.display(), dir.display());
            let built = wiki.build(&dir)?;
            output::print_build_output(&built);
        }
        Command::Outline {
            start,
            include_headings,
            numbers,
            use_heading,
            hide_page_links,
        } => {
            let wiki = FsWiki::open(&cli.wiki)?;
            let config = wiki.config();
            let start = naming::clean_id(&start, &config.ids);

            let mut options = TocOptions::for_page(&start, config);
            options.include_headings = include_headings.as_deref().map(parse_range).transpose()?;
            options.numbered = numbers;
            options.use_heading |= use_heading;
            options.hide_page_links = hide_page_links;
            if hide_page_links && options.include_headings.is_none() {
                options.include_headings = Some(HeadingRange::normalized(1, 2));
            }

            let request = RenderRequest::new(&start, RenderMode::Show);
            let result = build_outline(&wiki, &request, &options);
            output::print_outline(&result.outline);
            output::print_warnings(&result.warnings);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Read preview text from a file, or stdin for `-`.
fn read_preview_source(path: &std::path::Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        std::fs::read_to_string(path)
    }
}

/// Parse `N` or `N-M` into a heading range.
fn parse_range(text: &str) -> Result<HeadingRange, String> {
    let parse = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid heading level '{s}' in '{text}'"))
    };
    match text.split_once('-') {
        Some((lo, hi)) => Ok(HeadingRange::normalized(parse(lo)?, parse(hi)?)),
        None => {
            let level = parse(text)?;
            Ok(HeadingRange::normalized(level, level))
        }
    }
}
