use clap::Parser;
use site_metadata::config::{self, Workspace};
use site_metadata::imaging::{self, CommandBackend, MissingTool, Tool};
use site_metadata::item::{ItemBuilder, ItemError, Placeholders};
use site_metadata::{diff, generate, output, process, scan};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "site-metadata")]
#[command(about = "Update RSS, JSON and media metadata of a gallery website")]
#[command(long_about = "\
Update RSS, JSON and media metadata of a gallery website

Compares the source galleries with previously generated metadata and
updates what changed. Without action flags, only prints statistics.

Web root structure:

  site.toml                          # Optional config (see --gen-config)
  site-data/galleries/
  ├── 3-Summer/                      # Gallery: ID-TITLE
  │   ├── 1-beach-Dawn.jpg           # Item: ID-TAG-...-TAG-TITLE.ext
  │   ├── 2-Waves.mp4
  │   └── 3-live-Song.mp3
  └── 4-Winter--2020/                # -- is a literal hyphen
  site-metadata/                     # Generated
  ├── rss.xml
  ├── news.json
  ├── galleries.json
  └── galleries/
      ├── 3.json
      └── 3/
          ├── 1.thumbnail.jpg
          ├── 1.poster.jpg
          └── 2.mp4, 2.ogv, 2.webm, ...

Exit codes:
  10  invalid site.toml or unreadable placeholder images
  12  composite (ImageMagick) not found
  14  ffmpeg not found
  15  ffprobe not found
  21  cannot read site-data folder
  31  cannot read site-data galleries folder
  1   any other failure")]
#[command(version)]
struct Cli {
    /// Generate the RSS feed of new and modified galleries
    #[arg(long)]
    rss: bool,

    /// Generate news.json, galleries.json and per-gallery JSON files
    #[arg(long)]
    json: bool,

    /// Generate missing thumbnails, posters and audio/video renditions
    #[arg(long)]
    media: bool,

    /// Same as --rss --json --media
    #[arg(long)]
    all: bool,

    /// Print generated files and planned media instead of writing anything
    #[arg(long)]
    dry_run: bool,

    /// Web root containing site-data/ and site-metadata/
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print a stock site.toml with all options documented
    #[arg(long)]
    gen_config: bool,
}

#[derive(Error, Debug)]
enum RunError {
    #[error("Invalid site.toml: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    MissingTool(#[from] MissingTool),
    #[error("Cannot read from folder \"{}\"", .0.display())]
    SiteData(PathBuf),
    #[error("Cannot read from folder \"{}\"", .0.display())]
    Galleries(PathBuf),
    #[error("Cannot read placeholder image: {0}")]
    Placeholders(ItemError),
    #[error(transparent)]
    Scan(#[from] scan::ScanError),
    #[error(transparent)]
    Generate(#[from] generate::GenerateError),
    #[error(transparent)]
    Process(#[from] process::ProcessError),
}

impl RunError {
    fn exit_code(&self) -> u8 {
        match self {
            RunError::Config(_) | RunError::Placeholders(_) => 10,
            RunError::MissingTool(missing) => match missing.tool {
                Tool::Composite => 12,
                Tool::Ffmpeg => 14,
                Tool::Ffprobe => 15,
            },
            RunError::SiteData(_) => 21,
            RunError::Galleries(_) => 31,
            RunError::Scan(_) | RunError::Generate(_) | RunError::Process(_) => 1,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Cannot install log subscriber");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            if code == 1 {
                error!("Unhandled failure ({})", e);
            } else {
                error!("{}", e);
            }
            if let RunError::MissingTool(missing) = &e {
                warn!("Install the {} package or set [tools] in {}", missing.tool.package(), config::CONFIG_FILE);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let config = config::load_config(&cli.root)?;
    let workspace = Workspace::new(cli.root.clone(), config, cli.dry_run);
    if workspace.dry_run {
        warn!(">>>>>>>> RUNNING IN DRY MODE <<<<<<<<");
        warn!(">>>>> No changes will be stored <<<<<");
    }

    imaging::check_tools(&workspace.config.tools)?;

    let site_data = workspace.site_data_dir();
    if std::fs::read_dir(&site_data).is_err() {
        return Err(RunError::SiteData(site_data));
    }
    let galleries = workspace.input_galleries_dir();
    if std::fs::read_dir(&galleries).is_err() {
        return Err(RunError::Galleries(galleries));
    }

    let backend = CommandBackend::new(
        workspace.config.tools.clone(),
        workspace.resolve(&workspace.paths().video_watermark),
    );
    let placeholders =
        Placeholders::probe(&workspace, &backend).map_err(RunError::Placeholders)?;
    let builder = ItemBuilder::new(&workspace, &placeholders, &backend);

    let input = scan::scan_input(&builder)?;
    let generated = scan::scan_output(&workspace)?;
    let changes = diff::diff(&input, &generated);

    let (rss, json, media) = (cli.rss || cli.all, cli.json || cli.all, cli.media || cli.all);
    if !rss && !json && !media {
        output::print_statistics(&workspace, &input, &generated, &changes);
        return Ok(());
    }

    if rss {
        info!("New and modified galleries:");
        generate::generate_rss(&workspace, &input, &changes)?;
    }
    if json {
        generate::generate_json(&workspace, &input, &changes)?;
    }
    if media {
        let report = process::generate_media(&workspace, &input, &generated, &changes, &backend)?;
        output::print_process_report(&report, workspace.dry_run);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn cli_for(root: &std::path::Path) -> Cli {
        Cli::parse_from(["site-metadata", "--root", root.to_str().unwrap()])
    }

    fn write_config(root: &std::path::Path, toml: &str) {
        std::fs::write(root.join(config::CONFIG_FILE), toml).unwrap();
    }

    /// Tools resolvable on any Unix test host.
    const SHELL_TOOLS: &str = "[tools]\ncomposite = \"sh\"\nffmpeg = \"sh\"\nffprobe = \"sh\"\n";

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn all_flag_parses() {
        let cli = Cli::parse_from(["site-metadata", "--all", "--dry-run"]);
        assert!(cli.all && cli.dry_run);
        assert!(!cli.rss);
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn exit_codes_per_failure() {
        let config = RunError::Config(config::ConfigError::Validation("bad".into()));
        assert_eq!(config.exit_code(), 10);
        assert!(config.to_string().starts_with("Invalid site.toml: "));

        let missing = |tool: Tool| {
            RunError::MissingTool(MissingTool {
                tool,
                command: tool.to_string(),
            })
        };
        assert_eq!(missing(Tool::Composite).exit_code(), 12);
        assert_eq!(missing(Tool::Ffmpeg).exit_code(), 14);
        assert_eq!(missing(Tool::Ffprobe).exit_code(), 15);

        assert_eq!(RunError::SiteData(PathBuf::from("site-data")).exit_code(), 21);
        assert_eq!(RunError::Galleries(PathBuf::from("galleries")).exit_code(), 31);

        let io = std::io::Error::other("disk");
        assert_eq!(RunError::Scan(scan::ScanError::Io(io)).exit_code(), 1);
    }

    #[test]
    fn invalid_config_exits_10() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "unknown_key = 1\n");
        let err = run(&cli_for(tmp.path())).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn missing_tool_exits_with_its_code() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[tools]\ncomposite = \"no-such-composite-tool\"\n");
        let err = run(&cli_for(tmp.path())).unwrap_err();
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn unreadable_input_folders_exit_21_then_31() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), SHELL_TOOLS);
        let err = run(&cli_for(tmp.path())).unwrap_err();
        assert_eq!(err.exit_code(), 21);

        std::fs::create_dir(tmp.path().join("site-data")).unwrap();
        let err = run(&cli_for(tmp.path())).unwrap_err();
        assert_eq!(err.exit_code(), 31);
    }

    #[test]
    fn broken_placeholder_exits_10() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), SHELL_TOOLS);
        std::fs::create_dir_all(tmp.path().join("site-data/galleries")).unwrap();
        let err = run(&cli_for(tmp.path())).unwrap_err();
        assert!(matches!(err, RunError::Placeholders(_)));
        assert_eq!(err.exit_code(), 10);
    }
}
