use wbg_cli::prelude::{LayoutOpts, Parser, Verbosity};
use wbg_server::config::{ConfigFile, ServerConfig, DEFAULT_BIND};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let opts: Opts = Opts::parse();
    opts.verbose.init_logging()?;

    let mut config = ServerConfig::new(opts.bind, opts.layout);

    if let Some(path) = opts.config {
        config = config.apply(ConfigFile::read(&path)?);
        log::info!("Loaded configuration from {}", path);
    }

    log::info!(
        "Serving gallery root {} (catalog {}, policy {:?})",
        config.layout.root,
        config.layout.catalog_data,
        config.policy
    );

    wbg_server::serve(config).await?;

    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("Configuration error")]
    Config(#[from] wbg_server::config::Error),
    #[error("Log initialization error")]
    LogInitialization(#[from] log::SetLoggerError),
}

#[derive(Debug, Parser)]
#[clap(name = "wbg-server", version, author)]
struct Opts {
    #[clap(flatten)]
    verbose: Verbosity,
    #[clap(flatten)]
    layout: LayoutOpts,
    /// Address to listen on
    #[clap(long, default_value = DEFAULT_BIND)]
    bind: String,
    /// Optional TOML file overriding the other options
    #[clap(long)]
    config: Option<String>,
}
