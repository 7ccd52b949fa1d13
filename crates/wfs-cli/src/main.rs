use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use wfs_core::collections::Collections;
use wfs_core::config::{self, CONFIG_FILE_NAME, ClientConfig};
use wfs_core::{HttpTransport, Operation, ParamValue, PathConvention, Service};

#[derive(Parser)]
#[command(name = "wfs", about = "OGC WFS3 command-line client", version)]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOpts {
    /// Response encoding: json, geojson, html, xml, ldjson or a full MIME type
    #[arg(short, long, global = true)]
    encoding: Option<String>,

    /// Be noisier
    #[arg(short, long, global = true)]
    verbose: bool,

    /// URL layout of the service
    #[arg(long, global = true)]
    paths: Option<PathStyle>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Service info and the operations it declares
    Info {
        /// Service root URL
        source: String,
    },

    /// Collection info
    Coll {
        /// Service root URL
        source: String,

        /// Print a name/title listing instead of the raw document
        #[arg(long)]
        summary: bool,
    },

    /// Execute an operation
    Op {
        /// Service root URL
        source: String,

        /// Operation id
        operation: String,

        /// Arguments in form of name=value
        args: Vec<String>,
    },

    /// Fetch the items of a collection, or one feature
    Items {
        /// Service root URL
        source: String,

        /// Collection id
        collection: String,

        /// Feature id
        feature: Option<String>,
    },

    /// Initialize a new wfs configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PathStyle {
    Legacy,
    Current,
}

impl From<PathStyle> for PathConvention {
    fn from(style: PathStyle) -> Self {
        match style {
            PathStyle::Legacy => PathConvention::Legacy,
            PathStyle::Current => PathConvention::Current,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let opts = &cli.opts;

    let default_filter = if opts.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Info { source } => cmd_info(&effective_config(opts)?, &source, opts.verbose),

        Commands::Coll { source, summary } => cmd_coll(&effective_config(opts)?, &source, summary),

        Commands::Op {
            source,
            operation,
            args,
        } => cmd_op(&effective_config(opts)?, &source, &operation, &args),

        Commands::Items {
            source,
            collection,
            feature,
        } => cmd_items(
            &effective_config(opts)?,
            &source,
            &collection,
            feature.as_deref(),
        ),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "wfs", &mut io::stdout());
            Ok(())
        }
    }
}

/// Config file values overridden by command-line flags.
fn effective_config(opts: &GlobalOpts) -> Result<ClientConfig> {
    let mut cfg = config::load_config(&PathBuf::from(CONFIG_FILE_NAME))
        .map_err(|e| anyhow::anyhow!(e))?
        .unwrap_or_default();
    if let Some(ref encoding) = opts.encoding {
        cfg.encoding = encoding.clone();
    }
    if let Some(paths) = opts.paths {
        cfg.paths = paths.into();
    }
    if let Some(timeout) = opts.timeout {
        cfg.timeout_secs = Some(timeout);
    }
    Ok(cfg)
}

fn connect(cfg: &ClientConfig, source: &str) -> Result<Service> {
    eprintln!("connecting to {source}");
    let transport = HttpTransport::from_config(cfg).context("failed to create HTTP client")?;
    Service::connect(Arc::new(transport), source, cfg.paths)
        .with_context(|| format!("failed to connect to {source}"))
}

fn cmd_info(cfg: &ClientConfig, source: &str, verbose: bool) -> Result<()> {
    let svc = connect(cfg, source)?;
    let info = svc.info();
    let mut out = io::stdout().lock();

    writeln!(out, "Service Info:")?;
    writeln!(out, "\tURL: {}", info.url)?;
    writeln!(out, "\tDescription: {}", info.description)?;
    writeln!(out)?;
    writeln!(out, "Operations:")?;
    for op in svc.operations() {
        write_operation(&mut out, &op, verbose)?;
    }
    Ok(())
}

fn write_operation(out: &mut impl Write, op: &Operation, verbose: bool) -> io::Result<()> {
    writeln!(out, "\tOperation: {} {} [ {} ]", op.id, op.method, op.url())?;
    if verbose && !op.description.is_empty() {
        writeln!(out, "\t{}", op.description)?;
    }
    writeln!(out, "\tParameters:")?;
    for p in &op.parameters {
        let required = if p.required { " *Required*" } else { "" };
        write!(out, "\t\t{}[{}] ({}){}", p.name, p.param_type, p.location, required)?;
        if verbose && !p.description.is_empty() {
            write!(out, " {}", p.description)?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

fn cmd_coll(cfg: &ClientConfig, source: &str, summary: bool) -> Result<()> {
    let svc = connect(cfg, source)?;
    let op = svc.describe_collections()?;

    if !summary {
        op.simple_call()
            .accept(cfg.encoding.as_str())
            .execute_writer(&mut io::stdout().lock())?;
        return Ok(());
    }

    let mut body = Vec::new();
    op.simple_call().accept("json").execute_writer(&mut body)?;
    let collections =
        Collections::from_json(&body).context("failed to decode collection listing")?;
    let mut out = io::stdout().lock();
    for c in &collections.collections {
        match &c.title {
            Some(title) => writeln!(out, "{}\t{}", c.name, title)?,
            None => writeln!(out, "{}", c.name)?,
        }
    }
    Ok(())
}

fn cmd_op(cfg: &ClientConfig, source: &str, operation: &str, args: &[String]) -> Result<()> {
    let params = parse_args(args)?;
    let svc = connect(cfg, source)?;
    let op = svc.get_operation(operation)?;
    let call = op.call(params)?;
    call.accept(cfg.encoding.as_str())
        .execute_writer(&mut io::stdout().lock())?;
    Ok(())
}

/// Split `name=value` arguments.
fn parse_args(args: &[String]) -> Result<Vec<(String, ParamValue)>> {
    args.iter()
        .map(|a| -> Result<(String, ParamValue)> {
            match a.split_once('=') {
                Some((name, value)) if !name.is_empty() && !value.contains('=') => {
                    Ok((name.to_string(), ParamValue::from(value)))
                }
                _ => anyhow::bail!("arg inputs require key=value, got {a:?}"),
            }
        })
        .collect()
}

fn cmd_items(
    cfg: &ClientConfig,
    source: &str,
    collection: &str,
    feature: Option<&str>,
) -> Result<()> {
    let svc = connect(cfg, source)?;
    let url = match feature {
        Some(fid) => svc.paths().collection_item(collection, fid),
        None => svc.paths().collection_items(collection),
    };
    log::debug!("reading {url} ({} paths)", cfg.paths);
    svc.stream_url(&url, &cfg.encoding, &mut io::stdout().lock())?;
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_args() {
        let params = parse_args(&["id=42".to_string(), "f=json".to_string()]).unwrap();
        assert_eq!(params[0], ("id".to_string(), ParamValue::from("42")));
        assert_eq!(params[1].0, "f");
    }

    #[test]
    fn rejects_malformed_args() {
        assert!(parse_args(&["id".to_string()]).is_err());
        assert!(parse_args(&["a=b=c".to_string()]).is_err());
        assert!(parse_args(&["=x".to_string()]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "wfs", "--paths", "current", "-e", "geojson", "--timeout", "5", "info", "http://x/",
        ]);
        let cfg = effective_config(&cli.opts).unwrap();
        assert_eq!(cfg.paths, PathConvention::Current);
        assert_eq!(cfg.encoding, "geojson");
        assert_eq!(cfg.timeout_secs, Some(5));
    }

    #[test]
    fn cli_definition_is_valid() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }
}
