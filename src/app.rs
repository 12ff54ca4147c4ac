use std::path::PathBuf;

use clap::{error::ErrorKind, Parser};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{CliArgs, Command, ServeArgs, ShowArgs};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::directory::{DirectoryView, LoadOutcome};
use crate::output::{self, OutputFormat};
use crate::proxy::{self, SettingsSource};
use crate::server::{self, ServerOptions};

const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8888;
const DEFAULT_TIMEOUT: u64 = 10;

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "company_directory=info,tower_http=info",
        1 => "company_directory=debug,tower_http=debug",
        _ => "company_directory=trace,tower_http=trace",
    }
}

fn init_tracing(verbose: u8, color: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(color)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Clone, Debug)]
struct ShowConfig {
    proxy_url: Option<String>,
    search: String,
    timeout: u64,
    output: Option<String>,
    format: OutputFormat,
    color: bool,
}

#[derive(Clone, Debug)]
enum RunPlan {
    Serve(ServerOptions),
    Show(ShowConfig),
    InitConfig(PathBuf),
}

fn local_proxy_url(port: u16) -> String {
    format!("http://{}:{}{}", DEFAULT_BIND, port, proxy::ROUTE)
}

fn check_port(port: u16) -> Result<u16, String> {
    if port == 0 {
        return Err("invalid port, expected 1-65535".to_string());
    }
    Ok(port)
}

fn check_timeout(timeout: u64) -> Result<u64, String> {
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    Ok(timeout)
}

fn build_serve_options(args: ServeArgs, cfg: &ConfigFile) -> Result<ServerOptions, String> {
    let bind = args
        .bind
        .or_else(|| cfg.bind.clone())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let port = check_port(args.port.or(cfg.port).unwrap_or(DEFAULT_PORT))?;
    let timeout = check_timeout(args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT))?;
    let api_root = args
        .api_root
        .or_else(|| cfg.api_root.clone())
        .unwrap_or_else(|| proxy::DEFAULT_API_ROOT.to_string());
    reqwest::Url::parse(&api_root).map_err(|e| format!("invalid api_root '{api_root}': {e}"))?;
    let proxy_url = args.proxy_url.or_else(|| cfg.proxy_url.clone());

    Ok(ServerOptions {
        bind,
        port,
        proxy_url,
        api_root,
        timeout_seconds: timeout,
        settings: SettingsSource::Environment,
    })
}

fn build_show_config(
    args: ShowArgs,
    cfg: &ConfigFile,
    no_color: bool,
) -> Result<ShowConfig, String> {
    let timeout = check_timeout(args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT))?;
    let proxy_url = if args.offline {
        None
    } else {
        Some(
            args.proxy_url
                .or_else(|| cfg.proxy_url.clone())
                .unwrap_or_else(|| local_proxy_url(cfg.port.unwrap_or(DEFAULT_PORT))),
        )
    };

    let output = args
        .output
        .or_else(|| cfg.output.clone())
        .map(|p| config::expand_tilde_string(&p));
    let format = match args.format.or_else(|| cfg.output_format.clone()) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };
    let color = output.is_none() && !(no_color || cfg.no_color.unwrap_or(false));

    Ok(ShowConfig {
        proxy_url,
        search: args.search.unwrap_or_default(),
        timeout,
        output,
        format,
        color,
    })
}

fn build_run_plan(
    args: CliArgs,
    cfg: ConfigFile,
    config_path: Option<PathBuf>,
) -> Result<RunPlan, String> {
    validation::validate(&args)?;

    match args.command {
        Command::Serve(serve) => Ok(RunPlan::Serve(build_serve_options(serve, &cfg)?)),
        Command::Show(show) => Ok(RunPlan::Show(build_show_config(show, &cfg, args.no_color)?)),
        Command::InitConfig => {
            let path = config_path
                .ok_or_else(|| "could not determine a config path, pass --config".to_string())?;
            Ok(RunPlan::InitConfig(path))
        }
    }
}

async fn run_show(show: ShowConfig) -> Result<(), String> {
    let mut view = DirectoryView::default();
    if let Some(url) = show.proxy_url.as_deref() {
        let client = server::build_http_client(show.timeout).map_err(|e| e.to_string())?;
        if let LoadOutcome::Failed { error } = view.load_live(&client, url).await {
            tracing::info!(%error, "showing placeholder data");
        }
    }
    view.filter(&show.search);

    let rendered = output::render(show.format, view.rendered(), &show.search, show.color);
    match show.output.as_ref() {
        Some(path) => {
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .await
                .map_err(|e| format!("failed to open output file '{path}': {e}"))?;
            outfile
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output file '{path}': {e}"))?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
        }
    }
    Ok(())
}

async fn run_async(plan: RunPlan) -> Result<(), String> {
    match plan {
        RunPlan::Serve(options) => {
            format_kv_line("Listen", &format!("{}:{}", options.bind, options.port));
            format_kv_line("Upstream", &options.api_root);
            format_kv_line(
                "Live data",
                options.proxy_url.as_deref().unwrap_or(proxy::ROUTE),
            );
            println!();
            server::serve(options).await.map_err(|e| e.to_string())
        }
        RunPlan::Show(show) => run_show(show).await,
        RunPlan::InitConfig(path) => {
            if config::ensure_default_config_file(&path)? {
                format_kv_line("Created", &path.display().to_string());
            } else {
                format_kv_line("Exists", &path.display().to_string());
            }
            Ok(())
        }
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let _ = dotenvy::dotenv();

    let user_config_path = args.config.as_deref().map(config::expand_tilde);
    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };
    let config_path = user_config_path.or_else(config::default_config_path);

    let color = !(args.no_color || cfg.no_color.unwrap_or(false));
    if !color {
        colored::control::set_override(false);
    }
    init_tracing(args.verbose, color);

    let plan = build_run_plan(args, cfg, config_path)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(plan))
}
