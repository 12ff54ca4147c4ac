use crate::cli::args::{CliArgs, Command};
use crate::output::OutputFormat;

/// Flag-level checks. Port and timeout ranges are checked once the config
/// file has been merged in.
pub fn validate(args: &CliArgs) -> Result<(), String> {
    match &args.command {
        Command::Serve(serve) => {
            validate_url("--proxy-url", serve.proxy_url.as_deref())?;
            validate_url("--api-root", serve.api_root.as_deref())?;
        }
        Command::Show(show) => {
            validate_url("--proxy-url", show.proxy_url.as_deref())?;
            if let Some(raw) = show.format.as_deref() {
                OutputFormat::parse(raw).ok_or_else(|| {
                    format!("invalid --format '{raw}', expected text, json or html")
                })?;
            }
            if show.offline && show.proxy_url.is_some() {
                return Err("use either --offline or --proxy-url, not both".to_string());
            }
        }
        Command::InitConfig => {}
    }
    Ok(())
}

fn validate_url(flag: &str, raw: Option<&str>) -> Result<(), String> {
    if let Some(raw) = raw {
        reqwest::Url::parse(raw).map_err(|e| format!("invalid {flag} '{raw}': {e}"))?;
    }
    Ok(())
}
