//! Interactive editing of the client config.

use std::io::{BufRead, Write};
use std::path::Path;

use super::{valid_min_distance, ClientConfig, ClientError};

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    current: &str,
) -> Result<Option<String>, ClientError> {
    write!(output, "{} [{}]: ", label, current)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let line = line.trim();
    Ok((!line.is_empty()).then(|| line.to_string()))
}

/// Asks for server URL, interval and minimum distance. Empty answers keep
/// the current value.
pub fn prompt_config<R: BufRead, W: Write>(
    config: &mut ClientConfig,
    mut input: R,
    mut output: W,
) -> Result<(), ClientError> {
    if let Some(url) = prompt(&mut input, &mut output, "Enter server URL", &config.server_url)? {
        config.server_url = url;
    }

    let interval = config.update_interval.to_string();
    if let Some(raw) = prompt(
        &mut input,
        &mut output,
        "Enter update interval in seconds",
        &interval,
    )? {
        config.update_interval = match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => return Err(ClientError::Input(format!("not a positive interval: {}", raw))),
        };
    }

    let distance = config.min_distance.to_string();
    if let Some(raw) = prompt(
        &mut input,
        &mut output,
        "Enter minimum distance for updates in meters",
        &distance,
    )? {
        config.min_distance = match raw.parse::<f64>() {
            Ok(m) if valid_min_distance(m) => m,
            _ => return Err(ClientError::Input(format!("not a distance: {}", raw))),
        };
    }

    Ok(())
}

/// Prompts on stdin and saves the result to `path`.
pub fn run_setup(path: &Path) -> Result<(), ClientError> {
    let mut config = ClientConfig::load(path);
    let stdin = std::io::stdin();
    prompt_config(&mut config, stdin.lock(), std::io::stdout())?;
    config.save(path)?;
    Ok(())
}
