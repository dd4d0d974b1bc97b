use anyhow::{anyhow, bail, Context};
use veritext_lib::init_logging;
use veritext_lib::models::{ContentKind, DetectorStatus};
use veritext_lib::services::{
    get_api_key, ConfigStore, DetectorSession, MediaPayload, VerificationClient,
};

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn usage() {
    eprintln!(
        "Usage:\n  veritext-scan <text|image|video> <input> [--model <name>] [--timeout <secs>] [--config <dir>]\n\nNotes:\n  - For `text`, <input> is a path to a UTF-8 file, or `-` to read stdin.\n  - For `image`/`video`, <input> is a media file path or a `data:` URL.\n  - The API key is read from VERITEXT_API_KEY, GEMINI_API_KEY, API_KEY or the config file."
    );
}

fn read_text_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        return std::io::read_to_string(std::io::stdin()).context("read stdin failed");
    }
    std::fs::read_to_string(input).with_context(|| format!("read {} failed", input))
}

fn read_media_input(input: &str) -> anyhow::Result<MediaPayload> {
    if input.starts_with("data:") {
        return MediaPayload::from_data_url(input).map_err(|e| anyhow!(e));
    }
    MediaPayload::from_path(input).with_context(|| format!("read {} failed", input))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage();
        return Ok(());
    }

    init_logging();

    let kind: ContentKind = args[1].parse().map_err(|e: String| anyhow!(e))?;
    let input = args[2].as_str();

    let store = match parse_arg_value(&args, "--config") {
        Some(dir) => ConfigStore::new(dir.into()),
        None => ConfigStore::new(
            ConfigStore::default_config_dir().context("no config directory on this platform")?,
        ),
    };
    let mut config = store.load().map_err(|e| anyhow!(e))?;
    config.apply_env_overrides();
    if let Some(model) = parse_arg_value(&args, "--model") {
        config.model = model;
    }
    if let Some(timeout) = parse_arg_value(&args, "--timeout") {
        config.timeout_secs = timeout.parse().context("--timeout must be whole seconds")?;
    }

    let api_key = get_api_key(Some(&store)).context("API key not configured")?;
    let client = VerificationClient::gemini(api_key, &config)?;

    let mut session = DetectorSession::new(config.min_text_chars);
    session.set_kind(kind);
    match kind {
        ContentKind::Text => session.set_text(read_text_input(input)?),
        ContentKind::Image | ContentKind::Video => {
            session.set_media(Some(read_media_input(input)?))
        }
    }

    println!("Kind: {}", kind);
    println!("Input: {}", session.input_summary());
    println!("Model: {}", client.model());

    if let Err(e) = session.build_request() {
        bail!("{}", e);
    }

    match session.analyze(&client).await {
        Ok(result) => {
            println!("Band: {}", result.band().label());
            println!();
        }
        Err(e) => bail!("{}", e),
    }

    if session.status() == DetectorStatus::Success {
        if let Some(report) = session.report() {
            println!("{}", report);
        }
    }

    Ok(())
}
