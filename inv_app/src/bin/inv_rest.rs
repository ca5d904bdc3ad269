use std::sync::Arc;

use inv_app::cli;
use inv_app::config_loader;
use inv_app::config_loader::VenueConfigFile;
use inv_app::tracing_setup;
use inv_app::tracing_setup::LogOptions;
use inv_http::RequestDescriptor;
use inv_http::ReqwestTransport;
use inv_security::ApiKey;
use tracing::info;

/// Usage: inv_rest [path] [config] [--signed]
///
/// `--signed` reads `INV_API_KEY` / `INV_API_SECRET` (or a `.env` file) and
/// signs the request with the venue's scheme.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = tracing_setup::init("inv_rest", &LogOptions::default());

    let path = cli::arg_or(1, "/api/markets");
    let config_path = cli::arg_or(2, "config/ftx.toml");
    let signed = cli::has_flag("--signed");

    let venue = config_loader::load_venue_config_or(&config_path, VenueConfigFile::ftx);

    let factory = venue.actor_factory(Arc::new(ReqwestTransport::new()?))?;

    let api_key = if signed { Some(ApiKey::from_env("INV_API_KEY", "INV_API_SECRET")?) } else { None };
    let actor = factory.create(api_key, venue.rest_context()?);

    let mut request = RequestDescriptor::get(path.as_str()).quotas(venue.public_quotas()?);
    if signed {
        request = request.signed();
    }

    info!("GET {} on {} (signed: {})", path, venue.rest_url, actor.is_authenticated());
    let response = actor.execute(&request).await?;
    println!("{}", response.body);

    Ok(())
}
