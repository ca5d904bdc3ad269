use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Context;
use crossbeam_channel::bounded;
use crossbeam_channel::select;
use inv_app::cli;
use inv_app::config_loader;
use inv_app::config_loader::VenueConfigFile;
use inv_app::tracing_setup;
use inv_app::tracing_setup::LogOptions;
use inv_http::ReqwestTransport;
use inv_ws::bitstamp;
use inv_ws::bitstamp::BitstampMessage;
use inv_ws::PushFailure;
use inv_ws::PushRouter;
use inv_ws::PushSession;
use inv_ws::SessionConfig;
use tracing::debug;
use tracing::info;
use tracing::warn;

const MESSAGE_CHANNEL_CAPACITY: usize = 10_000;
const FAILURE_CHANNEL_CAPACITY: usize = 1_000;

fn log_message(message: &BitstampMessage) {
    match message {
        BitstampMessage::RequestConfirmation(confirmation) => info!("{} {}", confirmation.event, confirmation.channel),
        BitstampMessage::Trade(trade) => {
            let side = if trade.data.side == 0 { "buy" } else { "sell" };
            info!("{} {} {} @ {}", trade.channel, side, trade.data.amount_str, trade.data.price_str);
        }
        BitstampMessage::Order(order) => {
            info!("{} {} #{} {} @ {}", order.channel, order.event, order.data.id, order.data.amount_str, order.data.price_str)
        }
        BitstampMessage::OrderBookDiff(diff) => {
            debug!("{} {} bids, {} asks", diff.channel, diff.data.bids.len(), diff.data.asks.len())
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Keep guard alive for entire application lifetime
    let _guard = tracing_setup::init("inv_feed", &LogOptions::default());

    let config_path = cli::arg_or(1, "config/bitstamp.toml");
    let venue = config_loader::load_venue_config_or(&config_path, VenueConfigFile::bitstamp);

    let push = venue.push.clone().context("venue config has no push section")?;
    let table = venue.descriptor_table(bitstamp::decoder_for_shape)?;

    // An explicit pair subscribes every configured channel for it
    let subscriptions = match cli::arg(2) {
        Some(pair) => push.channels.iter().map(|channel| format!("{}{}", channel.prefix, pair.to_lowercase())).collect(),
        None => push.subscriptions.clone(),
    };

    let (messages_tx, messages_rx) = bounded::<BitstampMessage>(MESSAGE_CHANNEL_CAPACITY);
    let (failures_tx, failures_rx) = bounded::<PushFailure>(FAILURE_CHANNEL_CAPACITY);

    let mut builder = PushRouter::builder(table).on_confirmation(messages_tx.clone()).on_rejection(failures_tx);
    for channel in &push.channels {
        builder = builder.on_channel(channel.name.as_str(), messages_tx.clone());
    }
    drop(messages_tx);
    let router = Arc::new(builder.build()?);

    let mut session_config = SessionConfig::new(venue.websocket_url()?);
    for channel in &subscriptions {
        session_config = session_config.subscribe(bitstamp::subscribe_frame(channel));
    }

    // Subscriptions are charged to the venue's connection scoped rules
    let factory = venue.actor_factory(Arc::new(ReqwestTransport::new()?))?;
    let actor = factory.create(None, venue.websocket_context()?);

    let mut session = PushSession::new(session_config, Arc::clone(&router)).with_actor(actor, venue.subscription_quotas()?);
    session.connect()?;
    info!("Subscribed to {}", subscriptions.join(", "));

    let running = session.running();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received");
        running.store(false, Ordering::Relaxed);
    })?;

    let consumer = std::thread::spawn(move || {
        loop {
            select! {
                recv(messages_rx) -> message => match message {
                    Ok(message) => log_message(&message),
                    Err(_) => break,
                },
                recv(failures_rx) -> failure => {
                    if let Ok(failure) = failure {
                        debug!("Unhandled push frame: {failure:?}");
                    }
                }
            }
        }
    });

    if let Err(err) = session.run() {
        warn!("Push session ended with error: {err}");
    }
    session.close();

    let stats = router.stats();
    info!(
        "Frames: {}, routed: {}, rejected: {}, failed: {}, dropped: {}",
        session.frames_received(),
        stats.routed,
        stats.rejected,
        stats.failed,
        stats.dropped
    );

    drop(session);
    drop(router);
    let _ = consumer.join();

    Ok(())
}
