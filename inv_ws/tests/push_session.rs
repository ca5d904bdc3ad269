//! Push session behaviour against a loopback WebSocket server

use std::net::SocketAddr;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use inv_http::ftx::FtxApi;
use inv_http::Actor;
use inv_http::ActorError;
use inv_http::ActorFactory;
use inv_http::ApiContext;
use inv_http::EndpointContext;
use inv_http::HttpRequest;
use inv_http::Transport;
use inv_http::TransportError;
use inv_http::TransportFuture;
use inv_ratelimit::RateLimitCache;
use inv_ratelimit::RateLimitError;
use inv_ratelimit::RateLimitRule;
use inv_ratelimit::RateLimitScope;
use inv_ratelimit::RateLimitThrottle;
use inv_ws::bitstamp;
use inv_ws::PushRouter;
use inv_ws::PushSession;
use inv_ws::SessionConfig;
use inv_ws::SessionError;
use serde_json::Value;
use tungstenite::Message;

/// Push actors never dispatch REST calls
struct PushOnlyTransport;

impl Transport for PushOnlyTransport {
    fn send(&self, _request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async { Err(TransportError::Other("push only".to_string())) })
    }
}

/// Accepts `connections` clients in turn and returns the text frames each one sent
fn serve(connections: usize) -> (SocketAddr, JoinHandle<Vec<Vec<Value>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        (0..connections)
            .map(|_| {
                let (stream, _) = listener.accept().unwrap();
                let mut websocket = tungstenite::accept(stream).unwrap();

                let mut frames: Vec<Value> = Vec::new();
                loop {
                    match websocket.read() {
                        Ok(Message::Text(text)) => frames.push(serde_json::from_str(text.as_str()).unwrap()),
                        Ok(Message::Close(_)) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                frames
            })
            .collect()
    });

    (address, server)
}

fn router() -> Arc<PushRouter<bitstamp::BitstampMessage>> {
    Arc::new(PushRouter::builder(bitstamp::descriptor_table()).build().unwrap())
}

fn push_actor(rule: &RateLimitRule, address: SocketAddr) -> (Actor, Arc<RateLimitCache>) {
    let cache = Arc::new(RateLimitCache::builder().add_rule(rule.clone()).build().unwrap());
    let factory = ActorFactory::new(RateLimitThrottle::new(Arc::clone(&cache)), Arc::new(PushOnlyTransport));
    let context = EndpointContext::websocket(&format!("ws://{address}")).unwrap();
    (factory.create(None, context), cache)
}

#[test]
fn subscriptions_beyond_connection_limit_are_denied() {
    let (address, server) = serve(2);
    let rule = RateLimitRule::new("connection_subscribe", RateLimitScope::Connection, 2, Duration::from_secs(60));
    let (actor, cache) = push_actor(&rule, address);

    let config = SessionConfig::new(actor.context().base_url().as_str())
        .subscribe(bitstamp::subscribe_frame("live_trades_btcusd"))
        .subscribe(bitstamp::subscribe_frame("live_orders_btcusd"));

    let mut session = PushSession::new(config.clone(), router()).with_actor(actor.clone(), vec![rule.quota(1)]);
    session.connect().unwrap();

    let err = session.subscribe(&bitstamp::subscribe_frame("diff_order_book_btcusd")).unwrap_err();
    assert!(matches!(err, SessionError::Admission(ActorError::Quota(RateLimitError::QuotaExceeded { .. }))));

    let connection_id = session.connection_actor().and_then(|actor| actor.scope().connection().cloned()).unwrap();
    assert_eq!(cache.available("connection_subscribe", &connection_id), Some(0));
    session.close();

    // A new connection starts with its own allowance
    let mut session = PushSession::new(config, router()).with_actor(actor, vec![rule.quota(1)]);
    session.connect().unwrap();
    session.subscribe(&bitstamp::subscribe_frame("diff_order_book_btcusd")).unwrap();
    assert!(session.subscribe(&bitstamp::subscribe_frame("live_trades_ethusd")).is_err());
    session.close();

    let frames = server.join().unwrap();
    assert_eq!(frames[0].len(), 2);
    assert_eq!(frames[1].len(), 3);
    assert_eq!(frames[1][2], bitstamp::subscribe_frame("diff_order_book_btcusd"));
}

#[test]
fn ftx_market_push_actor_charges_subscribe_rule() {
    let (address, server) = serve(1);
    let context = ApiContext::new(
        EndpointContext::rest("https://ftx.com").unwrap(),
        Some(EndpointContext::websocket(&format!("ws://{address}")).unwrap()),
    );
    let api = FtxApi::from_context(context, Arc::new(PushOnlyTransport), None).unwrap();
    let market = api.ws().unwrap().market();

    let config = SessionConfig::new(market.actor().context().base_url().as_str()).subscribe(market.subscribe_frame("trades", "BTC-PERP"));
    let mut session = PushSession::new(config, router()).with_actor(market.actor().clone(), market.subscribe_quotas());
    session.connect().unwrap();

    for market_name in ["ETH-PERP", "SOL-PERP", "BTC-0325", "ETH-0325", "FTT-PERP", "BNB-PERP", "XRP-PERP", "DOGE-PERP", "LTC-PERP"] {
        session.subscribe(&market.subscribe_frame("trades", market_name)).unwrap();
    }
    let err = session.subscribe(&market.subscribe_frame("trades", "ADA-PERP")).unwrap_err();
    assert!(matches!(err, SessionError::Admission(ref err) if err.is_quota_exceeded()));
    session.close();

    let frames = server.join().unwrap();
    assert_eq!(frames[0].len(), 10);
    assert_eq!(frames[0][0], serde_json::json!({"op": "subscribe", "channel": "trades", "market": "BTC-PERP"}));
}

#[test]
fn stop_before_run_is_honoured() {
    let (address, server) = serve(1);

    let mut session = PushSession::new(SessionConfig::new(format!("ws://{address}")), router());
    session.connect().unwrap();
    assert!(session.running().load(Ordering::Relaxed));

    // Same as a Ctrl-C handler clearing the shared flag
    session.running().store(false, Ordering::Relaxed);
    session.run().unwrap();

    assert_eq!(session.frames_received(), 0);
    session.close();
    assert!(server.join().unwrap()[0].is_empty());
}
