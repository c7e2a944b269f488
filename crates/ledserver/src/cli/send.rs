//! `send` subcommand — one-shot test client for a running server.

use std::net::UdpSocket;

use ledserver_lib::LedserverError;
use ledserver_lib::color;
use ledserver_lib::wire::{self, Update};

use super::Result;

pub(super) fn cmd_send(to: &str, index: u32, color: &str, render: bool, repeat: u32) -> Result<()> {
    let color = color::parse_color(color)?;
    let payload = wire::encode(&Update {
        index,
        color,
        render,
    });

    if to.starts_with("tcp://") {
        return send_pubsub(to, &payload, repeat);
    }

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    for _ in 0..repeat {
        socket.send_to(&payload, to)?;
    }
    println!(
        "sent {repeat} update(s) to {to}: index {index} -> {} (render: {render})",
        color::format_color(color)
    );
    Ok(())
}

#[cfg(feature = "pubsub")]
fn send_pubsub(to: &str, payload: &[u8], repeat: u32) -> Result<()> {
    let ctx = zmq::Context::new();
    let socket = ctx
        .socket(zmq::PUB)
        .map_err(|e| LedserverError::Config(format!("zmq socket: {e}")))?;
    socket
        .connect(to)
        .map_err(|e| LedserverError::Config(format!("zmq connect {to}: {e}")))?;
    // A fresh PUB socket drops messages sent before the subscription
    // handshake completes; give it a moment.
    std::thread::sleep(std::time::Duration::from_millis(100));
    for _ in 0..repeat {
        socket
            .send(payload, 0)
            .map_err(|e| LedserverError::Config(format!("zmq send: {e}")))?;
    }
    println!("sent {repeat} update(s) to {to}");
    Ok(())
}

#[cfg(not(feature = "pubsub"))]
fn send_pubsub(_to: &str, _payload: &[u8], _repeat: u32) -> Result<()> {
    Err(LedserverError::Config(
        "this build has no pub/sub transport (rebuild with --features pubsub)".into(),
    ))
}
