//! `serve` subcommand — run the update-ingestion-and-render loop.

use std::path::Path;

use ledserver_lib::LedserverError;
use ledserver_lib::config::{Config, Transport};
use ledserver_lib::lifecycle::ShutdownFlag;
use ledserver_lib::render::{RenderGate, RenderMode};
use ledserver_lib::server;
use ledserver_lib::strip::{self, FrameBuffer, StripDriver};
use ledserver_lib::transport::{DatagramSource, UdpSource};

use super::Result;

/// Flag overrides for the `serve` subcommand; unset flags fall back to the
/// config file.
pub(super) struct ServeArgs {
    pub listen: Option<String>,
    pub transport: Option<String>,
    pub strip_length: Option<usize>,
    pub render_mode: Option<String>,
    pub render_rate: Option<u32>,
}

/// Log-only strip driver.
///
/// The real DMA/PWM driver is an external collaborator; this one makes the
/// server runnable (and observable) without hardware.
struct ConsoleStrip {
    released: bool,
}

impl StripDriver for ConsoleStrip {
    fn init() -> strip::Result<Self> {
        Ok(ConsoleStrip { released: false })
    }

    fn render(&mut self, frame: &FrameBuffer) -> strip::Result<()> {
        let lit = frame.pixels().iter().filter(|&&c| c != 0).count();
        log::debug!("[strip] render: {lit}/{} pixels lit", frame.len());
        Ok(())
    }

    fn finish(&mut self) {
        if !self.released {
            log::debug!("[strip] released");
            self.released = true;
        }
    }
}

fn apply_overrides(config: &mut Config, args: &ServeArgs) -> Result<()> {
    if let Some(listen) = &args.listen {
        config.listen = listen.clone();
    }
    if let Some(transport) = &args.transport {
        config.transport = transport.parse().map_err(LedserverError::Config)?;
    }
    if let Some(len) = args.strip_length {
        config.strip_length = len;
    }
    if let Some(mode) = &args.render_mode {
        config.render_mode = mode.parse().map_err(LedserverError::Config)?;
    }
    if let Some(rate) = args.render_rate {
        config.render_rate = rate;
    }
    Ok(())
}

fn open_source(config: &Config, gate: &RenderGate) -> Result<Box<dyn DatagramSource>> {
    match config.transport {
        Transport::Udp => Ok(Box::new(UdpSource::bind(
            &config.listen,
            gate.poll_interval(),
        )?)),
        #[cfg(feature = "pubsub")]
        Transport::PubSub => Ok(Box::new(ledserver_lib::transport::ZmqSource::bind(
            &config.listen,
            gate.poll_interval(),
        )?)),
        #[cfg(not(feature = "pubsub"))]
        Transport::PubSub => Err(LedserverError::Config(
            "this build has no pub/sub transport (rebuild with --features pubsub)".into(),
        )),
    }
}

pub(super) fn cmd_serve(args: &ServeArgs, config_path: Option<&Path>, json: bool) -> Result<()> {
    let mut config = super::load_config(config_path);
    apply_overrides(&mut config, args)?;
    config.validate().map_err(LedserverError::Config)?;

    // Fatal startup errors surface here, before the loop starts.
    let mut gate = RenderGate::new(config.render_mode, config.render_rate);
    let mut source = open_source(&config, &gate)?;
    let mut driver = ConsoleStrip::init()?;
    let mut frame = FrameBuffer::new(config.strip_length);

    let flag = ShutdownFlag::new();
    {
        let f = flag.clone();
        // The handler only stores into the atomic; cleanup happens on the
        // main thread once the loop observes the flag.
        if let Err(e) = ctrlc::set_handler(move || f.request_stop()) {
            log::warn!("could not install signal handler: {e}");
        }
    }

    println!("[listen] {} ({})", source.endpoint(), config.transport);
    println!("[strip]  {} pixels", config.strip_length);
    match config.render_mode {
        RenderMode::MessageTriggered => println!("[render] on message request"),
        RenderMode::Periodic => println!("[render] {}/s", config.render_rate),
    }
    println!("Press Ctrl+C to stop (clears the strip on exit).");
    println!();

    let stats = server::serve(&mut frame, source.as_mut(), &mut driver, &mut gate, &flag);
    // The strip is dark and released; only now may the socket close.
    drop(source);

    println!();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats).unwrap());
    } else {
        println!("{stats}");
    }
    Ok(())
}
