//! GIOP frame dump - logs one line per frame of a captured or live stream
//!
//! Usage:
//!   giop-dump capture.bin
//!   giop-dump --config orb.toml --json-logs capture.bin
//!   giop-dump --connect 127.0.0.1:2809

use anyhow::{bail, Context, Result};
use clap::Parser;
use giop_codec::{
    CancelRequestMessage, ControlMessage, FragmentMessage, LocateReplyMessage,
    LocateRequestMessage, MessageHandler, ReplyMessage, RequestMessage,
};
use giop_config::{init_tracing, LogFormat, OrbConfig};
use giop_network::{FrameError, FrameReader, MemoryTransport, TcpTransport, Transport};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "giop-dump")]
#[command(about = "Decode GIOP frames and log one line per frame")]
#[command(version)]
struct Args {
    /// Captured byte stream to decode
    #[arg(required_unless_present = "connect")]
    capture: Option<PathBuf>,

    /// Read from a live TCP peer instead of a capture file
    #[arg(long, conflicts_with = "capture")]
    connect: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    /// Recognize the java serialization marker in version bytes
    #[arg(long)]
    java_serialization: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => OrbConfig::load(path)?,
        None => OrbConfig::default(),
    };
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = LogFormat::Json;
    }
    if args.java_serialization {
        config.giop.java_serialization = true;
    }
    init_tracing(&config.logging)?;

    match (&args.capture, &args.connect) {
        (_, Some(addr)) => {
            let transport = TcpTransport::connect(addr.as_str())
                .with_context(|| format!("Failed to connect to {addr}"))?;
            info!(peer = %addr, "Dumping live stream");
            dump(FrameReader::new(transport, &config), |_| false)
        }
        (Some(path), None) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read capture {}", path.display()))?;
            info!(capture = %path.display(), bytes = bytes.len(), "Dumping capture");
            let reader = FrameReader::new(MemoryTransport::closed(bytes), &config);
            dump(reader, |transport: &MemoryTransport| transport.remaining() == 0)
        }
        (None, None) => bail!("either a capture file or --connect is required"),
    }
}

/// Read frames until the stream ends cleanly or a fatal error occurs
fn dump<T: Transport>(mut reader: FrameReader<T>, exhausted: impl Fn(&T) -> bool) -> Result<()> {
    let mut frames = 0u64;
    loop {
        if exhausted(reader.transport()) {
            break;
        }
        match reader.read_message() {
            Ok(message) => {
                frames += 1;
                let detail = message.dispatch(&mut FrameSummary);
                info!(
                    frame = frames,
                    version = %message.version(),
                    message_type = message.message_type().name(),
                    size = message.header().message_size,
                    little_endian = message.header().is_little_endian(),
                    more_fragments = message.more_fragments(),
                    incomplete = message.is_incomplete(),
                    "{detail}"
                );
            }
            Err(err @ FrameError::Body { .. }) => {
                frames += 1;
                warn!(frame = frames, error = %err, "Undecodable body");
            }
            Err(FrameError::ConnectionClosed { .. }) => {
                info!(frames, "Peer closed the stream");
                break;
            }
            Err(err) => {
                error!(frames, error = %err, "Fatal framing error");
                return Err(err.into());
            }
        }
    }
    info!(frames, "Dump complete");
    Ok(())
}

/// One-line description of each message kind
struct FrameSummary;

impl MessageHandler for FrameSummary {
    type Output = String;

    fn handle_request(&mut self, m: &RequestMessage) -> String {
        let key = m
            .object_key()
            .map(|key| key.to_string())
            .unwrap_or_else(|| format!("{}", m.target.disposition()));
        format!(
            "Request id={} op={} target={} response_expected={} args={}B",
            m.request_id,
            m.operation,
            key,
            m.is_response_expected(),
            m.body.len()
        )
    }

    fn handle_reply(&mut self, m: &ReplyMessage) -> String {
        match m.exception_id() {
            Some(id) => format!("Reply id={} status={} exception={}", m.request_id, m.reply_status(), id),
            None => format!(
                "Reply id={} status={} result={}B",
                m.request_id,
                m.reply_status(),
                m.body.len()
            ),
        }
    }

    fn handle_cancel_request(&mut self, m: &CancelRequestMessage) -> String {
        format!("CancelRequest id={}", m.request_id)
    }

    fn handle_locate_request(&mut self, m: &LocateRequestMessage) -> String {
        format!("LocateRequest id={} target={}", m.request_id, m.target.disposition())
    }

    fn handle_locate_reply(&mut self, m: &LocateReplyMessage) -> String {
        format!("LocateReply id={} status={}", m.request_id, m.locate_status())
    }

    fn handle_close_connection(&mut self, _m: &ControlMessage) -> String {
        "CloseConnection".to_string()
    }

    fn handle_message_error(&mut self, _m: &ControlMessage) -> String {
        "MessageError".to_string()
    }

    fn handle_fragment(&mut self, m: &FragmentMessage) -> String {
        format!(
            "Fragment id={} payload={} head={}",
            m.request_id(),
            m.payload.len(),
            hex::encode(&m.payload[..m.payload.len().min(16)])
        )
    }
}
