// src/bin/kinetoscope-emulator.rs

use anyhow::Result;
use clap::{Parser, Subcommand};

use kinetoscope::config::Config;
use kinetoscope::fetch::ReqwestRangeFetcher;
use kinetoscope::sram::EmulatedSram;
use kinetoscope::streamer::{Command, StreamerContext};
use kinetoscope::transport::MemoryMappedTransport;

/// Drive a single command through the streamer state machine against a real
/// download server, the way the cartridge's console half would over the
/// memory-mapped port.
///
/// One process stands in for both halves of the port: `Params` plays the
/// console by writing COMMAND/ARG and setting CMD_TOKEN, then the streamer
/// loop below reads that token, dispatches, and reports back.
#[derive(Parser, Debug)]
#[command(name = "kinetoscope-emulator")]
#[command(about = "Issue one streamer command against a video download server")]
struct Params {
    /// Download server host.
    #[arg(long, default_value = "storage.googleapis.com")]
    host: String,

    /// Download server port.
    #[arg(long, default_value_t = 80)]
    port: u16,

    /// Catalog path, relative to the server root.
    #[arg(long, default_value = "catalog.bin")]
    catalog_path: String,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// ECHO: round-trip a 16-bit argument through SRAM bank 0.
    Echo { value: u16 },
    /// LIST_VIDEOS: fetch the catalog into SRAM bank 0.
    ListVideos,
    /// START_VIDEO: begin streaming catalog entry `index`.
    StartVideo { index: u16 },
    /// STOP_VIDEO: cancel the current stream.
    StopVideo,
    /// FLIP_REGION: advance to the next chunk.
    FlipRegion,
    /// GET_ERROR: read back the streamer's sticky error message.
    GetError,
    /// CONNECT_NET: probe connectivity to the download server.
    ConnectNet,
    /// MARCH_TEST: fill an SRAM bank with a diagnostic pattern.
    MarchTest { pass: u16 },
}

impl CliCommand {
    fn command(&self) -> Command {
        match self {
            CliCommand::Echo { .. } => Command::Echo,
            CliCommand::ListVideos => Command::ListVideos,
            CliCommand::StartVideo { .. } => Command::StartVideo,
            CliCommand::StopVideo => Command::StopVideo,
            CliCommand::FlipRegion => Command::FlipRegion,
            CliCommand::GetError => Command::GetError,
            CliCommand::ConnectNet => Command::ConnectNet,
            CliCommand::MarchTest { .. } => Command::MarchTest,
        }
    }

    fn arg(&self) -> u16 {
        match self {
            CliCommand::Echo { value } => *value,
            CliCommand::StartVideo { index } => *index,
            CliCommand::MarchTest { pass } => *pass,
            CliCommand::ListVideos
            | CliCommand::StopVideo
            | CliCommand::FlipRegion
            | CliCommand::GetError
            | CliCommand::ConnectNet => 0,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    kinetoscope::init_logging();

    let params = Params::parse();
    let config = Config {
        server_host: params.host,
        server_port: params.port,
        catalog_path: params.catalog_path,
        ..Config::default()
    };

    let mut transport = MemoryMappedTransport::new();
    let mut context = StreamerContext::new(EmulatedSram::new(), ReqwestRangeFetcher::new(), config);

    // Console side: issue the command over the port.
    transport.write_command(params.command.command().code());
    transport.write_arg(params.command.arg());
    transport.set_cmd_token();

    // Streamer side: observe the token and dispatch.
    if transport.read_cmd_token() {
        transport.clear_cmd_token();
        context.dispatch(transport.read_command(), transport.read_arg()).await;
        if context.has_error() {
            transport.set_err_token();
        }
    }

    if transport.read_err_token() {
        eprintln!("error: {}", context.current_error().unwrap_or("<no message>"));
        transport.clear_err_token();
        std::process::exit(1);
    }

    context.with_sram(|sram| {
        let bank0 = sram.cursor();
        println!("dispatch complete; bank 0 cursor at {bank0} bytes");
    });

    if let Some(video) = context.video_state() {
        println!(
            "playing {} ({}/{} chunks fetched)",
            video.video_url, video.next_chunk, video.total_chunks
        );
    }

    Ok(())
}
