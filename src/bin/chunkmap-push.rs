#![warn(clippy::all, rust_2018_idioms)]

use chunkmap::chunk::{GradientChunk, SolidChunk};
use chunkmap::uploader::Uploader;
use clap::Parser;

/// Push a synthetic chunk to a chunkmap server, for exercising the ingest
/// path without a real world behind it.
#[derive(Parser, Debug)]
#[command(name = "chunkmap-push")]
struct Args {
    /// Server host name
    #[arg(long)]
    host: String,
    /// Server port
    #[arg(long, default_value_t = 80)]
    port: u16,
    /// Chunk x coordinate
    #[arg(long, allow_negative_numbers = true)]
    x: i32,
    /// Chunk z coordinate
    #[arg(long, allow_negative_numbers = true)]
    z: i32,
    /// Fill color as R,G,B
    #[arg(long, value_parser = parse_color, default_value = "255,0,0", conflicts_with = "gradient")]
    color: [u8; 3],
    /// Fill with a coordinate-derived gradient instead of a solid color
    #[arg(long)]
    gradient: bool,
}

fn parse_color(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected R,G,B, got {:?}", s));
    }
    let mut color = [0u8; 3];
    for (channel, part) in color.iter_mut().zip(&parts) {
        *channel = part
            .trim()
            .parse()
            .map_err(|e| format!("invalid channel {:?}: {}", part, e))?;
    }
    Ok(color)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).
    let args = Args::parse();

    let uploader = Uploader::with_port(&args.host, args.port);
    if !uploader.check_reachable().await {
        log::warn!(
            "{}:{} did not answer a probe, attempting the upload anyway",
            args.host,
            args.port
        );
    }

    let handle = if args.gradient {
        uploader.send_chunk_data(GradientChunk::new(args.x, args.z))
    } else {
        uploader.send_chunk_data(SolidChunk::new(args.x, args.z, args.color))
    };
    handle.await??;

    println!("Uploaded chunk ({}, {})", args.x, args.z);
    Ok(())
}
