#![allow(clippy::expect_used, clippy::panic)]

//! Dump the index of a game directory.
//!
//! Usage:
//!   cargo run --example dump_index -p scumm-resource -- <game dir> <game name> <version>
//!
//! Set `RUST_LOG=scumm_resource=debug` to follow the block parsing.

use scumm_formats::FormatProfile;
use scumm_resource::{DirectoryProvider, ResourceConfig, ResourceManager, ResourceType};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(dir), Some(game)) = (args.next(), args.next()) else {
        panic!("usage: dump_index <game dir> <game name> [version]");
    };
    let version: u8 = args
        .next()
        .map_or(6, |v| v.parse().expect("version is a number"));

    let profile = FormatProfile::new(version);
    let mut manager = ResourceManager::new(
        Box::new(DirectoryProvider::new(&dir)),
        profile,
        ResourceConfig::new(game),
    )
    .expect("valid configuration");

    let index = manager.read_index().expect("failed to read index");
    println!("Read {} index blocks from {dir}", index.blocks_read);
    println!(
        "Objects: {}, arrays: {}, audio names: {}\n",
        index.objects.len(),
        index.arrays.len(),
        index.audio_names.len()
    );

    for ty in ResourceType::ALL {
        let Some(table) = manager.table().table(ty) else {
            continue;
        };
        let absent = table.entries.iter().filter(|e| e.is_absent()).count();
        println!(
            "{:<12} tag={} count={:>5} mode={:?} absent={}",
            ty.name(),
            table.tag,
            table.slots.len(),
            table.mode,
            absent
        );
    }

    let rooms = manager.table().num(ResourceType::Room);
    println!("\n=== Rooms ===");
    for room in 1..rooms {
        match manager.get_address(ResourceType::Room, room) {
            Ok(Some(block)) => println!("room {room:>3}: {} bytes", block.len()),
            Ok(None) => println!("room {room:>3}: absent"),
            Err(e) => println!("room {room:>3}: {e}"),
        }
    }

    let stats = manager.resource_stats();
    println!(
        "\nResident: {} bytes ({} locked in {} slots)",
        stats.allocated, stats.locked_size, stats.locked_count
    );
}
