//! Chunk layout viewer - prints how a structure document chunks each depth.
//!
//! Usage: cargo run --bin chunk_layout -- --config <PATH> [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Structure JSON document (required)
//!   --depths <N>      Print depths below N (default: cold depth end, or 20)
//!   --index <INDEX>   Also locate a single node index

use std::path::PathBuf;
use std::process::ExitCode;

use cloudtile::core::logging;
use cloudtile::streaming::depth_layout;
use cloudtile::{Id, Structure};

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(config_path) = parse_str_arg(&args, "--config").map(PathBuf::from) else {
        log::error!("Missing --config <PATH>");
        return ExitCode::FAILURE;
    };

    let structure = match Structure::load(&config_path) {
        Ok(structure) => structure,
        Err(e) => {
            log::error!("Failed to load {}: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let default_depths = if structure.has_cold() { structure.cold_depth_end() } else { 20 };
    let depths = parse_u64_arg(&args, "--depths").unwrap_or(default_depths);

    println!("=== Chunk Layout ===");
    println!("Config:     {}", config_path.display());
    println!("Dimensions: {} (factor {})", structure.dimensions(), structure.factor());
    println!("Null:       [{}, {})", structure.null_depth_begin(), structure.null_depth_end());
    println!("Base:       [{}, {})", structure.base_depth_begin(), structure.base_depth_end());
    println!("Cold:       [{}, {})", structure.cold_depth_begin(), structure.cold_depth_end());
    if structure.has_sparse() {
        println!(
            "Sparse:     {}+{}",
            structure.sparse_depth_begin(),
            if structure.dynamic_chunks_active() { " (dynamic)" } else { "" }
        );
    }
    println!("Chunk size: {}", structure.base_points_per_chunk());
    println!();

    if !structure.has_cold() {
        log::warn!("Structure has no cold region, nothing is chunked");
        return ExitCode::SUCCESS;
    }

    println!(
        "{:>6}  {:<8}  {:>24}  {:>24}  {:>24}  {}",
        "depth", "region", "first", "chunks", "points/chunk", "shared"
    );
    for layout in depth_layout(&structure, 0..depths) {
        println!(
            "{:>6}  {:<8}  {:>24}  {:>24}  {:>24}  {}",
            layout.depth,
            format!("{:?}", layout.region),
            layout.first_chunk_num,
            layout.num_chunks,
            layout.points_per_chunk,
            if layout.shared { "yes" } else { "" },
        );
    }

    if let Some(raw) = parse_str_arg(&args, "--index") {
        let Ok(index) = raw.parse::<Id>() else {
            log::error!("Invalid node index: {}", raw);
            return ExitCode::FAILURE;
        };
        if &index < structure.cold_index_begin() {
            println!("\nIndex {} is in the {:?} region (not chunked)", index, structure.region_of_index(&index));
        } else {
            let info = structure.chunk_info(&index);
            println!();
            println!("Index {}:", index);
            println!("  depth        {}", info.depth());
            println!("  chunk id     {}", info.chunk_id());
            println!("  chunk num    {}", info.chunk_num());
            println!("  offset       {}", info.chunk_offset());
            println!("  chunk size   {}", info.points_per_chunk());
        }
    }

    ExitCode::SUCCESS
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
