use std::{io, path::PathBuf, sync::Arc, thread, time::Duration};

use clap::Parser;
use color_eyre as ey;
use ey::eyre::{eyre, Context};
use jeriya_content::{AsyncAsset, AsyncLoader, AsyncLoaderConfig, FileAsset};
use jeriya_shared::{
    log::{self, info, warn},
    walkdir::WalkDir,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
enum CommandLineArguments {
    Load(Load),
}

/// Loads every file in a directory with the AsyncLoader
#[derive(Parser, Debug)]
struct Load {
    /// Directory that contains the files to load
    #[arg(short, long)]
    directory: PathBuf,

    /// YAML file with the configuration of the loader
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Duration of a simulated frame. Loaded assets are finalized once per frame.
    #[arg(short, long, default_value = "16")]
    frame_time_ms: u64,
}

fn main() -> ey::Result<()> {
    // Setup logging
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                jeriya_shared::chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Trace)
        .chain(io::stdout())
        .apply()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    let command_line_arguments = CommandLineArguments::parse();
    match &command_line_arguments {
        CommandLineArguments::Load(load) => run_load(load)?,
    }
    Ok(())
}

fn run_load(load: &Load) -> ey::Result<()> {
    let config = match &load.config {
        Some(path) => AsyncLoaderConfig::from_file(path).wrap_err("Failed to read the loader configuration")?,
        None => AsyncLoaderConfig::default(),
    };
    let loader = AsyncLoader::new(config).wrap_err("Failed to create the loader")?;

    if !load.directory.is_dir() {
        return Err(eyre!("{} is not a directory", load.directory.display()));
    }

    info!("Collecting files in {}", load.directory.display());
    let mut assets = Vec::new();
    for entry in WalkDir::new(&load.directory) {
        let entry = entry.wrap_err("Failed to walk the directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let asset = Arc::new(FileAsset::<Vec<u8>>::new(entry.path(), Box::new(|data: &[u8]| Ok(data.to_vec()))));
        loader.submit(asset.clone());
        assets.push(asset);
    }
    info!("Submitted {} files", assets.len());

    loader.start().wrap_err("Failed to start the loader")?;

    let frame_time = Duration::from_millis(load.frame_time_ms);
    let mut frame_count = 0;
    loop {
        frame_count += 1;
        if loader.drain_and_finalize() {
            break;
        }
        thread::sleep(frame_time);
    }
    loader.shutdown();

    let mut bytes = 0;
    let mut invalid_count = 0;
    for asset in &assets {
        if asset.is_valid() {
            bytes += asset.value().map_or(0, |value| value.len());
        } else {
            warn!("Failed to load {}", asset.key());
            invalid_count += 1;
        }
    }
    info!(
        "Loaded {} of {} files ({} bytes) in {} frames",
        assets.len() - invalid_count,
        assets.len(),
        bytes,
        frame_count
    );
    if invalid_count > 0 {
        return Err(eyre!("{invalid_count} files failed to load"));
    }
    Ok(())
}
