mod cli;

use std::path::{Path, PathBuf};

use clap::Parser;
use emu::memory::{SystemBus, WaitControl};
use emu::{Arm7tdmi, CpuConfig, LoadError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;

/// Contents of the `--config` file. Missing sections keep their defaults.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct RunnerConfig {
    cpu: CpuConfig,
    wait_control: WaitControl,
}

#[derive(Debug, Error)]
enum RunnerError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("cannot load image: {0}")]
    Load(#[from] LoadError),

    #[error("slice must be positive, got {0}")]
    Slice(i32),
}

fn read_file(path: &Path) -> Result<Vec<u8>, RunnerError> {
    std::fs::read(path).map_err(|source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(path: Option<&Path>) -> Result<RunnerConfig, RunnerError> {
    let Some(path) = path else {
        return Ok(RunnerConfig::default());
    };

    let data = read_file(path)?;
    Ok(serde_json::from_slice(&data)?)
}

fn setup_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, "tdmi.log");
            let (file_nb, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_writer(file_nb).with_ansi(false))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

fn main() -> Result<(), RunnerError> {
    let args = cli::Args::parse();
    let _tracing_guard = setup_tracing(args.log_dir.as_deref());

    if args.slice <= 0 {
        return Err(RunnerError::Slice(args.slice));
    }

    let mut config = load_config(args.config.as_deref())?;
    if config.cpu.reset_vector == 0 {
        config.cpu.reset_vector = args.load_address;
    }

    let image = read_file(&args.image)?;
    let mut bus = SystemBus::new(config.wait_control);
    bus.load(args.load_address, &image)?;
    tracing::info!(
        "loaded {} ({} bytes) at 0x{:08X}",
        args.image.display(),
        image.len(),
        args.load_address
    );

    let mut cpu = Arm7tdmi::new(bus, config.cpu);
    let mut remaining = args.cycles;
    while remaining > 0 {
        let slice = i32::try_from(remaining).map_or(args.slice, |left| left.min(args.slice));
        cpu.execute(slice);
        remaining = args.cycles.saturating_sub(cpu.cycles_consumed());

        if let Some(err) = cpu.take_diagnostic() {
            tracing::error!("stopped: {err}");
            break;
        }
    }

    tracing::info!(
        "ran {} instructions in {} cycles",
        cpu.instructions_executed(),
        cpu.cycles_consumed()
    );
    for (index, value) in cpu.registers.as_array().iter().enumerate() {
        tracing::info!("R{index:<2} = 0x{value:08X}");
    }
    tracing::info!("CPSR = {}", cpu.read_status());

    Ok(())
}
