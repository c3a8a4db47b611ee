use std::path::PathBuf;
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::time::{Duration, Instant};

use clap::Parser;
use colored::Colorize;
use log::{info, warn};

use hs_engine::{HsEngine, Platform};
use hs_linux::{
    FileTables, LinuxProcessor, LogSink, ProcStatSampler, ProcessRegistry, TableFile, UdpBus,
};
use hs_store::fs_backend::FileSystemBackend;
use hs_store::CounterStore;

#[derive(Parser)]
struct Cli {
    /// TOML table file (engine overrides, tables, supervised processes).
    #[arg(long, default_value = "hs.toml")] tables: PathBuf,
    /// Processing cycle period.
    #[arg(long, default_value_t = 100)] period_ms: u64,
    /// Where event messages arrive.
    #[arg(long, default_value = "127.0.0.1:5510")] bind: String,
    /// Where message actions are sent.
    #[arg(long)] target: Option<String>,
    /// Directory for the durable reset counters.
    #[arg(long, default_value = "hs-data")] counters: PathBuf,
    #[arg(long)] watchdog: Option<PathBuf>,
    /// Print a housekeeping line every N cycles (0 = never).
    #[arg(long, default_value_t = 50)] hk_every: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    println!("{}", ">>> HS NODE: Health & Safety Monitor <<<".bold().green());
    info!("Tables: {}  Bus: {}  Period: {} ms", cli.tables.display(), cli.bind, cli.period_ms);

    let file = TableFile::load(&cli.tables)?;
    let config = file.engine_config();

    let mut apps = ProcessRegistry::new();
    for spec in file.processes()? {
        apps.spawn(spec)?;
    }
    info!("Supervising {} processes", apps.len());

    let platform = Platform {
        apps: Box::new(apps),
        bus: Box::new(UdpBus::new(&cli.bind, cli.target.as_deref())?),
        storage: Box::new(CounterStore::new(Box::new(FileSystemBackend::new(&cli.counters)?))),
        cpu: Box::new(ProcStatSampler::new()),
        processor: Box::new(LinuxProcessor::new(cli.watchdog.as_deref())?),
        sink: Box::new(LogSink),
        tables: Box::new(FileTables::new(&cli.tables)),
    };

    let mut engine = HsEngine::new(platform, config)
        .map_err(|e| anyhow::anyhow!("engine rejected configuration: {}", e))?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        warn!("Signal received. Stopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let period = Duration::from_millis(cli.period_ms);
    info!("{}", "Engine Active.".cyan());

    while running.load(Ordering::SeqCst) {
        let started = Instant::now();
        engine.run_cycle();

        let hk = engine.housekeeping();
        if cli.hk_every != 0 && hk.cycles % cli.hk_every == 0 {
            info!(
                "[HK] cycles={} resets={}/{} events={} invalid={} msgacts={} cpu avg={} peak={}",
                hk.cycles, hk.resets_performed, hk.max_resets, hk.events_monitored,
                hk.invalid_events, hk.msg_acts_executed, hk.utilization_average, hk.utilization_peak
            );
        }

        if let Some(rest) = period.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    // Dropping the engine stops the supervised processes.
    drop(engine);
    info!("{}", "HS node stopped.".yellow());
    Ok(())
}
