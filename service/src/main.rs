use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::Context;
use clap::Parser;
use service::{AnyResult, Args, DryRun, PollLoop, UsbDisplay, init_logging};

fn main() -> AnyResult<()> {
    let args = Args::parse();
    init_logging(args.journald)?;

    let cpu = args.cpu_sensor();
    let gpu = args.gpu_sensor()?;

    let running = Arc::new(AtomicBool::new(true));
    ctrlc::set_handler({
        let running = running.clone();
        move || running.store(false, Ordering::SeqCst)
    })
    .context("unable to install signal handler")?;

    if args.dry_run {
        PollLoop::new(cpu, gpu, DryRun).run(&running);
    } else {
        PollLoop::new(cpu, gpu, UsbDisplay::default()).run(&running);
    }

    Ok(())
}
