use anyhow::Context as _;
use clap::{Parser, ValueEnum};

use crate::{AnyResult, Disabled, LmSensors, NvmlGpu, SystemCpu, TemperatureSource};

/// Shows CPU and GPU temperatures on the Antec digital display.
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Where to read the CPU temperature from.
    #[arg(long, value_enum, default_value_t = CpuSource::LmSensors)]
    pub cpu_source: CpuSource,
    /// Chip passed to `sensors`.
    #[arg(long, default_value = LmSensors::DEFAULT_CHIP)]
    pub sensors_chip: String,
    /// Field of the `sensors` output holding the CPU temperature.
    #[arg(long, default_value = LmSensors::DEFAULT_LABEL)]
    pub cpu_label: String,
    /// NVML index of the GPU to monitor.
    #[arg(long, default_value_t = 0)]
    pub gpu_index: u32,
    /// Do not load NVML and always show 0.0 for the GPU.
    #[arg(long)]
    pub no_gpu: bool,
    /// Log payloads instead of sending them to the display.
    #[arg(long)]
    pub dry_run: bool,
    /// Log to the systemd journal instead of stderr.
    #[arg(long)]
    pub journald: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CpuSource {
    /// Parse the output of lm-sensors.
    LmSensors,
    /// Use the platform thermal zone.
    System,
}

impl Args {
    #[must_use]
    pub fn cpu_sensor(&self) -> Box<dyn TemperatureSource> {
        match self.cpu_source {
            CpuSource::LmSensors => Box::new(LmSensors::new(
                self.sensors_chip.as_str(),
                self.cpu_label.as_str(),
            )),
            CpuSource::System => Box::new(SystemCpu::new()),
        }
    }

    ///
    /// # Errors
    ///
    /// Returns an error if NVML is requested but cannot be initialized.
    pub fn gpu_sensor(&self) -> AnyResult<Box<dyn TemperatureSource>> {
        if self.no_gpu {
            return Ok(Box::new(Disabled));
        }

        let gpu = NvmlGpu::new(self.gpu_index).context("unable to initialize NVML")?;
        Ok(Box::new(gpu))
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Args, CpuSource};

    #[test]
    fn test_command() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["antec-display"]).unwrap();

        assert_eq!(args.cpu_source, CpuSource::LmSensors);
        assert_eq!(args.sensors_chip, "k10temp-pci-00c3");
        assert_eq!(args.cpu_label, "Tctl");
        assert_eq!(args.gpu_index, 0);
        assert!(!args.no_gpu && !args.dry_run && !args.journald);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "antec-display",
            "--cpu-source",
            "system",
            "--no-gpu",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.cpu_source, CpuSource::System);
        assert!(args.no_gpu && args.dry_run);
        assert!(args.gpu_sensor().is_ok());
    }

    #[test]
    fn test_no_interval_flag() {
        assert!(Args::try_parse_from(["antec-display", "--interval", "1000"]).is_err());
    }
}
