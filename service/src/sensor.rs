use std::{
    io,
    process::{Command, ExitStatus},
    string::FromUtf8Error,
};

use nvml_wrapper::{Nvml, enum_wrappers::device::TemperatureSensor, error::NvmlError};
use protocol::Reading;
use strum::Display;
use systemstat::{Platform, System};
use thiserror::Error as ThisError;

/// Something that can be sampled for a temperature once per poll cycle.
///
/// Reads never fail: any problem results in [`Reading::Unavailable`].
pub trait TemperatureSource {
    fn read(&mut self) -> Reading;
}

impl<T> TemperatureSource for Box<T>
where
    T: TemperatureSource + ?Sized,
{
    fn read(&mut self) -> Reading {
        (**self).read()
    }
}

/// Which temperature is shown, used as a log field.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Sensor {
    Cpu,
    Gpu,
}

/// CPU temperature parsed from the `sensors` command of lm-sensors.
#[derive(Clone, Debug)]
pub struct LmSensors {
    chip: String,
    label: String,
}

impl LmSensors {
    /// AMD Zen package sensor.
    pub const DEFAULT_CHIP: &'static str = "k10temp-pci-00c3";
    pub const DEFAULT_LABEL: &'static str = "Tctl";

    pub fn new(chip: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            chip: chip.into(),
            label: label.into(),
        }
    }

    fn query(&self) -> Result<f64, SensorError> {
        let output = Command::new("sensors")
            .arg(&self.chip)
            .output()
            .map_err(SensorError::Spawn)?;

        if !output.status.success() {
            return Err(SensorError::Status(output.status));
        }

        let text = String::from_utf8(output.stdout)?;

        parse_sensors_output(&text, &self.label)
            .ok_or_else(|| SensorError::MissingLabel(self.label.clone()))
    }
}

impl Default for LmSensors {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHIP, Self::DEFAULT_LABEL)
    }
}

impl TemperatureSource for LmSensors {
    fn read(&mut self) -> Reading {
        match self.query() {
            Ok(celsius) => Reading::Celsius(celsius),
            Err(e) => {
                tracing::debug!(chip = %self.chip, "{e}");
                Reading::Unavailable
            }
        }
    }
}

/// Extracts the value of a `<label>: +45.6°C` line from `sensors` output.
#[must_use]
pub fn parse_sensors_output(output: &str, label: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        let value = line.trim_start().strip_prefix(label)?.strip_prefix(':')?;
        let token = value.split_whitespace().next()?;
        token.strip_suffix("°C").unwrap_or(token).parse().ok()
    })
}

#[derive(Debug, ThisError)]
enum SensorError {
    #[error("unable to run sensors: {0}")]
    Spawn(#[source] io::Error),
    #[error("sensors exited with {0}")]
    Status(ExitStatus),
    #[error("sensors output is not UTF-8")]
    Utf8(#[from] FromUtf8Error),
    #[error("no `{0}` field in sensors output")]
    MissingLabel(String),
}

/// CPU temperature as reported by the platform thermal zone.
#[allow(missing_debug_implementations)]
pub struct SystemCpu(System);

impl SystemCpu {
    #[must_use]
    pub fn new() -> Self {
        Self(System::new())
    }
}

impl Default for SystemCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperatureSource for SystemCpu {
    fn read(&mut self) -> Reading {
        self.0
            .cpu_temp()
            .inspect_err(|e| tracing::debug!("unable to read CPU temperature: {e}"))
            .ok()
            .map(f64::from)
            .into()
    }
}

/// NVIDIA GPU core temperature through NVML.
#[allow(missing_debug_implementations)]
pub struct NvmlGpu {
    nvml: Nvml,
    index: u32,
}

impl NvmlGpu {
    ///
    /// # Errors
    ///
    /// Returns an error if the NVML library cannot be loaded or initialized.
    pub fn new(index: u32) -> Result<Self, NvmlError> {
        let nvml = Nvml::init()?;

        match nvml.device_by_index(index).and_then(|device| device.name()) {
            Ok(name) => tracing::info!("using GPU {index}: {name}"),
            Err(e) => tracing::warn!("GPU {index} not available yet: {e}"),
        }

        Ok(Self { nvml, index })
    }
}

impl TemperatureSource for NvmlGpu {
    fn read(&mut self) -> Reading {
        self.nvml
            .device_by_index(self.index)
            .and_then(|device| device.temperature(TemperatureSensor::Gpu))
            .inspect_err(|e| tracing::debug!("unable to read GPU temperature: {e}"))
            .ok()
            .map(f64::from)
            .into()
    }
}

/// A source that is never available, displayed as `0.0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Disabled;

impl TemperatureSource for Disabled {
    fn read(&mut self) -> Reading {
        Reading::Unavailable
    }
}
