mod cli;
mod display;
mod logging;
mod poll;
mod sensor;

pub use anyhow::Result as AnyResult;
pub use cli::{Args, CpuSource};
pub use display::{DisplayError, DryRun, PayloadSink, UsbDisplay};
pub use logging::init_logging;
pub use poll::{POLL_INTERVAL, PollLoop};
pub use sensor::{
    Disabled, LmSensors, NvmlGpu, Sensor, SystemCpu, TemperatureSource, parse_sensors_output,
};
