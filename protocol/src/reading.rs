/// A single temperature sample, in degrees Celsius.
///
/// Sensor failures are not errors: they produce [`Reading::Unavailable`],
/// which the display shows as `0.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Reading {
    Celsius(f64),
    #[default]
    Unavailable,
}

impl Reading {
    /// The value to display, falling back to the `0.0` sentinel.
    #[inline]
    #[must_use]
    pub fn celsius(self) -> f64 {
        match self {
            Self::Celsius(value) => value,
            Self::Unavailable => 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_available(self) -> bool {
        matches!(self, Self::Celsius(_))
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Self::Celsius(value)
    }
}

impl From<Option<f64>> for Reading {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Unavailable, Self::Celsius)
    }
}
