use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, TransportError};

/// Default line rate of the DTS link.
pub const DEFAULT_BAUD_RATE: u32 = 1_250_000;

/// Default read timeout. Short enough that a shutdown request is observed promptly.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Line settings for opening a serial device.
///
/// Passed through opaquely to the device; nothing above the transport layer
/// interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Device path or name (e.g. `/dev/ttyUSB0`, `COM3`).
    pub port: String,
    /// Line rate in bits per second. Default: 1 250 000.
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    /// Upper bound on a single blocking read.
    pub read_timeout: Duration,
}

impl SerialSettings {
    /// Settings for `port` with the DTS defaults (8E1 at 1.25 Mbaud).
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::Even,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl TryFrom<u8> for DataBits {
    type Error = TransportError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            other => Err(TransportError::InvalidSetting(format!(
                "data bits must be 5-8, got {other}"
            ))),
        }
    }
}

impl TryFrom<u8> for StopBits {
    type Error = TransportError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(TransportError::InvalidSetting(format!(
                "stop bits must be 1 or 2, got {other}"
            ))),
        }
    }
}

impl FromStr for Parity {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Self::None),
            "odd" | "o" => Ok(Self::Odd),
            "even" | "e" => Ok(Self::Even),
            other => Err(TransportError::InvalidSetting(format!(
                "unknown parity '{other}' (expected none, odd or even)"
            ))),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parity::None => "none",
            Parity::Odd => "odd",
            Parity::Even => "even",
        };
        f.write_str(name)
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(value: DataBits) -> Self {
        match value {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(value: StopBits) -> Self {
        match value {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(value: Parity) -> Self {
        match value {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dts_link() {
        let settings = SerialSettings::new("/dev/ttyUSB0");
        assert_eq!(settings.port, "/dev/ttyUSB0");
        assert_eq!(settings.baud_rate, 1_250_000);
        assert_eq!(settings.data_bits, DataBits::Eight);
        assert_eq!(settings.stop_bits, StopBits::One);
        assert_eq!(settings.parity, Parity::Even);
        assert_eq!(settings.read_timeout, Duration::from_millis(100));
    }

    #[test]
    fn data_bits_range() {
        assert_eq!(DataBits::try_from(7).unwrap(), DataBits::Seven);
        assert!(matches!(
            DataBits::try_from(9),
            Err(TransportError::InvalidSetting(_))
        ));
        assert!(DataBits::try_from(4).is_err());
    }

    #[test]
    fn stop_bits_range() {
        assert_eq!(StopBits::try_from(2).unwrap(), StopBits::Two);
        assert!(StopBits::try_from(0).is_err());
    }

    #[test]
    fn parity_parses_names_and_letters() {
        assert_eq!("even".parse::<Parity>().unwrap(), Parity::Even);
        assert_eq!("N".parse::<Parity>().unwrap(), Parity::None);
        assert_eq!("Odd".parse::<Parity>().unwrap(), Parity::Odd);
        assert!("mark".parse::<Parity>().is_err());
        assert_eq!(Parity::Even.to_string(), "even");
    }
}
