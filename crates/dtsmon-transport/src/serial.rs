use std::io::{ErrorKind, Read};

use serialport::{ClearBuffer, FlowControl, SerialPort, SerialPortType};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::settings::SerialSettings;
use crate::traits::ByteSource;

/// A serial device opened for reading.
///
/// Reads time out after [`SerialSettings::read_timeout`] and report zero bytes,
/// which keeps the owning loop responsive to shutdown requests. Pending device
/// buffers are purged on open and again on drop.
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    settings: SerialSettings,
}

impl SerialSource {
    /// Open and configure the device named in `settings`.
    pub fn open(settings: &SerialSettings) -> Result<Self> {
        let port = serialport::new(settings.port.as_str(), settings.baud_rate)
            .data_bits(settings.data_bits.into())
            .stop_bits(settings.stop_bits.into())
            .parity(settings.parity.into())
            .flow_control(FlowControl::None)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: settings.port.clone(),
                source,
            })?;

        let mut source = Self {
            port,
            settings: settings.clone(),
        };
        source.flush()?;

        info!(
            port = %source.settings.port,
            baud = source.settings.baud_rate,
            parity = %source.settings.parity,
            "serial device opened"
        );
        Ok(source)
    }

    /// Settings the device was opened with.
    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    /// Line rate reported by the device itself.
    pub fn baud_rate(&self) -> Result<u32> {
        self.port.baud_rate().map_err(TransportError::Configure)
    }
}

impl ByteSource for SerialSource {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.port
            .clear(ClearBuffer::All)
            .map_err(TransportError::Configure)
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.settings.port, self.settings.baud_rate)
    }
}

impl Drop for SerialSource {
    fn drop(&mut self) {
        if let Err(err) = self.port.clear(ClearBuffer::All) {
            warn!(port = %self.settings.port, error = %err, "failed purging serial buffers on close");
        }
        debug!(port = %self.settings.port, "serial device closed");
    }
}

/// A serial port visible to the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    /// Bus kind, with USB vendor/product ids when known.
    pub kind: String,
    pub description: Option<String>,
}

/// List serial ports visible to the operating system.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    let mut infos: Vec<PortInfo> = ports
        .into_iter()
        .map(|port| {
            let (kind, description) = match port.port_type {
                SerialPortType::UsbPort(usb) => {
                    let description = match (usb.manufacturer, usb.product) {
                        (Some(m), Some(p)) => Some(format!("{m} {p}")),
                        (Some(m), None) => Some(m),
                        (None, p) => p,
                    };
                    (format!("usb {:04x}:{:04x}", usb.vid, usb.pid), description)
                }
                SerialPortType::PciPort => ("pci".to_string(), None),
                SerialPortType::BluetoothPort => ("bluetooth".to_string(), None),
                SerialPortType::Unknown => ("unknown".to_string(), None),
            };
            PortInfo {
                name: port.port_name,
                kind,
                description,
            }
        })
        .collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_device_reports_port_name() {
        let settings = SerialSettings::new("/dev/dtsmon-definitely-not-a-device");
        let err = match SerialSource::open(&settings) {
            Ok(_) => panic!("opening a missing device should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, TransportError::Open { ref port, .. } if port == &settings.port));
        assert!(err.to_string().contains("dtsmon-definitely-not-a-device"));
    }
}
