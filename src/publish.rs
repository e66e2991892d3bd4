//! Hand-off of completed readings to whoever consumes them.

use crate::driver::SensorReading;

/// Sensor id stamped on every published record.
pub const SENSOR_ID: u32 = 1;

/// Status code of a nominal reading.
pub const STATUS_NOMINAL: u32 = 0;

/// The record handed to downstream consumers.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize))]
pub struct SensorOutput {
    /// Milliseconds since the UNIX epoch.
    pub timestamp: u64,
    pub sensor_id: u32,
    pub status: u32,
    pub current: f32,
    pub supply_voltage: f32,
    pub power: f32,
}

impl SensorOutput {
    pub fn new(reading: &SensorReading, timestamp: u64) -> Self {
        Self {
            timestamp,
            sensor_id: SENSOR_ID,
            status: STATUS_NOMINAL,
            current: reading.current as f32,
            supply_voltage: reading.supply_voltage as f32,
            power: reading.power as f32,
        }
    }
}

pub trait Publisher {
    type Error;

    fn publish(&mut self, reading: &SensorReading) -> Result<(), Self::Error>;
}

impl<T: Publisher + ?Sized> Publisher for &mut T {
    type Error = T::Error;

    fn publish(&mut self, reading: &SensorReading) -> Result<(), Self::Error> {
        (**self).publish(reading)
    }
}

#[cfg(feature = "std")]
pub use self::json::{JsonLinesPublisher, PublishError};

#[cfg(feature = "std")]
mod json {
    use super::{Publisher, SensorOutput};
    use crate::driver::SensorReading;
    use std::io::{self, Write};
    use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

    #[derive(Debug, thiserror::Error)]
    pub enum PublishError {
        #[error("failed to write reading: {0}")]
        Io(#[from] io::Error),
        #[error("failed to serialize reading: {0}")]
        Serialize(#[from] serde_json::Error),
        #[error("system clock is before the UNIX epoch: {0}")]
        Clock(#[from] SystemTimeError),
    }

    /// Writes one JSON [`SensorOutput`] per line.
    pub struct JsonLinesPublisher<W> {
        writer: W,
    }

    impl<W: Write> JsonLinesPublisher<W> {
        pub fn new(writer: W) -> Self {
            Self { writer }
        }

        pub fn into_inner(self) -> W {
            self.writer
        }

        pub fn write_output(&mut self, output: &SensorOutput) -> Result<(), PublishError> {
            let mut line = serde_json::to_vec(output)?;
            line.push(b'\n');
            self.writer.write_all(&line)?;
            self.writer.flush()?;
            Ok(())
        }
    }

    impl<W: Write> Publisher for JsonLinesPublisher<W> {
        type Error = PublishError;

        fn publish(&mut self, reading: &SensorReading) -> Result<(), Self::Error> {
            let timestamp = millis_since_epoch(SystemTime::now())?;
            self.write_output(&SensorOutput::new(reading, timestamp))
        }
    }

    fn millis_since_epoch(time: SystemTime) -> Result<u64, PublishError> {
        Ok(time.duration_since(UNIX_EPOCH)?.as_millis() as u64)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const READING: SensorReading = SensorReading {
            supply_voltage: 12.5,
            current: -0.25,
            power: 3.125,
        };

        #[test]
        fn writes_one_record_per_line() {
            let mut publisher = JsonLinesPublisher::new(Vec::new());
            publisher.write_output(&SensorOutput::new(&READING, 1_700_000_000_000)).unwrap();
            publisher.write_output(&SensorOutput::new(&READING, 1_700_000_000_100)).unwrap();

            let text = String::from_utf8(publisher.into_inner()).unwrap();
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines.len(), 2);
            assert_eq!(
                lines[0],
                r#"{"timestamp":1700000000000,"sensor_id":1,"status":0,"current":-0.25,"supply_voltage":12.5,"power":3.125}"#
            );
        }

        #[test]
        fn publish_stamps_current_time() {
            let before = millis_since_epoch(SystemTime::now()).unwrap();
            let mut publisher = JsonLinesPublisher::new(Vec::new());
            publisher.publish(&READING).unwrap();

            let text = String::from_utf8(publisher.into_inner()).unwrap();
            let record: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
            assert!(record["timestamp"].as_u64().unwrap() >= before);
            assert_eq!(record["sensor_id"], 1);
            assert_eq!(record["status"], 0);
        }

        #[test]
        fn clock_before_epoch_is_an_error() {
            use std::time::Duration;

            let before_epoch = UNIX_EPOCH - Duration::from_secs(1);
            assert!(matches!(
                millis_since_epoch(before_epoch),
                Err(PublishError::Clock(_))
            ));
            assert_eq!(
                millis_since_epoch(UNIX_EPOCH + Duration::from_millis(1_500)).unwrap(),
                1_500
            );
        }

        struct BrokenPipe;

        impl Write for BrokenPipe {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        #[test]
        fn write_failure_is_reported() {
            let mut publisher = JsonLinesPublisher::new(BrokenPipe);
            assert!(matches!(publisher.publish(&READING), Err(PublishError::Io(_))));
        }
    }
}
