use crate::register::Register;
use core::fmt;
use embedded_hal::i2c::{ErrorKind, I2c};
use log::debug;

/// I2C address with A0 and A1 both tied to GND.
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Averaging 1, 1.1 ms bus and shunt conversion time, continuous shunt and bus mode.
pub const CONFIGURATION: u16 = 0x4127;

/// Shunt resistor fitted in series with the battery supply, in ohms.
pub const SHUNT_RESISTANCE_OHMS: f64 = 0.002;

/// Current register LSB, in amps.
pub const CURRENT_LSB_A: f64 = 0.001;

/// CAL = 0.00512 / (CURRENT_LSB_A * SHUNT_RESISTANCE_OHMS)
///     = 0.00512 / (0.001 A * 0.002 Ω) = 2560
pub const CALIBRATION: u16 = 0x0A00;

/// Bus voltage register LSB, in volts.
pub const BUS_VOLTAGE_LSB_V: f64 = 0.00125;

/// Shunt voltage register LSB, in volts.
pub const SHUNT_VOLTAGE_LSB_V: f64 = 0.000_002_5;

/// Power register LSB, fixed by the chip at 25 times the current LSB.
pub const POWER_LSB_W: f64 = 25.0 * CURRENT_LSB_A;

/// A physical quantity sampled by [`INA226Driver::read_sensor_data`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Quantity {
    BusVoltage,
    Current,
    Power,
}

impl Quantity {
    pub const fn register(self) -> Register {
        match self {
            Quantity::BusVoltage => Register::BusVoltage,
            Quantity::Current => Register::Current,
            Quantity::Power => Register::Power,
        }
    }

    fn convert(self, raw: u16) -> f64 {
        match self {
            Quantity::BusVoltage => bus_voltage_from_raw(raw),
            Quantity::Current => current_from_raw(raw),
            Quantity::Power => power_from_raw(raw),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Quantity::BusVoltage => "bus voltage",
            Quantity::Current => "current",
            Quantity::Power => "power",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum INA226Error<E> {
    /// Writing the configuration or calibration register failed during construction.
    #[error("unable to initialize INA226, writing {register:?} failed: {cause:?}")]
    Initialization { register: Register, cause: E },
    #[error("I2C error accessing {register:?}: {cause:?}")]
    Bus { register: Register, cause: E },
    /// One of the reads making up a [`SensorReading`] failed.
    #[error("failed to read {quantity}: {cause:?}")]
    Read { quantity: Quantity, cause: E },
}

impl<E: embedded_hal::i2c::Error> INA226Error<E> {
    /// The bus-level error kind behind this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            INA226Error::Initialization { cause, .. }
            | INA226Error::Bus { cause, .. }
            | INA226Error::Read { cause, .. } => cause.kind(),
        }
    }
}

/// One complete sample of the monitored supply.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SensorReading {
    /// Bus (supply) voltage in volts.
    pub supply_voltage: f64,
    /// Current through the shunt in amps, negative when flowing backwards.
    pub current: f64,
    /// Power in watts.
    pub power: f64,
}

/// A sensor that produces complete [`SensorReading`]s on demand.
pub trait PowerSensor {
    type Error;

    fn read_sensor_data(&mut self) -> Result<SensorReading, Self::Error>;
}

impl<T: PowerSensor + ?Sized> PowerSensor for &mut T {
    type Error = T::Error;

    fn read_sensor_data(&mut self) -> Result<SensorReading, Self::Error> {
        (**self).read_sensor_data()
    }
}

pub fn bus_voltage_from_raw(raw: u16) -> f64 {
    f64::from(raw) * BUS_VOLTAGE_LSB_V
}

/// The current register holds a two's-complement value.
pub fn current_from_raw(raw: u16) -> f64 {
    f64::from(raw as i16) * CURRENT_LSB_A
}

/// The power register is always non-negative.
pub fn power_from_raw(raw: u16) -> f64 {
    f64::from(raw) * POWER_LSB_W
}

pub fn shunt_voltage_from_raw(raw: u16) -> f64 {
    f64::from(raw as i16) * SHUNT_VOLTAGE_LSB_V
}

pub struct INA226Driver<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> INA226Driver<I2C>
where
    I2C: I2c,
{
    /// Creates a driver at [`DEFAULT_ADDRESS`] and programs the configuration and
    /// calibration registers.
    ///
    /// # Arguments
    ///
    /// * `i2c`: The I2C bus, owned by the driver until [`release`](Self::release).
    ///
    /// Fails with [`INA226Error::Initialization`] if either register write fails.
    pub fn new(i2c: I2C) -> Result<Self, INA226Error<I2C::Error>> {
        Self::new_with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Same as [`new`](Self::new) for a chip strapped to a different address.
    pub fn new_with_address(i2c: I2C, address: u8) -> Result<Self, INA226Error<I2C::Error>> {
        let mut driver = Self { i2c, address };

        for (register, value) in [
            (Register::Configuration, CONFIGURATION),
            (Register::Calibration, CALIBRATION),
        ] {
            driver
                .write_raw(register, value)
                .map_err(|cause| INA226Error::Initialization { register, cause })?;
        }

        debug!(
            "INA226 at 0x{:02X} initialized (config 0x{:04X}, calibration 0x{:04X})",
            address, CONFIGURATION, CALIBRATION
        );

        Ok(driver)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives the bus back. The chip keeps running with its current configuration.
    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn get_bus_voltage(&mut self) -> Result<f64, INA226Error<I2C::Error>> {
        Ok(bus_voltage_from_raw(self.read(Register::BusVoltage)?))
    }

    pub fn get_current(&mut self) -> Result<f64, INA226Error<I2C::Error>> {
        Ok(current_from_raw(self.read(Register::Current)?))
    }

    pub fn get_power(&mut self) -> Result<f64, INA226Error<I2C::Error>> {
        Ok(power_from_raw(self.read(Register::Power)?))
    }

    pub fn get_shunt_voltage(&mut self) -> Result<f64, INA226Error<I2C::Error>> {
        Ok(shunt_voltage_from_raw(self.read(Register::ShuntVoltage)?))
    }

    /// Reads bus voltage, current and power, in that order. The first failing read
    /// aborts the whole sample.
    pub fn read_sensor_data(&mut self) -> Result<SensorReading, INA226Error<I2C::Error>> {
        Ok(SensorReading {
            supply_voltage: self.read_quantity(Quantity::BusVoltage)?,
            current: self.read_quantity(Quantity::Current)?,
            power: self.read_quantity(Quantity::Power)?,
        })
    }

    pub fn write(
        &mut self,
        register: Register,
        data: u16,
    ) -> Result<(), INA226Error<I2C::Error>> {
        self.write_raw(register, data)
            .map_err(|cause| INA226Error::Bus { register, cause })
    }

    pub fn read(&mut self, register: Register) -> Result<u16, INA226Error<I2C::Error>> {
        self.read_raw(register)
            .map_err(|cause| INA226Error::Bus { register, cause })
    }

    fn read_quantity(&mut self, quantity: Quantity) -> Result<f64, INA226Error<I2C::Error>> {
        let raw = self
            .read_raw(quantity.register())
            .map_err(|cause| INA226Error::Read { quantity, cause })?;

        Ok(quantity.convert(raw))
    }

    fn write_raw(&mut self, register: Register, data: u16) -> Result<(), I2C::Error> {
        let [high, low] = data.to_be_bytes();
        self.i2c.write(self.address, &[register.addr(), high, low])
    }

    // Pointer select and data read are two separate transactions.
    fn read_raw(&mut self, register: Register) -> Result<u16, I2C::Error> {
        let mut read_buffer = [0u8; 2];
        self.i2c.write(self.address, &[register.addr()])?;
        self.i2c.read(self.address, &mut read_buffer)?;

        Ok(u16::from_be_bytes(read_buffer))
    }
}

impl<I2C> PowerSensor for INA226Driver<I2C>
where
    I2C: I2c,
{
    type Error = INA226Error<I2C::Error>;

    fn read_sensor_data(&mut self) -> Result<SensorReading, Self::Error> {
        INA226Driver::read_sensor_data(self)
    }
}
