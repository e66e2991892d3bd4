/// INA226 register pointer addresses.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Register {
    Configuration = 0x00,
    ShuntVoltage = 0x01,
    BusVoltage = 0x02,
    Power = 0x03,
    Current = 0x04,
    Calibration = 0x05,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::Register;

    #[test]
    fn register_addresses_match_datasheet() {
        assert_eq!(Register::Configuration.addr(), 0x00);
        assert_eq!(Register::ShuntVoltage.addr(), 0x01);
        assert_eq!(Register::BusVoltage.addr(), 0x02);
        assert_eq!(Register::Power.addr(), 0x03);
        assert_eq!(Register::Current.addr(), 0x04);
        assert_eq!(Register::Calibration.addr(), 0x05);
    }
}
