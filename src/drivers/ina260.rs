//! TI INA260 power monitor.
//!
//! Only the power register is used.  Registers are 16-bit big-endian,
//! selected by writing the register pointer before the read.

use embedded_hal::i2c::I2c;
use log::info;

use crate::error::BusError;

pub const DEFAULT_ADDRESS: u8 = 0x40;

const REG_POWER: u8 = 0x03;
const REG_MANUFACTURER_ID: u8 = 0xFE;
const MANUFACTURER_ID: u16 = 0x5449; // "TI"

/// Power register LSB.
const POWER_LSB_W: f32 = 0.010;

/// Stateless handle: the bus is borrowed per call so it can be shared.
#[derive(Debug, Clone, Copy)]
pub struct Ina260 {
    address: u8,
}

impl Ina260 {
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    /// Verify the device answers with the TI manufacturer ID.
    pub fn probe<I: I2c>(&self, bus: &mut I) -> Result<(), BusError> {
        let id = self.read_register(bus, REG_MANUFACTURER_ID)?;
        if id != MANUFACTURER_ID {
            return Err(BusError::UnexpectedId {
                register: REG_MANUFACTURER_ID,
                value: id,
            });
        }
        info!("INA260 | found at 0x{:02X}", self.address);
        Ok(())
    }

    /// Instantaneous power in watts.
    pub fn read_power_watts<I: I2c>(&self, bus: &mut I) -> Result<f32, BusError> {
        let raw = self.read_register(bus, REG_POWER)?;
        Ok(f32::from(raw) * POWER_LSB_W)
    }

    fn read_register<I: I2c>(&self, bus: &mut I, register: u8) -> Result<u16, BusError> {
        let mut buf = [0u8; 2];
        bus.write_read(self.address, &[register], &mut buf)
            .map_err(|e| BusError::from_i2c(&e))?;
        Ok(u16::from_be_bytes(buf))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    /// Register-file I²C mock shared by the driver tests.
    #[derive(Default)]
    pub(crate) struct MockBus {
        pub regs: std::collections::HashMap<(u8, u8), u8>,
        pub writes: Vec<(u8, Vec<u8>)>,
        pub fail: bool,
    }

    impl MockBus {
        pub fn set16(&mut self, addr: u8, reg: u8, value: u16) {
            let [hi, lo] = value.to_be_bytes();
            self.regs.insert((addr, reg), hi);
            self.regs.insert((addr, reg.wrapping_add(1)), lo);
        }

        pub fn set8(&mut self, addr: u8, reg: u8, value: u8) {
            self.regs.insert((addr, reg), value);
        }
    }

    impl ErrorType for MockBus {
        type Error = ErrorKind;
    }

    impl I2c for MockBus {
        fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            let mut pointer = 0u8;
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        if let Some((&reg, rest)) = bytes.split_first() {
                            pointer = reg;
                            for (i, b) in rest.iter().enumerate() {
                                self.regs.insert((address, reg.wrapping_add(i as u8)), *b);
                            }
                        }
                        self.writes.push((address, bytes.to_vec()));
                    }
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = self
                                .regs
                                .get(&(address, pointer.wrapping_add(i as u8)))
                                .copied()
                                .unwrap_or(0);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn power_register_scaled_to_watts() {
        let mut bus = MockBus::default();
        bus.set16(DEFAULT_ADDRESS, REG_POWER, 1_234); // 12.34 W
        let ina = Ina260::new(DEFAULT_ADDRESS);
        let w = ina.read_power_watts(&mut bus).unwrap();
        assert!((w - 12.34).abs() < 1e-3);
    }

    #[test]
    fn probe_checks_manufacturer_id() {
        let mut bus = MockBus::default();
        let ina = Ina260::new(DEFAULT_ADDRESS);
        bus.set16(DEFAULT_ADDRESS, REG_MANUFACTURER_ID, 0x1234);
        assert_eq!(
            ina.probe(&mut bus),
            Err(BusError::UnexpectedId { register: 0xFE, value: 0x1234 })
        );
        bus.set16(DEFAULT_ADDRESS, REG_MANUFACTURER_ID, MANUFACTURER_ID);
        assert!(ina.probe(&mut bus).is_ok());
    }

    #[test]
    fn nack_maps_to_bus_error() {
        let mut bus = MockBus { fail: true, ..MockBus::default() };
        let ina = Ina260::new(DEFAULT_ADDRESS);
        assert_eq!(ina.read_power_watts(&mut bus), Err(BusError::Nack));
    }
}
