//! Register-level access to the gauge.

use embedded_hal::i2c::{I2c, Operation};

/// Length of the characterization table in bytes.
pub const MODEL_DATA_LEN: usize = 64;

/// The table is written in blocks of this size.
pub const TABLE_BLOCK_LEN: usize = 16;

/// First address of the model table (`0x40..=0x7F`).
pub const TABLE_BASE: u8 = 0x40;

pub const UNLOCK_KEY: [u8; 2] = [0x4A, 0x57];
pub const LOCK_KEY: [u8; 2] = [0x00, 0x00];

/// OCV reads as all ones while model access is locked.
pub const OCV_LOCKED: [u8; 2] = [0xFF, 0xFF];

/// Word registers used by the driver. All values are big-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// 12-bit cell voltage, 1.25mV per LSB, left aligned.
    VCell = 0x02,
    /// State of charge, 1/256% or 1/512% per LSB depending on the model.
    Soc = 0x04,
    /// RCOMP in the high byte, alert threshold in the low byte.
    Config = 0x0C,
    /// Open-circuit voltage. Only accessible while unlocked.
    Ocv = 0x0E,
    /// Model access control.
    Lock = 0x3E,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// A transport able to move words and table blocks to and from the gauge.
///
/// Every method is one bus transaction. Implementations that share the bus must hold it for the
/// whole transaction and release it on every exit path, but not longer.
pub trait RegisterChannel {
    type Error;

    /// Reads a register as `[msb, lsb]`.
    fn read_word(&mut self, reg: Register) -> Result<[u8; 2], Self::Error>;

    /// Writes `[msb, lsb]` to a register.
    fn write_word(&mut self, reg: Register, word: [u8; 2]) -> Result<(), Self::Error>;

    /// Writes a 16-byte block of table memory starting at `address`.
    fn write_block(
        &mut self,
        address: u8,
        block: &[u8; TABLE_BLOCK_LEN],
    ) -> Result<(), Self::Error>;
}

pub struct I2cInterface<I> {
    pub i2c: I,
}

impl<I> I2cInterface<I> {
    pub const DEVICE_ADDR: u8 = 0x36;
}

impl<I> I2cInterface<I>
where
    I: I2c,
{
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I::Error> {
        self.i2c.transaction(
            Self::DEVICE_ADDR,
            &mut [Operation::Write(&[address]), Operation::Write(data)],
        )
    }
}

impl<I> RegisterChannel for I2cInterface<I>
where
    I: I2c,
{
    type Error = I::Error;

    fn read_word(&mut self, reg: Register) -> Result<[u8; 2], Self::Error> {
        let mut word = [0; 2];
        self.i2c.transaction(
            Self::DEVICE_ADDR,
            &mut [Operation::Write(&[reg.addr()]), Operation::Read(&mut word)],
        )?;
        Ok(word)
    }

    fn write_word(&mut self, reg: Register, word: [u8; 2]) -> Result<(), Self::Error> {
        self.write(reg.addr(), &word)
    }

    fn write_block(
        &mut self,
        address: u8,
        block: &[u8; TABLE_BLOCK_LEN],
    ) -> Result<(), Self::Error> {
        self.write(address, block)
    }
}
