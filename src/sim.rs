//! An in-memory MAX1704x for driving the protocol in tests.

use embedded_hal::{
    delay::DelayNs,
    i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation},
};

use crate::{
    config::ModelConfig,
    ll::{I2cInterface, Register, LOCK_KEY, MODEL_DATA_LEN, OCV_LOCKED, TABLE_BASE, UNLOCK_KEY},
};

const TABLE_END: u8 = TABLE_BASE + MODEL_DATA_LEN as u8 - 1;

pub struct SimulatedGauge {
    regs: [u8; 256],
    pub table: [u8; MODEL_DATA_LEN],
    pub unlocked: bool,

    /// Number of unlock writes to ignore before model access opens.
    pub unlock_failures: u32,

    /// Register whose accesses are not acknowledged.
    pub nack_register: Option<u8>,

    /// SOC high byte reported at the test OCV when `table` holds the expected model.
    pub soc_intact: u8,

    /// SOC high byte reported at the test OCV otherwise.
    pub soc_corrupt: u8,

    expected_table: [u8; MODEL_DATA_LEN],
    ocv_test: [u8; 2],

    pub block_writes: usize,
    pub transactions: usize,
    pub word_writes: Vec<(u8, [u8; 2])>,
}

impl SimulatedGauge {
    /// A powered-up gauge with an empty table and power-on register values.
    pub fn new(config: &ModelConfig) -> Self {
        let mut this = Self {
            regs: [0; 256],
            table: [0; MODEL_DATA_LEN],
            unlocked: false,
            unlock_failures: 0,
            nack_register: None,
            soc_intact: config.soc_check_a + 1,
            soc_corrupt: 0,
            expected_table: config.model_data,
            ocv_test: config.ocv_test_bytes(),
            block_writes: 0,
            transactions: 0,
            word_writes: Vec::new(),
        };

        this.set_word(Register::VCell, [0xA0, 0xA0]);
        this.set_word(Register::Soc, [0x32, 0x00]);
        this.set_word(Register::Config, [0x97, 0x1C]);
        this.set_word(Register::Ocv, [0xDA, 0x20]);

        this
    }

    /// Same as [`Self::new`], with the model already resident.
    pub fn with_model(config: &ModelConfig) -> Self {
        let mut this = Self::new(config);
        this.table = config.model_data;
        this
    }

    /// Register contents, regardless of lock state.
    pub fn word(&self, reg: Register) -> [u8; 2] {
        let addr = reg.addr() as usize;
        [self.regs[addr], self.regs[addr + 1]]
    }

    pub fn set_word(&mut self, reg: Register, word: [u8; 2]) {
        let addr = reg.addr() as usize;
        self.regs[addr..addr + 2].copy_from_slice(&word);
    }

    fn check_ack(&self, address: u8) -> Result<(), ErrorKind> {
        if self.nack_register == Some(address) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }
        Ok(())
    }

    fn read_word_at(&self, address: u8) -> [u8; 2] {
        if address == Register::Ocv.addr() && !self.unlocked {
            return OCV_LOCKED;
        }

        if address == Register::Soc.addr()
            && self.unlocked
            && self.word(Register::Ocv) == self.ocv_test
        {
            let soc = if self.table == self.expected_table {
                self.soc_intact
            } else {
                self.soc_corrupt
            };
            return [soc, 0x00];
        }

        let address = address as usize;
        [self.regs[address], self.regs[address + 1]]
    }

    fn write_at(&mut self, address: u8, data: &[u8]) {
        match address {
            TABLE_BASE..=TABLE_END => {
                self.block_writes += 1;
                if self.unlocked {
                    let offset = (address - TABLE_BASE) as usize;
                    self.table[offset..offset + data.len()].copy_from_slice(data);
                }
            }
            _ => {
                let word = [data[0], data[1]];
                self.word_writes.push((address, word));

                if address == Register::Lock.addr() {
                    if word == UNLOCK_KEY {
                        if self.unlock_failures > 0 {
                            self.unlock_failures -= 1;
                        } else {
                            self.unlocked = true;
                        }
                    } else if word == LOCK_KEY {
                        self.unlocked = false;
                    }
                } else if address != Register::Ocv.addr() || self.unlocked {
                    let address = address as usize;
                    self.regs[address..address + 2].copy_from_slice(&word);
                }
            }
        }
    }
}

impl ErrorType for SimulatedGauge {
    type Error = ErrorKind;
}

impl I2c for SimulatedGauge {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != I2cInterface::<()>::DEVICE_ADDR {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        self.transactions += 1;

        let mut pointer = None;
        let mut written = Vec::new();

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        match pointer {
                            None => pointer = Some(byte),
                            Some(_) => written.push(byte),
                        }
                    }
                }
                Operation::Read(buffer) => {
                    let address = pointer.ok_or(ErrorKind::Other)?;
                    self.check_ack(address)?;

                    let word = self.read_word_at(address);
                    let len = buffer.len().min(2);
                    buffer[..len].copy_from_slice(&word[..len]);
                }
            }
        }

        if !written.is_empty() {
            let address = pointer.ok_or(ErrorKind::Other)?;
            self.check_ack(address)?;
            self.write_at(address, &written);
        }

        Ok(())
    }
}

/// Records requested delays instead of waiting.
#[derive(Default)]
pub struct RecordingDelay {
    pub delays_ms: Vec<u32>,
    pub total_ns: u64,
}

impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
        self.total_ns += ms as u64 * 1_000_000;
    }
}

pub fn init_logger() {
    _ = simple_logger::SimpleLogger::new().init();
}
