//! Driver for the MAX17040/1/3/4 ModelGauge fuel gauges running a custom battery model.
//!
//! The gauges keep the custom model in RAM. [`ModelGauge::load_model`] writes it after power-up,
//! and [`ModelGauge::verify_model`] should be called periodically (hourly is the vendor's
//! recommendation) to detect a table lost to brown-out or ESD and reload it.
//!
//! All operations block. `load_model` takes around half a second and can take over ten seconds
//! if the device refuses to unlock. The bus is only held for one register transaction at a
//! time, so a shared bus (e.g. an `embedded-hal-bus` device) stays usable between steps.
#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate logger;

use embedded_hal::delay::DelayNs;

pub mod config;
pub mod ll;
pub mod models;

#[cfg(test)]
mod sim;

pub use config::{raw_vcell_to_volts, ConfigError, ModelConfig, SocBits};

use ll::{
    I2cInterface, Register, RegisterChannel, LOCK_KEY, MODEL_DATA_LEN, OCV_LOCKED,
    TABLE_BASE, TABLE_BLOCK_LEN, UNLOCK_KEY,
};

const UNLOCK_ATTEMPTS: u32 = 100;
const UNLOCK_RETRY_DELAY_MS: u32 = 100;

// The table needs at least 150ms before it can be used.
const TABLE_SETTLE_MS: u32 = 150;

// SOC must be read between 150ms and 600ms after writing OCV.
const OCV_SETTLE_MS: u32 = 150;

const LOCK_SETTLE_MS: u32 = 150;

/// RCOMP must be at its maximum while the table is written.
const RCOMP_MAX: [u8; 2] = [0xFF, 0x00];

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A bus transaction failed.
    Transfer(E),

    /// Model access did not unlock within the retry budget. The table was not touched.
    Unlock,

    /// The SOC high byte read back after loading the model was out of the expected range.
    SocCheck(u8),
}

impl<E> Error<E> {
    /// Returns `true` if the device responded but the model could not be loaded.
    pub fn is_protocol_failure(&self) -> bool {
        !matches!(self, Error::Transfer(_))
    }
}

/// Outcome of a successful model check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// The resident model is intact.
    Ok,

    /// The resident model failed verification and was reloaded.
    ///
    /// This is reported even if the reload itself failed its SOC check or could not unlock the
    /// device. The outcome of the reload is logged.
    Reloaded,
}

pub struct ModelGauge<C> {
    channel: C,
    config: ModelConfig,
}

impl<I> ModelGauge<I2cInterface<I>> {
    pub fn new(i2c: I, config: ModelConfig) -> Result<Self, ConfigError> {
        Self::with_channel(I2cInterface { i2c }, config)
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.channel.i2c
    }

    pub fn into_inner(self) -> I {
        self.channel.i2c
    }
}

impl<C> ModelGauge<C> {
    /// Creates a driver talking over an arbitrary register channel.
    pub fn with_channel(channel: C, config: ModelConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self { channel, config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl<C> ModelGauge<C>
where
    C: RegisterChannel,
{
    fn read(&mut self, reg: Register) -> Result<[u8; 2], Error<C::Error>> {
        self.channel.read_word(reg).map_err(Error::Transfer)
    }

    fn write(&mut self, reg: Register, word: [u8; 2]) -> Result<(), Error<C::Error>> {
        self.channel.write_word(reg, word).map_err(Error::Transfer)
    }

    /// Opens model access and returns the OCV value read while unlocked.
    fn unlock(&mut self, delay: &mut impl DelayNs) -> Result<[u8; 2], Error<C::Error>> {
        for _attempt in 1..=UNLOCK_ATTEMPTS {
            self.write(Register::Lock, UNLOCK_KEY)?;

            // The device may have accepted the key, lock it before bailing out.
            let ocv = match self.read(Register::Ocv) {
                Ok(ocv) => ocv,
                Err(e) => {
                    _ = self.lock(delay);
                    return Err(e);
                }
            };

            if ocv != OCV_LOCKED {
                debug!(
                    "Model access unlocked after {} attempt(s), OCV: {}, {}",
                    _attempt, ocv[0], ocv[1]
                );
                return Ok(ocv);
            }

            debug!("Model access still locked, attempt {}", _attempt);
            delay.delay_ms(UNLOCK_RETRY_DELAY_MS);
        }

        error!("Failed to unlock model access");
        Err(Error::Unlock)
    }

    fn lock(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<C::Error>> {
        let result = self.write(Register::Lock, LOCK_KEY);
        delay.delay_ms(LOCK_SETTLE_MS);
        result
    }

    fn write_table(&mut self) -> Result<(), Error<C::Error>> {
        let chunks = self.config.model_data.chunks_exact(TABLE_BLOCK_LEN);

        for (idx, chunk) in chunks.enumerate() {
            let mut block = [0; TABLE_BLOCK_LEN];
            block.copy_from_slice(chunk);

            let address = TABLE_BASE + (idx * TABLE_BLOCK_LEN) as u8;
            self.channel
                .write_block(address, &block)
                .map_err(Error::Transfer)?;
        }

        Ok(())
    }

    fn write_and_check_model(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<C::Error>> {
        self.write(Register::Config, RCOMP_MAX)?;
        self.write_table()?;
        delay.delay_ms(TABLE_SETTLE_MS);

        self.write(Register::Ocv, self.config.ocv_test_bytes())?;
        delay.delay_ms(OCV_SETTLE_MS);

        let [soc, _] = self.read(Register::Soc)?;
        if self.config.load_check_passes(soc) {
            info!("Model loaded, SOC check: {}", soc);
            Ok(())
        } else {
            error!(
                "Model load failed, SOC check: {} not in {}..={}",
                soc, self.config.soc_check_a, self.config.soc_check_b
            );
            Err(Error::SocCheck(soc))
        }
    }

    fn load_unlocked(
        &mut self,
        delay: &mut impl DelayNs,
        original_ocv: [u8; 2],
    ) -> Result<(), Error<C::Error>> {
        let checked = self.write_and_check_model(delay);

        // Restore even if the check failed, never leave the test OCV applied.
        let rcomp = self.write(Register::Config, [self.config.rcomp0, 0x00]);
        let ocv = self.write(Register::Ocv, original_ocv);

        checked.and(rcomp).and(ocv)
    }

    /// Writes the custom model to the device and checks that it took effect.
    ///
    /// RCOMP is set to `rcomp0` and OCV is restored afterwards. Once model access is unlocked,
    /// the device is locked again on every path, including bus errors. The first error
    /// encountered is returned.
    pub fn load_model(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<C::Error>> {
        let original_ocv = self.unlock(delay)?;

        let result = self.load_unlocked(delay, original_ocv);
        let locked = self.lock(delay);

        result.and(locked)
    }

    fn apply_test_ocv(
        &mut self,
        delay: &mut impl DelayNs,
        original_rcomp: [u8; 2],
    ) -> Result<u8, Error<C::Error>> {
        self.write(Register::Ocv, self.config.ocv_test_bytes())?;
        self.write(Register::Config, original_rcomp)?;
        delay.delay_ms(OCV_SETTLE_MS);

        let [soc, _] = self.read(Register::Soc)?;
        Ok(soc)
    }

    fn verify_unlocked(&mut self, delay: &mut impl DelayNs) -> Result<Status, Error<C::Error>> {
        let original_rcomp = self.read(Register::Config)?;
        let original_ocv = self.read(Register::Ocv)?;

        let soc = match self.apply_test_ocv(delay, original_rcomp) {
            Ok(soc) if !self.config.verify_check_passes(soc) => soc,
            checked => {
                // Accepted, or the check could not complete. Either way the test OCV goes.
                let rcomp = self.write(Register::Config, original_rcomp);
                let ocv = self.write(Register::Ocv, original_ocv);

                let _soc = checked?;
                rcomp?;
                ocv?;

                info!("Model verified, SOC check: {}", _soc);
                return Ok(Status::Ok);
            }
        };

        warn!("Model verification failed, SOC check: {}. Reloading", soc);
        match self.load_model(delay) {
            Ok(()) => info!("Model reloaded"),
            Err(Error::Transfer(e)) => return Err(Error::Transfer(e)),
            Err(Error::Unlock) => error!("Model reload failed: device did not unlock"),
            Err(Error::SocCheck(_soc)) => error!("Model reload failed: SOC check: {}", _soc),
        }

        Ok(Status::Reloaded)
    }

    /// Checks the model resident in the device RAM without rewriting it, and reloads it if the
    /// check fails.
    ///
    /// Note that the accepted SOC range excludes `soc_check_a`, while [`Self::load_model`]
    /// accepts it.
    pub fn verify_model(&mut self, delay: &mut impl DelayNs) -> Result<Status, Error<C::Error>> {
        self.write(Register::Lock, UNLOCK_KEY)?;

        let result = self.verify_unlocked(delay);
        let locked = self.write(Register::Lock, LOCK_KEY);

        let status = result?;
        locked?;

        Ok(status)
    }

    /// Returns the raw VCELL register.
    pub fn read_raw_vcell(&mut self) -> Result<u16, C::Error> {
        let word = self.channel.read_word(Register::VCell)?;
        Ok(u16::from_be_bytes(word))
    }

    /// Returns the cell voltage in V.
    pub fn read_voltage(&mut self) -> Result<f32, C::Error> {
        let word = self.channel.read_word(Register::VCell)?;
        Ok(raw_vcell_to_volts(word))
    }

    /// Returns the raw SOC register.
    pub fn read_raw_soc(&mut self) -> Result<u16, C::Error> {
        let word = self.channel.read_word(Register::Soc)?;
        Ok(u16::from_be_bytes(word))
    }

    /// Returns the state of charge in %. The value is not clamped to 0..=100.
    pub fn read_soc(&mut self) -> Result<f32, C::Error> {
        let raw = self.read_raw_soc()?;
        Ok(self.config.bits.raw_to_percent(raw))
    }

    /// Updates RCOMP for the given cell temperature in °C. Returns the value written.
    ///
    /// The alert threshold in the low byte of the register is preserved.
    pub fn update_rcomp(&mut self, temp_c: f32) -> Result<u8, C::Error> {
        let rcomp = self.config.compensated_rcomp(temp_c);

        let [_, alert] = self.channel.read_word(Register::Config)?;
        self.channel.write_word(Register::Config, [rcomp, alert])?;

        trace!("RCOMP updated to {}", rcomp);
        Ok(rcomp)
    }
}

const _: () = assert!(MODEL_DATA_LEN % TABLE_BLOCK_LEN == 0);
