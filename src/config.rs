use crate::ll::MODEL_DATA_LEN;

/// Model configuration is inconsistent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `soc_check_a` is larger than `soc_check_b`.
    SocCheckOrder { low: u8, high: u8 },
    /// The model resolution is neither 18 nor 19 bits.
    Bits(u8),
}

/// SOC register resolution of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocBits {
    /// 1/256% per LSB.
    Bits18,
    /// 1/512% per LSB.
    Bits19,
}

impl SocBits {
    pub const fn divisor(self) -> f32 {
        match self {
            SocBits::Bits18 => 256.0,
            SocBits::Bits19 => 512.0,
        }
    }

    /// Converts the raw SOC register value to a percentage. The result is not clamped.
    ///
    /// ```rust
    /// # use max1704x::SocBits;
    /// assert_eq!(SocBits::Bits19.raw_to_percent(0x6400), 50.0);
    /// assert_eq!(SocBits::Bits18.raw_to_percent(0x3200), 50.0);
    /// assert_eq!(SocBits::Bits18.raw_to_percent(0xFFFF), 65535.0 / 256.0);
    /// ```
    #[inline]
    pub fn raw_to_percent(self, raw: u16) -> f32 {
        raw as f32 / self.divisor()
    }
}

impl TryFrom<u8> for SocBits {
    type Error = ConfigError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            18 => Ok(SocBits::Bits18),
            19 => Ok(SocBits::Bits19),
            other => Err(ConfigError::Bits(other)),
        }
    }
}

impl From<SocBits> for u8 {
    fn from(bits: SocBits) -> u8 {
        match bits {
            SocBits::Bits18 => 18,
            SocBits::Bits19 => 19,
        }
    }
}

/// Converts the VCELL register to volts.
///
/// VCELL holds a 12-bit value in its upper bits, 1.25mV per LSB.
///
/// ```rust
/// # use max1704x::raw_vcell_to_volts;
/// assert_eq!(raw_vcell_to_volts([0xA0, 0xA0]), 3.2125);
/// assert_eq!(raw_vcell_to_volts([0x00, 0x0F]), 0.0);
/// assert_eq!(raw_vcell_to_volts([0xFF, 0xF0]), 4095.0 / 800.0);
/// ```
#[inline]
pub fn raw_vcell_to_volts(word: [u8; 2]) -> f32 {
    let [msb, lsb] = word;
    let raw = ((msb as u16) << 4) | (lsb >> 4) as u16;

    raw as f32 / 800.0
}

/// A custom battery model, as exported by the cell characterization tool (the `.ini` file).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModelConfig {
    pub empty_adjustment: u8,
    pub full_adjustment: u8,

    /// Starting RCOMP value.
    pub rcomp0: u8,

    /// Temperature coefficient for RCOMP above 20°C.
    pub temp_co_up: f32,

    /// Temperature coefficient for RCOMP at or below 20°C.
    pub temp_co_down: f32,

    /// OCV value applied while checking the model.
    pub ocv_test: u16,

    /// Lower bound of the expected SOC high byte at `ocv_test`.
    pub soc_check_a: u8,

    /// Upper bound of the expected SOC high byte at `ocv_test`.
    pub soc_check_b: u8,

    pub bits: SocBits,

    /// Written in this order to the table starting at 0x40.
    pub model_data: [u8; MODEL_DATA_LEN],
}

impl ModelConfig {
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.soc_check_a > self.soc_check_b {
            return Err(ConfigError::SocCheckOrder {
                low: self.soc_check_a,
                high: self.soc_check_b,
            });
        }

        Ok(())
    }

    /// The check used after loading the table. Inclusive on both ends.
    #[inline]
    pub fn load_check_passes(&self, soc_msb: u8) -> bool {
        (self.soc_check_a..=self.soc_check_b).contains(&soc_msb)
    }

    /// The check used when verifying the resident table. Exclusive on the lower end.
    #[inline]
    pub fn verify_check_passes(&self, soc_msb: u8) -> bool {
        soc_msb > self.soc_check_a && soc_msb <= self.soc_check_b
    }

    pub const fn ocv_test_bytes(&self) -> [u8; 2] {
        self.ocv_test.to_be_bytes()
    }

    /// RCOMP adjusted for the cell temperature in °C, saturated to the register range.
    ///
    /// ```rust
    /// # use max1704x::models::LG_INR21700;
    /// assert_eq!(LG_INR21700.compensated_rcomp(20.0), 92);
    /// assert_eq!(LG_INR21700.compensated_rcomp(40.0), 82);
    /// assert_eq!(LG_INR21700.compensated_rcomp(0.0), 108);
    /// assert_eq!(LG_INR21700.compensated_rcomp(-400.0), 255);
    /// ```
    pub fn compensated_rcomp(&self, temp_c: f32) -> u8 {
        let coefficient = if temp_c > 20.0 {
            self.temp_co_up
        } else {
            self.temp_co_down
        };

        let rcomp = self.rcomp0 as f32 + (temp_c - 20.0) * coefficient;
        rcomp.clamp(0.0, u8::MAX as f32) as u8
    }
}
