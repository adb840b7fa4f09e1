//! Characterization data for cells the driver has been used with.
//!
//! Values come from the `.ini` files produced by the characterization tool. The EVKit-only
//! sections of those files are discarded.

use crate::config::{ModelConfig, SocBits};

/// LG INR21700, single cell.
pub const LG_INR21700: ModelConfig = ModelConfig {
    empty_adjustment: 0,
    full_adjustment: 100,
    rcomp0: 92,
    temp_co_up: -0.453125,
    temp_co_down: -0.8125,
    ocv_test: 58560,
    soc_check_a: 203,
    soc_check_b: 205,
    bits: SocBits::Bits19,
    model_data: [
        0x88, 0x70, 0xAA, 0x10, 0xAD, 0x90, 0xB0, 0x60, 0xB3, 0xF0, 0xB7, 0x00, 0xB8, 0xF0, 0xBC, 0x50,
        0xBF, 0xE0, 0xC2, 0x00, 0xC4, 0x60, 0xC7, 0x40, 0xCA, 0xD0, 0xCC, 0x40, 0xCD, 0x00, 0xDA, 0xC0,
        0x00, 0x40, 0x07, 0x00, 0x0C, 0x00, 0x10, 0x40, 0x13, 0x00, 0x1D, 0x60, 0x19, 0x20, 0x1A, 0xE0,
        0x13, 0xC0, 0x15, 0x80, 0x11, 0xC0, 0x13, 0x20, 0x3D, 0x00, 0x5E, 0x60, 0x01, 0x20, 0x01, 0x20,
    ],
};

/// LG INR18650, 1S4P pack.
pub const LG_INR18650_1S4P: ModelConfig = ModelConfig {
    empty_adjustment: 0,
    full_adjustment: 100,
    rcomp0: 123,
    temp_co_up: 0.0,
    temp_co_down: 0.0,
    ocv_test: 56176,
    soc_check_a: 225,
    soc_check_b: 227,
    bits: SocBits::Bits19,
    model_data: [
        0x99, 0x20, 0xA6, 0xA0, 0xA9, 0x50, 0xAC, 0x40, 0xB0, 0x60, 0xB3, 0x20, 0xB4, 0xF0, 0xB7, 0x60,
        0xBB, 0xF0, 0xBE, 0xC0, 0xC2, 0x00, 0xC5, 0x50, 0xC8, 0xF0, 0xCB, 0x10, 0xCD, 0x10, 0xD1, 0x70,
        0x01, 0x20, 0x14, 0x40, 0x0A, 0xA0, 0x0C, 0x40, 0x1A, 0x00, 0x23, 0x20, 0x1D, 0xE0, 0x0F, 0xA0,
        0x0A, 0x60, 0x13, 0x80, 0x11, 0xE0, 0x0F, 0x00, 0x11, 0x40, 0x27, 0x80, 0x0A, 0xA0, 0x0A, 0xA0,
    ],
};

const _: () = assert!(LG_INR21700.validate().is_ok());
const _: () = assert!(LG_INR18650_1S4P.validate().is_ok());
