//! AXP192 / AXP202 power management, just enough to switch the GPS rail on.

use embedded_hal::i2c::I2c;

pub const AXP192_ADDRESS: u8 = 0x34;
pub const AXP202_ADDRESS: u8 = 0x35;

const REG_IC_TYPE: u8 = 0x03;
const REG_POWER_OUTPUT: u8 = 0x12;
const REG_LDO3_MODE: u8 = 0x29;

const AXP192_CHIP_ID: u8 = 0x03;
const AXP202_CHIP_ID: u8 = 0x41;

const AXP192_LDO3_ENABLE: u8 = 1 << 3;
const AXP202_LDO3_ENABLE: u8 = 1 << 6;
// set selects switch mode, clear is a regulated LDO
const AXP202_LDO3_SWITCH_MODE: u8 = 1 << 7;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PmuChip {
    Axp192,
    Axp202,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PmuError<E> {
    Bus(E),
    UnknownChip(u8),
}

fn read_register<I2C: I2c>(i2c: &mut I2C, address: u8, register: u8) -> Result<u8, I2C::Error> {
    let mut value = [0u8];
    i2c.write_read(address, &[register], &mut value)?;
    Ok(value[0])
}

fn update_register<I2C: I2c>(
    i2c: &mut I2C,
    address: u8,
    register: u8,
    set: u8,
    clear: u8,
) -> Result<(), I2C::Error> {
    let value = read_register(i2c, address, register)?;
    i2c.write(address, &[register, (value & !clear) | set])
}

/// Identify the chip answering at `address`
pub fn detect<I2C: I2c>(i2c: &mut I2C, address: u8) -> Result<PmuChip, PmuError<I2C::Error>> {
    match read_register(i2c, address, REG_IC_TYPE).map_err(PmuError::Bus)? {
        AXP192_CHIP_ID => Ok(PmuChip::Axp192),
        AXP202_CHIP_ID => Ok(PmuChip::Axp202),
        other => Err(PmuError::UnknownChip(other)),
    }
}

/// Switch LDO3, the GPS supply on T-Beam style boards, on as a regulator
pub fn enable_ldo3<I2C: I2c>(
    i2c: &mut I2C,
    address: u8,
    chip: PmuChip,
) -> Result<(), I2C::Error> {
    match chip {
        PmuChip::Axp192 => update_register(i2c, address, REG_POWER_OUTPUT, AXP192_LDO3_ENABLE, 0),
        PmuChip::Axp202 => {
            update_register(i2c, address, REG_LDO3_MODE, 0, AXP202_LDO3_SWITCH_MODE)?;
            update_register(i2c, address, REG_POWER_OUTPUT, AXP202_LDO3_ENABLE, 0)
        }
    }
}

/// Best effort: probe both PMU addresses and power the GPS from the first
/// chip found. Boards without a PMU carry on without one.
pub fn power_up_gps<I2C: I2c>(i2c: &mut I2C) -> Option<PmuChip> {
    for address in [AXP192_ADDRESS, AXP202_ADDRESS] {
        let chip = match detect(i2c, address) {
            Ok(chip) => chip,
            Err(e) => {
                log::debug!("[pmu] nothing usable at {:#04x}: {:?}", address, e);
                continue;
            }
        };

        return match enable_ldo3(i2c, address, chip) {
            Ok(()) => {
                log::info!("[pmu] {:?} at {:#04x}, LDO3 on (GPS powered)", chip, address);
                Some(chip)
            }
            Err(e) => {
                log::warn!("[pmu] {:?} found but enabling LDO3 failed: {:?}", chip, e);
                None
            }
        };
    }

    log::info!("[pmu] no PMU detected, continuing without one");
    None
}
