//! Region timing of the reference bus.
//!
//! ```text
//! Region        Bus   N16/S16        N32/S32
//! 00 BIOS       32    1/1            1/1
//! 02 EWRAM      16    3/3            6/6
//! 03 IWRAM      32    1/1            1/1
//! 04 I/O        32    1/1            1/1
//! 05 Palette    16    1/1            2/2
//! 06 VRAM       16    1/1            2/2
//! 07 OAM        32    1/1            1/1
//! 08-0D ROM     16    1+N / 1+S      N16+S16 / 2*S16
//! 0E-0F SRAM    8     1+N            1+N
//! ```
//!
//! The ROM and SRAM wait states come from [`WaitControl`].

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

const FIRST_ACCESS_WAITS: [i32; 4] = [4, 3, 2, 8];

/// Wait-state control register of the cartridge bus.
///
/// ```text
/// Bit   Meaning
/// 0-1   SRAM wait            (0..3 = 4,3,2,8 cycles)
/// 2-3   ROM window 0 first   (0..3 = 4,3,2,8 cycles)
/// 4     ROM window 0 second  (0..1 = 2,1 cycles)
/// 5-6   ROM window 1 first   (0..3 = 4,3,2,8 cycles)
/// 7     ROM window 1 second  (0..1 = 4,1 cycles)
/// 8-9   ROM window 2 first   (0..3 = 4,3,2,8 cycles)
/// 10    ROM window 2 second  (0..1 = 8,1 cycles)
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitControl {
    pub sram: u8,
    pub ws0_first: u8,
    pub ws0_second: bool,
    pub ws1_first: u8,
    pub ws1_second: bool,
    pub ws2_first: u8,
    pub ws2_second: bool,
}

impl From<u16> for WaitControl {
    fn from(raw: u16) -> Self {
        Self {
            sram: raw.get_bits(0..=1) as u8,
            ws0_first: raw.get_bits(2..=3) as u8,
            ws0_second: raw.get_bit(4),
            ws1_first: raw.get_bits(5..=6) as u8,
            ws1_second: raw.get_bit(7),
            ws2_first: raw.get_bits(8..=9) as u8,
            ws2_second: raw.get_bit(10),
        }
    }
}

impl From<WaitControl> for u16 {
    fn from(control: WaitControl) -> Self {
        Self::from(control.sram & 0b11)
            | Self::from(control.ws0_first & 0b11) << 2
            | Self::from(control.ws0_second) << 4
            | Self::from(control.ws1_first & 0b11) << 5
            | Self::from(control.ws1_second) << 7
            | Self::from(control.ws2_first & 0b11) << 8
            | Self::from(control.ws2_second) << 10
    }
}

/// Cycles per access, indexed by address bits 24-27.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitStateTable {
    non_sequential_16: [i32; 16],
    sequential_16: [i32; 16],
    non_sequential_32: [i32; 16],
    sequential_32: [i32; 16],
}

impl Default for WaitStateTable {
    fn default() -> Self {
        Self::new(WaitControl::default())
    }
}

impl WaitStateTable {
    #[must_use]
    pub fn new(control: WaitControl) -> Self {
        let mut table = Self {
            non_sequential_16: [1; 16],
            sequential_16: [1; 16],
            non_sequential_32: [1; 16],
            sequential_32: [1; 16],
        };

        // 16-bit regions with fixed waits.
        for (region, cycles) in [(0x2, 3), (0x5, 1), (0x6, 1)] {
            table.set_16bit_region(region, cycles, cycles);
        }

        let rom_windows = [
            (0x8, control.ws0_first, if control.ws0_second { 1 } else { 2 }),
            (0xA, control.ws1_first, if control.ws1_second { 1 } else { 4 }),
            (0xC, control.ws2_first, if control.ws2_second { 1 } else { 8 }),
        ];
        for (region, first, second) in rom_windows {
            let n = 1 + FIRST_ACCESS_WAITS[usize::from(first & 0b11)];
            let s = 1 + second;
            table.set_16bit_region(region, n, s);
            table.set_16bit_region(region + 1, n, s);
        }

        // SRAM sits on an 8-bit bus and only ever moves one byte per access.
        let sram = 1 + FIRST_ACCESS_WAITS[usize::from(control.sram & 0b11)];
        for region in [0xE, 0xF] {
            table.non_sequential_16[region] = sram;
            table.sequential_16[region] = sram;
            table.non_sequential_32[region] = sram;
            table.sequential_32[region] = sram;
        }

        table
    }

    const fn set_16bit_region(&mut self, region: usize, n: i32, s: i32) {
        self.non_sequential_16[region] = n;
        self.sequential_16[region] = s;
        // A word goes through as two halfwords, the second one sequential.
        self.non_sequential_32[region] = n + s;
        self.sequential_32[region] = s + s;
    }

    #[must_use]
    pub fn cycles(&self, sequential: bool, is_32bit: bool, address: u32) -> i32 {
        if address >= 0x1000_0000 {
            return 1;
        }
        let region = (address >> 24) as usize & 0xF;
        match (sequential, is_32bit) {
            (false, false) => self.non_sequential_16[region],
            (true, false) => self.sequential_16[region],
            (false, true) => self.non_sequential_32[region],
            (true, true) => self.sequential_32[region],
        }
    }
}
