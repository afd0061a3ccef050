use crate::bitwise::Bits;
use crate::error::LoadError;
use crate::memory::wait_states::{WaitControl, WaitStateTable};
use crate::memory::Bus;

const BIOS_SIZE: usize = 0x4000;
const EWRAM_SIZE: usize = 0x4_0000;
const IWRAM_SIZE: usize = 0x8000;
const IO_SIZE: usize = 0x400;
const PALETTE_SIZE: usize = 0x400;
const VRAM_SIZE: usize = 0x1_8000;
const OAM_SIZE: usize = 0x400;
const ROM_MAX_SIZE: usize = 0x200_0000;
const SRAM_SIZE: usize = 0x1_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Bios,
    Ewram,
    Iwram,
    Io,
    Palette,
    Vram,
    Oam,
    Rom,
    Sram,
    Unmapped,
}

/// A plain memory map with the handheld's layout and timing.
///
/// Every region is passive storage: I/O registers read back what was
/// written. ROM and BIOS ignore stores.
pub struct SystemBus {
    /// From 0x00000000 to 0x00003FFF.
    bios: Vec<u8>,

    /// From 0x02000000, 256 KiB mirrored up to 0x02FFFFFF.
    ewram: Vec<u8>,

    /// From 0x03000000, 32 KiB mirrored up to 0x03FFFFFF.
    iwram: Vec<u8>,

    /// From 0x04000000 to 0x040003FF.
    io: Vec<u8>,

    palette: Vec<u8>,
    vram: Vec<u8>,
    oam: Vec<u8>,

    /// Visible in the three windows at 0x08000000, 0x0A000000 and 0x0C000000.
    rom: Vec<u8>,

    /// From 0x0E000000, 64 KiB mirrored up to 0x0FFFFFFF.
    sram: Vec<u8>,

    wait_control: WaitControl,
    wait_states: WaitStateTable,
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new(WaitControl::default())
    }
}

impl SystemBus {
    #[must_use]
    pub fn new(wait_control: WaitControl) -> Self {
        Self {
            bios: vec![0; BIOS_SIZE],
            ewram: vec![0; EWRAM_SIZE],
            iwram: vec![0; IWRAM_SIZE],
            io: vec![0; IO_SIZE],
            palette: vec![0; PALETTE_SIZE],
            vram: vec![0; VRAM_SIZE],
            oam: vec![0; OAM_SIZE],
            rom: Vec::new(),
            sram: vec![0; SRAM_SIZE],
            wait_control,
            wait_states: WaitStateTable::new(wait_control),
        }
    }

    #[must_use]
    pub const fn wait_control(&self) -> WaitControl {
        self.wait_control
    }

    pub fn set_wait_control(&mut self, wait_control: WaitControl) {
        self.wait_control = wait_control;
        self.wait_states = WaitStateTable::new(wait_control);
    }

    /// Copies `data` into the map at `address`, bypassing write protection.
    /// Loading into the cartridge window grows the ROM as needed.
    ///
    /// # Errors
    ///
    /// Fails when the data does not fit the region starting at `address`.
    pub fn load(&mut self, address: u32, data: &[u8]) -> Result<(), LoadError> {
        let (region, offset) = locate(address);
        let does_not_fit = LoadError::DoesNotFit {
            address,
            len: data.len(),
        };

        let storage = match region {
            Region::Rom => {
                let end = offset + data.len();
                if end > ROM_MAX_SIZE {
                    return Err(does_not_fit);
                }
                if self.rom.len() < end {
                    self.rom.resize(end, 0);
                }
                &mut self.rom
            }
            Region::Unmapped => return Err(does_not_fit),
            _ => self.storage_mut(region),
        };

        let target = storage
            .get_mut(offset..offset + data.len())
            .ok_or(does_not_fit)?;
        target.copy_from_slice(data);

        tracing::debug!("loaded {} bytes at {address:#010x}", data.len());
        Ok(())
    }

    fn storage(&self, region: Region) -> &[u8] {
        match region {
            Region::Bios => &self.bios,
            Region::Ewram => &self.ewram,
            Region::Iwram => &self.iwram,
            Region::Io => &self.io,
            Region::Palette => &self.palette,
            Region::Vram => &self.vram,
            Region::Oam => &self.oam,
            Region::Rom => &self.rom,
            Region::Sram => &self.sram,
            Region::Unmapped => &[],
        }
    }

    fn storage_mut(&mut self, region: Region) -> &mut Vec<u8> {
        match region {
            Region::Bios => &mut self.bios,
            Region::Ewram => &mut self.ewram,
            Region::Iwram => &mut self.iwram,
            Region::Io => &mut self.io,
            Region::Palette => &mut self.palette,
            Region::Vram => &mut self.vram,
            Region::Oam => &mut self.oam,
            Region::Rom | Region::Unmapped => &mut self.rom,
            Region::Sram => &mut self.sram,
        }
    }

    fn read_raw(&self, address: u32) -> u8 {
        let (region, offset) = locate(address);
        match region {
            Region::Unmapped => {
                tracing::trace!("read on unused memory {address:#010x}");
                0
            }
            // Past the end of the cartridge the bus still holds the low
            // halfword of the requested halfword address.
            Region::Rom if offset >= self.rom.len() => {
                (((address >> 1) & 0xFFFF) as u16).get_byte((address & 1) as u8)
            }
            _ => self.storage(region).get(offset).copied().unwrap_or(0),
        }
    }

    fn write_raw(&mut self, address: u32, value: u8) {
        let (region, offset) = locate(address);
        match region {
            Region::Bios | Region::Rom | Region::Unmapped => {
                tracing::trace!("ignored write of {value:#04x} at {address:#010x}");
            }
            _ => {
                if let Some(slot) = self.storage_mut(region).get_mut(offset) {
                    *slot = value;
                }
            }
        }
    }
}

fn locate(address: u32) -> (Region, usize) {
    let address = address as usize;
    match address >> 24 {
        0x00 if address < BIOS_SIZE => (Region::Bios, address),
        0x02 => (Region::Ewram, address & (EWRAM_SIZE - 1)),
        0x03 => (Region::Iwram, address & (IWRAM_SIZE - 1)),
        0x04 if address & 0x00FF_FFFF < IO_SIZE => (Region::Io, address & (IO_SIZE - 1)),
        0x05 => (Region::Palette, address & (PALETTE_SIZE - 1)),
        0x06 => {
            // 96 KiB in a 128 KiB window: the last 32 KiB mirror the previous 32 KiB.
            let offset = address & 0x1_FFFF;
            let offset = if offset >= VRAM_SIZE { offset - 0x8000 } else { offset };
            (Region::Vram, offset)
        }
        0x07 => (Region::Oam, address & (OAM_SIZE - 1)),
        0x08..=0x0D => (Region::Rom, address & (ROM_MAX_SIZE - 1)),
        0x0E..=0x0F => (Region::Sram, address & (SRAM_SIZE - 1)),
        _ => (Region::Unmapped, 0),
    }
}

impl Bus for SystemBus {
    fn read_byte(&mut self, address: u32) -> u8 {
        self.read_raw(address)
    }

    fn read_half_word(&mut self, address: u32) -> u16 {
        u16::from_le_bytes([self.read_raw(address), self.read_raw(address.wrapping_add(1))])
    }

    fn read_word(&mut self, address: u32) -> u32 {
        u32::from_le_bytes([
            self.read_raw(address),
            self.read_raw(address.wrapping_add(1)),
            self.read_raw(address.wrapping_add(2)),
            self.read_raw(address.wrapping_add(3)),
        ])
    }

    fn write_byte(&mut self, address: u32, value: u8) {
        self.write_raw(address, value);
    }

    fn write_half_word(&mut self, address: u32, value: u16) {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write_raw(address.wrapping_add(i as u32), byte);
        }
    }

    fn write_word(&mut self, address: u32, value: u32) {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write_raw(address.wrapping_add(i as u32), byte);
        }
    }

    fn access_cycles(&self, sequential: bool, is_32bit: bool, address: u32) -> i32 {
        self.wait_states.cycles(sequential, is_32bit, address)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn check_write_work_ram() {
        let mut bus = SystemBus::default();
        bus.write_byte(0x0300_0005, 5);
        assert_eq!(bus.iwram[5], 5);
        bus.write_word(0x0200_0010, 0xDEAD_BEEF);
        assert_eq!(bus.read_word(0x0200_0010), 0xDEAD_BEEF);
        assert_eq!(bus.read_half_word(0x0200_0012), 0xDEAD);
    }

    #[test]
    fn check_mirror_iram() {
        let mut bus = SystemBus::default();
        bus.iwram[0x21FF] = 5;
        assert_eq!(bus.read_byte(0x0300_A1FF), 5);
        assert_eq!(bus.read_byte(0x03FF_A1FF), 5);
        bus.write_byte(0x03FF_F1FF, 1);
        assert_eq!(bus.iwram[0x71FF], 1);
    }

    #[test]
    fn check_mirror_wram() {
        let mut bus = SystemBus::default();
        bus.ewram[0x01_0003] = 5;
        assert_eq!(bus.read_byte(0x0205_0003), 5);
        assert_eq!(bus.read_byte(0x02F5_0003), 5);
    }

    #[test]
    fn check_vram_mirror() {
        let mut bus = SystemBus::default();
        bus.write_byte(0x0601_0004, 9);
        assert_eq!(bus.read_byte(0x0601_8004), 9);
    }

    #[test]
    fn check_rom_is_read_only() {
        let mut bus = SystemBus::default();
        bus.load(0x0800_0000, &[1, 2, 3, 4]).unwrap();
        bus.write_byte(0x0800_0000, 0xFF);
        assert_eq!(bus.read_word(0x0800_0000), 0x0403_0201);
        assert_eq!(bus.read_word(0x0A00_0000), 0x0403_0201);
    }

    #[test]
    fn check_rom_past_end() {
        let mut bus = SystemBus::default();
        bus.load(0x0800_0000, &[1, 2, 3, 4]).unwrap();
        assert_eq!(bus.read_byte(0x09FF_FFFF), 0xFF);
        assert_eq!(bus.read_byte(0x09FF_FFEE), 0xF7);
    }

    #[test]
    fn check_load_out_of_bounds() {
        let mut bus = SystemBus::default();
        assert_eq!(
            bus.load(0x0300_7FFE, &[0; 4]),
            Err(LoadError::DoesNotFit {
                address: 0x0300_7FFE,
                len: 4
            })
        );
        assert!(bus.load(0x1000_0000, &[0]).is_err());
        assert!(bus.load(0x0000_0000, &[0; BIOS_SIZE]).is_ok());
    }

    #[test]
    fn check_unmapped_reads_zero() {
        let mut bus = SystemBus::default();
        bus.write_word(0x0100_0000, 0xFFFF_FFFF);
        assert_eq!(bus.read_word(0x0100_0000), 0);
    }

    #[test]
    fn check_access_cycles_follow_wait_control() {
        let mut bus = SystemBus::default();
        assert_eq!(bus.access_cycles(false, false, 0x0800_0000), 5);
        bus.set_wait_control(WaitControl::from(0x4317));
        assert_eq!(bus.access_cycles(false, false, 0x0800_0000), 4);
    }
}
