//! # Memory Interface
//!
//! The core never owns backing storage. It talks to a [`Bus`] for every
//! fetch, load and store, and asks the same bus what each access costs.
//! Addresses handed to the bus are already aligned to the access width;
//! rotation of misaligned loads happens in the core.

#[allow(clippy::cast_possible_truncation)]
pub mod system_bus;

#[cfg(test)]
pub mod test_memory;

pub mod wait_states;

pub use system_bus::SystemBus;
pub use wait_states::{WaitControl, WaitStateTable};

pub trait Bus {
    fn read_byte(&mut self, address: u32) -> u8;

    fn read_half_word(&mut self, address: u32) -> u16;

    fn read_word(&mut self, address: u32) -> u32;

    fn write_byte(&mut self, address: u32, value: u8);

    fn write_half_word(&mut self, address: u32, value: u16);

    fn write_word(&mut self, address: u32, value: u32);

    /// Cycles taken by one access, wait states included. A 32-bit access on
    /// a 16-bit region costs both halves.
    fn access_cycles(&self, sequential: bool, is_32bit: bool, address: u32) -> i32;
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn read_byte(&mut self, address: u32) -> u8 {
        (**self).read_byte(address)
    }

    fn read_half_word(&mut self, address: u32) -> u16 {
        (**self).read_half_word(address)
    }

    fn read_word(&mut self, address: u32) -> u32 {
        (**self).read_word(address)
    }

    fn write_byte(&mut self, address: u32, value: u8) {
        (**self).write_byte(address, value);
    }

    fn write_half_word(&mut self, address: u32, value: u16) {
        (**self).write_half_word(address, value);
    }

    fn write_word(&mut self, address: u32, value: u32) {
        (**self).write_word(address, value);
    }

    fn access_cycles(&self, sequential: bool, is_32bit: bool, address: u32) -> i32 {
        (**self).access_cycles(sequential, is_32bit, address)
    }
}
