use crate::memory::Bus;

const SIZE: usize = 0x10_0000;

/// 1 MiB of flat memory, mirrored over the whole address space, with a
/// uniform cost per access.
pub struct TestMemory {
    data: Vec<u8>,
    pub sequential_cycles: i32,
    pub non_sequential_cycles: i32,
    /// Every store as (address, width in bytes).
    pub writes: Vec<(u32, u32)>,
}

impl Default for TestMemory {
    fn default() -> Self {
        Self {
            data: vec![0; SIZE],
            sequential_cycles: 1,
            non_sequential_cycles: 1,
            writes: Vec::new(),
        }
    }
}

impl TestMemory {
    pub fn with_arm_program(base: u32, program: &[u32]) -> Self {
        let mut memory = Self::default();
        memory.load_arm(base, program);
        memory
    }

    pub fn with_thumb_program(base: u32, program: &[u16]) -> Self {
        let mut memory = Self::default();
        memory.load_thumb(base, program);
        memory
    }

    pub fn load_arm(&mut self, base: u32, program: &[u32]) {
        for (i, op) in program.iter().enumerate() {
            self.poke_word(base.wrapping_add(4 * i as u32), *op);
        }
    }

    pub fn load_thumb(&mut self, base: u32, program: &[u16]) {
        for (i, op) in program.iter().enumerate() {
            let address = base + 2 * i as u32;
            for (j, byte) in op.to_le_bytes().into_iter().enumerate() {
                self.data[Self::index(address + j as u32)] = byte;
            }
        }
    }

    pub fn poke_word(&mut self, address: u32, value: u32) {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.data[Self::index(address.wrapping_add(i as u32))] = byte;
        }
    }

    pub fn peek_word(&self, address: u32) -> u32 {
        u32::from_le_bytes(std::array::from_fn(|i| self.data[Self::index(address.wrapping_add(i as u32))]))
    }

    pub fn peek_byte(&self, address: u32) -> u8 {
        self.data[Self::index(address)]
    }

    const fn index(address: u32) -> usize {
        address as usize & (SIZE - 1)
    }
}

impl Bus for TestMemory {
    fn read_byte(&mut self, address: u32) -> u8 {
        self.data[Self::index(address)]
    }

    fn read_half_word(&mut self, address: u32) -> u16 {
        u16::from_le_bytes([
            self.data[Self::index(address)],
            self.data[Self::index(address.wrapping_add(1))],
        ])
    }

    fn read_word(&mut self, address: u32) -> u32 {
        self.peek_word(address)
    }

    fn write_byte(&mut self, address: u32, value: u8) {
        self.writes.push((address, 1));
        self.data[Self::index(address)] = value;
    }

    fn write_half_word(&mut self, address: u32, value: u16) {
        self.writes.push((address, 2));
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.data[Self::index(address.wrapping_add(i as u32))] = byte;
        }
    }

    fn write_word(&mut self, address: u32, value: u32) {
        self.writes.push((address, 4));
        self.poke_word(address, value);
    }

    fn access_cycles(&self, sequential: bool, _is_32bit: bool, _address: u32) -> i32 {
        if sequential {
            self.sequential_cycles
        } else {
            self.non_sequential_cycles
        }
    }
}
