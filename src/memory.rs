// General Memory Map
// 0000-3FFF   16KB ROM Bank 00     (in cartridge, fixed)
// 4000-7FFF   16KB ROM Bank 01..NN (in cartridge, switchable bank number)
// 8000-9FFF   8KB Video RAM (VRAM)
// A000-BFFF   8KB External RAM     (in cartridge, switchable bank, if any)
// C000-DFFF   8KB Work RAM (WRAM)
// E000-FDFF   Same as C000-DDFF (ECHO)
// FE00-FE9F   Sprite Attribute Table (OAM)
// FEA0-FEFF   Not Usable
// FF00-FF7F   I/O Ports
// FF80-FFFE   High RAM (HRAM)
// FFFF        Interrupt Enable Register
pub trait Memory {
    fn get(&self, a: u16) -> u8;

    fn set(&mut self, a: u16, v: u8);

    fn get_word(&self, a: u16) -> u16 {
        u16::from(self.get(a)) | (u16::from(self.get(a.wrapping_add(1))) << 8)
    }

    fn set_word(&mut self, a: u16, v: u16) {
        self.set(a, (v & 0xff) as u8);
        self.set(a.wrapping_add(1), (v >> 8) as u8)
    }
}

// The four fixed RAM regions that are not owned by the cartridge: high
// RAM, work RAM, video RAM, and the sprite attribute table. All zeroed at
// power-up.
pub struct Ram {
    pub hram: [u8; 0x7f],
    pub wram: [u8; 0x2000],
    pub vram: [u8; 0x2000],
    pub oam: [u8; 0xa0],
}

impl Ram {
    pub fn power_up() -> Self {
        Self { hram: [0x00; 0x7f], wram: [0x00; 0x2000], vram: [0x00; 0x2000], oam: [0x00; 0xa0] }
    }
}
