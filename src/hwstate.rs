// Interrupt enable/flag register, the IME latch, the CPU halt flag, and
// the DIV/TIMA timer chain all live together here because they are read
// and mutated from the same handful of bus addresses (FF04-FF07, FF0F,
// FFFF) and because the CPU's interrupt-service step needs to see all of
// them in one place.
//
// See: http://gbdev.gg8.se/wiki/articles/Timer_and_Divider_Registers
// See: http://bgb.bircd.org/pandocs.htm#interrupts

#[derive(Clone, Copy, Eq, PartialEq)]
pub enum Ime {
    Off,
    Pending,
    On,
}

#[rustfmt::skip]
#[derive(Clone, Copy)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer   = 2,
    Serial  = 3,
    Joypad  = 4,
}

impl Interrupt {
    pub fn addr(self) -> u16 {
        match self {
            Interrupt::VBlank => 0x0040,
            Interrupt::LcdStat => 0x0048,
            Interrupt::Timer => 0x0050,
            Interrupt::Serial => 0x0058,
            Interrupt::Joypad => 0x0060,
        }
    }

    // Fixed priority order: vblank, lcd, timer, serial, joypad.
    const ORDER: [Interrupt; 5] =
        [Interrupt::VBlank, Interrupt::LcdStat, Interrupt::Timer, Interrupt::Serial, Interrupt::Joypad];
}

pub struct HWState {
    pub int_enable: u8,
    pub int_flags: u8,
    pub ime: Ime,
    pub cpu_halt: bool,

    div: u8,
    tima: u8,
    tma: u8,
    tac: u8,
    div_clock: i16,
    tima_clock: i16,
    tima_clock_limit: i16,
}

impl HWState {
    pub fn power_up() -> Self {
        Self {
            int_enable: 0x00,
            int_flags: 0x00,
            ime: Ime::On,
            cpu_halt: false,
            div: 0x00,
            tima: 0x00,
            tma: 0x00,
            tac: 0x00,
            div_clock: 0,
            tima_clock: 0,
            tima_clock_limit: 1024,
        }
    }

    pub fn request(&mut self, i: Interrupt) {
        self.int_flags |= 1 << (i as u8);
    }

    pub fn pending(&self) -> bool {
        self.int_flags & self.int_enable & 0x1f != 0x00
    }

    pub fn get(&self, a: u16) -> u8 {
        match a {
            0xff04 => self.div,
            0xff05 => self.tima,
            0xff06 => self.tma,
            0xff07 => self.tac | 0xf8,
            0xff0f => self.int_flags | 0xe0,
            0xffff => self.int_enable,
            _ => unreachable!("HWState does not own address {:#06x}", a),
        }
    }

    pub fn set(&mut self, a: u16, v: u8) {
        match a {
            0xff04 => {
                self.div = 0x00;
                self.div_clock = 0;
            }
            0xff05 => self.tima = v,
            0xff06 => self.tma = v,
            0xff07 => {
                self.tac = v & 0x07;
                self.tima_clock_limit = match v & 0x03 {
                    0b00 => 1024,
                    0b01 => 16,
                    0b10 => 64,
                    _ => 256,
                };
            }
            0xff0f => self.int_flags = v & 0x1f,
            0xffff => self.int_enable = v & 0x1f,
            _ => unreachable!("HWState does not own address {:#06x}", a),
        }
    }

    // DIV increments every 256 cycles regardless of TAC. TIMA ticks only
    // when TAC bit 2 is set, at the rate TAC's low two bits select.
    pub fn next(&mut self, cycles: i16) {
        self.div_clock += cycles;
        while self.div_clock >= 256 {
            self.div_clock -= 256;
            self.div = self.div.wrapping_add(1);
        }

        if self.tac & 0x04 == 0x00 {
            return;
        }
        self.tima_clock += cycles;
        while self.tima_clock >= self.tima_clock_limit {
            self.tima_clock -= self.tima_clock_limit;
            let (r, overflow) = self.tima.overflowing_add(1);
            if overflow {
                self.tima = self.tma;
                self.request(Interrupt::Timer);
            } else {
                self.tima = r;
            }
        }
    }

    // EI sets Pending; the instruction after EI runs with IME still
    // effectively off, then IME flips On. DI is immediate.
    pub fn step_ime(&mut self) {
        if self.ime == Ime::Pending {
            self.ime = Ime::On;
        }
    }

    // Returns the cycle cost of this service pass, and the handler
    // address to dispatch to if an interrupt was actually taken. Halt is
    // cleared whenever a pending interrupt appears, even with IME off;
    // dispatch only happens when IME is On.
    pub fn service(&mut self) -> (u32, Option<u16>) {
        if !self.pending() {
            return (0, None);
        }
        let mut cost = 0;
        if self.cpu_halt {
            self.cpu_halt = false;
            cost += 4;
        }
        if self.ime != Ime::On {
            return (cost, None);
        }
        for i in Interrupt::ORDER {
            let mask = 1 << (i as u8);
            if self.int_flags & self.int_enable & mask != 0 {
                self.int_flags &= !mask;
                self.ime = Ime::Off;
                return (cost + 20, Some(i.addr()));
            }
        }
        (cost, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tima_ticks_at_selected_divisor() {
        let mut hw = HWState::power_up();
        hw.set(0xff07, 0x05); // enabled, divisor 16
        hw.next(16);
        assert_eq!(hw.get(0xff05), 1);
    }

    #[test]
    fn tima_overflow_reloads_from_tma_and_requests_interrupt() {
        let mut hw = HWState::power_up();
        hw.set(0xff06, 0x42);
        hw.set(0xff07, 0x05);
        hw.set(0xff05, 0xff);
        hw.next(16);
        assert_eq!(hw.get(0xff05), 0x42);
        assert_ne!(hw.get(0xff0f) & 0x04, 0);
    }

    #[test]
    fn div_write_resets_to_zero() {
        let mut hw = HWState::power_up();
        hw.next(300);
        assert_ne!(hw.get(0xff04), 0);
        hw.set(0xff04, 0x99);
        assert_eq!(hw.get(0xff04), 0);
    }

    #[test]
    fn ei_takes_effect_after_one_instruction() {
        let mut hw = HWState::power_up();
        hw.ime = Ime::Off;
        hw.ime = Ime::Pending;
        hw.request(Interrupt::VBlank);
        hw.int_enable = 0x01;
        // Pending should not service yet: IME only becomes On after the
        // step_ime() call that follows the *next* dispatched instruction.
        let (cost, addr) = hw.service();
        assert_eq!(cost, 0);
        assert_eq!(addr, None);
        hw.step_ime();
        assert_eq!(hw.ime, Ime::On);
        let (cost, addr) = hw.service();
        assert_eq!(cost, 20);
        assert_eq!(addr, Some(Interrupt::VBlank.addr()));
    }
}
