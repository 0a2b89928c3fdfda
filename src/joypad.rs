// The P1 register (FF00) is unusual: writes only ever set bits 5/4 (the
// column-select), and reads mux in whichever row of buttons that select
// points at. Both rows are held internally as "0 = pressed" bitmasks to
// match the register's active-low convention directly.

use crate::hwstate::{HWState, Interrupt};

#[derive(Clone, Copy)]
pub enum JoypadKey {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

pub struct Joypad {
    matrix: u8,
    select: u8,
}

impl Joypad {
    pub fn power_up() -> Self {
        Self { matrix: 0xff, select: 0x00 }
    }

    pub fn get(&self) -> u8 {
        if self.select & 0x30 == 0x00 {
            return self.select | (self.matrix & (self.matrix >> 4) & 0x0f);
        }
        if self.select & 0x10 == 0x00 {
            return self.select | (self.matrix & 0x0f);
        }
        if self.select & 0x20 == 0x00 {
            return self.select | (self.matrix >> 4);
        }
        self.select | 0x0f
    }

    pub fn set(&mut self, v: u8) {
        self.select = v & 0x30;
    }

    pub fn keydown(&mut self, key: JoypadKey, hw: &mut HWState) {
        self.matrix &= !(1 << key_bit(key));
        hw.request(Interrupt::Joypad);
    }

    pub fn keyup(&mut self, key: JoypadKey) {
        self.matrix |= 1 << key_bit(key);
    }
}

fn key_bit(key: JoypadKey) -> u8 {
    match key {
        JoypadKey::Right => 0,
        JoypadKey::Left => 1,
        JoypadKey::Up => 2,
        JoypadKey::Down => 3,
        JoypadKey::A => 4,
        JoypadKey::B => 5,
        JoypadKey::Select => 6,
        JoypadKey::Start => 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_row_reads_through_select_bit4() {
        let mut jp = Joypad::power_up();
        jp.set(0x10);
        jp.keydown(JoypadKey::Right, &mut HWState::power_up());
        assert_eq!(jp.get() & 0x01, 0x00);
        assert_eq!(jp.get() & 0x02, 0x02);
    }

    #[test]
    fn button_row_reads_through_select_bit5() {
        let mut jp = Joypad::power_up();
        jp.set(0x20);
        jp.keydown(JoypadKey::A, &mut HWState::power_up());
        assert_eq!(jp.get() & 0x01, 0x00);
    }

    #[test]
    fn keydown_requests_joypad_interrupt() {
        let mut jp = Joypad::power_up();
        let mut hw = HWState::power_up();
        jp.keydown(JoypadKey::Start, &mut hw);
        assert_ne!(hw.get(0xff0f) & 0x10, 0);
    }

    #[test]
    fn keyup_clears_matrix_bit() {
        let mut jp = Joypad::power_up();
        let mut hw = HWState::power_up();
        jp.set(0x10);
        jp.keydown(JoypadKey::Down, &mut hw);
        jp.keyup(JoypadKey::Down);
        assert_eq!(jp.get() & 0x08, 0x08);
    }

    #[test]
    fn both_rows_selected_reads_their_and() {
        let mut jp = Joypad::power_up();
        let mut hw = HWState::power_up();
        jp.set(0x00);
        jp.keydown(JoypadKey::Right, &mut hw);
        assert_eq!(jp.get() & 0x01, 0x00);
        jp.keyup(JoypadKey::Right);
        assert_eq!(jp.get() & 0x0f, 0x0f);
        jp.keydown(JoypadKey::Right, &mut hw);
        jp.keydown(JoypadKey::A, &mut hw);
        assert_eq!(jp.get() & 0x01, 0x00);
    }

    #[test]
    fn neither_row_selected_reads_all_ones() {
        let mut jp = Joypad::power_up();
        let mut hw = HWState::power_up();
        jp.set(0x30);
        jp.keydown(JoypadKey::Right, &mut hw);
        assert_eq!(jp.get() & 0x0f, 0x0f);
    }
}
