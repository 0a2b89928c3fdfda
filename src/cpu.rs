// The instruction interpreter: one 256-entry unprefixed dispatch plus a
// 256-entry CB-prefixed sub-dispatch, built the way the teacher's cpu.rs
// builds it (an `alu_*` helper per flag-bearing operation, a `match` over
// the opcode byte rather than a function-pointer table) but re-costed in
// T-cycle units with the conditional-branch deltas made explicit, per
// this crate's expanded spec.

use crate::bus::Bus;
use crate::hwstate::Ime;
use crate::memory::Memory;
use crate::register::{Registers, FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

const UNDEFINED_OPCODES: [u8; 11] = [0xd3, 0xdb, 0xdd, 0xe3, 0xe4, 0xeb, 0xec, 0xed, 0xf4, 0xfc, 0xfd];

fn rlc(v: u8) -> (u8, bool) {
    let c = v & 0x80 != 0;
    ((v << 1) | (c as u8), c)
}
fn rrc(v: u8) -> (u8, bool) {
    let c = v & 0x01 != 0;
    ((v >> 1) | ((c as u8) << 7), c)
}
fn rl(v: u8, cin: bool) -> (u8, bool) {
    let c = v & 0x80 != 0;
    ((v << 1) | (cin as u8), c)
}
fn rr(v: u8, cin: bool) -> (u8, bool) {
    let c = v & 0x01 != 0;
    ((v >> 1) | ((cin as u8) << 7), c)
}
fn sla(v: u8) -> (u8, bool) {
    (v << 1, v & 0x80 != 0)
}
fn sra(v: u8) -> (u8, bool) {
    ((v >> 1) | (v & 0x80), v & 0x01 != 0)
}
fn swap(v: u8) -> u8 {
    (v << 4) | (v >> 4)
}
fn srl(v: u8) -> (u8, bool) {
    (v >> 1, v & 0x01 != 0)
}

pub struct Cpu {
    pub reg: Registers,
    pub clock: u64,
}

impl Cpu {
    pub fn power_up() -> Self {
        Self { reg: Registers::power_up(), clock: 0 }
    }

    // One kernel step: optionally runs the interrupt-enable latch's
    // EI-delay transition, then either stays halted (4 cycles) or
    // fetches and executes one instruction.
    pub fn step(&mut self, bus: &mut Bus) -> u32 {
        bus.hw.step_ime();
        if bus.hw.cpu_halt {
            self.clock += 4;
            return 4;
        }
        let opcode = self.imm8(bus);
        let cycles = if opcode == 0xcb {
            let cb = self.imm8(bus);
            self.execute_cb(bus, cb)
        } else {
            self.execute(bus, opcode)
        };
        self.clock += u64::from(cycles);
        cycles
    }

    pub fn service_interrupt(&mut self, bus: &mut Bus, addr: u16) {
        let pc = self.reg.pc;
        self.push(bus, pc);
        self.reg.pc = addr;
    }

    fn imm8(&mut self, bus: &Bus) -> u8 {
        let v = bus.get(self.reg.pc);
        self.reg.pc = self.reg.pc.wrapping_add(1);
        v
    }

    fn imm16(&mut self, bus: &Bus) -> u16 {
        let v = bus.get_word(self.reg.pc);
        self.reg.pc = self.reg.pc.wrapping_add(2);
        v
    }

    fn push(&mut self, bus: &mut Bus, v: u16) {
        self.reg.sp = self.reg.sp.wrapping_sub(2);
        bus.set_word(self.reg.sp, v);
    }

    fn pop(&mut self, bus: &Bus) -> u16 {
        let v = bus.get_word(self.reg.sp);
        self.reg.sp = self.reg.sp.wrapping_add(2);
        v
    }

    fn get_r8(&self, bus: &Bus, i: u8) -> u8 {
        match i {
            0 => self.reg.b,
            1 => self.reg.c,
            2 => self.reg.d,
            3 => self.reg.e,
            4 => self.reg.h,
            5 => self.reg.l,
            6 => bus.get(self.reg.get_hl()),
            _ => self.reg.a,
        }
    }

    fn set_r8(&mut self, bus: &mut Bus, i: u8, v: u8) {
        match i {
            0 => self.reg.b = v,
            1 => self.reg.c = v,
            2 => self.reg.d = v,
            3 => self.reg.e = v,
            4 => self.reg.h = v,
            5 => self.reg.l = v,
            6 => bus.set(self.reg.get_hl(), v),
            _ => self.reg.a = v,
        }
    }

    fn get_rr(&self, sel: u8) -> u16 {
        match sel {
            0 => self.reg.get_bc(),
            1 => self.reg.get_de(),
            2 => self.reg.get_hl(),
            _ => self.reg.sp,
        }
    }

    fn set_rr(&mut self, sel: u8, v: u16) {
        match sel {
            0 => self.reg.set_bc(v),
            1 => self.reg.set_de(v),
            2 => self.reg.set_hl(v),
            _ => self.reg.sp = v,
        }
    }

    fn set_shift_flags(&mut self, r: u8, c: bool) {
        self.reg.set_flag(FLAG_Z, r == 0);
        self.reg.set_flag(FLAG_N, false);
        self.reg.set_flag(FLAG_H, false);
        self.reg.set_flag(FLAG_C, c);
    }

    fn alu_add(&mut self, v: u8) {
        let a = self.reg.a;
        let r = a.wrapping_add(v);
        self.reg.set_flag(FLAG_Z, r == 0);
        self.reg.set_flag(FLAG_N, false);
        self.reg.set_flag(FLAG_H, (a & 0xf) + (v & 0xf) > 0xf);
        self.reg.set_flag(FLAG_C, u16::from(a) + u16::from(v) > 0xff);
        self.reg.a = r;
    }

    fn alu_adc(&mut self, v: u8) {
        let a = self.reg.a;
        let cin = u8::from(self.reg.flag(FLAG_C));
        let r = a.wrapping_add(v).wrapping_add(cin);
        self.reg.set_flag(FLAG_Z, r == 0);
        self.reg.set_flag(FLAG_N, false);
        self.reg.set_flag(FLAG_H, (a & 0xf) + (v & 0xf) + cin > 0xf);
        self.reg.set_flag(FLAG_C, u16::from(a) + u16::from(v) + u16::from(cin) > 0xff);
        self.reg.a = r;
    }

    fn alu_sub(&mut self, v: u8) -> u8 {
        let a = self.reg.a;
        let r = a.wrapping_sub(v);
        self.reg.set_flag(FLAG_Z, r == 0);
        self.reg.set_flag(FLAG_N, true);
        self.reg.set_flag(FLAG_H, (a & 0xf) < (v & 0xf));
        self.reg.set_flag(FLAG_C, a < v);
        r
    }

    fn alu_sbc(&mut self, v: u8) -> u8 {
        let a = self.reg.a;
        let cin = i32::from(self.reg.flag(FLAG_C));
        let r = a.wrapping_sub(v).wrapping_sub(cin as u8);
        self.reg.set_flag(FLAG_Z, r == 0);
        self.reg.set_flag(FLAG_N, true);
        self.reg.set_flag(FLAG_H, i32::from(a & 0xf) - i32::from(v & 0xf) - cin < 0);
        self.reg.set_flag(FLAG_C, i32::from(a) - i32::from(v) - cin < 0);
        r
    }

    fn alu_and(&mut self, v: u8) {
        self.reg.a &= v;
        let r = self.reg.a;
        self.reg.set_flag(FLAG_Z, r == 0);
        self.reg.set_flag(FLAG_N, false);
        self.reg.set_flag(FLAG_H, true);
        self.reg.set_flag(FLAG_C, false);
    }

    fn alu_or(&mut self, v: u8) {
        self.reg.a |= v;
        let r = self.reg.a;
        self.reg.set_flag(FLAG_Z, r == 0);
        self.reg.set_flag(FLAG_N, false);
        self.reg.set_flag(FLAG_H, false);
        self.reg.set_flag(FLAG_C, false);
    }

    fn alu_xor(&mut self, v: u8) {
        self.reg.a ^= v;
        let r = self.reg.a;
        self.reg.set_flag(FLAG_Z, r == 0);
        self.reg.set_flag(FLAG_N, false);
        self.reg.set_flag(FLAG_H, false);
        self.reg.set_flag(FLAG_C, false);
    }

    fn alu_inc(&mut self, v: u8) -> u8 {
        let r = v.wrapping_add(1);
        self.reg.set_flag(FLAG_Z, r == 0);
        self.reg.set_flag(FLAG_N, false);
        self.reg.set_flag(FLAG_H, (v & 0xf) + 1 > 0xf);
        r
    }

    fn alu_dec(&mut self, v: u8) -> u8 {
        let r = v.wrapping_sub(1);
        self.reg.set_flag(FLAG_Z, r == 0);
        self.reg.set_flag(FLAG_N, true);
        self.reg.set_flag(FLAG_H, v & 0xf == 0);
        r
    }

    fn alu_add_hl(&mut self, v: u16) {
        let hl = self.reg.get_hl();
        let r = hl.wrapping_add(v);
        self.reg.set_flag(FLAG_N, false);
        self.reg.set_flag(FLAG_H, (hl & 0xfff) + (v & 0xfff) > 0xfff);
        self.reg.set_flag(FLAG_C, u32::from(hl) + u32::from(v) > 0xffff);
        self.reg.set_hl(r);
    }

    fn alu_add_sp_r8(&mut self, v: i8) -> u16 {
        let sp = self.reg.sp;
        let v16 = v as i16 as u16;
        self.reg.set_flag(FLAG_Z, false);
        self.reg.set_flag(FLAG_N, false);
        self.reg.set_flag(FLAG_H, (sp & 0xf) + (v16 & 0xf) > 0xf);
        self.reg.set_flag(FLAG_C, (sp & 0xff) + (v16 & 0xff) > 0xff);
        sp.wrapping_add(v16)
    }

    fn alu_daa(&mut self) {
        let mut a = self.reg.a;
        let mut carry = self.reg.flag(FLAG_C);
        if !self.reg.flag(FLAG_N) {
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
            if self.reg.flag(FLAG_H) || a & 0x0f > 0x09 {
                a = a.wrapping_add(0x06);
            }
        } else {
            if carry {
                a = a.wrapping_sub(0x60);
            }
            if self.reg.flag(FLAG_H) {
                a = a.wrapping_sub(0x06);
            }
        }
        self.reg.set_flag(FLAG_C, carry);
        self.reg.set_flag(FLAG_H, false);
        self.reg.set_flag(FLAG_Z, a == 0);
        self.reg.a = a;
    }

    fn cond(&self, which: u8) -> bool {
        match which {
            0 => !self.reg.flag(FLAG_Z),
            1 => self.reg.flag(FLAG_Z),
            2 => !self.reg.flag(FLAG_C),
            _ => self.reg.flag(FLAG_C),
        }
    }

    fn execute_cb(&mut self, bus: &mut Bus, op: u8) -> u32 {
        let reg_i = op & 0x07;
        let v = self.get_r8(bus, reg_i);
        let row = op >> 3;
        let write = match row {
            0 => {
                let (r, c) = rlc(v);
                self.set_shift_flags(r, c);
                Some(r)
            }
            1 => {
                let (r, c) = rrc(v);
                self.set_shift_flags(r, c);
                Some(r)
            }
            2 => {
                let cin = self.reg.flag(FLAG_C);
                let (r, c) = rl(v, cin);
                self.set_shift_flags(r, c);
                Some(r)
            }
            3 => {
                let cin = self.reg.flag(FLAG_C);
                let (r, c) = rr(v, cin);
                self.set_shift_flags(r, c);
                Some(r)
            }
            4 => {
                let (r, c) = sla(v);
                self.set_shift_flags(r, c);
                Some(r)
            }
            5 => {
                let (r, c) = sra(v);
                self.set_shift_flags(r, c);
                Some(r)
            }
            6 => {
                let r = swap(v);
                self.reg.set_flag(FLAG_Z, r == 0);
                self.reg.set_flag(FLAG_N, false);
                self.reg.set_flag(FLAG_H, false);
                self.reg.set_flag(FLAG_C, false);
                Some(r)
            }
            7 => {
                let (r, c) = srl(v);
                self.set_shift_flags(r, c);
                Some(r)
            }
            8..=15 => {
                let bit = row - 8;
                self.reg.set_flag(FLAG_Z, v & (1 << bit) == 0);
                self.reg.set_flag(FLAG_N, false);
                self.reg.set_flag(FLAG_H, true);
                None
            }
            16..=23 => {
                let bit = row - 16;
                Some(v & !(1 << bit))
            }
            _ => {
                let bit = row - 24;
                Some(v | (1 << bit))
            }
        };
        if let Some(r) = write {
            self.set_r8(bus, reg_i, r);
        }
        if reg_i == 6 {
            if (8..=15).contains(&row) {
                12
            } else {
                16
            }
        } else {
            8
        }
    }

    #[allow(clippy::cognitive_complexity)]
    fn execute(&mut self, bus: &mut Bus, op: u8) -> u32 {
        if UNDEFINED_OPCODES.contains(&op) {
            rog::debugln!("Undefined opcode {:#04x} at pc={:#06x}", op, self.reg.pc.wrapping_sub(1));
            return 4;
        }

        if (0x40..=0x7f).contains(&op) && op != 0x76 {
            let dst = (op >> 3) & 7;
            let src = op & 7;
            let v = self.get_r8(bus, src);
            self.set_r8(bus, dst, v);
            return if dst == 6 || src == 6 { 8 } else { 4 };
        }

        if (0x80..=0xbf).contains(&op) {
            let sel = (op >> 3) & 7;
            let src = op & 7;
            let v = self.get_r8(bus, src);
            match sel {
                0 => self.alu_add(v),
                1 => self.alu_adc(v),
                2 => {
                    let r = self.alu_sub(v);
                    self.reg.a = r;
                }
                3 => {
                    let r = self.alu_sbc(v);
                    self.reg.a = r;
                }
                4 => self.alu_and(v),
                5 => self.alu_xor(v),
                6 => self.alu_or(v),
                _ => {
                    self.alu_sub(v);
                }
            }
            return if src == 6 { 8 } else { 4 };
        }

        match op {
            0x00 => 4,
            0x76 => {
                if bus.hw.pending() {
                    rog::debugln!("halt skipped at pc={:#06x}: interrupt already pending", self.reg.pc);
                } else {
                    bus.hw.cpu_halt = true;
                }
                4
            }
            0x01 | 0x11 | 0x21 | 0x31 => {
                let sel = (op >> 4) & 3;
                let v = self.imm16(bus);
                self.set_rr(sel, v);
                12
            }
            0x02 => {
                bus.set(self.reg.get_bc(), self.reg.a);
                8
            }
            0x12 => {
                bus.set(self.reg.get_de(), self.reg.a);
                8
            }
            0x22 => {
                let a = self.reg.get_hl();
                bus.set(a, self.reg.a);
                self.reg.set_hl(a.wrapping_add(1));
                8
            }
            0x32 => {
                let a = self.reg.get_hl();
                bus.set(a, self.reg.a);
                self.reg.set_hl(a.wrapping_sub(1));
                8
            }
            0x03 | 0x13 | 0x23 | 0x33 => {
                let sel = (op >> 4) & 3;
                let v = self.get_rr(sel).wrapping_add(1);
                self.set_rr(sel, v);
                8
            }
            0x0b | 0x1b | 0x2b | 0x3b => {
                let sel = (op >> 4) & 3;
                let v = self.get_rr(sel).wrapping_sub(1);
                self.set_rr(sel, v);
                8
            }
            0x04 | 0x0c | 0x14 | 0x1c | 0x24 | 0x2c | 0x3c => {
                let i = (op >> 3) & 7;
                let v = self.get_r8(bus, i);
                let r = self.alu_inc(v);
                self.set_r8(bus, i, r);
                if i == 6 {
                    12
                } else {
                    4
                }
            }
            0x34 => {
                let v = self.get_r8(bus, 6);
                let r = self.alu_inc(v);
                self.set_r8(bus, 6, r);
                12
            }
            0x05 | 0x0d | 0x15 | 0x1d | 0x25 | 0x2d | 0x3d => {
                let i = (op >> 3) & 7;
                let v = self.get_r8(bus, i);
                let r = self.alu_dec(v);
                self.set_r8(bus, i, r);
                4
            }
            0x35 => {
                let v = self.get_r8(bus, 6);
                let r = self.alu_dec(v);
                self.set_r8(bus, 6, r);
                12
            }
            0x06 | 0x0e | 0x16 | 0x1e | 0x26 | 0x2e | 0x36 | 0x3e => {
                let i = (op >> 3) & 7;
                let v = self.imm8(bus);
                self.set_r8(bus, i, v);
                if i == 6 {
                    12
                } else {
                    8
                }
            }
            0x07 => {
                let (r, c) = rlc(self.reg.a);
                self.reg.a = r;
                self.reg.set_flag(FLAG_Z, false);
                self.reg.set_flag(FLAG_N, false);
                self.reg.set_flag(FLAG_H, false);
                self.reg.set_flag(FLAG_C, c);
                4
            }
            0x0f => {
                let (r, c) = rrc(self.reg.a);
                self.reg.a = r;
                self.reg.set_flag(FLAG_Z, false);
                self.reg.set_flag(FLAG_N, false);
                self.reg.set_flag(FLAG_H, false);
                self.reg.set_flag(FLAG_C, c);
                4
            }
            0x17 => {
                let (r, c) = rl(self.reg.a, self.reg.flag(FLAG_C));
                self.reg.a = r;
                self.reg.set_flag(FLAG_Z, false);
                self.reg.set_flag(FLAG_N, false);
                self.reg.set_flag(FLAG_H, false);
                self.reg.set_flag(FLAG_C, c);
                4
            }
            0x1f => {
                let (r, c) = rr(self.reg.a, self.reg.flag(FLAG_C));
                self.reg.a = r;
                self.reg.set_flag(FLAG_Z, false);
                self.reg.set_flag(FLAG_N, false);
                self.reg.set_flag(FLAG_H, false);
                self.reg.set_flag(FLAG_C, c);
                4
            }
            0x08 => {
                let a = self.imm16(bus);
                bus.set_word(a, self.reg.sp);
                20
            }
            0x09 | 0x19 | 0x29 | 0x39 => {
                let sel = (op >> 4) & 3;
                let v = self.get_rr(sel);
                self.alu_add_hl(v);
                8
            }
            0x0a => {
                self.reg.a = bus.get(self.reg.get_bc());
                8
            }
            0x1a => {
                self.reg.a = bus.get(self.reg.get_de());
                8
            }
            0x2a => {
                let a = self.reg.get_hl();
                self.reg.a = bus.get(a);
                self.reg.set_hl(a.wrapping_add(1));
                8
            }
            0x3a => {
                let a = self.reg.get_hl();
                self.reg.a = bus.get(a);
                self.reg.set_hl(a.wrapping_sub(1));
                8
            }
            0x10 => {
                self.imm8(bus);
                rog::debugln!("stop executed at pc={:#06x}; treated as a no-op", self.reg.pc);
                4
            }
            0x18 => {
                let off = self.imm8(bus) as i8;
                self.reg.pc = self.reg.pc.wrapping_add(off as i16 as u16);
                12
            }
            0x20 | 0x28 | 0x30 | 0x38 => {
                let which = (op >> 3) & 3;
                let off = self.imm8(bus) as i8;
                if self.cond(which) {
                    self.reg.pc = self.reg.pc.wrapping_add(off as i16 as u16);
                    12
                } else {
                    8
                }
            }
            0x27 => {
                self.alu_daa();
                4
            }
            0x2f => {
                self.reg.a = !self.reg.a;
                self.reg.set_flag(FLAG_N, true);
                self.reg.set_flag(FLAG_H, true);
                4
            }
            0x37 => {
                self.reg.set_flag(FLAG_N, false);
                self.reg.set_flag(FLAG_H, false);
                self.reg.set_flag(FLAG_C, true);
                4
            }
            0x3f => {
                let c = self.reg.flag(FLAG_C);
                self.reg.set_flag(FLAG_N, false);
                self.reg.set_flag(FLAG_H, false);
                self.reg.set_flag(FLAG_C, !c);
                4
            }
            0xc6 => {
                let v = self.imm8(bus);
                self.alu_add(v);
                8
            }
            0xce => {
                let v = self.imm8(bus);
                self.alu_adc(v);
                8
            }
            0xd6 => {
                let v = self.imm8(bus);
                let r = self.alu_sub(v);
                self.reg.a = r;
                8
            }
            0xde => {
                let v = self.imm8(bus);
                let r = self.alu_sbc(v);
                self.reg.a = r;
                8
            }
            0xe6 => {
                let v = self.imm8(bus);
                self.alu_and(v);
                8
            }
            0xee => {
                let v = self.imm8(bus);
                self.alu_xor(v);
                8
            }
            0xf6 => {
                let v = self.imm8(bus);
                self.alu_or(v);
                8
            }
            0xfe => {
                let v = self.imm8(bus);
                self.alu_sub(v);
                8
            }
            0xc1 | 0xd1 | 0xe1 => {
                let sel = (op >> 4) & 3;
                let v = self.pop(bus);
                self.set_rr(sel, v);
                12
            }
            0xf1 => {
                let v = self.pop(bus);
                self.reg.set_af(v);
                12
            }
            0xc5 | 0xd5 | 0xe5 => {
                let sel = (op >> 4) & 3;
                let v = self.get_rr(sel);
                self.push(bus, v);
                16
            }
            0xf5 => {
                let v = self.reg.get_af();
                self.push(bus, v);
                16
            }
            0xc0 | 0xc8 | 0xd0 | 0xd8 => {
                let which = (op >> 3) & 3;
                if self.cond(which) {
                    self.reg.pc = self.pop(bus);
                    20
                } else {
                    8
                }
            }
            0xc9 => {
                self.reg.pc = self.pop(bus);
                16
            }
            0xd9 => {
                self.reg.pc = self.pop(bus);
                bus.hw.ime = Ime::Pending;
                16
            }
            0xc2 | 0xca | 0xd2 | 0xda => {
                let which = (op >> 3) & 3;
                let a = self.imm16(bus);
                if self.cond(which) {
                    self.reg.pc = a;
                    16
                } else {
                    12
                }
            }
            0xc3 => {
                self.reg.pc = self.imm16(bus);
                16
            }
            0xe9 => {
                self.reg.pc = self.reg.get_hl();
                4
            }
            0xc4 | 0xcc | 0xd4 | 0xdc => {
                let which = (op >> 3) & 3;
                let a = self.imm16(bus);
                if self.cond(which) {
                    let ret = self.reg.pc;
                    self.push(bus, ret);
                    self.reg.pc = a;
                    24
                } else {
                    12
                }
            }
            0xcd => {
                let a = self.imm16(bus);
                let ret = self.reg.pc;
                self.push(bus, ret);
                self.reg.pc = a;
                24
            }
            0xc7 | 0xcf | 0xd7 | 0xdf | 0xe7 | 0xef | 0xf7 | 0xff => {
                let ret = self.reg.pc;
                self.push(bus, ret);
                self.reg.pc = u16::from(op & 0x38);
                16
            }
            0xe0 => {
                let off = self.imm8(bus);
                bus.set(0xff00 + u16::from(off), self.reg.a);
                12
            }
            0xf0 => {
                let off = self.imm8(bus);
                self.reg.a = bus.get(0xff00 + u16::from(off));
                12
            }
            0xe2 => {
                bus.set(0xff00 + u16::from(self.reg.c), self.reg.a);
                8
            }
            0xf2 => {
                self.reg.a = bus.get(0xff00 + u16::from(self.reg.c));
                8
            }
            0xea => {
                let a = self.imm16(bus);
                bus.set(a, self.reg.a);
                16
            }
            0xfa => {
                let a = self.imm16(bus);
                self.reg.a = bus.get(a);
                16
            }
            0xe8 => {
                let off = self.imm8(bus) as i8;
                self.reg.sp = self.alu_add_sp_r8(off);
                16
            }
            0xf8 => {
                let off = self.imm8(bus) as i8;
                let v = self.alu_add_sp_r8(off);
                self.reg.set_hl(v);
                12
            }
            0xf9 => {
                self.reg.sp = self.reg.get_hl();
                8
            }
            0xf3 => {
                bus.hw.ime = Ime::Off;
                4
            }
            0xfb => {
                bus.hw.ime = Ime::Pending;
                4
            }
            _ => unreachable!("opcode {:#04x} not covered by dispatch", op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;

    const LOGO: [u8; 48] = [
        0xce, 0xed, 0x66, 0x66, 0xcc, 0x0d, 0x00, 0x0b, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0c, 0x00, 0x0d, 0x00, 0x08,
        0x11, 0x1f, 0x88, 0x89, 0x00, 0x0e, 0xdc, 0xcc, 0x6e, 0xe6, 0xdd, 0xdd, 0xd9, 0x99, 0xbb, 0xbb, 0x67, 0x63,
        0x6e, 0x0e, 0xec, 0xcc, 0xdd, 0xdc, 0x99, 0x9f, 0xbb, 0xb9, 0x33, 0x3e,
    ];

    fn test_bus() -> Bus {
        let mut data = vec![0u8; 32 * 1024];
        data[0x104..0x134].copy_from_slice(&LOGO);
        let mut checksum: u8 = 0;
        for &b in &data[0x134..0x14d] {
            checksum = checksum.wrapping_sub(b).wrapping_sub(1);
        }
        data[0x14d] = checksum;
        Bus::power_up(Cart::from_bytes(data).unwrap())
    }

    #[test]
    fn swap_matches_invariant() {
        let mut bus = test_bus();
        let mut cpu = Cpu::power_up();
        cpu.reg.a = 0x3a;
        cpu.reg.f = 0x00;
        bus.set(0x0100, 0xcb);
        bus.set(0x0101, 0x37);
        cpu.reg.pc = 0x0100;
        cpu.step(&mut bus);
        assert_eq!(cpu.reg.a, 0xa3);
        assert_eq!(cpu.reg.f, 0x00);
    }

    #[test]
    fn add_sets_half_carry() {
        let mut bus = test_bus();
        let mut cpu = Cpu::power_up();
        cpu.reg.a = 0x0f;
        cpu.reg.b = 0x01;
        cpu.reg.f = 0x00;
        bus.set(0x0100, 0x80); // ADD A,B
        cpu.reg.pc = 0x0100;
        cpu.step(&mut bus);
        assert_eq!(cpu.reg.a, 0x10);
        assert_eq!(cpu.reg.f, FLAG_H);
    }

    #[test]
    fn sub_sets_n_h_c() {
        let mut bus = test_bus();
        let mut cpu = Cpu::power_up();
        cpu.reg.a = 0x00;
        cpu.reg.b = 0x01;
        bus.set(0x0100, 0x90); // SUB B
        cpu.reg.pc = 0x0100;
        cpu.step(&mut bus);
        assert_eq!(cpu.reg.a, 0xff);
        assert_eq!(cpu.reg.f, FLAG_N | FLAG_H | FLAG_C);
    }

    #[test]
    fn push_bc_pop_af_masks_low_nibble() {
        let mut bus = test_bus();
        let mut cpu = Cpu::power_up();
        cpu.reg.sp = 0xfffe;
        cpu.reg.set_bc(0x1234);
        bus.set(0x0100, 0xc5); // PUSH BC
        bus.set(0x0101, 0xf1); // POP AF
        cpu.reg.pc = 0x0100;
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.reg.get_af(), 0x1230);
        assert_eq!(cpu.reg.sp, 0xfffe);
    }

    #[test]
    fn daa_round_trips_bcd_addition() {
        let mut bus = test_bus();
        let mut cpu = Cpu::power_up();
        cpu.reg.a = 0x45;
        cpu.reg.b = 0x38;
        bus.set(0x0100, 0x80); // ADD A,B -> 0x7d
        bus.set(0x0101, 0x27); // DAA -> 0x83
        cpu.reg.pc = 0x0100;
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.reg.a, 0x83);
    }

    #[test]
    fn undefined_opcode_is_skipped() {
        let mut bus = test_bus();
        let mut cpu = Cpu::power_up();
        bus.set(0x0100, 0xd3);
        bus.set(0x0101, 0x00);
        cpu.reg.pc = 0x0100;
        cpu.step(&mut bus);
        assert_eq!(cpu.reg.pc, 0x0101);
    }
}
