// CLI entry point for the minifb/cpal reference frontend. Grounded on
// the teacher's `main.rs` gui-feature `fn main()`: same argparse flags,
// same key map, same per-host-frame drive loop, same save-flush on exit.

use gba_core::joypad::JoypadKey;
use gba_core::kernel::Emulator;
use gba_core::{frontend, ppu};

fn main() {
    rog::reg("gba_core");

    let mut rom = String::new();
    let mut enable_audio = false;
    let mut scale_factor: u32 = 2;
    {
        let mut parser = argparse::ArgumentParser::new();
        parser.set_description("A cycle-driven handheld-console emulator");
        parser.refer(&mut rom).add_argument("rom", argparse::Store, "Rom file path");
        parser.refer(&mut enable_audio).add_option(
            &["-a", "--enable-audio"],
            argparse::StoreTrue,
            "Enable audio playback",
        );
        parser.refer(&mut scale_factor).add_option(
            &["-x", "--scale-factor"],
            argparse::Store,
            "Scale the display by an integer factor (1, 2, 4 or 8)",
        );
        parser.parse_args_or_exit();
    }

    let mut emu = match Emulator::power_up(&rom) {
        Ok(emu) => emu,
        Err(e) => {
            rog::println!("failed to load {}: {}", rom, e);
            std::process::exit(1);
        }
    };

    if enable_audio {
        if let Some(sink) = frontend::open_audio_output() {
            emu.set_audio_sink(Box::new(sink));
        }
    }

    let scale = match scale_factor {
        1 => minifb::Scale::X1,
        4 => minifb::Scale::X4,
        8 => minifb::Scale::X8,
        _ => minifb::Scale::X2,
    };
    let option = minifb::WindowOptions { resize: true, scale, ..Default::default() };
    let mut window = match minifb::Window::new("gba_core", ppu::SCREEN_W, ppu::SCREEN_H, option) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("failed to open a window: {}", e);
            std::process::exit(1);
        }
    };

    let cycle_quantum: u32 = 70224;
    'outer: while window.is_open() && !window.is_key_down(minifb::Key::Escape) {
        let mut sink =
            frontend::MinifbFrameSink { window: &mut window, buffer: vec![0u32; ppu::SCREEN_W * ppu::SCREEN_H] };
        emu.run_for(cycle_quantum, &mut sink);

        for (key, joypad_key) in frontend::KEY_MAP.iter() {
            if sink.window.is_key_down(*key) {
                emu.keydown(*joypad_key);
            } else {
                emu.keyup(*joypad_key);
            }
        }
        if !sink.window.is_open() {
            break 'outer;
        }
    }

    emu.flush_save();
}
