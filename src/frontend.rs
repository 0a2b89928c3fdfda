// Reference host frontend: a minifb window for the framebuffer and a
// cpal output stream for audio. Grounded on the teacher's main.rs (the
// `gui` feature's cpal 0.8 `EventLoop`/`build_output_stream` setup and
// the `(minifb::Key, JoypadKey)` mapping table) — split out from the
// binary entry point so `main.rs` stays a thin driver loop.

use crate::apu::AudioSink;
use crate::joypad::JoypadKey;
use crate::kernel::FrameSink;
use std::sync::{Arc, Mutex};

pub const KEY_MAP: [(minifb::Key, JoypadKey); 8] = [
    (minifb::Key::Right, JoypadKey::Right),
    (minifb::Key::Left, JoypadKey::Left),
    (minifb::Key::Up, JoypadKey::Up),
    (minifb::Key::Down, JoypadKey::Down),
    (minifb::Key::Z, JoypadKey::A),
    (minifb::Key::X, JoypadKey::B),
    (minifb::Key::Space, JoypadKey::Select),
    (minifb::Key::Enter, JoypadKey::Start),
];

pub struct MinifbFrameSink<'a> {
    pub window: &'a mut minifb::Window,
    pub buffer: Vec<u32>,
}

impl<'a> FrameSink for MinifbFrameSink<'a> {
    fn present_frame(&mut self, screen: &[u32]) {
        self.buffer.copy_from_slice(screen);
        if let Err(e) = self.window.update_with_buffer(self.buffer.as_slice()) {
            rog::debugln!("Failed to present frame: {}", e);
        }
    }
}

// Shared ring of interleaved (left, right) f32 samples the cpal callback
// drains from. `AudioSink::push_samples` receives interleaved i16 pairs
// from the APU and converts them to cpal's float format on the way in.
pub struct QueueAudioSink {
    queue: Arc<Mutex<std::collections::VecDeque<(f32, f32)>>>,
}

impl AudioSink for QueueAudioSink {
    fn push_samples(&mut self, samples: &[i16]) {
        let mut queue = self.queue.lock().unwrap();
        for pair in samples.chunks(2) {
            if let [l, r] = pair {
                queue.push_back((f32::from(*l) / f32::from(i16::MAX), f32::from(*r) / f32::from(i16::MAX)));
            }
        }
        while queue.len() > 44100 {
            queue.pop_front();
        }
    }
}

// Opens the default cpal output device, spawns its `EventLoop::run` on a
// background thread, and returns the sink side the APU pushes samples
// into. Returns None if no output device is available (audio stays
// silent; the emulator itself does not depend on it).
pub fn open_audio_output() -> Option<QueueAudioSink> {
    let device = cpal::default_output_device()?;
    rog::debugln!("Open the audio player: {}", device.name());
    let source_format = device.default_output_format().ok()?;
    let format =
        cpal::Format { channels: 2, sample_rate: source_format.sample_rate, data_type: cpal::SampleFormat::F32 };

    let event_loop = cpal::EventLoop::new();
    let stream_id = event_loop.build_output_stream(&device, &format).ok()?;
    event_loop.play_stream(stream_id);

    let queue = Arc::new(Mutex::new(std::collections::VecDeque::new()));
    let queue_for_callback = queue.clone();
    std::thread::spawn(move || {
        event_loop.run(move |_, stream_data| {
            let mut queue = queue_for_callback.lock().unwrap();
            if let cpal::StreamData::Output { buffer } = stream_data {
                match buffer {
                    cpal::UnknownTypeOutputBuffer::F32(mut buffer) => {
                        for frame in buffer.chunks_mut(2) {
                            let (l, r) = queue.pop_front().unwrap_or((0.0, 0.0));
                            frame[0] = l;
                            if frame.len() > 1 {
                                frame[1] = r;
                            }
                        }
                    }
                    cpal::UnknownTypeOutputBuffer::I16(mut buffer) => {
                        for frame in buffer.chunks_mut(2) {
                            let (l, r) = queue.pop_front().unwrap_or((0.0, 0.0));
                            frame[0] = (l * f32::from(i16::MAX)) as i16;
                            if frame.len() > 1 {
                                frame[1] = (r * f32::from(i16::MAX)) as i16;
                            }
                        }
                    }
                    cpal::UnknownTypeOutputBuffer::U16(mut buffer) => {
                        for frame in buffer.chunks_mut(2) {
                            let (l, r) = queue.pop_front().unwrap_or((0.0, 0.0));
                            frame[0] = (l * f32::from(i16::MAX) + f32::from(u16::MAX) / 2.0) as u16;
                            if frame.len() > 1 {
                                frame[1] = (r * f32::from(i16::MAX) + f32::from(u16::MAX) / 2.0) as u16;
                            }
                        }
                    }
                }
            }
        });
    });

    Some(QueueAudioSink { queue })
}
