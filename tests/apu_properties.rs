use nes_apu::apu::tables::LENGTH_TABLE;
use nes_apu::{
    Apu, ApuConfig, ApuEvents, Channel, FilterType, HostBus, NoiseStrategy, NullBus,
    OutputBuffer, Synthesis,
};

const SPF: i32 = 735;

/// Bus backed by a flat 64K memory image that records DMA side effects
struct RecordingBus {
    memory: Vec<u8>,
    fetches: Vec<u16>,
    stolen: u32,
    raised: u32,
    cleared: u32,
}

impl RecordingBus {
    fn new() -> Self {
        Self {
            memory: vec![0; 0x10000],
            fetches: Vec::new(),
            stolen: 0,
            raised: 0,
            cleared: 0,
        }
    }
}

impl HostBus for RecordingBus {
    fn read_memory(&mut self, address: u16) -> u8 {
        self.fetches.push(address);
        self.memory[address as usize]
    }

    fn steal_cycles(&mut self, cycles: u32) {
        self.stolen += cycles;
    }

    fn raise_irq(&mut self) {
        self.raised += 1;
    }

    fn clear_irq(&mut self) {
        self.cleared += 1;
    }
}

fn apu() -> Apu {
    Apu::new(ApuConfig::default()).unwrap()
}

fn render(apu: &mut Apu, n: usize) -> Vec<i16> {
    let mut buf = vec![0i16; n];
    apu.process(&mut NullBus, Some(OutputBuffer::Signed16(&mut buf)), n);
    buf
}

#[test]
fn test_samples_per_frame_at_44100() {
    let apu = apu();
    assert_eq!(apu.samples_per_frame(), SPF);
}

#[test]
fn test_note_length_loads_from_table() {
    let mut apu = apu();
    apu.write(&mut NullBus, 0x4015, 0x0F);
    for (index, &frames) in LENGTH_TABLE.iter().enumerate() {
        let value = (index as u8) << 3;
        apu.write(&mut NullBus, 0x4003, value);
        apu.write(&mut NullBus, 0x4007, value | 0x07);
        apu.write(&mut NullBus, 0x400B, value);
        apu.write(&mut NullBus, 0x400F, value);
        let expected = i32::from(frames) * SPF;
        for channel in [Channel::PulseA, Channel::PulseB, Channel::Triangle, Channel::Noise] {
            assert_eq!(
                apu.channel_state(channel).length,
                expected,
                "{channel} index {index}"
            );
        }
    }
}

#[test]
fn test_status_needs_enable_and_length() {
    let mut apu = apu();
    apu.write(&mut NullBus, 0x4015, 0x00);
    apu.write(&mut NullBus, 0x4003, 0x08);
    assert_eq!(apu.read(&NullBus, 0x4015) & 0x01, 0);
}

#[test]
fn test_disable_zeroes_counters_idempotently() {
    let mut apu = apu();
    apu.write(&mut NullBus, 0x4015, 0x0F);
    apu.write(&mut NullBus, 0x4000, 0x1F);
    apu.write(&mut NullBus, 0x4003, 0x08);
    apu.write(&mut NullBus, 0x4008, 0x7F);
    apu.write(&mut NullBus, 0x400B, 0x08);
    apu.write(&mut NullBus, 0x400F, 0x08);
    render(&mut apu, 50);
    assert!(apu.channel_state(Channel::Triangle).linear_length > 0);

    for _ in 0..2 {
        apu.write(&mut NullBus, 0x4015, 0x00);
        for channel in [Channel::PulseA, Channel::Triangle, Channel::Noise] {
            let state = apu.channel_state(channel);
            assert_eq!(state.length, 0, "{channel}");
            assert!(!state.playing);
        }
        assert_eq!(apu.channel_state(Channel::Triangle).linear_length, 0);
        assert_eq!(apu.read(&NullBus, 0x4015), 0);
    }

    // Re-enabling does not bring the counters back
    apu.write(&mut NullBus, 0x4015, 0x0F);
    assert_eq!(apu.read(&NullBus, 0x4015), 0);
}

#[test]
fn test_pulse_silent_below_frequency_8() {
    for (ctrl, lo, hi) in [(0x4000u16, 0x4002u16, 0x4003u16), (0x4004, 0x4006, 0x4007)] {
        for duty in 0..4u8 {
            for volume in [1u8, 8, 15] {
                for freq in 0..8u8 {
                    let mut apu = apu();
                    apu.write(&mut NullBus, 0x4015, 0x03);
                    apu.write(&mut NullBus, ctrl, (duty << 6) | 0x10 | volume);
                    apu.write(&mut NullBus, lo, freq);
                    apu.write(&mut NullBus, hi, 0x08);
                    let out = render(&mut apu, 400);
                    assert!(
                        out.iter().all(|&s| s == 0),
                        "${ctrl:04X} duty {duty} volume {volume} freq {freq}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_pulse_audible_at_frequency_8() {
    let mut apu = apu();
    apu.write(&mut NullBus, 0x4015, 0x01);
    apu.write(&mut NullBus, 0x4000, 0x9F);
    apu.write(&mut NullBus, 0x4002, 0x08);
    apu.write(&mut NullBus, 0x4003, 0x08);
    let out = render(&mut apu, 400);
    assert!(out.iter().any(|&s| s != 0));
}

#[test]
fn test_pulse_length_expires_at_exact_tick() {
    let mut apu = apu();
    apu.write(&mut NullBus, 0x4015, 0x01);
    apu.write(&mut NullBus, 0x4000, 0x9F); // hold clear
    apu.write(&mut NullBus, 0x4002, 0xFD);
    apu.write(&mut NullBus, 0x4003, 0x08); // index 1: 127 frames

    let ticks = (127 * SPF) as usize;
    apu.process(&mut NullBus, None, ticks - 1);
    assert_eq!(apu.read(&NullBus, 0x4015) & 0x01, 0x01);
    assert_eq!(apu.channel_state(Channel::PulseA).length, 1);

    apu.process(&mut NullBus, None, 1);
    assert_eq!(apu.read(&NullBus, 0x4015) & 0x01, 0x00);
}

#[test]
fn test_held_length_never_expires() {
    let mut apu = apu();
    apu.write(&mut NullBus, 0x4015, 0x01);
    apu.write(&mut NullBus, 0x4000, 0xBF); // hold set
    apu.write(&mut NullBus, 0x4002, 0xFD);
    apu.write(&mut NullBus, 0x4003, 0x18); // index 3: 1 frame
    apu.process(&mut NullBus, None, 10 * SPF as usize);
    assert_eq!(apu.channel_state(Channel::PulseA).length, SPF);
}

#[test]
fn test_silenced_pulse_decays_to_zero() {
    let mut apu = apu();
    apu.write(&mut NullBus, 0x4015, 0x01);
    apu.write(&mut NullBus, 0x4000, 0x9F);
    apu.write(&mut NullBus, 0x4002, 0xFD);
    apu.write(&mut NullBus, 0x4003, 0x08);
    render(&mut apu, 100);
    apu.write(&mut NullBus, 0x4015, 0x00);

    let tail = render(&mut apu, 4000);
    let mut previous = i32::from(tail[0]).abs();
    for &s in &tail[1..] {
        let level = i32::from(s).abs();
        assert!(level <= previous, "output jumped from {previous} to {level}");
        previous = level;
    }
    assert_eq!(*tail.last().unwrap(), 0);
}

fn noise_stream(strategy: NoiseStrategy, synthesis: Synthesis) -> Vec<i16> {
    let config = ApuConfig::default()
        .with_noise(strategy)
        .with_synthesis(synthesis);
    let mut apu = Apu::new(config).unwrap();
    apu.write(&mut NullBus, 0x4015, 0x08);
    apu.write(&mut NullBus, 0x400C, 0x3F);
    apu.write(&mut NullBus, 0x400E, 0x03);
    apu.write(&mut NullBus, 0x400F, 0x08);
    let mut out = render(&mut apu, 2000);
    apu.write(&mut NullBus, 0x400E, 0x85); // switch to short mode
    out.extend(render(&mut apu, 2000));
    out
}

#[test]
fn test_noise_is_deterministic() {
    for strategy in [NoiseStrategy::Precomputed, NoiseStrategy::Realtime] {
        for synthesis in [Synthesis::Oversampled, Synthesis::SingleSample] {
            let a = noise_stream(strategy, synthesis);
            let b = noise_stream(strategy, synthesis);
            assert_eq!(a, b, "{strategy:?} {synthesis:?}");
            assert!(a.iter().any(|&s| s != 0));
        }
    }
}

#[test]
fn test_noise_survives_reset() {
    let mut apu = apu();
    let setup = |apu: &mut Apu| {
        apu.write(&mut NullBus, 0x4015, 0x08);
        apu.write(&mut NullBus, 0x400C, 0x3F);
        apu.write(&mut NullBus, 0x400E, 0x82);
        apu.write(&mut NullBus, 0x400F, 0x08);
    };
    setup(&mut apu);
    let first = render(&mut apu, 1000);
    apu.reset();
    setup(&mut apu);
    assert_eq!(render(&mut apu, 1000), first);
}

#[test]
fn test_dmc_single_byte_fetch_steal_and_irq() {
    let mut apu = apu();
    let mut bus = RecordingBus::new();
    bus.memory[0xC000] = 0xAA;

    apu.write(&mut bus, 0x4010, 0x8F); // IRQ on, no loop, fastest rate
    apu.write(&mut bus, 0x4012, 0x00); // $C000
    apu.write(&mut bus, 0x4013, 0x00); // 1 byte
    apu.write(&mut bus, 0x4015, 0x10);
    assert_eq!(apu.read(&bus, 0x4015) & 0x10, 0x10);

    let events = apu.process(&mut bus, None, 100);
    assert_eq!(bus.fetches, vec![0xC000]);
    assert_eq!(bus.stolen, 1);
    assert_eq!(bus.raised, 1);
    assert!(events.contains(ApuEvents::IRQ_RAISED));
    assert!(events.contains(ApuEvents::DMC_FINISHED));

    let status = apu.read(&bus, 0x4015);
    assert_eq!(status & 0x10, 0, "DMC reports disabled");
    assert_eq!(status & 0x80, 0x80, "IRQ pending");
    assert!(!apu.dmc_state().enabled);

    // More processing raises nothing further
    let events = apu.process(&mut bus, None, 1000);
    assert!(events.is_empty());
    assert_eq!(bus.raised, 1);
    assert_eq!(bus.fetches.len(), 1);
}

#[test]
fn test_status_write_acknowledges_dmc_irq() {
    let mut apu = apu();
    let mut bus = RecordingBus::new();
    apu.write(&mut bus, 0x4010, 0x8F);
    apu.write(&mut bus, 0x4015, 0x10);
    apu.process(&mut bus, None, 100);
    assert!(apu.dmc_state().irq_occurred);

    let events = apu.write(&mut bus, 0x4015, 0x00);
    assert!(events.contains(ApuEvents::IRQ_CLEARED));
    assert_eq!(bus.cleared, 1);
    assert_eq!(apu.read(&bus, 0x4015) & 0x80, 0);

    // Nothing pending: no second clear
    assert!(apu.write(&mut bus, 0x4015, 0x00).is_empty());
    assert_eq!(bus.cleared, 1);
}

#[test]
fn test_irq_disable_acknowledges_dmc_irq() {
    let mut apu = apu();
    let mut bus = RecordingBus::new();
    apu.write(&mut bus, 0x4010, 0x8F);
    apu.write(&mut bus, 0x4015, 0x10);
    apu.process(&mut bus, None, 100);

    let events = apu.write(&mut bus, 0x4010, 0x0F);
    assert!(events.contains(ApuEvents::IRQ_CLEARED));
    assert!(!apu.dmc_state().irq_occurred);
}

#[test]
fn test_dmc_looping_sample_keeps_fetching() {
    let mut apu = apu();
    let mut bus = RecordingBus::new();
    for byte in &mut bus.memory[0xC040..0xC051] {
        *byte = 0x55;
    }
    apu.write(&mut bus, 0x4010, 0x4F);
    apu.write(&mut bus, 0x4012, 0x01); // $C040
    apu.write(&mut bus, 0x4013, 0x01); // 17 bytes
    apu.write(&mut bus, 0x4015, 0x10);

    apu.process(&mut bus, None, SPF as usize);
    assert!(bus.fetches.len() > 17);
    assert_eq!(bus.fetches[17], 0xC040);
    assert_eq!(bus.stolen as usize, bus.fetches.len());
    assert_eq!(bus.raised, 0);
    assert_eq!(apu.read(&bus, 0x4015) & 0x10, 0x10);
}

#[test]
fn test_null_buffer_matches_real_buffer() {
    let program = |apu: &mut Apu, bus: &mut RecordingBus| {
        apu.write(bus, 0x4015, 0x1F);
        apu.write(bus, 0x4000, 0x5F);
        apu.write(bus, 0x4001, 0x9A);
        apu.write(bus, 0x4002, 0x80);
        apu.write(bus, 0x4003, 0x21);
        apu.write(bus, 0x4008, 0x40);
        apu.write(bus, 0x400A, 0x60);
        apu.write(bus, 0x400B, 0x10);
        apu.write(bus, 0x400C, 0x05);
        apu.write(bus, 0x400E, 0x07);
        apu.write(bus, 0x400F, 0x30);
        apu.write(bus, 0x4010, 0x8C);
        apu.write(bus, 0x4013, 0x04);
        apu.write(bus, 0x4015, 0x1F);
    };

    let mut dry = apu();
    let mut wet = apu();
    let mut dry_bus = RecordingBus::new();
    let mut wet_bus = RecordingBus::new();
    program(&mut dry, &mut dry_bus);
    program(&mut wet, &mut wet_bus);

    let n = 3 * SPF as usize;
    let dry_events = dry.process(&mut dry_bus, None, n);
    let mut buf = vec![0i16; n];
    let wet_events = wet.process(&mut wet_bus, Some(OutputBuffer::Signed16(&mut buf)), n);
    assert_eq!(dry_events, wet_events);

    for channel in [
        Channel::PulseA,
        Channel::PulseB,
        Channel::Triangle,
        Channel::Noise,
        Channel::Dmc,
    ] {
        assert_eq!(dry.channel_state(channel), wet.channel_state(channel), "{channel}");
    }
    assert_eq!(dry.dmc_state(), wet.dmc_state());
    assert_eq!(dry_bus.fetches, wet_bus.fetches);
    assert_eq!(dry.elapsed_cycles(), wet.elapsed_cycles());

    // Filter history advanced too
    assert_eq!(render(&mut dry, 500), render(&mut wet, 500));
}

#[test]
fn test_filters_smooth_steps() {
    let run = |filter: FilterType| {
        let mut apu = apu();
        apu.set_filter(filter);
        apu.write(&mut NullBus, 0x4011, 0x10); // DAC step to 0x10 << 8
        render(&mut apu, 3)
    };
    assert_eq!(run(FilterType::None), vec![8192, 8192, 8192]);
    assert_eq!(run(FilterType::LowPass), vec![4096, 8192, 8192]);
    assert_eq!(run(FilterType::Weighted), vec![6144, 8192, 8192]);
}

#[test]
fn test_eight_bit_output_tracks_sixteen_bit() {
    let mut a = apu();
    let mut b = apu();
    for apu in [&mut a, &mut b] {
        apu.write(&mut NullBus, 0x4015, 0x01);
        apu.write(&mut NullBus, 0x4000, 0x9F);
        apu.write(&mut NullBus, 0x4002, 0xFD);
        apu.write(&mut NullBus, 0x4003, 0x08);
    }
    let wide = render(&mut a, 500);
    let mut narrow = vec![0u8; 500];
    b.process(&mut NullBus, Some(OutputBuffer::Unsigned8(&mut narrow)), 500);
    for (w, n) in wide.iter().zip(&narrow) {
        assert_eq!(((*w >> 8) as u8) ^ 0x80, *n);
    }
}
