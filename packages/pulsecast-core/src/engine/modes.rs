//! Mode policies: translate an analysis frame (or wall-clock time) into a
//! per-lamp color/brightness target.

use crate::analysis::Frame;
use crate::engine::state::Mode;

/// A single lamp's intended color and brightness for this iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LampTarget {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub brightness: u8,
}

/// Mutable per-worker state not shared with the supervisor (`hue_phase`,
/// `beat_count`): owned exclusively by the worker loop, so it needs no lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPhase {
    pub hue_phase: f32,
    pub beat_count: u64,
}

/// Standard 6-sector HSV to RGB conversion. `h` wraps to `[0,1)`, `s` and `v`
/// are clamped to `[0,1]`. `s = 0` yields an achromatic triple.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);

    if s == 0.0 {
        let gray = (v * 255.0).round() as u8;
        return (gray, gray, gray);
    }

    let h6 = h * 6.0;
    let sector = h6.floor() as i32;
    let f = h6 - h6.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector.rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    let to_u8 = |c: f32| (c * 255.0).round() as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}

fn round_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Drives both lamps from one analysis frame under the given mode and
/// worker phase, advancing `phase` in place.
pub fn drive_from_frame(mode: Mode, intensity: u8, frame: &Frame, phase: &mut WorkerPhase) -> [LampTarget; 2] {
    let s = intensity as f32 / 10.0;
    let e = (frame.rms * 5.0).min(1.0);

    match mode {
        Mode::Pulse => pulse_from_frame(s, e, frame.beat, frame.rms, phase),
        Mode::Ambient => ambient_from_frame(s, e, phase),
        Mode::Party => party_from_frame(s, e, frame.beat, phase),
        Mode::Off => [LampTarget { r: 0, g: 0, b: 0, brightness: 1 }; 2],
    }
}

fn pulse_from_frame(s: f32, e: f32, beat: bool, rms: f32, phase: &mut WorkerPhase) -> [LampTarget; 2] {
    let brightness = if beat {
        phase.hue_phase = (phase.hue_phase + 0.08).rem_euclid(1.0);
        phase.beat_count = phase.beat_count.wrapping_add(1);
        round_u8(100.0 * s)
    } else {
        phase.hue_phase = (phase.hue_phase + 0.002).rem_euclid(1.0);
        round_u8((rms * 500.0).clamp(20.0, 70.0) * s)
    };

    let base = if e > 0.5 { e * 0.1 } else { 0.6 + (1.0 - e) * 0.15 };
    let hue = (base + phase.hue_phase * 0.3).rem_euclid(1.0);
    let saturation = 0.7 + 0.3 * s;
    let (r, g, b) = hsv_to_rgb(hue, saturation, 1.0);

    [LampTarget { r, g, b, brightness }; 2]
}

fn ambient_from_frame(s: f32, e: f32, phase: &mut WorkerPhase) -> [LampTarget; 2] {
    let speed = 0.001 + e * 0.005;
    phase.hue_phase = (phase.hue_phase + speed).rem_euclid(1.0);

    let saturation = 0.4 + 0.3 * e;
    let brightness = round_u8((30.0 + 50.0 * e) * s);

    let (r0, g0, b0) = hsv_to_rgb(phase.hue_phase, saturation, 1.0);
    let (r1, g1, b1) = hsv_to_rgb((phase.hue_phase + 0.5).rem_euclid(1.0), saturation, 1.0);

    [
        LampTarget { r: r0, g: g0, b: b0, brightness },
        LampTarget { r: r1, g: g1, b: b1, brightness },
    ]
}

fn party_from_frame(s: f32, e: f32, beat: bool, phase: &mut WorkerPhase) -> [LampTarget; 2] {
    if beat {
        phase.hue_phase = (phase.hue_phase + 0.15).rem_euclid(1.0);
        let flash = (phase.beat_count % 2) as usize;
        phase.beat_count = phase.beat_count.wrapping_add(1);

        let (r, g, b) = hsv_to_rgb(phase.hue_phase, 1.0, 1.0);
        let (cr, cg, cb) = hsv_to_rgb((phase.hue_phase + 0.5).rem_euclid(1.0), 1.0, 1.0);
        let mut targets = [
            LampTarget { r: cr, g: cg, b: cb, brightness: round_u8(40.0 * s) },
            LampTarget { r: cr, g: cg, b: cb, brightness: round_u8(40.0 * s) },
        ];
        targets[flash] = LampTarget { r, g, b, brightness: round_u8(100.0 * s) };
        targets
    } else if e > 0.8 {
        let brightness = round_u8(100.0 * s);
        [LampTarget { r: 255, g: 255, b: 255, brightness }; 2]
    } else {
        let (r, g, b) = hsv_to_rgb(phase.hue_phase, 0.8, 1.0);
        let brightness = round_u8((40.0 * e).max(10.0) * s);
        [LampTarget { r, g, b, brightness }; 2]
    }
}

/// Wall-clock-driven pattern used when no audio is available. `t` is seconds
/// since the worker started.
pub fn drive_from_clock(mode: Mode, intensity: u8, t: f64, phase: &mut WorkerPhase) -> [LampTarget; 2] {
    let s = intensity as f32 / 10.0;

    match mode {
        Mode::Pulse => {
            let brightness = round_u8((40.0 + 30.0 * (2.0 * t).sin() as f32) * s);
            phase.hue_phase = (phase.hue_phase + 0.003).rem_euclid(1.0);
            let (r, g, b) = hsv_to_rgb(phase.hue_phase, 0.8, 1.0);
            [LampTarget { r, g, b, brightness }; 2]
        }
        Mode::Ambient => {
            phase.hue_phase = (phase.hue_phase + 0.001).rem_euclid(1.0);
            let brightness = round_u8(50.0 * s);
            let (r0, g0, b0) = hsv_to_rgb(phase.hue_phase, 0.6, 1.0);
            let (r1, g1, b1) = hsv_to_rgb((phase.hue_phase + 0.5).rem_euclid(1.0), 0.6, 1.0);
            [
                LampTarget { r: r0, g: g0, b: b0, brightness },
                LampTarget { r: r1, g: g1, b: b1, brightness },
            ]
        }
        Mode::Party => {
            phase.hue_phase = (phase.hue_phase + 0.01).rem_euclid(1.0);
            let idx = ((4.0 * t).floor() as i64).rem_euclid(2) as usize;
            let (r, g, b) = hsv_to_rgb(phase.hue_phase, 1.0, 1.0);
            let on_brightness = round_u8(100.0 * s);
            let off_brightness = round_u8(10.0 * s);
            let mut targets = [
                LampTarget { r: 0, g: 0, b: 0, brightness: off_brightness },
                LampTarget { r: 0, g: 0, b: 0, brightness: off_brightness },
            ];
            targets[idx] = LampTarget { r, g, b, brightness: on_brightness };
            targets
        }
        Mode::Off => [LampTarget { r: 0, g: 0, b: 0, brightness: 1 }; 2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_to_rgb_is_pure() {
        assert_eq!(hsv_to_rgb(0.3, 0.5, 0.8), hsv_to_rgb(0.3, 0.5, 0.8));
    }

    #[test]
    fn hsv_zero_saturation_is_achromatic() {
        let (r, g, b) = hsv_to_rgb(0.42, 0.0, 0.6);
        let expected = (0.6f32 * 255.0).round() as u8;
        assert_eq!((r, g, b), (expected, expected, expected));
    }

    #[test]
    fn hsv_primary_red_at_zero_hue() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), (255, 0, 0));
    }

    #[test]
    fn pulse_with_zero_rms_and_no_beat_respects_intensity_floor() {
        let frame = Frame { bass: 0.0, mid: 0.0, treble: 0.0, rms: 0.0, beat: false };
        let mut phase = WorkerPhase::default();
        let targets = drive_from_frame(Mode::Pulse, 7, &frame, &mut phase);
        // brightness = round(clamp(0, 20, 70) * 0.7) = round(20*0.7) = 14
        assert_eq!(targets[0].brightness, 14);
    }

    #[test]
    fn pulse_intensity_one_never_exceeds_ten() {
        let frame = Frame { bass: 1.0, mid: 1.0, treble: 1.0, rms: 1.0, beat: true };
        let mut phase = WorkerPhase::default();
        let targets = drive_from_frame(Mode::Pulse, 1, &frame, &mut phase);
        assert!(targets[0].brightness <= 10);
    }

    #[test]
    fn pulse_intensity_ten_with_beat_is_full_brightness() {
        let frame = Frame { bass: 1.0, mid: 1.0, treble: 1.0, rms: 1.0, beat: true };
        let mut phase = WorkerPhase::default();
        let targets = drive_from_frame(Mode::Pulse, 10, &frame, &mut phase);
        assert_eq!(targets[0].brightness, 100);
        assert_eq!(targets[1].brightness, 100);
    }

    #[test]
    fn ambient_lamps_use_complementary_hues() {
        let frame = Frame { bass: 0.0, mid: 0.0, treble: 0.0, rms: 0.2, beat: false };
        let mut phase = WorkerPhase { hue_phase: 0.1, beat_count: 0 };
        let targets = drive_from_frame(Mode::Ambient, 5, &frame, &mut phase);
        // Both lamps get the same brightness, different (complementary) hues.
        assert_eq!(targets[0].brightness, targets[1].brightness);
        assert_ne!((targets[0].r, targets[0].g, targets[0].b), (targets[1].r, targets[1].g, targets[1].b));
    }

    #[test]
    fn party_energy_spike_without_beat_goes_white() {
        let frame = Frame { bass: 0.0, mid: 0.0, treble: 0.0, rms: 1.0, beat: false };
        let mut phase = WorkerPhase::default();
        let targets = drive_from_frame(Mode::Party, 5, &frame, &mut phase);
        assert_eq!((targets[0].r, targets[0].g, targets[0].b), (255, 255, 255));
        assert_eq!((targets[1].r, targets[1].g, targets[1].b), (255, 255, 255));
    }

    #[test]
    fn party_beat_alternates_flash_lamp_by_beat_count() {
        let frame = Frame { bass: 0.0, mid: 0.0, treble: 0.0, rms: 0.0, beat: true };
        let mut phase = WorkerPhase::default();
        let first = drive_from_frame(Mode::Party, 10, &frame, &mut phase);
        let second = drive_from_frame(Mode::Party, 10, &frame, &mut phase);
        // First beat (beat_count starts at 0) flashes lamp 0; second flashes lamp 1.
        assert_eq!(first[0].brightness, 100);
        assert_eq!(second[1].brightness, 100);
    }

    #[test]
    fn pattern_only_ambient_uses_complementary_hues() {
        let mut phase = WorkerPhase::default();
        let targets = drive_from_clock(Mode::Ambient, 3, 1.0, &mut phase);
        assert_eq!(targets[0].brightness, targets[1].brightness);
        assert_ne!((targets[0].r, targets[0].g, targets[0].b), (targets[1].r, targets[1].g, targets[1].b));
    }
}
