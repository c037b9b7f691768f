//! Property tests over arbitrary field-bus traffic, plus a file-driven run
//! of the simulator.

use proptest::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;
use udc_common::config::{ConfigLoader, UdcConfig};
use udc_common::consts::MAX_IIB_MODULES;
use udc_common::iib::{FRAME_LEN, FrameKind, IibDataId};
use udc_common::ps::{Fap4pHardInterlock, PsState};
use udc_common::shm::Core;
use udc_firmware::IibAggregator;
use udc_firmware::sim::{Simulator, parse_frames};

const FAP_4P_CONFIG: &str = r#"
[shared]
log_level = "warn"
service_name = "udc-props"

[ps]
model = "fap_4p"
num_ps_modules = 4
"#;

fn simulator() -> Simulator {
    let mut file = NamedTempFile::new().expect("config file");
    file.write_all(FAP_4P_CONFIG.as_bytes()).expect("write config");
    let config = UdcConfig::load(file.path()).expect("config");
    Simulator::new(config).expect("simulator")
}

fn frame_kind() -> impl Strategy<Value = FrameKind> {
    prop_oneof![
        Just(FrameKind::Data),
        Just(FrameKind::Interlock),
        Just(FrameKind::Alarm),
    ]
}

fn frame() -> impl Strategy<Value = (FrameKind, [u8; FRAME_LEN])> {
    (frame_kind(), 0u8..=6, any::<u8>(), any::<u32>()).prop_map(|(kind, address, id, raw)| {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = address;
        bytes[1] = id;
        bytes[4..].copy_from_slice(&raw.to_le_bytes());
        (kind, bytes)
    })
}

fn hard_bits(sim: &Simulator) -> Vec<(u32, u32)> {
    sim.report()
        .modules
        .iter()
        .map(|m| (m.supervisory_hard_interlock, m.hard_interlock))
        .collect()
}

proptest! {
    /// Test: only the addressed field of the addressed board changes.
    #[test]
    fn telemetry_touches_one_field(
        index in 0usize..MAX_IIB_MODULES,
        id in prop::sample::select(IibDataId::ALL.to_vec()),
        value in -1.0e6f32..1.0e6,
    ) {
        let mut iib = IibAggregator::new();
        let before = *iib.modules();

        let applied = iib.apply_telemetry(index, id as u8, value).expect("in range");
        prop_assert_eq!(applied, Some(id));

        let after = iib.modules();
        for (i, (a, b)) in after.iter().zip(before.iter()).enumerate() {
            for other in IibDataId::ALL {
                if i == index && other == id {
                    prop_assert_eq!(a.get(other), value);
                } else {
                    prop_assert_eq!(a.get(other), b.get(other));
                }
            }
        }
    }

    /// Test: unrecognised data ids leave every board untouched.
    #[test]
    fn unknown_data_id_is_noop(
        index in 0usize..MAX_IIB_MODULES,
        id in any::<u8>().prop_filter("recognised id", |id| IibDataId::from_u8(*id).is_none()),
        value in any::<f32>(),
    ) {
        let mut iib = IibAggregator::new();
        let before = *iib.modules();
        prop_assert_eq!(iib.apply_telemetry(index, id, value).expect("in range"), None);
        prop_assert_eq!(iib.modules(), &before);
        prop_assert_eq!(iib.stats().unknown_data_id, 1);
    }

    /// Test: no frame sequence ever clears a latched hard interlock on
    /// either core.
    #[test]
    fn hard_interlocks_never_clear_without_reset(
        frames in prop::collection::vec(frame(), 1..40),
    ) {
        let mut sim = simulator();
        let mut previous = hard_bits(&sim);

        for (kind, bytes) in &frames {
            sim.feed(*kind, bytes);
            sim.settle();

            let now = hard_bits(&sim);
            for ((s0, c0), (s1, c1)) in previous.iter().zip(now.iter()) {
                prop_assert_eq!(s0 & s1, *s0);
                prop_assert_eq!(c0 & c1, *c0);
            }
            previous = now;
        }
    }

    /// Test: every interlock report from a known address ends with the
    /// control core holding that module in Interlock.
    #[test]
    fn interlock_report_reaches_control_core(
        address in 1u8..=4,
        raw in any::<u32>(),
    ) {
        let mut sim = simulator();
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = address;
        bytes[4..].copy_from_slice(&raw.to_le_bytes());

        prop_assert!(sim.feed(FrameKind::Interlock, &bytes));
        sim.settle();

        let index = usize::from(address - 1);
        let control = sim.shared_memory().region(Core::Control);
        prop_assert!(control.ps_module[index].hard_interlock.contains(Fap4pHardInterlock::IibItlk));
        prop_assert_eq!(control.ps_module[index].status.state(), Some(PsState::Interlock));
    }
}

/// Test: configuration and frame files on disk drive a full replay.
#[test]
fn replay_from_files() {
    let mut config_file = NamedTempFile::new().expect("config file");
    config_file
        .write_all(FAP_4P_CONFIG.as_bytes())
        .expect("write config");
    let config = UdcConfig::load(config_file.path()).expect("load config");
    config.validate().expect("valid config");

    let mut frame_file = NamedTempFile::new().expect("frame file");
    writeln!(frame_file, "# board 1 input voltage, then a board 2 fault").expect("write");
    writeln!(frame_file, "data 01 02 00 00 00 00 f0 43").expect("write");
    writeln!(frame_file, "itlk 02 00 00 00 04 00 00 00").expect("write");
    writeln!(frame_file, "data 09 02 00 00 00 00 f0 43").expect("write");
    let text = std::fs::read_to_string(frame_file.path()).expect("read frames");
    let frames = parse_frames(&text).expect("parse frames");
    assert_eq!(frames.len(), 3);

    let mut sim = Simulator::new(config).expect("simulator");
    sim.run(&frames);
    let report = sim.report();

    assert_eq!(report.service_name, "udc-props");
    assert_eq!(report.frames_in, 3);
    assert_eq!(report.frames_applied, 2);
    assert_eq!(report.iib_stats.rejected_address, 1);
    assert_eq!(report.iib[0].vin, 480.0);
    assert_eq!(report.iib[1].itlk_summary, 0x4);
    assert_eq!(report.modules[1].state, Some(PsState::Interlock));
    assert_eq!(report.modules[0].state, Some(PsState::Off));
    assert_eq!(report.variables, 79);
}
