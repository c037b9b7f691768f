//! End-to-end behaviour of the two cores over the simulated link.

use udc_common::config::PsConfig;
use udc_common::iib::frame::{encode_frame, encode_interlock};
use udc_common::iib::{FrameKind, IibDataId};
use udc_common::ipc::translate::{C28_CTOM_MSGRAM_START, M3_CTOM_MSGRAM_START};
use udc_common::ipc::{MessageId, MtocCommand, to_peer, to_self};
use udc_common::ps::{Fap4pHardInterlock, PsModel, PsState};
use udc_common::shm::{Core, SharedMemory};
use udc_firmware::{
    ControlCore, ControlHandler, HradcResetLine, IpcEndpoint, IpcTransport, SimulatedLink,
    SimulatedPort, Supervisor,
};

fn fap_4p_memory() -> SharedMemory {
    let mut shm = SharedMemory::new();
    shm.init(&PsConfig {
        model: PsModel::Fap4P,
        num_ps_modules: 4,
    });
    shm
}

fn cores() -> (
    Supervisor<SimulatedPort, HradcResetLine>,
    ControlCore<SimulatedPort>,
) {
    let (m3, c28) = SimulatedLink::pair();
    let supervisor = Supervisor::new(m3, HradcResetLine::new());
    let control = ControlCore::new(c28);
    supervisor.init();
    control.init();
    (supervisor, control)
}

/// Test: the control-side message-RAM base maps back onto itself.
#[test]
fn scenario_message_ram_base_roundtrip() {
    let self_addr = to_self(C28_CTOM_MSGRAM_START).expect("to_self");
    assert_eq!(self_addr, M3_CTOM_MSGRAM_START);
    assert_eq!(to_peer(self_addr).expect("to_peer"), C28_CTOM_MSGRAM_START);
}

/// Test: low-priority command 5 on message id 1 lands in bits 7:4 behind the tag.
#[test]
fn scenario_low_priority_layout() {
    let mut shm = fap_4p_memory();
    let (m3, _c28) = SimulatedLink::pair();
    let mut endpoint = IpcEndpoint::new(Core::Supervisory, m3);

    endpoint.send_low_priority(
        shm.supervisory().local,
        MessageId::new(1).expect("id"),
        MtocCommand::ResetInterlocks,
    );

    let pending = endpoint.transport().pending();
    assert_eq!(pending & 0xF, 0x1);
    assert_eq!((pending >> 4) & 0xF, 5);
    assert_eq!(shm.region(Core::Supervisory).msg_id, 1);
}

/// Test: an IGBT-1 temperature frame from address 3 changes only that field.
#[test]
fn scenario_igbt_temperature_frame() {
    let mut shm = fap_4p_memory();
    let (mut m3, _c28) = cores();
    let before = *m3.iib().modules();
    let region_before = *shm.region(Core::Supervisory);

    let v = 42.5f32.to_le_bytes();
    let frame = [0x03, 0x06, 0x00, 0x00, v[0], v[1], v[2], v[3]];
    assert!(m3.on_field_bus_frame(&mut shm.supervisory(), FrameKind::Data.message_id(), &frame));

    let after = m3.iib().modules();
    assert_eq!(after[2].temp_igbt1, 42.5);
    for id in IibDataId::ALL {
        if id != IibDataId::TempIgbt1 {
            assert_eq!(after[2].get(id), before[2].get(id), "{id:?} changed");
        }
    }
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1], before[1]);
    assert_eq!(after[3], before[3]);
    assert_eq!(*shm.region(Core::Supervisory), region_before);
}

/// Test: an empty interlock report from address 2 still latches module 1.
#[test]
fn scenario_zero_interlock_report_latches() {
    let mut shm = fap_4p_memory();
    let (mut m3, _c28) = cores();
    m3.on_field_bus_frame(
        &mut shm.supervisory(),
        FrameKind::Interlock.message_id(),
        &encode_interlock(2, 0),
    );

    let region = shm.region(Core::Supervisory);
    assert!(region.ps_module[1].hard_interlock.contains(Fap4pHardInterlock::IibItlk));
    assert_eq!(m3.iib().modules()[1].itlk_summary, 0);
    for (i, m) in region.ps_module.iter().enumerate() {
        if i != 1 {
            assert!(!m.hard_interlock.is_latched(), "module {i} latched");
        }
    }

    m3.on_field_bus_frame(
        &mut shm.supervisory(),
        FrameKind::Interlock.message_id(),
        &encode_interlock(2, 0x0000_0030),
    );
    assert_eq!(m3.iib().modules()[1].itlk_summary, 0x30);
}

/// Test: a sent flag stays busy until the peer's interrupt acknowledges it.
#[test]
fn scenario_busy_until_acknowledged() {
    let mut shm = fap_4p_memory();
    let (m3, c28) = SimulatedLink::pair();
    let mut m3 = IpcEndpoint::new(Core::Supervisory, m3);
    let mut c28 = IpcEndpoint::new(Core::Control, c28);
    let flag = 0x0001_0000;

    m3.send(shm.supervisory().local, MessageId::new(0).expect("id"), flag);
    assert!(m3.is_busy(flag));
    assert!(!m3.is_busy(!flag));

    c28.on_receive(&mut shm.control(), &mut ControlHandler);
    assert!(!m3.is_busy(flag));
}

/// Test: an IIB fault takes the module out of regulation until reset.
#[test]
fn iib_fault_stops_module_until_operator_reset() {
    let mut shm = fap_4p_memory();
    let (mut m3, mut c28) = cores();

    m3.send_command(&mut shm.supervisory(), 3, MtocCommand::TurnOn)
        .expect("turn on");
    c28.on_ipc_interrupt(&mut shm.control());
    assert_eq!(
        shm.region(Core::Control).ps_module[3].status.state(),
        Some(PsState::SlowRef)
    );

    m3.on_field_bus_frame(
        &mut shm.supervisory(),
        FrameKind::Interlock.message_id(),
        &encode_interlock(4, 0x1),
    );
    assert_eq!(m3.housekeeping(&mut shm.supervisory()), Some(3));
    c28.on_ipc_interrupt(&mut shm.control());
    assert_eq!(
        shm.region(Core::Control).ps_module[3].status.state(),
        Some(PsState::Interlock)
    );

    // More telemetry never clears the latch.
    for _ in 0..10 {
        m3.on_field_bus_frame(
            &mut shm.supervisory(),
            FrameKind::Data.message_id(),
            &encode_frame(4, 12, 35.0),
        );
        m3.housekeeping(&mut shm.supervisory());
        c28.on_ipc_interrupt(&mut shm.control());
    }
    assert!(
        shm.region(Core::Control).ps_module[3]
            .hard_interlock
            .contains(Fap4pHardInterlock::IibItlk)
    );

    m3.send_command(&mut shm.supervisory(), 3, MtocCommand::TurnOn)
        .expect("turn on");
    c28.on_ipc_interrupt(&mut shm.control());
    assert_eq!(
        shm.region(Core::Control).ps_module[3].status.state(),
        Some(PsState::Interlock)
    );

    m3.reset_interlocks(&mut shm.supervisory(), 3).expect("reset");
    c28.on_ipc_interrupt(&mut shm.control());
    assert_eq!(
        shm.region(Core::Control).ps_module[3].status.state(),
        Some(PsState::Off)
    );
    assert!(!shm.region(Core::Control).ps_module[3].hard_interlock.is_latched());
}
