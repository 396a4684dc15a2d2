mod common;

use common::{console, run_until, toggle_times, SimBoard, SimFault};
use fault_scenarios::write_to_address_zero;
use fault_trap::Fault;

fn fault_on_edge_at(at: u32) -> SimFault {
    SimBoard::press_button_at(at);
    write_to_address_zero::app_start::<SimBoard>().unwrap();

    run_until()
}

#[test]
fn blinks_until_the_falling_edge_then_faults() {
    let _board = SimBoard::take();

    // Off the blink grid, the fault does not wait for the next blink
    let fault = fault_on_edge_at(1_730);

    assert_eq!(fault.fault, Fault::null_write_u16(0xDEAD));
    assert_eq!(fault.at, 1_730);
    assert_eq!(toggle_times(), [501, 1_002, 1_503]);
    assert!(console().is_empty());
}

#[test]
fn edge_before_the_first_blink_faults_right_away() {
    let _board = SimBoard::take();

    let fault = fault_on_edge_at(200);

    assert_eq!(fault.fault, Fault::null_write_u16(0xDEAD));
    assert_eq!(fault.at, 200);
    assert!(toggle_times().is_empty());
}

#[test]
fn edge_on_a_blink_instant_preempts_that_blink() {
    let _board = SimBoard::take();

    // The third blink is due at 1503 ms, the interrupt comes first
    let fault = fault_on_edge_at(1_503);

    assert_eq!(fault.fault, Fault::null_write_u16(0xDEAD));
    assert_eq!(fault.at, 1_503);
    assert_eq!(toggle_times(), [501, 1_002]);
}
