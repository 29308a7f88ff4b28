//! Integration tests for the PIO runtime
//!
//! Programs are loaded from assembly text and stepped against a fabric; the
//! assertions cover timing, shift-register and FIFO behavior.

use pio_runtime::{PinFabric, PioBlock, StateMachine, Status};
use pio_spec::{StateMachineConfig, FIFO_DEPTH};

fn load(source: &str, config: StateMachineConfig) -> StateMachine {
    let mut sm = StateMachine::with_config(config).unwrap();
    let program = sm.load_source(source);
    assert!(program.diagnostics.is_empty(), "{:?}", program.diagnostics);
    sm.enable();
    sm
}

// ============================================================================
// Timing
// ============================================================================

#[test]
fn test_nop_without_delay_takes_one_cycle() {
    let mut sm = load("nop", StateMachineConfig::DEFAULT);
    let mut fabric = PinFabric::new();
    assert!(sm.step(&mut fabric));
    assert_eq!(sm.cycle_count(), 1);
}

#[test]
fn test_blink_holds_each_level_for_32_cycles() {
    let source = r#"
.program blink
.wrap_target
    set pins, 1 [31]
    set pins, 0 [31]
.wrap
"#;
    let config = StateMachineConfig::DEFAULT.with_set_pins(0, 1);
    let mut sm = load(source, config);
    let mut fabric = PinFabric::new();

    let mut levels = Vec::new();
    let mut starts = Vec::new();
    for _ in 0..4 {
        starts.push(sm.cycle_count());
        assert!(sm.step(&mut fabric));
        levels.push(fabric.get_gpio(0));
    }

    assert_eq!(levels, vec![true, false, true, false]);
    assert_eq!(starts, vec![0, 32, 64, 96]);
    assert_eq!(sm.cycle_count(), 128);
    assert_eq!(fabric.gpio_mask(), 0);
}

#[test]
fn test_delay_is_consumed_once_per_execution() {
    let mut sm = load(".wrap_target\nnop [4]\n.wrap", StateMachineConfig::DEFAULT);
    let mut fabric = PinFabric::new();
    for n in 1..=10u64 {
        sm.step(&mut fabric);
        assert_eq!(sm.cycle_count(), 5 * n);
    }
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_jmp_x_decrement() {
    let mut sm = load("loop:\njmp x--, loop\nnop", StateMachineConfig::DEFAULT);
    let mut fabric = PinFabric::new();

    sm.registers_mut().x = 1;
    sm.step(&mut fabric);
    assert_eq!(sm.registers().x, 0);
    assert_eq!(sm.registers().pc, 2);

    sm.registers_mut().pc = 0;
    sm.registers_mut().x = 2;
    sm.step(&mut fabric);
    assert_eq!(sm.registers().x, 1);
    assert_eq!(sm.registers().pc, 0);
}

#[test]
fn test_counted_loop() {
    let source = "set x, 5\nloop:\nset y, 1\njmp x--, loop\nset y, 2";
    let mut sm = load(source, StateMachineConfig::DEFAULT);
    let mut fabric = PinFabric::new();

    let steps = sm.run_cycles(&mut fabric, 100);
    // set x, then 5 passes of (set y, jmp), then the final set y
    assert_eq!(steps, 1 + 5 * 2 + 1);
    assert_eq!(sm.registers().x, 0);
    assert_eq!(sm.registers().y, 2);
    assert_eq!(sm.status(), Status::Disabled);
}

#[test]
fn test_jmp_pin_uses_jmp_pin() {
    let config = StateMachineConfig::DEFAULT.with_jmp_pin(9);
    let mut sm = load("jmp pin, high\nset x, 1\nhigh:\nset y, 1", config);
    let mut fabric = PinFabric::new();
    fabric.set_gpio(9, true);

    sm.run_cycles(&mut fabric, 10);
    assert_eq!(sm.registers().x, 0);
    assert_eq!(sm.registers().y, 1);
}

#[test]
fn test_wait_gpio_stalls_until_level() {
    let mut sm = load("wait 1 gpio 20\nset x, 3", StateMachineConfig::DEFAULT);
    let mut fabric = PinFabric::new();

    for _ in 0..10 {
        assert!(sm.step(&mut fabric));
        assert!(sm.is_stalled());
    }
    // Stalled attempts consume no cycles
    assert_eq!(sm.cycle_count(), 0);

    fabric.set_gpio(20, true);
    sm.step(&mut fabric);
    sm.step(&mut fabric);
    assert_eq!(sm.registers().x, 3);
}

// ============================================================================
// Shift registers and FIFOs
// ============================================================================

#[test]
fn test_out_pins_writes_only_bitcount_pins() {
    let mut sm = load("out pins, 8", StateMachineConfig::DEFAULT);
    let mut fabric = PinFabric::new();
    fabric.set_gpio(12, true);

    sm.registers_mut().osr = 0xFF;
    sm.registers_mut().osr_shift_count = 32;
    sm.step(&mut fabric);

    assert_eq!(fabric.gpio_mask(), 0xFF | (1 << 12));
    assert_eq!(sm.registers().osr_shift_count, 24);
}

#[test]
fn test_out_pins_respects_out_count() {
    let config = StateMachineConfig::DEFAULT.with_out_pins(4, 2);
    let mut sm = load("out pins, 8", config);
    let mut fabric = PinFabric::new();

    sm.put_tx(0xFF);
    sm.step(&mut fabric);
    assert_eq!(fabric.gpio_mask(), 0b11 << 4);
}

#[test]
fn test_in_pins_autopush() {
    let config = StateMachineConfig::DEFAULT.with_autopush(32);
    let mut sm = load(".wrap_target\nin pins, 32\n.wrap", config);
    let mut fabric = PinFabric::new();
    fabric.set_gpio(1, true);

    for n in 1..=FIFO_DEPTH + 3 {
        sm.step(&mut fabric);
        assert_eq!(sm.rx_level(), n.min(FIFO_DEPTH));
        assert_eq!(sm.registers().isr_shift_count, 0);
        assert_eq!(sm.registers().isr, 0);
    }
    assert_eq!(sm.get_rx(), Some(0b10));
}

#[test]
fn test_in_pins_pushes_at_default_threshold() {
    let mut sm = load(".wrap_target\nin pins, 32\n.wrap", StateMachineConfig::DEFAULT);
    let mut fabric = PinFabric::new();
    fabric.set_gpio(3, true);

    for n in 1..=FIFO_DEPTH + 2 {
        sm.step(&mut fabric);
        assert_eq!(sm.rx_level(), n.min(FIFO_DEPTH));
        assert_eq!(sm.registers().isr_shift_count, 0);
    }
    assert_eq!(sm.get_rx(), Some(1 << 3));
}

#[test]
fn test_in_x_shifts_top_byte() {
    let mut sm = load("in x, 8", StateMachineConfig::DEFAULT);
    let mut fabric = PinFabric::new();
    sm.registers_mut().x = 0xAB00_0000;

    sm.step(&mut fabric);
    assert_eq!(sm.registers().isr, 0xAB00_0000);
    assert_eq!(sm.registers().isr_shift_count, 8);
    assert_eq!(sm.rx_level(), 0);
}

#[test]
fn test_pull_stalls_on_empty_tx() {
    let mut sm = load("pull", StateMachineConfig::DEFAULT);
    let mut fabric = PinFabric::new();

    for _ in 0..1000 {
        assert!(sm.step(&mut fabric));
        assert_eq!(sm.registers().pc, 0);
        assert!(sm.is_stalled());
    }
    assert_eq!(sm.cycle_count(), 0);

    sm.put_tx(0x1234);
    sm.step(&mut fabric);
    assert!(!sm.is_stalled());
    assert_eq!(sm.cycle_count(), 1);
    assert_eq!(sm.registers().osr, 0x1234);
}

#[test]
fn test_serial_shift_out() {
    let source = r#"
    pull
    set x, 8
bitloop:
    out pins, 1
    jmp x--, bitloop
"#;
    let config = StateMachineConfig::DEFAULT.with_out_pins(3, 1);
    let mut sm = load(source, config);
    let mut fabric = PinFabric::new();
    sm.put_tx(0b1011_0010);

    let mut bits = Vec::new();
    while sm.step(&mut fabric) {
        if sm.current_instruction().map(|i| i.mnemonic()) == Some("jmp") {
            bits.push(fabric.get_gpio(3));
        }
    }

    assert_eq!(
        bits,
        vec![false, true, false, false, true, true, false, true]
    );
}

#[test]
fn test_echo_through_fifos() {
    let source = r#"
.wrap_target
    pull
    mov x, ~osr
    mov isr, x
    push
.wrap
"#;
    let mut sm = load(source, StateMachineConfig::DEFAULT);
    let mut fabric = PinFabric::new();

    for value in [0u32, 1, 0xFFFF_0000] {
        assert!(sm.put_tx(value));
    }
    sm.run_cycles(&mut fabric, 20);

    assert_eq!(sm.get_rx(), Some(!0u32));
    assert_eq!(sm.get_rx(), Some(!1u32));
    assert_eq!(sm.get_rx(), Some(0x0000_FFFF));
    assert_eq!(sm.get_rx(), None);
    assert!(sm.is_stalled());
}

#[test]
fn test_tx_fifo_bounded() {
    let mut sm = StateMachine::new();
    for i in 0..FIFO_DEPTH as u32 {
        assert!(sm.put_tx(i));
    }
    assert!(!sm.put_tx(99));
    assert_eq!(sm.tx_level(), FIFO_DEPTH);
}

// ============================================================================
// Side-set
// ============================================================================

#[test]
fn test_side_set_pindirs() {
    let source = ".side_set 2 pindirs\nnop side 2\nnop side 1";
    let config = StateMachineConfig::DEFAULT.with_sideset_pins(6, 0);
    let mut sm = load(source, config);
    let mut fabric = PinFabric::new();

    sm.step(&mut fabric);
    assert_eq!(fabric.dir_mask(), 0b10 << 6);
    sm.step(&mut fabric);
    assert_eq!(fabric.dir_mask(), 0b01 << 6);
    assert_eq!(fabric.gpio_mask(), 0);
}

#[test]
fn test_configured_side_set_wins_over_directive() {
    let source = ".side_set 3\nnop side 7";
    let config = StateMachineConfig::DEFAULT.with_sideset_pins(0, 1);
    let mut sm = load(source, config);
    let mut fabric = PinFabric::new();

    sm.step(&mut fabric);
    assert_eq!(fabric.gpio_mask(), 0b1);
}

// ============================================================================
// Block level
// ============================================================================

#[test]
fn test_irq_handshake_between_machines() {
    let producer = "irq wait 1\nset x, 1";
    let consumer = "wait 1 irq 1\nset y, 1";

    let mut block = PioBlock::new();
    block.add_state_machine(load(producer, StateMachineConfig::DEFAULT)).unwrap();
    block.add_state_machine(load(consumer, StateMachineConfig::DEFAULT)).unwrap();
    block.start_all();

    // Tick 1: producer raises the flag and waits, consumer sees and clears it
    block.step_all();
    assert!(block.state_machine(0).unwrap().is_stalled());
    assert!(!block.get_irq(1));

    // Tick 2: producer observes the clear
    block.step_all();
    assert!(!block.state_machine(0).unwrap().is_stalled());

    block.run(10);
    assert_eq!(block.state_machine(0).unwrap().registers().x, 1);
    assert_eq!(block.state_machine(1).unwrap().registers().y, 1);
}

#[test]
fn test_relative_irq_per_machine() {
    let mut block = PioBlock::new();
    for _ in 0..4 {
        block
            .add_state_machine(load("irq 0 rel", StateMachineConfig::DEFAULT))
            .unwrap();
    }
    block.start_all();
    block.step_all();
    assert_eq!(block.fabric().irq_mask(), 0b1111);
}

// ============================================================================
// Property tests
// ============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_nop_delay_costs_delay_plus_one(delay in 0u8..=31) {
            let mut sm = load(&format!("nop [{}]", delay), StateMachineConfig::DEFAULT);
            let mut fabric = PinFabric::new();
            prop_assert!(sm.step(&mut fabric));
            prop_assert_eq!(sm.cycle_count(), delay as u64 + 1);
        }

        #[test]
        fn test_rx_fifo_never_exceeds_depth(steps in 0usize..40) {
            let config = StateMachineConfig::DEFAULT.with_autopush(8);
            let mut sm = load(".wrap_target\nin x, 8\n.wrap", config);
            let mut fabric = PinFabric::new();
            for _ in 0..steps {
                sm.step(&mut fabric);
                prop_assert!(sm.rx_level() <= FIFO_DEPTH);
                prop_assert!(sm.registers().isr_shift_count <= 32);
            }
            prop_assert_eq!(sm.rx_level(), steps.min(FIFO_DEPTH));
        }

        #[test]
        fn test_pc_stays_within_wrap(steps in 1u64..200, x in 0u32..16) {
            let source = "set y, 0\n.wrap_target\njmp !x, skip\nmov y, x\nskip:\njmp x--, skip\n.wrap\nset y, 31";
            let mut sm = load(source, StateMachineConfig::DEFAULT);
            sm.registers_mut().x = x;
            let mut fabric = PinFabric::new();

            sm.step(&mut fabric);
            for _ in 0..steps {
                prop_assert!(sm.step(&mut fabric));
                let pc = sm.registers().pc;
                prop_assert!((1..=6).contains(&pc), "pc = {}", pc);
            }
            prop_assert_ne!(sm.registers().y, 31);
        }
    }
}
