use triton_core::device::EpromProgrammer;
use triton_core::device::eprom::EPROM_SIZE;

const PORT_A: u8 = 0; // data bus to the EPROM
const PORT_B: u8 = 1; // address low byte
const PORT_C: u8 = 2; // address prefix + CS/WE
const CONTROL: u8 = 3;

// Control words: bit 7 = mode set, bit 4 = port A direction
const A_OUTPUT: u8 = 0x80;
const A_INPUT: u8 = 0x90;

/// Point the programmer at `addr` with chip select and write enable lines
/// as given.
fn select(eprom: &mut EpromProgrammer, addr: u16, cs: bool, we: bool) {
    eprom.write(PORT_B, addr as u8);
    let mut c = ((addr >> 8) & 0x03) as u8;
    if cs {
        c |= 0x04;
    }
    if we {
        c |= 0x08;
    }
    eprom.write(PORT_C, c);
}

#[test]
fn test_fresh_part_reads_erased() {
    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_INPUT);
    select(&mut eprom, 0x123, true, false);
    assert_eq!(eprom.read(PORT_A), 0xFF);
}

#[test]
fn test_programming_ands_bits_in() {
    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_OUTPUT);
    select(&mut eprom, 0x040, true, true);
    eprom.write(PORT_A, 0x3C);

    eprom.write(CONTROL, A_INPUT);
    select(&mut eprom, 0x040, true, false);
    assert_eq!(eprom.read(PORT_A), 0x3C);

    // a second write can only clear bits, never set them
    eprom.write(CONTROL, A_OUTPUT);
    select(&mut eprom, 0x040, true, true);
    eprom.write(PORT_A, 0xF0);
    eprom.write(CONTROL, A_INPUT);
    select(&mut eprom, 0x040, true, false);
    assert_eq!(eprom.read(PORT_A), 0x30);
}

#[test]
fn test_write_requires_write_enable() {
    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_OUTPUT);
    select(&mut eprom, 0x000, true, false); // WE low
    eprom.write(PORT_A, 0x00);
    assert_eq!(eprom.image()[0], 0xFF);
    assert_eq!(eprom.write_count(0), 0);
}

#[test]
fn test_read_requires_chip_select() {
    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_OUTPUT);
    select(&mut eprom, 0x000, true, true);
    eprom.write(PORT_A, 0x00);

    eprom.write(CONTROL, A_INPUT);
    select(&mut eprom, 0x000, false, false); // CS low: bus floats
    assert_eq!(eprom.read(PORT_A), 0xFF);
    select(&mut eprom, 0x000, true, false);
    assert_eq!(eprom.read(PORT_A), 0x00);
}

#[test]
fn test_address_prefix_from_port_c() {
    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_OUTPUT);
    select(&mut eprom, 0x2A5, true, true); // prefix 2, low byte A5
    eprom.write(PORT_A, 0x55);
    assert_eq!(eprom.image()[0x2A5], 0x55);
    assert_eq!(eprom.image()[0x0A5], 0xFF); // other pages untouched
    assert_eq!(eprom.image()[0x3A5], 0xFF);
}

#[test]
fn test_write_counts_accumulate() {
    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_OUTPUT);
    select(&mut eprom, 0x010, true, true);
    for _ in 0..150 {
        eprom.write(PORT_A, 0xA5);
    }
    assert_eq!(eprom.write_count(0x010), 150);
    assert_eq!(eprom.image()[0x010], 0xA5);
}

#[test]
fn test_status_bit_tracks_program_pulses() {
    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_OUTPUT);
    select(&mut eprom, 0x000, true, true);
    assert_eq!(eprom.read(PORT_C) & 0x80, 0x80); // ready
    eprom.write(PORT_A, 0x00);
    assert_eq!(eprom.read(PORT_C) & 0x80, 0x00); // pulse pending
    select(&mut eprom, 0x000, true, true); // port C write re-arms
    assert_eq!(eprom.read(PORT_C) & 0x80, 0x80);
}

#[test]
fn test_bit_set_reset_drives_port_c() {
    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_OUTPUT);
    eprom.write(PORT_B, 0x42);
    // BSR: set bit 2 (chip select), set bit 3 (write enable)
    eprom.write(CONTROL, 0b0000_0101);
    eprom.write(CONTROL, 0b0000_0111);
    eprom.write(PORT_A, 0x00);
    assert_eq!(eprom.image()[0x042], 0x00);
    // BSR: reset bit 3
    eprom.write(CONTROL, 0b0000_0110);
    eprom.write(PORT_A, 0x55);
    assert_eq!(eprom.write_count(0x042), 1); // no further pulses
}

#[test]
fn test_uv_erase_restores_the_part() {
    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_OUTPUT);
    select(&mut eprom, 0x001, true, true);
    eprom.write(PORT_A, 0x00);
    eprom.uv_erase();
    assert_eq!(eprom.image()[0x001], 0xFF);
    assert_eq!(eprom.write_count(0x001), 0);
    assert!(eprom.image().iter().all(|&b| b == 0xFF));
}

#[test]
fn test_save_writes_the_image() {
    let path = std::env::temp_dir().join("triton_eprom_save_test");
    let _ = std::fs::remove_file(&path);

    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_OUTPUT);
    select(&mut eprom, 0x000, true, true);
    eprom.write(PORT_A, 0x12);
    eprom.save(&path).unwrap();

    let saved = std::fs::read(&path).unwrap();
    assert_eq!(saved.len(), EPROM_SIZE);
    assert_eq!(saved[0], 0x12);
    assert_eq!(saved[1], 0xFF);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_output_mode_port_a_reads_back_latch() {
    let mut eprom = EpromProgrammer::new();
    eprom.write(CONTROL, A_OUTPUT);
    select(&mut eprom, 0x000, true, false);
    eprom.write(PORT_A, 0x77);
    assert_eq!(eprom.read(PORT_A), 0x77);
    assert_eq!(eprom.read(PORT_B), 0x00);
}
