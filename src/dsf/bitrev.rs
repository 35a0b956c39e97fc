/// Disc bytes carry the oldest sample in the MSB, DSF expects it in the LSB.
pub const BIT_REVERSE_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).reverse_bits();
        i += 1;
    }
    table
}

#[inline]
pub fn reverse(byte: u8) -> u8 {
    BIT_REVERSE_TABLE[byte as usize]
}
