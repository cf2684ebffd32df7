const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Display color for an identifier as `#rrggbb`.
///
/// FNV-1a over the UTF-8 bytes, low 24 bits. Unlike `DefaultHasher` the
/// result does not change between builds or processes.
pub fn color_for(identifier: &str) -> String {
    let hash = identifier
        .bytes()
        .fold(FNV_OFFSET_BASIS, |acc, b| (acc ^ u64::from(b)).wrapping_mul(FNV_PRIME));
    format!("#{:06x}", hash & 0xFF_FFFF)
}
