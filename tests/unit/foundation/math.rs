use super::*;

#[test]
fn fnv_hash_is_stable_across_chunking() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"stagecraft");
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"stage");
    b.write_bytes(b"craft");
    assert_eq!(a.finish(), b.finish());

    let mut c = Fnv1a64::new_default();
    c.write_u64(1);
    assert_ne!(c.finish(), a.finish());
}

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(0, 200), 0);
}

#[test]
fn normalize_degrees_half_open_range() {
    assert_eq!(normalize_degrees(180.0), 180.0);
    assert_eq!(normalize_degrees(-180.0), 180.0);
    assert_eq!(normalize_degrees(190.0), -170.0);
    assert_eq!(normalize_degrees(-190.0), 170.0);
    assert_eq!(normalize_degrees(720.0 + 45.0), 45.0);
    assert_eq!(normalize_degrees(0.0), 0.0);
}
