use jewelmusic::webhooks::{sign, verify, verify_at};
use proptest::prelude::*;

const NOW: i64 = 1_700_000_000;

fn secret() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,40}"
}

proptest! {
    #[test]
    fn signed_payload_verifies_within_window(
        payload in any::<String>(),
        secret in secret(),
        skew in -300i64..=300,
    ) {
        let header = sign(payload.as_bytes(), &secret, Some(NOW + skew));
        prop_assert!(verify_at(payload.as_bytes(), &header, &secret, 300, NOW));
    }

    #[test]
    fn signature_outside_window_is_rejected(
        payload in any::<String>(),
        secret in secret(),
        excess in 1i64..100_000,
        future in any::<bool>(),
    ) {
        let ts = if future { NOW + 300 + excess } else { NOW - 300 - excess };
        let header = sign(payload.as_bytes(), &secret, Some(ts));
        prop_assert!(!verify_at(payload.as_bytes(), &header, &secret, 300, NOW));
    }

    #[test]
    fn flipped_byte_is_rejected(
        payload in "[ -~]{1,200}",
        secret in secret(),
        index in any::<prop::sample::Index>(),
        bit in 0u8..7,
    ) {
        let header = sign(payload.as_bytes(), &secret, Some(NOW));
        let mut tampered = payload.into_bytes();
        let i = index.index(tampered.len());
        tampered[i] ^= 1 << bit;
        prop_assert!(!verify_at(&tampered, &header, &secret, 300, NOW));
    }

    #[test]
    fn other_secret_is_rejected(
        payload in any::<String>(),
        s1 in secret(),
        s2 in secret(),
    ) {
        prop_assume!(s1 != s2);
        let header = sign(payload.as_bytes(), &s1, Some(NOW));
        prop_assert!(!verify_at(payload.as_bytes(), &header, &s2, 300, NOW));
    }

    #[test]
    fn arbitrary_headers_never_panic(header in any::<String>(), payload in any::<Vec<u8>>()) {
        let _ = verify(&payload, &header, "whsec_test", 300);
    }
}

#[test]
fn fresh_signature_verifies_against_system_clock() {
    let payload = br#"{"id":"evt_1","type":"track.uploaded"}"#;
    let header = sign(payload, "whsec_test", None);
    assert!(verify(payload, &header, "whsec_test", 300));
    assert!(!verify(payload, &header, "whsec_other", 300));
}
