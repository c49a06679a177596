//! Property-Based Tests for the BARON cipher and token primitives
//!
//! - AES-128 decrypt(encrypt(P, K), K) == P for all blocks and keys
//! - Agreement with the RustCrypto `aes` crate on random inputs
//! - Token seal/open and mask involution
//! - Ratchet monotonicity over repeated rounds

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::aes::{aes128_decrypt, aes128_encrypt, Aes128};
    use crate::ratchet::Ratchet;
    use crate::token::Token;

    // ========================================================================
    // Cipher
    // ========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_aes_round_trip(
            plaintext in prop::array::uniform16(any::<u8>()),
            key in prop::array::uniform16(any::<u8>()),
        ) {
            let ciphertext = aes128_encrypt(&plaintext, &key).unwrap();
            prop_assert_eq!(aes128_decrypt(&ciphertext, &key), plaintext);
        }

        #[test]
        fn prop_aes_matches_reference_crate(
            plaintext in prop::array::uniform16(any::<u8>()),
            key in prop::array::uniform16(any::<u8>()),
        ) {
            use ::aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};

            let reference = ::aes::Aes128::new(GenericArray::from_slice(&key));
            let mut block = GenericArray::clone_from_slice(&plaintext);
            reference.encrypt_block(&mut block);

            let ours = Aes128::new(&key).encrypt_block(&plaintext);
            prop_assert_eq!(&ours[..], block.as_slice());
        }

        #[test]
        fn prop_short_plaintext_round_trip(
            plaintext in prop::collection::vec(any::<u8>(), 0..=16),
            key in prop::array::uniform16(any::<u8>()),
        ) {
            let ciphertext = aes128_encrypt(&plaintext, &key).unwrap();
            let decrypted = aes128_decrypt(&ciphertext, &key);
            let pad = 16 - plaintext.len();
            prop_assert!(decrypted[..pad].iter().all(|b| *b == 0));
            prop_assert_eq!(&decrypted[pad..], &plaintext[..]);
        }

        #[test]
        fn prop_oversized_plaintext_rejected(
            plaintext in prop::collection::vec(any::<u8>(), 17..64),
            key in prop::array::uniform16(any::<u8>()),
        ) {
            prop_assert!(aes128_encrypt(&plaintext, &key).is_err());
        }
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_seal_open(counter in any::<u32>(), key in prop::array::uniform16(any::<u8>())) {
            prop_assert_eq!(Token::seal(counter, &key).open(&key), counter);
        }

        #[test]
        fn prop_mask_involution(counter in any::<u32>(), key in prop::array::uniform16(any::<u8>())) {
            let token = Token::from_counter(counter);
            prop_assert_eq!(token.mask(&key).mask(&key), token);
        }

        #[test]
        fn prop_ct_eq_agrees_with_eq(
            a in prop::array::uniform16(any::<u8>()),
            b in prop::array::uniform16(any::<u8>()),
        ) {
            let (a, b) = (Token::from_bytes(a), Token::from_bytes(b));
            prop_assert_eq!(a.ct_eq(&b), a == b);
            prop_assert!(a.ct_eq(&a));
        }
    }

    // ========================================================================
    // Ratchet
    // ========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_ratchet_monotonic(c0 in any::<u32>(), rounds in 1usize..32) {
            let mut requester = Ratchet::new(c0);
            let mut verifier = Ratchet::new(c0);

            for _ in 0..rounds {
                let before = verifier.counter();
                let presented = requester.advance();
                prop_assert_eq!(presented, before.wrapping_add(1));

                let answer = verifier.verify(presented);
                prop_assert_eq!(answer, Some(before.wrapping_add(2)));
                prop_assert!(requester.confirm(before.wrapping_add(2)));
            }

            prop_assert_eq!(verifier.counter(), c0.wrapping_add(2u32.wrapping_mul(rounds as u32)));
            prop_assert_eq!(requester.counter(), verifier.counter());
        }

        #[test]
        fn prop_ratchet_rejects_off_by_any(c0 in any::<u32>(), delta in 2u32..u32::MAX) {
            let mut verifier = Ratchet::new(c0);
            prop_assert_eq!(verifier.verify(c0.wrapping_add(delta)), None);
            prop_assert_eq!(verifier.counter(), c0);
        }

        #[test]
        fn prop_sealed_ratchet_round(c0 in any::<u32>(), key in prop::array::uniform16(any::<u8>())) {
            let mut requester = Ratchet::new(c0);
            let mut verifier = Ratchet::new(c0);

            let request = Token::seal(requester.advance(), &key);
            let answer = verifier.verify(request.open(&key)).unwrap();
            let reply = Token::seal(answer, &key);
            prop_assert!(requester.confirm(reply.open(&key)));
        }
    }
}
