//! Tests for script execution: standard spending patterns end to end

use num_bigint::BigUint;
use num_traits::{Num, Zero};

use txcore::codec::hash160;
use txcore::constants::{OP_1, OP_PUSHDATA1, SIGHASH_ALL};
use txcore::ecdsa::PrivateKey;
use txcore::error::ProtocolError;
use txcore::script::{p2pkh_script, p2sh_script, verify_script, Cmd, Script};

fn test_key() -> PrivateKey {
    let secret = BigUint::from_str_radix(
        "7ec663c77881a638ee7f461abb85baf7e3486a1d2aeccd9e108c6063d3aa637e",
        16,
    )
    .unwrap();
    PrivateKey::new(secret).unwrap()
}

/// Unlocking script `<signature> <pubkey>` for a given sighash.
fn p2pkh_unlock(key: &PrivateKey, z: &BigUint) -> Script {
    let mut sig_bytes = key.sign(z).unwrap().der();
    sig_bytes.push(SIGHASH_ALL as u8);
    Script::new(vec![Cmd::Push(sig_bytes), Cmd::Push(key.public_key().sec(true))])
}

#[test]
fn test_p2pkh_spend_succeeds() {
    let key = test_key();
    let z = BigUint::from_str_radix(
        "876382c426507c7ec3ac623c1eb4b896bcf5ce8a198d24364c8ece62dfe81f65",
        16,
    )
    .unwrap();
    let locking = p2pkh_script(&key.public_key().hash160(true));
    let unlocking = p2pkh_unlock(&key, &z);
    assert!(verify_script(&unlocking, &locking, &z).unwrap());
}

#[test]
fn test_p2pkh_rejects_tampered_signature() {
    let key = test_key();
    let z = BigUint::from_str_radix(
        "876382c426507c7ec3ac623c1eb4b896bcf5ce8a198d24364c8ece62dfe81f65",
        16,
    )
    .unwrap();
    let locking = p2pkh_script(&key.public_key().hash160(true));
    let unlocking = p2pkh_unlock(&key, &z);

    // Corrupt one signature byte; evaluation must fail without crashing.
    let mut cmds = unlocking.cmds().to_vec();
    if let Cmd::Push(sig) = &mut cmds[0] {
        sig[10] ^= 0x01;
    }
    let tampered = Script::new(cmds);
    let result = verify_script(&tampered, &locking, &z);
    match result {
        Ok(valid) => assert!(!valid),
        Err(e) => assert!(e.is_validation_failure()),
    }
}

#[test]
fn test_p2pkh_rejects_wrong_key() {
    let key = test_key();
    let other = PrivateKey::new(BigUint::from(31337u32)).unwrap();
    let z = BigUint::from(12345u32);
    let locking = p2pkh_script(&key.public_key().hash160(true));
    // Signature and pubkey are internally consistent but hash to the wrong value.
    let unlocking = p2pkh_unlock(&other, &z);
    let result = verify_script(&unlocking, &locking, &z);
    match result {
        Ok(valid) => assert!(!valid),
        Err(e) => assert!(e.is_validation_failure()),
    }
}

#[test]
fn test_p2sh_redeem_script_executes() {
    // Redeem script is a bare OP_1; spending only requires revealing it.
    let redeem_raw = vec![OP_1];
    let h160 = hash160(&redeem_raw);
    assert_eq!(
        hex::encode(h160),
        "da1745e9b549bd0bfa1a569971c77eba30cd5a4b"
    );
    let locking = p2sh_script(&h160);
    assert!(locking.is_p2sh());
    let unlocking = Script::new(vec![Cmd::Push(redeem_raw)]);
    assert!(verify_script(&unlocking, &locking, &BigUint::zero()).unwrap());
}

#[test]
fn test_p2sh_undecodable_redeem_script_is_invalid_not_error() {
    // Redeem bytes matching the committed hash but unparseable as a script:
    // a lone OP_PUSHDATA1 with no length byte behind it. This must fail the
    // spend, not abort validation.
    let redeem_raw = vec![OP_PUSHDATA1];
    let locking = p2sh_script(&hash160(&redeem_raw));
    let unlocking = Script::new(vec![Cmd::Push(redeem_raw)]);
    assert_eq!(
        verify_script(&unlocking, &locking, &BigUint::zero()),
        Ok(false)
    );
}

#[test]
fn test_p2sh_rejects_wrong_redeem_script() {
    let h160 = hash160(&[OP_1]);
    let locking = p2sh_script(&h160);
    // Reveal a different script than the one committed to.
    let unlocking = Script::new(vec![Cmd::Push(vec![0x52])]);
    assert!(!verify_script(&unlocking, &locking, &BigUint::zero()).unwrap());
}

#[test]
fn test_exotic_opcode_fails_closed() {
    // OP_CHECKMULTISIG is outside the supported set here.
    let script = Script::new(vec![Cmd::Op(OP_1), Cmd::Op(0xae)]);
    assert_eq!(
        script.evaluate(&BigUint::zero()),
        Err(ProtocolError::UnsupportedOpcode(0xae))
    );
}

#[test]
fn test_classifiers() {
    let p2pkh = p2pkh_script(&[0u8; 20]);
    assert!(p2pkh.is_p2pkh());
    assert!(!p2pkh.is_p2sh());
    let p2sh = p2sh_script(&[0u8; 20]);
    assert!(p2sh.is_p2sh());
    assert!(!p2sh.is_p2pkh());
}
