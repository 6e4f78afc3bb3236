// Secure Remote Password math for the Cognito `USER_SRP_AUTH` flow.
//
// Hex handling mirrors what Cognito expects byte-for-byte: big integers are
// rendered as lowercase hex, left-padded so that the first byte never has its
// high bit set, and hashed as the decoded bytes of that padded string.

use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

/// RFC 3526 3072-bit MODP group prime.
const N_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D",
    "C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9",
    "DE2BCBF6955817183995497CEA956AE515D2261898FA0510",
    "15728E5A8AAAC42DAD33170D04507A33A85521ABDF1CBA64",
    "ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7",
    "ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6B",
    "F12FFA06D98A0864D87602733EC86A64521F2B18177B200C",
    "BBE117577A615D6C770988C0BAD946E208E24FA074E5AB31",
    "43DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF",
);
const G_HEX: &str = "2";
const INFO_BITS: &[u8] = b"Caldera Derived Key";

static N: LazyLock<BigUint> = LazyLock::new(|| {
    BigUint::parse_bytes(N_HEX.as_bytes(), 16).unwrap_or_else(|| BigUint::from(0u8))
});
static G: LazyLock<BigUint> = LazyLock::new(|| BigUint::from(2u8));
static K: LazyLock<BigUint> = LazyLock::new(|| {
    let digest = hex_hash(&format!("00{N_HEX}0{G_HEX}")).unwrap_or_default();
    BigUint::parse_bytes(digest.as_bytes(), 16).unwrap_or_else(|| BigUint::from(0u8))
});

/// Client half of one SRP handshake: the ephemeral secret `a` and `A = g^a mod N`.
pub(crate) struct SrpSession {
    small_a: BigUint,
    large_a: BigUint,
}

/// Server values from the `PASSWORD_VERIFIER` challenge.
pub(crate) struct PasswordVerifier<'a> {
    pub pool_name: &'a str,
    pub user_id_for_srp: &'a str,
    pub salt_hex: &'a str,
    pub srp_b_hex: &'a str,
    pub secret_block: &'a str,
    pub timestamp: &'a str,
}

impl SrpSession {
    /// Draw a fresh 1024-bit ephemeral secret.
    pub(crate) fn generate() -> Self {
        loop {
            let mut bytes = [0u8; 128];
            rand::thread_rng().fill_bytes(&mut bytes);
            let session = Self::from_secret(&BigUint::from_bytes_be(&bytes));
            if session.large_a != BigUint::from(0u8) {
                return session;
            }
        }
    }

    pub(crate) fn from_secret(secret: &BigUint) -> Self {
        let small_a = secret % &*N;
        let large_a = G.modpow(&small_a, &N);
        Self { small_a, large_a }
    }

    /// `SRP_A` as sent in `InitiateAuth`.
    pub(crate) fn public_a_hex(&self) -> String {
        self.large_a.to_str_radix(16)
    }

    /// Compute the base64 `PASSWORD_CLAIM_SIGNATURE`.
    pub(crate) fn password_claim(
        &self,
        verifier: &PasswordVerifier<'_>,
        password: &str,
    ) -> Result<String, Error> {
        let server_b = parse_hex(verifier.srp_b_hex, "SRP_B")?;
        if &server_b % &*N == BigUint::from(0u8) {
            return Err(srp_error("server sent an invalid SRP_B"));
        }

        let u = parse_hex(
            &hex_hash(&(pad_hex(&self.large_a) + &pad_hex(&server_b)))?,
            "u",
        )?;
        if u == BigUint::from(0u8) {
            return Err(srp_error("scrambling parameter is zero"));
        }

        let user_password = format!(
            "{}{}:{}",
            verifier.pool_name, verifier.user_id_for_srp, password
        );
        let user_password_hash = hex::encode(Sha256::digest(user_password.as_bytes()));
        let x = parse_hex(
            &hex_hash(&(pad_hex(&parse_hex(verifier.salt_hex, "SALT")?) + &user_password_hash))?,
            "x",
        )?;

        // S = (B - k * g^x) ^ (a + u * x) mod N, with the subtraction kept non-negative.
        let kgx = (&*K * G.modpow(&x, &N)) % &*N;
        let base = ((&server_b % &*N) + &*N - kgx) % &*N;
        let exponent = &self.small_a + &u * &x;
        let s = base.modpow(&exponent, &N);

        let key = compute_hkdf(&decode_hex(&pad_hex(&s))?, &decode_hex(&pad_hex(&u))?)?;

        let secret_block = BASE64
            .decode(verifier.secret_block)
            .map_err(|e| srp_error(format!("SECRET_BLOCK is not base64: {e}")))?;

        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| srp_error(format!("invalid HMAC key: {e}")))?;
        mac.update(verifier.pool_name.as_bytes());
        mac.update(verifier.user_id_for_srp.as_bytes());
        mac.update(&secret_block);
        mac.update(verifier.timestamp.as_bytes());

        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// Cognito's timestamp format: `Mon Oct 5 09:04:03 UTC 2026` (day not zero-padded).
pub(crate) fn srp_timestamp(now: DateTime<Utc>) -> String {
    now.format("%a %b %-d %H:%M:%S UTC %Y").to_string()
}

fn pad_hex(value: &BigUint) -> String {
    pad_hex_str(&value.to_str_radix(16))
}

/// Left-pad to an even length and prepend `00` when the high bit would be set.
fn pad_hex_str(hex: &str) -> String {
    if hex.len() % 2 == 1 {
        format!("0{hex}")
    } else if hex.chars().next().is_some_and(|c| "89abcdefABCDEF".contains(c)) {
        format!("00{hex}")
    } else {
        hex.to_owned()
    }
}

fn hex_hash(hex: &str) -> Result<String, Error> {
    Ok(hex::encode(Sha256::digest(decode_hex(hex)?)))
}

fn compute_hkdf(ikm: &[u8], salt: &[u8]) -> Result<[u8; 16], Error> {
    let mut extract =
        HmacSha256::new_from_slice(salt).map_err(|e| srp_error(format!("HKDF extract: {e}")))?;
    extract.update(ikm);
    let prk = extract.finalize().into_bytes();

    let mut expand =
        HmacSha256::new_from_slice(&prk).map_err(|e| srp_error(format!("HKDF expand: {e}")))?;
    expand.update(INFO_BITS);
    expand.update(&[1]);
    let okm = expand.finalize().into_bytes();

    let mut key = [0u8; 16];
    key.copy_from_slice(&okm[..16]);
    Ok(key)
}

fn parse_hex(hex: &str, what: &str) -> Result<BigUint, Error> {
    BigUint::parse_bytes(hex.as_bytes(), 16)
        .ok_or_else(|| srp_error(format!("{what} is not a hex number")))
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, Error> {
    hex::decode(hex).map_err(|e| srp_error(format!("invalid hex: {e}")))
}

fn srp_error(message: impl Into<String>) -> Error {
    Error::Authentication {
        message: message.into(),
    }
}
