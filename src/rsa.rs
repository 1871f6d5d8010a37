use anyhow::{Context, Result};
use openssl::pkey::PKey;
use openssl::rsa::Rsa;

/// Generates a 2048-bit RSA key pair for signing session tokens.
///
/// Returns `(public_key, private_key)`, the public key in PEM format and the
/// private key in PKCS#8 PEM format.
pub fn generate_rsa_keys() -> Result<(Vec<u8>, Vec<u8>)> {
    let rsa = Rsa::generate(2048).context("generate rsa key")?;
    let pkey = PKey::from_rsa(rsa).context("wrap rsa key")?;

    let private_key = pkey
        .private_key_to_pem_pkcs8()
        .context("encode private key")?;
    let public_key = pkey.public_key_to_pem().context("encode public key")?;

    Ok((public_key, private_key))
}
