/// Prefix of every issued secret.
pub const SECRET_PREFIX: &str = "vnsk";

/// Random bytes behind each secret.
pub const SECRET_ENTROPY_BYTES: usize = 32;

/// Characters of the secret kept for masked display.
pub const MASKED_PREFIX_LEN: usize = 20;

/// Identity used for every request that does not carry a valid credential.
pub const PUBLIC_IDENTITY: &str = "public";
