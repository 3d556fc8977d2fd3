/// Rede crypto helpers.
///
/// Symmetric sealing (AES-256-GCM) for values the web client hands to the
/// browser, plus key and secret generation for bootstrap.
pub mod encrypt;
pub mod keys;
