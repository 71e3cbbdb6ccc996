//! Domain-scoped message the extension is asked to sign

/// Build the challenge for `primary_address`.
///
/// The salt and host bind the signature to this application, so the same
/// extension account yields a different key on any other site.
pub fn challenge_message(domain_salt: &str, primary_address: &str, app_host: &str) -> String {
    format!(
        "[{}] I authorize the creation of a BSV wallet for my BTC address {}. \
         This signature will be used as a seed to generate my BSV private key. \
         I understand that this signature is specific to {} and should not be shared or used on other sites.",
        domain_salt, primary_address, app_host
    )
}
