use {
    base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD},
    monzo_common::{Error, Result},
    url::Url,
};

/// Build the consent-page URL the user's browser is sent to.
pub fn build_authorization_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<Url> {
    let mut url = Url::parse(auth_url).map_err(|source| Error::InvalidUrl {
        url: auth_url.to_string(),
        source,
    })?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("state", state);
    Ok(url)
}

/// Random anti-forgery value, checked again when the callback arrives.
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}
