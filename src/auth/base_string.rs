//! OAuth 1.0a signature base string and `Authorization` header construction.
//!
//! Both the RSA-signed bootstrap calls and the HMAC-signed session calls sign
//! the exact same canonical representation of a request, so this module is
//! shared by both paths and kept free of any I/O or key material.

use std::collections::HashMap;

/// Percent-encode a string with the OAuth unreserved set
/// (`A-Z a-z 0-9 - _ . ~`); everything else, including `/`, `:` and `,`,
/// is encoded.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Build the signature base string for a request.
///
/// Parameters are sorted lexicographically by key, values percent-encoded,
/// joined as `key=value` pairs with `&`, and the result assembled as
/// `METHOD&encode(url)&encode(params)`. The `realm` parameter must not be in
/// `params`; it belongs to the header only.
///
/// `prepend` is prefixed verbatim (not encoded) when supplied; the live
/// session token request is the only caller that uses it, passing the
/// hex-encoded decrypted access token secret.
///
/// The server canonicalizes `|`, `,` and `:` inside parameter values to their
/// singly-encoded forms, so the doubly-encoded `%257C`, `%252C` and `%253A`
/// produced by the second encoding pass are corrected back before signing.
pub fn signature_base_string(
    method: &str,
    url: &str,
    params: &HashMap<String, String>,
    prepend: Option<&str>,
) -> String {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();

    let param_string = keys
        .iter()
        .map(|k| format!("{}={}", k, percent_encode(&params[*k])))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    );

    let base = match prepend {
        Some(p) => format!("{}{}", p, base),
        None => base,
    };

    base.replace("%257C", "%7C")
        .replace("%252C", "%2C")
        .replace("%253A", "%3A")
}

/// Assemble the `Authorization` header value.
///
/// `realm` leads, followed by the OAuth parameters sorted by key, each quoted
/// and comma-separated. Values are taken as given: the RSA bootstrap path
/// passes its signature as raw base64 while the HMAC path percent-encodes it
/// first, and that difference is the caller's responsibility.
pub fn oauth_header(realm: &str, params: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();

    let fields = keys
        .iter()
        .map(|k| format!("{}=\"{}\"", k, params[*k]))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth realm=\"{}\", {}", realm, fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_base_string_fixed_vector() {
        let p = params(&[
            ("oauth_callback", "oob"),
            ("oauth_consumer_key", "TESTCONS"),
        ]);
        let base = signature_base_string(
            "POST",
            "https://api.ibkr.com/v1/api/oauth/request_token",
            &p,
            None,
        );
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.ibkr.com%2Fv1%2Fapi%2Foauth%2Frequest_token\
             &oauth_callback%3Doob%26oauth_consumer_key%3DTESTCONS"
        );
    }

    #[test]
    fn test_base_string_independent_of_insertion_order() {
        let forward = params(&[
            ("oauth_nonce", "abc123"),
            ("oauth_timestamp", "1700000000"),
            ("oauth_consumer_key", "TESTCONS"),
        ]);
        let mut reversed = HashMap::new();
        reversed.insert("oauth_consumer_key".to_string(), "TESTCONS".to_string());
        reversed.insert("oauth_timestamp".to_string(), "1700000000".to_string());
        reversed.insert("oauth_nonce".to_string(), "abc123".to_string());

        let url = "https://api.ibkr.com/v1/api/portfolio/accounts";
        assert_eq!(
            signature_base_string("GET", url, &forward, None),
            signature_base_string("GET", url, &reversed, None)
        );
    }

    #[test]
    fn test_double_encoding_corrections() {
        let p = params(&[("conids", "1|2,3:4")]);
        let base = signature_base_string(
            "GET",
            "https://api.ibkr.com/v1/api/iserver/marketdata/snapshot",
            &p,
            None,
        );
        assert!(base.contains("%7C"));
        assert!(base.contains("%2C"));
        assert!(base.contains("%3A"));
        assert!(!base.contains("%257C"));
        assert!(!base.contains("%252C"));
        assert!(!base.contains("%253A"));
    }

    #[test]
    fn test_prepend_is_verbatim_prefix() {
        let p = params(&[("diffie_hellman_challenge", "deadbeef")]);
        let url = "https://api.ibkr.com/v1/api/oauth/live_session_token";
        let without = signature_base_string("POST", url, &p, None);
        let with = signature_base_string("POST", url, &p, Some("a1b2c3"));
        assert_eq!(with, format!("a1b2c3{}", without));
    }

    #[test]
    fn test_method_uppercased() {
        let p = params(&[]);
        let base = signature_base_string("get", "https://api.ibkr.com/v1/api/tickle", &p, None);
        assert!(base.starts_with("GET&"));
    }

    #[test]
    fn test_oauth_header_layout() {
        let p = params(&[
            ("oauth_token", "token123"),
            ("oauth_consumer_key", "TESTCONS"),
        ]);
        let header = oauth_header("limited_poa", &p);
        assert_eq!(
            header,
            "OAuth realm=\"limited_poa\", oauth_consumer_key=\"TESTCONS\", \
             oauth_token=\"token123\""
        );
    }

    #[test]
    fn test_percent_encode_reserved_characters() {
        assert_eq!(percent_encode("a/b:c,d"), "a%2Fb%3Ac%2Cd");
        assert_eq!(percent_encode("safe-_.~"), "safe-_.~");
    }
}
