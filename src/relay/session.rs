use crate::config::RelayConfig;

/// Read a cookie value from a `name=value; name2=value2` string.
///
/// Values are URI-component decoded; a value that does not decode is
/// returned as-is. Missing cookies yield `None`.
pub fn read_cookie(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim_start)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .map(|raw| {
            urlencoding::decode(raw)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        })
}

/// Session identifiers sent with the on-demand fetch. Never validated:
/// empty strings are sent as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIds {
    pub user_id: String,
    pub txn_token: String,
}

impl SessionIds {
    /// Primary id: the first cookie in `config.user_id_cookies` that is set
    /// and non-empty. Transaction token: `config.txn_token_cookie`.
    pub fn from_cookies(cookies: &str, config: &RelayConfig) -> Self {
        let user_id = config
            .user_id_cookies
            .iter()
            .filter_map(|name| read_cookie(cookies, name))
            .find(|value| !value.is_empty())
            .unwrap_or_default();
        let txn_token = read_cookie(cookies, &config.txn_token_cookie).unwrap_or_default();

        Self { user_id, txn_token }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cookie() {
        let cookies = "theme=dark; smartbuy_token=abc123; smartbuy_txn_token=t%2F9%3D";
        assert_eq!(read_cookie(cookies, "smartbuy_token").as_deref(), Some("abc123"));
        assert_eq!(read_cookie(cookies, "smartbuy_txn_token").as_deref(), Some("t/9="));
        assert_eq!(read_cookie(cookies, "theme").as_deref(), Some("dark"));
        assert_eq!(read_cookie(cookies, "missing"), None);
    }

    #[test]
    fn test_read_cookie_requires_exact_name() {
        let cookies = "smartbuy_token_old=stale; xsmartbuy_token=nope";
        assert_eq!(read_cookie(cookies, "smartbuy_token"), None);
    }

    #[test]
    fn test_read_cookie_undecodable_value_kept_raw() {
        assert_eq!(read_cookie("a=%E0%A4", "a").as_deref(), Some("%E0%A4"));
    }

    #[test]
    fn test_session_ids_fallback_to_user_cookie() {
        let config = RelayConfig::default();

        let ids = SessionIds::from_cookies("smartbuy_user=u-42; smartbuy_txn_token=tx", &config);
        assert_eq!(ids.user_id, "u-42");
        assert_eq!(ids.txn_token, "tx");

        let ids = SessionIds::from_cookies("smartbuy_token=tok; smartbuy_user=u-42", &config);
        assert_eq!(ids.user_id, "tok");
        assert_eq!(ids.txn_token, "");
    }

    #[test]
    fn test_session_ids_empty_token_falls_through() {
        let config = RelayConfig::default();
        let ids = SessionIds::from_cookies("smartbuy_token=; smartbuy_user=u-7", &config);
        assert_eq!(ids.user_id, "u-7");
    }

    #[test]
    fn test_session_ids_without_cookies() {
        let ids = SessionIds::from_cookies("", &RelayConfig::default());
        assert_eq!(ids, SessionIds::default());
    }
}
