//! Outbound URL construction.

use url::Url;

use crate::credentials::Secret;

/// Builds upstream URLs from a base URL, a client path and client parameters.
#[derive(Debug, Clone)]
pub struct UpstreamUrl {
    base: Url,
    auth_param: String,
}

impl UpstreamUrl {
    pub fn new(base_url: &str, auth_param: impl Into<String>) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base_url)?;
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self {
            base,
            auth_param: auth_param.into(),
        })
    }

    pub fn auth_param(&self) -> &str {
        &self.auth_param
    }

    /// Upstream URL for `path` + `params`, authenticated with `secret`.
    ///
    /// The path is appended to the base path, never resolved against it, so a
    /// client path can not point the credential at another host. Client values
    /// of the auth parameter are dropped and exactly one, carrying `secret`, is
    /// appended.
    pub fn build(&self, path: &str, params: &[(String, String)], secret: &Secret) -> Url {
        let mut url = self.base.clone();
        let joined = format!(
            "{}/{}",
            self.base.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);

        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                if name != &self.auth_param {
                    query.append_pair(name, value);
                }
            }
            query.append_pair(&self.auth_param, secret.expose());
        }

        url
    }
}
