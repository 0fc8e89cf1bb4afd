//! Routes and their rate-limit identity
//!
//! A route is a method plus a path template such as
//! `/channels/{channel_id}/messages/{message_id}`. Buckets are keyed by the
//! template and the values of the major parameters (channel, guild, webhook)
//! so that requests against different channels never share a bucket.

use std::fmt;

use reqwest::Method;

/// Values of the parameters that split rate-limit buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MajorParams {
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
    pub webhook_id: Option<String>,
    pub webhook_token: Option<String>,
}

impl fmt::Display for MajorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            &self.channel_id,
            &self.guild_id,
            &self.webhook_id,
            &self.webhook_token,
        ];
        let mut first = true;
        for part in parts {
            if !first {
                f.write_str(":")?;
            }
            first = false;
            f.write_str(part.as_deref().unwrap_or("None"))?;
        }
        Ok(())
    }
}

/// A concrete request target
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    template: &'static str,
    path: String,
    major: MajorParams,
    query: Vec<(String, String)>,
}

impl Route {
    /// Start a route from a method and path template
    pub fn new(method: Method, template: &'static str) -> Self {
        Self {
            method,
            template,
            path: template.to_string(),
            major: MajorParams::default(),
            query: Vec::new(),
        }
    }

    pub fn get(template: &'static str) -> Self {
        Self::new(Method::GET, template)
    }

    pub fn post(template: &'static str) -> Self {
        Self::new(Method::POST, template)
    }

    pub fn patch(template: &'static str) -> Self {
        Self::new(Method::PATCH, template)
    }

    pub fn put(template: &'static str) -> Self {
        Self::new(Method::PUT, template)
    }

    pub fn delete(template: &'static str) -> Self {
        Self::new(Method::DELETE, template)
    }

    /// Substitute `{name}` in the path, recording major parameters
    #[must_use]
    pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        self.path = self.path.replace(&format!("{{{name}}}"), &value);
        match name {
            "channel_id" => self.major.channel_id = Some(value),
            "guild_id" => self.major.guild_id = Some(value),
            "webhook_id" => self.major.webhook_id = Some(value),
            "webhook_token" => self.major.webhook_token = Some(value),
            _ => {}
        }
        self
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter when a value is present
    #[must_use]
    pub fn query_opt<T: fmt::Display>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn major(&self) -> &MajorParams {
        &self.major
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Rate-limit identity of the template, before the server names a bucket
    pub fn route_key(&self) -> String {
        format!("{} {}", self.method, self.template)
    }

    /// Full URL below `api_base`
    pub fn url(&self, api_base: &str) -> String {
        format!("{}{}", api_base.trim_end_matches('/'), self.path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
