use easy_error::{Error, ResultExt, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BUFFER_SIZE: usize = 4096;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Tunables shared by copy and splice. Durations are in milliseconds.
///
/// ```yaml
/// bufferSize: 4096
/// pollInterval: 10
/// readTimeout: 30000
/// graceDelay: 10
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CopyParams {
    pub buffer_size: usize,
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    #[serde(with = "opt_millis")]
    pub read_timeout: Option<Duration>,
    /// Delay between one splice direction finishing and the other being
    /// cancelled. Falls back to `poll_interval`.
    #[serde(with = "opt_millis")]
    pub grace_delay: Option<Duration>,
}

impl Default for CopyParams {
    fn default() -> Self {
        CopyParams {
            buffer_size: DEFAULT_BUFFER_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_timeout: None,
            grace_delay: None,
        }
    }
}

impl CopyParams {
    pub async fn load(path: &str) -> Result<Self, Error> {
        let s = tokio::fs::read(path).await.context("read file")?;
        let s = String::from_utf8(s).context("parse utf8")?;
        Self::from_yaml(&s)
    }

    pub fn from_yaml(s: &str) -> Result<Self, Error> {
        let params: CopyParams = serde_yaml_ng::from_str(s).context("parse yaml")?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.buffer_size == 0 {
            bail!("bufferSize must be positive");
        }
        if self.poll_interval.is_zero() {
            bail!("pollInterval must be positive");
        }
        Ok(())
    }

    pub fn grace_delay(&self) -> Duration {
        self.grace_delay.unwrap_or(self.poll_interval)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
