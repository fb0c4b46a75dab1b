//! Diagnostic gating. Verbose traces are opt-in per creature category and
//! channel, e.g. `torpedo.dive` or `flyer.*`.

use serde::{Deserialize, Serialize};

/// Enabled `category.channel` pairs. `*` matches any channel (or everything
/// when used alone).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugFlags {
    pub channels: Vec<String>,
}

impl DebugFlags {
    pub fn enable(&mut self, category: &str, channel: &str) {
        self.channels.push(format!("{category}.{channel}"));
    }

    pub fn is_enabled(&self, category: &str, channel: &str) -> bool {
        self.channels.iter().any(|entry| {
            if entry == "*" {
                return true;
            }
            match entry.split_once('.') {
                Some((cat, chan)) => cat == category && (chan == "*" || chan == channel),
                None => false,
            }
        })
    }
}

/// `log::debug!` gated on a [`DebugFlags`] lookup.
macro_rules! trace_ai {
    ($flags:expr, $category:expr, $channel:expr, $($arg:tt)+) => {
        if $flags.is_enabled($category, $channel) {
            log::debug!($($arg)+);
        }
    };
}

pub(crate) use trace_ai;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_and_exact_channels() {
        let mut flags = DebugFlags::default();
        assert!(!flags.is_enabled("torpedo", "dive"));
        flags.enable("torpedo", "dive");
        assert!(flags.is_enabled("torpedo", "dive"));
        assert!(!flags.is_enabled("torpedo", "terrain"));
        flags.channels.push("flyer.*".into());
        assert!(flags.is_enabled("flyer", "altitude"));
        flags.channels = vec!["*".into()];
        assert!(flags.is_enabled("scheduler", "cull"));
    }
}
