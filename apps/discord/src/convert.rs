//! Chinese script conversion applied to outgoing text.

/// Rewrites text before it is shown in chat.
pub trait ScriptConverter: Send + Sync {
    /// Convert `text`.
    fn convert(&self, text: &str) -> String;
}

/// Simplified to Taiwan traditional Chinese, including regional phrasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaiwanTraditional;

impl ScriptConverter for TaiwanTraditional {
    fn convert(&self, text: &str) -> String {
        zhconv::zhconv(text, zhconv::Variant::ZhTW)
    }
}

/// Leaves text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl ScriptConverter for Identity {
    fn convert(&self, text: &str) -> String {
        text.to_owned()
    }
}
