use crate::bootstrap::RendererSpec;
use crate::program::FailurePolicy;

pub const DEFAULT_VERTEX_SHADER: &str = "shaders/quad.vert";
pub const DEFAULT_FRAGMENT_SHADER: &str = "shaders/quad.frag";

/// Runtime configuration for the windowed renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Surface size and the two shader locators.
    pub spec: RendererSpec,
    /// Window title.
    pub title: String,
    /// What setup does when a stage fails to compile or the program fails to link.
    pub policy: FailurePolicy,
}

impl Default for RendererConfig {
    /// An 800x600 window rendering the bundled quad shaders.
    fn default() -> Self {
        Self {
            spec: RendererSpec::new(800, 600, DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER),
            title: "triquad".to_string(),
            policy: FailurePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_bundled_shaders() {
        let config = RendererConfig::default();
        assert_eq!((config.spec.width, config.spec.height), (800, 600));
        assert_eq!(config.spec.vertex, DEFAULT_VERTEX_SHADER);
        assert_eq!(config.spec.fragment, DEFAULT_FRAGMENT_SHADER);
        assert_eq!(config.policy, FailurePolicy::Proceed);
    }
}
