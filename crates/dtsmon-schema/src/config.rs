/// Controls how layout descriptors are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// When true, layouts whose payload size is odd are rejected.
    ///
    /// Inherited from the DTS firmware; some links do not need it.
    pub require_even_payload: bool,
    /// Maximum bytes read from a descriptor file.
    pub max_descriptor_size: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            require_even_payload: true,
            max_descriptor_size: 256 * 1024,
        }
    }
}
