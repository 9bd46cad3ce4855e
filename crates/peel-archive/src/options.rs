use peel_fs::ReplaceOptions;

/// Chunk size used when copying decompressed bytes into the scratch file.
pub const DEFAULT_BUFFER_SIZE: usize = 10 * 1024;

#[derive(Clone, Copy, Debug)]
pub struct UnpackOptions {
    buffer_size: usize,
    max_layers:  Option<usize>,
    replace:     ReplaceOptions,
}

impl Default for UnpackOptions {
    fn default() -> Self { Self::new() }
}

impl UnpackOptions {
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_layers:  None,
            replace:     ReplaceOptions::new(),
        }
    }

    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes.max(1);
        self
    }

    /// Stop peeling after this many archive layers. `None` peels until the
    /// file is no longer an archive.
    pub fn max_layers(mut self, layers: Option<usize>) -> Self {
        self.max_layers = layers;
        self
    }

    pub fn replace(mut self, replace: ReplaceOptions) -> Self {
        self.replace = replace;
        self
    }

    pub fn get_buffer_size(&self) -> usize { self.buffer_size }

    pub fn get_max_layers(&self) -> Option<usize> { self.max_layers }

    pub fn replace_options(&self) -> ReplaceOptions { self.replace }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = UnpackOptions::default();
        assert_eq!(options.get_buffer_size(), DEFAULT_BUFFER_SIZE);
        assert_eq!(options.get_max_layers(), None);
        assert!(options.replace_options().is_sync());
    }

    #[test]
    fn zero_buffer_is_clamped() {
        let options = UnpackOptions::new().buffer_size(0);
        assert_eq!(options.get_buffer_size(), 1);
    }

    #[test]
    fn builder_chain() {
        let options = UnpackOptions::new()
            .buffer_size(512)
            .max_layers(Some(2))
            .replace(ReplaceOptions::new().suffix(".unpack"));
        assert_eq!(options.get_buffer_size(), 512);
        assert_eq!(options.get_max_layers(), Some(2));
        assert_eq!(options.replace_options().suffix_str(), ".unpack");
    }
}
