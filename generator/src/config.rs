use wsdlgen_xsd::{BuiltinOverwriteAction, NormalizeOptions, RedefinitionPolicy};

/// Options of one generator run.
///
/// ```
/// let config = wsdlgen::Config::default()
///     .package_name("spell")
///     .max_output_args(1);
/// assert_eq!(config.header_text(), "Package spell");
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    target_namespace: Option<String>,
    max_input_args: usize,
    max_output_args: usize,
    package_name: String,
    header: Option<String>,
    normalize: NormalizeOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_namespace: None,
            max_input_args: 4,
            max_output_args: 4,
            package_name: "ws".into(),
            header: None,
            normalize: NormalizeOptions::default(),
        }
    }
}

impl Config {
    /// Only emit types of `namespace`.
    pub fn target_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.target_namespace = Some(namespace.into());
        self
    }

    /// Operations taking more inputs than this get a request wrapper struct.
    pub fn max_input_args(mut self, max: usize) -> Self {
        self.max_input_args = max;
        self
    }

    /// Operations returning more outputs than this get a response wrapper struct.
    pub fn max_output_args(mut self, max: usize) -> Self {
        self.max_output_args = max;
        self
    }

    pub fn package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = name.into();
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn redefinition_policy(mut self, policy: RedefinitionPolicy) -> Self {
        self.normalize.redefinition = policy;
        self
    }

    pub fn builtin_overwrite(mut self, action: BuiltinOverwriteAction) -> Self {
        self.normalize.builtin_overwrite = action;
        self
    }

    pub fn requested_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    pub fn input_threshold(&self) -> usize {
        self.max_input_args
    }

    pub fn output_threshold(&self) -> usize {
        self.max_output_args
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        self.normalize
    }

    /// The header line of the emitted file.
    pub fn header_text(&self) -> String {
        match &self.header {
            Some(header) => header.clone(),
            None => format!("Package {}", self.package_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.input_threshold(), 4);
        assert_eq!(config.output_threshold(), 4);
        assert_eq!(config.requested_namespace(), None);
        assert_eq!(config.header_text(), "Package ws");
        assert_eq!(
            config.normalize_options().builtin_overwrite,
            BuiltinOverwriteAction::Deny
        );
    }

    #[test]
    fn explicit_header_wins() {
        let config = Config::default().package_name("x").header("Spelling client");
        assert_eq!(config.header_text(), "Spelling client");
    }
}
