use std::env;

#[derive(Clone, Debug)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Clone, Debug)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) ansi: bool,
    /// Collected while parsing; logged once the subscriber is installed.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    fn from_lookup(component: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let component = component.trim().to_string();
        let mut warnings = Vec::new();

        let service_name = lookup("SERVICE_NAME")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| component.clone());

        let environment = lookup("STAGE")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "local".to_string());

        let ansi = match lookup("LOG_ANSI") {
            None => true,
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                warnings.push(format!("LOG_ANSI is invalid (value: {raw}); keeping colors on"));
                true
            }),
        };

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            ansi,
            warnings,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
