use crate::core::config::data::Config;

fn describe(value: Option<&str>, effective: &str) -> String {
    match value {
        Some(value) => value.to_string(),
        None => format!("{effective} (default)"),
    }
}

impl Config {
    pub fn describe_all(&self) -> Vec<(&'static str, String)> {
        let backend = self.backend.map(|backend| backend.to_string());
        let highlights = self
            .highlights
            .map(|on| if on { "on" } else { "off" }.to_string());
        vec![
            (
                "gateway_url",
                describe(self.gateway_url.as_deref(), self.gateway_url()),
            ),
            ("api_url", describe(self.api_url.as_deref(), self.api_url())),
            ("model", describe(self.model.as_deref(), self.model())),
            (
                "backend",
                describe(backend.as_deref(), &self.backend().to_string()),
            ),
            (
                "instruction",
                describe(self.instruction.as_deref(), self.instruction()),
            ),
            (
                "system_prompt",
                describe(self.system_prompt.as_deref(), self.chat_system_prompt()),
            ),
            (
                "highlights",
                describe(
                    highlights.as_deref(),
                    if self.highlights() { "on" } else { "off" },
                ),
            ),
        ]
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        for (key, value) in self.describe_all() {
            println!("  {key}: {value}");
        }
    }
}
