//! The `quizforge init` command.

use std::path::Path;

use anyhow::Result;

use quizforge_providers::config::CONFIG_FILE_NAME;

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE_NAME).exists() {
        println!("{CONFIG_FILE_NAME} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE_NAME, SAMPLE_CONFIG)?;
        println!("Created {CONFIG_FILE_NAME}");
    }

    println!("\nNext steps:");
    println!("  1. Set OPENAI_API_KEY or GEMINI_API_KEY (or edit {CONFIG_FILE_NAME})");
    println!("  2. Run: quizforge plan --seed 1");
    println!("  3. Run: quizforge generate --output session.json");
    println!("  4. Run: quizforge analyze --session session.json --answers answers.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizforge configuration

default_provider = "openai"
default_model = "gpt-4.1"
default_temperature = 0.7
max_retries = 2
retry_delay_ms = 1000
parallelism = 4
output_dir = "./quizforge-sessions"

topics = [
    "digital_electronics",
    "analog_circuits",
    "communication_systems",
    "computer_networks",
    "operating_systems",
    "data_structures",
    "algorithms",
    "cyber_security",
    "cryptography",
    "information_theory",
]

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[diagnostic]
questionCount = 10
# "all", "random", or a list of topic ids
topicSelection = "random"
timeLimit = 600

[diagnostic.difficultyDistribution]
easy = 30
medium = 50
hard = 20
"#;
