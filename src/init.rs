//! Init wizard: interactive first-run setup with cliclack styled prompts.

use iva_core::config::{InputMode, TtsEngine};
use iva_core::shellexpand;
use std::path::Path;

const LOGO: &str = r#"
    ██╗██╗   ██╗ █████╗
    ██║██║   ██║██╔══██╗
    ██║██║   ██║███████║
    ██║╚██╗ ██╔╝██╔══██║
    ██║ ╚████╔╝ ██║  ██║
    ╚═╝  ╚═══╝  ╚═╝  ╚═╝
"#;

/// Everything the wizard asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct Answers {
    pub data_dir: String,
    pub openai_api_key: String,
    pub input_mode: InputMode,
    pub tts_engine: TtsEngine,
    pub elevenlabs_api_key: String,
    pub google_enabled: bool,
    pub credentials_path: String,
    pub confirm_before_saving: bool,
}

impl Default for Answers {
    fn default() -> Self {
        Self {
            data_dir: "~/.iva".to_string(),
            openai_api_key: String::new(),
            input_mode: InputMode::Text,
            tts_engine: TtsEngine::None,
            elevenlabs_api_key: String::new(),
            google_enabled: false,
            credentials_path: "config/credentials.json".to_string(),
            confirm_before_saving: false,
        }
    }
}

/// Run the interactive init wizard.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    println!("{LOGO}");
    cliclack::intro("iva init")?;

    let mut answers = Answers::default();

    // 1. Data directory.
    let data_dir = shellexpand(&answers.data_dir);
    if Path::new(&data_dir).exists() {
        cliclack::log::success(format!("{data_dir} exists"))?;
    } else {
        std::fs::create_dir_all(&data_dir)?;
        cliclack::log::success(format!("{data_dir} created"))?;
    }

    // 2. OpenAI key (chat and Whisper).
    answers.openai_api_key = cliclack::input("OpenAI API key")
        .placeholder("sk-... (or Enter to use OPENAI_API_KEY)")
        .required(false)
        .default_input("")
        .interact()?;
    if answers.openai_api_key.is_empty() && std::env::var("OPENAI_API_KEY").is_err() {
        cliclack::log::warning("No OpenAI key yet. Chat replies will fail until one is set.")?;
    }

    // 3. Input and output modes.
    answers.input_mode = cliclack::select("How will you talk to IVA?")
        .item(InputMode::Text, "Typing", "Read lines from the terminal")
        .item(InputMode::Speech, "Speaking", "Record clips and transcribe with Whisper")
        .interact()?;

    answers.tts_engine = cliclack::select("Should IVA speak its replies?")
        .item(TtsEngine::None, "No", "Print replies only")
        .item(TtsEngine::Local, "Local voice", "say / espeak")
        .item(
            TtsEngine::Elevenlabs,
            "ElevenLabs",
            "Natural voices, falls back to the local voice",
        )
        .interact()?;

    if answers.tts_engine == TtsEngine::Elevenlabs {
        answers.elevenlabs_api_key = cliclack::input("ElevenLabs API key")
            .placeholder("Enter to use ELEVENLABS_API_KEY")
            .required(false)
            .default_input("")
            .interact()?;
    }

    // 4. Google Calendar and Tasks.
    answers.google_enabled = cliclack::confirm("Connect Google Calendar and Tasks?")
        .initial_value(false)
        .interact()?;
    if answers.google_enabled {
        answers.credentials_path = cliclack::input("OAuth client secrets file")
            .default_input(&answers.credentials_path)
            .interact()?;
        if !Path::new(&shellexpand(&answers.credentials_path)).exists() {
            cliclack::note(
                "Google credentials",
                "Create an OAuth client (Desktop app) in the Google Cloud console,\n\
                 enable the Calendar and Tasks APIs, and download the JSON to the\n\
                 path above. IVA asks for consent the first time it needs access.",
            )?;
        }
    }

    // 5. Confirmation before saving.
    answers.confirm_before_saving = cliclack::confirm("Ask before saving reminders and tasks?")
        .initial_value(false)
        .interact()?;

    // 6. Write config.toml.
    if Path::new(config_path).exists() {
        cliclack::log::warning(format!(
            "{config_path} already exists, skipping.\nDelete it and run 'iva init' again to regenerate."
        ))?;
    } else {
        std::fs::write(config_path, generate_config(&answers))?;
        cliclack::log::success(format!("Generated {config_path}"))?;
    }

    let mut steps = format!("1. Review {config_path}\n2. Run: iva");
    if answers.google_enabled {
        steps.push_str("\n3. Run: iva reminders (opens the Google consent page once)");
    }
    cliclack::note("Next steps", &steps)?;
    cliclack::outro("Setup complete!")?;
    Ok(())
}

/// Render config.toml from wizard answers (pure function for testability).
pub fn generate_config(answers: &Answers) -> String {
    let input_mode = match answers.input_mode {
        InputMode::Text => "text",
        InputMode::Speech => "speech",
    };
    let api_key_line = if answers.openai_api_key.is_empty() {
        "# api_key = \"\"  # or env: OPENAI_API_KEY".to_string()
    } else {
        format!("api_key = \"{}\"", answers.openai_api_key)
    };
    let elevenlabs_line = if answers.elevenlabs_api_key.is_empty() {
        "# elevenlabs_api_key = \"\"  # or env: ELEVENLABS_API_KEY".to_string()
    } else {
        format!("elevenlabs_api_key = \"{}\"", answers.elevenlabs_api_key)
    };

    format!(
        r#"[iva]
name = "IVA"
data_dir = "{data_dir}"
log_level = "info"
confirm_before_saving = {confirm}

[provider]
default = "openai"

[provider.openai]
{api_key_line}
model = "gpt-3.5-turbo"

[memory]
db_path = "{data_dir}/data/memory.db"
max_context_messages = 10

[google]
enabled = {google}
credentials_path = "{credentials}"

[voice]
input_mode = "{input_mode}"
tts_engine = "{tts}"
{elevenlabs_line}

[focus]
work_minutes = 25
break_minutes = 5
"#,
        data_dir = answers.data_dir,
        confirm = answers.confirm_before_saving,
        google = answers.google_enabled,
        credentials = answers.credentials_path,
        tts = answers.tts_engine.display_name(),
    )
}
